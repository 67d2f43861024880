use std::{collections::BTreeMap, fmt};

///
/// ErrorTree
///
/// Route-keyed collection of validation messages. Routes nest by schema
/// location (type path, then property or visit name) so a report groups
/// every problem of one node together.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ErrorTree {
    messages: Vec<String>,
    children: BTreeMap<String, Self>,
}

impl ErrorTree {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message at this level.
    pub fn add(&mut self, message: impl fmt::Display) {
        self.messages.push(message.to_string());
    }

    /// Record a message under a child route.
    pub fn add_at(&mut self, route: impl Into<String>, message: impl fmt::Display) {
        self.children.entry(route.into()).or_default().add(message);
    }

    /// Fold the errors of a fallible step into this tree.
    pub fn add_result(&mut self, result: Result<(), Self>) {
        if let Err(errs) = result {
            self.merge(errs);
        }
    }

    /// Merge another tree into this level.
    pub fn merge(&mut self, other: Self) {
        self.messages.extend(other.messages);
        for (route, child) in other.children {
            self.children.entry(route).or_default().merge(child);
        }
    }

    /// Merge another tree under a child route; empty trees are dropped.
    pub fn merge_at(&mut self, route: impl Into<String>, other: Self) {
        if !other.is_empty() {
            self.children.entry(route.into()).or_default().merge(other);
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty() && self.children.values().all(Self::is_empty)
    }

    /// Total number of messages, including nested routes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len() + self.children.values().map(Self::len).sum::<usize>()
    }

    pub fn result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }

    /// Flatten into `(route, message)` pairs in route order.
    #[must_use]
    pub fn flatten(&self) -> Vec<(String, String)> {
        let mut out = Vec::new();
        self.flatten_into(&mut Vec::new(), &mut out);

        out
    }

    fn flatten_into<'a>(&'a self, route: &mut Vec<&'a str>, out: &mut Vec<(String, String)>) {
        for message in &self.messages {
            out.push((route.join("."), message.clone()));
        }
        for (key, child) in &self.children {
            route.push(key);
            child.flatten_into(route, out);
            route.pop();
        }
    }
}

impl fmt::Display for ErrorTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (route, message)) in self.flatten().iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            if route.is_empty() {
                write!(f, "{message}")?;
            } else {
                write!(f, "{route}: {message}")?;
            }
        }

        Ok(())
    }
}

impl std::error::Error for ErrorTree {}

/// Append a formatted message to an [`ErrorTree`].
#[macro_export]
macro_rules! err {
    ($errs:expr, $($arg:tt)*) => {{
        $errs.add(format!($($arg)*));
    }};
}
