use derive_more::Display;
use serde::Serialize;

///
/// Route
///
/// How one entry of a dispatch table is served.
///

#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq, Serialize)]
pub enum Route {
    /// Storage owned by this level.
    Declared,

    /// Storage inherited from the primary, accessors regenerated here.
    Redeclared,

    /// Explicit hand-off to the primary ancestor.
    Inherited,
}

///
/// DispatchTable
///
/// Dense table over the contiguous local range `start..start + len`.
/// Indices outside the range are delegated to the primary ancestor.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct DispatchTable {
    start: usize,
    entries: Vec<Route>,
}

impl DispatchTable {
    #[must_use]
    pub const fn new(start: usize, entries: Vec<Route>) -> Self {
        Self { start, entries }
    }

    #[must_use]
    pub const fn start(&self) -> usize {
        self.start
    }

    #[must_use]
    pub const fn end(&self) -> usize {
        self.start + self.entries.len()
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Route for `index`, or `None` when it lies outside the local range.
    #[must_use]
    pub fn route(&self, index: usize) -> Option<Route> {
        index
            .checked_sub(self.start)
            .and_then(|offset| self.entries.get(offset))
            .copied()
    }

    #[must_use]
    pub fn entries(&self) -> &[Route] {
        &self.entries
    }
}
