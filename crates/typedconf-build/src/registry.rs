use serde::Serialize;
use std::collections::BTreeMap;

///
/// IndexRegistry
///
/// Immutable `property -> slot` map of one implementation level. A level's
/// registry starts as a copy of its primary's and only ever appends, so a
/// slot assigned anywhere up the chain keeps its number in every
/// descendant.
///

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct IndexRegistry {
    slots: BTreeMap<String, usize>,
}

impl IndexRegistry {
    /// Registry of the universal root.
    #[must_use]
    pub fn root() -> Self {
        Self::default()
    }

    /// Append `names`, in order, after every slot of `self`.
    #[must_use]
    pub fn extend<'a>(&self, names: impl IntoIterator<Item = &'a str>) -> Self {
        let mut slots = self.slots.clone();
        for name in names {
            let next = slots.len();
            slots.entry(name.to_string()).or_insert(next);
        }

        Self { slots }
    }

    #[must_use]
    pub fn slot_of(&self, name: &str) -> Option<usize> {
        self.slots.get(name).copied()
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.slots.contains_key(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Property names ordered by slot.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<(&str, usize)> =
            self.slots.iter().map(|(n, s)| (n.as_str(), *s)).collect();
        names.sort_by_key(|(_, slot)| *slot);

        names.into_iter().map(|(n, _)| n).collect()
    }
}
