//! Live containers for list and map properties.
//!
//! A container tracks whether it has ever been mutated; that flag is what
//! list and map properties report as "is set". Resetting a property replaces
//! the content in place so the container keeps its identity.

use crate::{
    convert::ValueType,
    error::ValueError,
    value::Value,
};
use std::ops::Deref;

///
/// ItemList
///

#[derive(Clone, Debug, PartialEq)]
pub struct ItemList<T> {
    items: Vec<T>,
    modified: bool,
}

impl<T> ItemList<T> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            items: Vec::new(),
            modified: false,
        }
    }

    #[must_use]
    pub const fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn push(&mut self, item: T) {
        self.items.push(item);
        self.modified = true;
    }

    pub fn insert(&mut self, index: usize, item: T) {
        self.items.insert(index, item);
        self.modified = true;
    }

    pub fn remove(&mut self, index: usize) -> Option<T> {
        if index < self.items.len() {
            self.modified = true;
            Some(self.items.remove(index))
        } else {
            None
        }
    }

    /// Replace the element at `index`, returning the previous one.
    pub fn set(&mut self, index: usize, item: T) -> Option<T> {
        let slot = self.items.get_mut(index)?;
        self.modified = true;

        Some(std::mem::replace(slot, item))
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.modified = true;
    }

    /// Replace the whole content and the modification flag.
    pub fn replace(&mut self, items: Vec<T>, modified: bool) {
        self.items = items;
        self.modified = modified;
    }

    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.items
    }
}

impl<T> Default for ItemList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Deref for ItemList<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        &self.items
    }
}

impl<T: ValueType> ValueType for ItemList<T> {
    fn to_value(&self) -> Value {
        self.items.to_value()
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        Ok(Self {
            items: Vec::from_value(value)?,
            modified: false,
        })
    }
}

///
/// ItemMap
///
/// Insertion-ordered map; keys only need equality.
///

#[derive(Clone, Debug, PartialEq)]
pub struct ItemMap<K, V> {
    entries: Vec<(K, V)>,
    modified: bool,
}

impl<K: PartialEq, V> ItemMap<K, V> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
            modified: false,
        }
    }

    #[must_use]
    pub const fn is_modified(&self) -> bool {
        self.modified
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn get(&self, key: &K) -> Option<&V> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    #[must_use]
    pub fn contains_key(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    /// Insert or replace in place, keeping the original position.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        self.modified = true;

        if let Some((_, existing)) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            return Some(std::mem::replace(existing, value));
        }
        self.entries.push((key, value));

        None
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        let index = self.entries.iter().position(|(k, _)| k == key)?;
        self.modified = true;

        Some(self.entries.remove(index).1)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.modified = true;
    }

    pub fn replace(&mut self, entries: Vec<(K, V)>, modified: bool) {
        self.entries = entries;
        self.modified = modified;
    }

    #[must_use]
    pub fn into_entries(self) -> Vec<(K, V)> {
        self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.iter().map(|(_, v)| v)
    }
}

impl<K: PartialEq, V> Default for ItemMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: ValueType + PartialEq, V: ValueType> ValueType for ItemMap<K, V> {
    fn to_value(&self) -> Value {
        Value::Map(
            self.entries
                .iter()
                .map(|(k, v)| (k.to_value(), v.to_value()))
                .collect(),
        )
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Map(entries) => {
                let entries = entries
                    .into_iter()
                    .map(|(k, v)| Ok((K::from_value(k)?, V::from_value(v)?)))
                    .collect::<Result<_, ValueError>>()?;

                Ok(Self {
                    entries,
                    modified: false,
                })
            }
            Value::Null => Ok(Self::new()),
            other => Err(ValueError::new("map", other.kind_name())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_tracks_modification() {
        let mut list = ItemList::new();
        assert!(!list.is_modified());

        list.push(1);
        assert!(list.is_modified());
        assert_eq!(list.as_slice(), &[1]);

        list.replace(Vec::new(), false);
        assert!(list.is_empty());
        assert!(!list.is_modified(), "replace resets the flag it is given");
    }

    #[test]
    fn out_of_range_edits_do_not_mark_modified() {
        let mut list: ItemList<i32> = ItemList::new();

        assert_eq!(list.remove(3), None);
        assert_eq!(list.set(0, 9), None);
        assert!(!list.is_modified());
    }

    #[test]
    fn map_insert_keeps_position() {
        let mut map = ItemMap::new();
        map.insert("a", 1);
        map.insert("b", 2);
        assert_eq!(map.insert("a", 3), Some(1));

        let keys: Vec<_> = map.keys().copied().collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(map.get(&"a"), Some(&3));
        assert!(map.is_modified());
    }
}
