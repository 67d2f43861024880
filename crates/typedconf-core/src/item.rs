use crate::{
    error::AccessError,
    model::PropertyModel,
    sanitize::normalize,
    validate::check_value,
    value::Value,
};
use std::{any::Any, fmt, sync::Arc};
use typedconf_schema::ROOT_TYPE;

///
/// UpdateListener
///
/// Observes committed writes. Fired after the value is stored.
///

pub trait UpdateListener: Send + Sync {
    fn property_updated(&self, type_path: &str, property: &str, old: &Value, new: &Value);
}

///
/// ItemState
///
/// Per-instance state that lives at the root of every implementation chain.
///

#[derive(Clone, Default)]
pub struct ItemState {
    frozen: bool,
    listeners: Vec<Arc<dyn UpdateListener>>,
}

impl ItemState {
    #[must_use]
    pub const fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub const fn freeze(&mut self) {
        self.frozen = true;
    }

    pub fn add_listener(&mut self, listener: Arc<dyn UpdateListener>) {
        self.listeners.push(listener);
    }

    pub fn notify(&self, type_path: &str, property: &str, old: &Value, new: &Value) {
        for listener in &self.listeners {
            listener.property_updated(type_path, property, old, new);
        }
    }
}

impl fmt::Debug for ItemState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ItemState")
            .field("frozen", &self.frozen)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

///
/// ConfigItem
///
/// Contract of every implementation level. The four storage operations
/// (`load`, `store`, `clear`, `flag`) are the per-level dispatch tables: a
/// level serves its local index range and hands every other index to its
/// primary ancestor. The public operations are provided on top of them so
/// that every write passes the same checks before it is committed.
///

pub trait ConfigItem: Any + Send + Sync {
    fn type_path(&self) -> &str;

    /// Descriptors of every visible property, indexed by slot.
    fn properties(&self) -> &[PropertyModel];

    fn state(&self) -> &ItemState;

    fn state_mut(&mut self) -> &mut ItemState;

    fn as_any(&self) -> &dyn Any;

    fn value_equality(&self) -> bool {
        false
    }

    fn load(&self, index: usize) -> Result<Value, AccessError>;

    /// Store an already checked value, returning the previous one.
    fn store(&mut self, index: usize, value: Value, is_set: bool) -> Result<Value, AccessError>;

    fn clear(&mut self, index: usize, initial: Value) -> Result<(), AccessError>;

    fn flag(&self, index: usize) -> Result<bool, AccessError>;

    //
    // generic operations
    //

    fn value(&self, index: usize) -> Result<Value, AccessError> {
        self.descriptor(index)?;
        self.load(index)
    }

    fn update(&mut self, index: usize, value: Value, is_set: bool) -> Result<(), AccessError> {
        self.check_set()?;

        let (name, value) = {
            let prop = self.descriptor(index)?;
            let value = normalize(self.type_path(), prop, value)?;
            check_value(self.type_path(), prop, &value)?;

            (prop.name.clone(), value)
        };
        let old = self.store(index, value.clone(), is_set)?;
        self.notify_update(&name, &old, &value);

        Ok(())
    }

    fn reset(&mut self, index: usize) -> Result<(), AccessError> {
        self.check_set()?;
        let initial = self.descriptor(index)?.initial();

        self.clear(index, initial)
    }

    fn is_set(&self, index: usize) -> Result<bool, AccessError> {
        self.descriptor(index)?;
        self.flag(index)
    }

    /// Put every property into its fresh-instance state.
    fn init(&mut self) -> Result<(), AccessError> {
        let initial: Vec<Value> = self.properties().iter().map(PropertyModel::initial).collect();
        for (index, value) in initial.into_iter().enumerate() {
            self.clear(index, value)?;
        }

        Ok(())
    }

    //
    // by name
    //

    fn slot_of(&self, property: &str) -> Result<usize, AccessError> {
        self.properties()
            .iter()
            .find(|p| p.name == property)
            .map(|p| p.slot)
            .ok_or_else(|| AccessError::unknown_property(self.type_path(), property))
    }

    fn get(&self, property: &str) -> Result<Value, AccessError> {
        self.value(self.slot_of(property)?)
    }

    fn set(&mut self, property: &str, value: Value) -> Result<(), AccessError> {
        let index = self.slot_of(property)?;
        self.update(index, value, true)
    }

    fn reset_property(&mut self, property: &str) -> Result<(), AccessError> {
        let index = self.slot_of(property)?;
        self.reset(index)
    }

    fn is_property_set(&self, property: &str) -> Result<bool, AccessError> {
        self.is_set(self.slot_of(property)?)
    }

    /// Positional read; past the end yields the element sentinel.
    fn get_indexed(&self, property: &str, index: usize) -> Result<Value, AccessError> {
        let prop = self.access(property, "indexed", |p| p.indexed)?;
        let sentinel = prop.element.sentinel();

        match self.value(prop.slot)? {
            Value::List(items) => Ok(items.into_iter().nth(index).unwrap_or(sentinel)),
            _ => Ok(sentinel),
        }
    }

    /// Positional write; gaps up to `index` are padded with the sentinel.
    fn set_indexed(
        &mut self,
        property: &str,
        index: usize,
        value: Value,
    ) -> Result<(), AccessError> {
        let (slot, sentinel) = {
            let prop = self.access(property, "indexed", |p| p.indexed)?;
            (prop.slot, prop.element.sentinel())
        };

        let mut items = match self.value(slot)? {
            Value::List(items) => items,
            _ => Vec::new(),
        };
        if items.len() <= index {
            items.resize(index + 1, sentinel);
        }
        items[index] = value;

        self.update(slot, Value::List(items), true)
    }

    /// Keyed read: scans for the element whose key property equals `key`.
    fn get_keyed(&self, property: &str, key: &Value) -> Result<Value, AccessError> {
        let prop = self.access(property, "keyed", |p| p.key.is_some())?;
        let sentinel = prop.element.sentinel();
        let key_property = prop.key.as_deref().unwrap_or_default();

        let found = match self.value(prop.slot)? {
            Value::List(items) => items.into_iter().find(|item| {
                item.as_item()
                    .and_then(|i| i.get(key_property).ok())
                    .is_some_and(|k| &k == key)
            }),
            Value::Map(entries) => entries.into_iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        };

        Ok(found.unwrap_or(sentinel))
    }

    //
    // invariants
    //

    fn check_set(&self) -> Result<(), AccessError> {
        if self.state().is_frozen() {
            Err(AccessError::frozen(self.type_path()))
        } else {
            Ok(())
        }
    }

    fn notify_update(&self, property: &str, old: &Value, new: &Value) {
        self.state().notify(self.type_path(), property, old, new);
    }

    fn freeze(&mut self) {
        self.state_mut().freeze();
    }

    fn add_listener(&mut self, listener: Arc<dyn UpdateListener>) {
        self.state_mut().add_listener(listener);
    }

    //
    // helpers
    //

    fn descriptor(&self, index: usize) -> Result<&PropertyModel, AccessError> {
        self.properties()
            .get(index)
            .ok_or_else(|| AccessError::missing_property(self.type_path(), index))
    }

    fn access(
        &self,
        property: &str,
        access: &'static str,
        allowed: fn(&PropertyModel) -> bool,
    ) -> Result<&PropertyModel, AccessError> {
        let prop = self.descriptor(self.slot_of(property)?)?;
        if allowed(prop) {
            Ok(prop)
        } else {
            Err(AccessError::NotIndexed {
                type_path: self.type_path().to_string(),
                property: property.to_string(),
                access,
            })
        }
    }
}

/// Same type and equal values in every slot.
#[must_use]
pub fn structural_eq(a: &dyn ConfigItem, b: &dyn ConfigItem) -> bool {
    a.type_path() == b.type_path()
        && a.properties().len() == b.properties().len()
        && (0..a.properties().len()).all(|i| match (a.value(i), b.value(i)) {
            (Ok(x), Ok(y)) => x == y,
            _ => false,
        })
}

///
/// RootItem
///
/// Implementation of the universal root type: no properties, owns the
/// instance state. Every index reaching it is missing.
///

#[derive(Clone, Debug, Default)]
pub struct RootItem {
    state: ItemState,
}

impl RootItem {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl ConfigItem for RootItem {
    fn type_path(&self) -> &str {
        ROOT_TYPE
    }

    fn properties(&self) -> &[PropertyModel] {
        &[]
    }

    fn state(&self) -> &ItemState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ItemState {
        &mut self.state
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn load(&self, index: usize) -> Result<Value, AccessError> {
        Err(AccessError::missing_property(ROOT_TYPE, index))
    }

    fn store(&mut self, index: usize, _: Value, _: bool) -> Result<Value, AccessError> {
        Err(AccessError::missing_property(ROOT_TYPE, index))
    }

    fn clear(&mut self, index: usize, _: Value) -> Result<(), AccessError> {
        Err(AccessError::missing_property(ROOT_TYPE, index))
    }

    fn flag(&self, index: usize) -> Result<bool, AccessError> {
        Err(AccessError::missing_property(ROOT_TYPE, index))
    }
}
