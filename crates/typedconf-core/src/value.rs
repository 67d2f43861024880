use crate::{
    error::AccessError,
    item::{ConfigItem, structural_eq},
};
use std::{fmt, sync::Arc};

///
/// Value
///
/// Dynamic property value used by index-addressed operations. Arrays and
/// lists share `List`; maps keep insertion order.
///

#[derive(Clone, Debug, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Char(char),
    Text(String),
    Item(ItemRef),
    List(Vec<Self>),
    Map(Vec<(Self, Self)>),
}

impl Value {
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Variant name used in diagnostics.
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Char(_) => "char",
            Self::Text(_) => "text",
            Self::Item(_) => "item",
            Self::List(_) => "list",
            Self::Map(_) => "map",
        }
    }

    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub const fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            Self::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_item(&self) -> Option<&ItemRef> {
        match self {
            Self::Item(item) => Some(item),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_list(&self) -> Option<&[Self]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_map(&self) -> Option<&[(Self, Self)]> {
        match self {
            Self::Map(entries) => Some(entries),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a.to_bits() == b.to_bits() || a == b,
            (Self::Char(a), Self::Char(b)) => a == b,
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Item(a), Self::Item(b)) => a == b,
            (Self::List(a), Self::List(b)) => a == b,
            (Self::Map(a), Self::Map(b)) => a == b,
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Int(value.into())
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<char> for Value {
    fn from(value: char) -> Self {
        Self::Char(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<ItemRef> for Value {
    fn from(value: ItemRef) -> Self {
        Self::Item(value)
    }
}

///
/// ItemRef
///
/// Shared handle to a configuration item. Equality is identity unless both
/// sides opted into value equality.
///

#[derive(Clone)]
pub struct ItemRef(Arc<dyn ConfigItem>);

impl ItemRef {
    pub fn new<T: ConfigItem>(item: T) -> Self {
        Self(Arc::new(item))
    }

    #[must_use]
    pub fn from_arc(item: Arc<dyn ConfigItem>) -> Self {
        Self(item)
    }

    #[must_use]
    pub fn item(&self) -> &dyn ConfigItem {
        self.0.as_ref()
    }

    /// Mutable access while this handle is the only one.
    pub fn get_mut(&mut self) -> Option<&mut dyn ConfigItem> {
        Arc::get_mut(&mut self.0)
    }

    #[must_use]
    pub fn type_path(&self) -> &str {
        self.0.type_path()
    }

    /// Read a property of the referenced item by name.
    pub fn get(&self, property: &str) -> Result<Value, AccessError> {
        self.0.get(property)
    }

    #[must_use]
    pub fn downcast_ref<T: ConfigItem>(&self) -> Option<&T> {
        self.0.as_any().downcast_ref::<T>()
    }

    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for ItemRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ItemRef").field(&self.type_path()).finish()
    }
}

impl PartialEq for ItemRef {
    fn eq(&self, other: &Self) -> bool {
        if self.ptr_eq(other) {
            return true;
        }

        self.0.value_equality()
            && other.0.value_equality()
            && structural_eq(self.item(), other.item())
    }
}
