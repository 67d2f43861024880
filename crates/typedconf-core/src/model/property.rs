use crate::{Primitive, PropertyKind, value::Value};
use typedconf_schema::types::Literal;

///
/// ElementShape
///
/// What a single value (or collection element) of a property may hold.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ElementShape {
    Primitive(Primitive),
    Item,
    Any,
}

impl ElementShape {
    /// The "no such entry" value of this shape.
    #[must_use]
    pub fn sentinel(self) -> Value {
        match self {
            Self::Primitive(p) => literal_value(&p.zero(), self),
            Self::Item | Self::Any => Value::Null,
        }
    }
}

///
/// PropertyModel
///
/// Per-concrete-type property descriptor. `slot` is the stable index used
/// by the generic operations.
///

#[derive(Clone, Debug, PartialEq)]
pub struct PropertyModel {
    pub name: String,
    pub slot: usize,
    pub kind: PropertyKind,
    pub element: ElementShape,
    pub nullable: bool,
    pub indexed: bool,

    /// Key property on the element type, for keyed lookups.
    pub key: Option<String>,

    /// Declared default, already converted; `Null` when none was declared.
    pub default: Value,
}

impl PropertyModel {
    #[must_use]
    pub fn new(name: &str, slot: usize, kind: PropertyKind) -> Self {
        Self {
            name: name.to_string(),
            slot,
            kind,
            element: ElementShape::Any,
            nullable: false,
            indexed: false,
            key: None,
            default: Value::Null,
        }
    }

    #[must_use]
    pub const fn element(mut self, element: ElementShape) -> Self {
        self.element = element;
        self
    }

    #[must_use]
    pub const fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    #[must_use]
    pub const fn indexed(mut self, indexed: bool) -> Self {
        self.indexed = indexed;
        self
    }

    #[must_use]
    pub fn key(mut self, key: &str) -> Self {
        self.key = Some(key.to_string());
        self
    }

    #[must_use]
    pub fn default_value(mut self, default: Value) -> Self {
        self.default = default;
        self
    }

    /// Value held by a fresh or reset slot.
    #[must_use]
    pub fn initial(&self) -> Value {
        if !self.default.is_null() {
            return self.default.clone();
        }

        match self.kind {
            PropertyKind::Array | PropertyKind::List => Value::List(Vec::new()),
            PropertyKind::Map => Value::Map(Vec::new()),
            PropertyKind::Plain | PropertyKind::Complex if !self.nullable => match self.element {
                ElementShape::Primitive(_) => self.element.sentinel(),
                _ => Value::Null,
            },
            _ => Value::Null,
        }
    }
}

/// Convert a schema literal for a slot of the given shape.
#[must_use]
pub fn literal_value(literal: &Literal, shape: ElementShape) -> Value {
    #[allow(clippy::cast_precision_loss)]
    match (literal, shape) {
        (Literal::Bool(b), _) => Value::Bool(*b),
        (Literal::Int(i), ElementShape::Primitive(p)) if p.is_float() => Value::Float(*i as f64),
        (Literal::Int(i), _) => Value::Int(*i),
        (Literal::Float(f), _) => Value::Float(*f),
        (Literal::Text(s), ElementShape::Primitive(Primitive::Char)) => {
            s.chars().next().map_or(Value::Null, Value::Char)
        }
        (Literal::Text(s), _) => Value::Text(s.clone()),
        (Literal::List(items), _) => {
            Value::List(items.iter().map(|l| literal_value(l, shape)).collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_values_by_kind() {
        let int = PropertyModel::new("x", 0, PropertyKind::Plain)
            .element(ElementShape::Primitive(Primitive::Int32));
        assert_eq!(int.initial(), Value::Int(0));

        let nullable = int.clone().nullable(true);
        assert_eq!(nullable.initial(), Value::Null);

        let list = PropertyModel::new("tags", 1, PropertyKind::List);
        assert_eq!(list.initial(), Value::List(Vec::new()));

        let named = int.default_value(Value::Int(7));
        assert_eq!(named.initial(), Value::Int(7));
    }

    #[test]
    fn literals_follow_the_element_shape() {
        let float = ElementShape::Primitive(Primitive::Float64);
        assert_eq!(literal_value(&Literal::Int(2), float), Value::Float(2.0));

        let ch = ElementShape::Primitive(Primitive::Char);
        assert_eq!(literal_value(&Literal::Text("z".into()), ch), Value::Char('z'));
    }
}
