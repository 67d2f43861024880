use crate::{
    PropertyKind,
    error::AccessError,
    model::{ElementShape, PropertyModel},
    value::Value,
};

///
/// normalize
/// Apply the per-kind write normalization to an incoming value.
///
/// `null` becomes the empty container for array, list and map properties.
/// Non-nullable plain and complex properties turn `null` into their declared
/// default, else the kind default; with neither the write is rejected.
/// Non-nullable item and reference properties always reject `null`.
/// Numeric values are widened to the property's float shape.
///
pub fn normalize(
    type_path: &str,
    prop: &PropertyModel,
    value: Value,
) -> Result<Value, AccessError> {
    if value.is_null() {
        return normalize_null(type_path, prop);
    }

    Ok(widen(prop.element, value))
}

fn normalize_null(type_path: &str, prop: &PropertyModel) -> Result<Value, AccessError> {
    match prop.kind {
        PropertyKind::Array | PropertyKind::List => Ok(Value::List(Vec::new())),
        PropertyKind::Map => Ok(Value::Map(Vec::new())),
        PropertyKind::Plain | PropertyKind::Complex if !prop.nullable => {
            let initial = prop.initial();
            if initial.is_null() {
                Err(non_nullable(type_path, prop))
            } else {
                Ok(initial)
            }
        }
        PropertyKind::Item | PropertyKind::Reference if !prop.nullable => {
            Err(non_nullable(type_path, prop))
        }
        _ => Ok(Value::Null),
    }
}

fn non_nullable(type_path: &str, prop: &PropertyModel) -> AccessError {
    AccessError::NonNullable {
        type_path: type_path.to_string(),
        property: prop.name.clone(),
    }
}

// Ints written to float slots, single-char text written to char slots.
fn widen(shape: ElementShape, value: Value) -> Value {
    let ElementShape::Primitive(p) = shape else {
        return value;
    };

    match value {
        Value::Int(_) if p.is_float() => value.as_float().map_or(value, Value::Float),
        Value::Text(ref s) if p == crate::Primitive::Char && s.chars().count() == 1 => {
            s.chars().next().map_or(value.clone(), Value::Char)
        }
        Value::List(items) => Value::List(items.into_iter().map(|v| widen(shape, v)).collect()),
        Value::Map(entries) => Value::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k, widen(shape, v)))
                .collect(),
        ),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Primitive;

    fn int(nullable: bool) -> PropertyModel {
        PropertyModel::new("count", 0, PropertyKind::Plain)
            .element(ElementShape::Primitive(Primitive::Int32))
            .nullable(nullable)
    }

    #[test]
    fn null_collections_become_empty() {
        let list = PropertyModel::new("tags", 0, PropertyKind::List);
        let map = PropertyModel::new("env", 0, PropertyKind::Map);

        assert_eq!(normalize("T", &list, Value::Null), Ok(Value::List(Vec::new())));
        assert_eq!(normalize("T", &map, Value::Null), Ok(Value::Map(Vec::new())));
    }

    #[test]
    fn null_scalar_takes_the_default() {
        let declared = int(false).default_value(Value::Int(8));

        assert_eq!(normalize("T", &declared, Value::Null), Ok(Value::Int(8)));
        assert_eq!(normalize("T", &int(false), Value::Null), Ok(Value::Int(0)));
        assert_eq!(normalize("T", &int(true), Value::Null), Ok(Value::Null));
    }

    #[test]
    fn non_nullable_without_any_default_rejects_null() {
        let opaque = PropertyModel::new("clock", 0, PropertyKind::Complex);

        assert_eq!(
            normalize("demo.T", &opaque, Value::Null),
            Err(AccessError::NonNullable {
                type_path: "demo.T".into(),
                property: "clock".into(),
            })
        );
    }

    #[test]
    fn non_nullable_items_reject_null() {
        let target =
            PropertyModel::new("target", 0, PropertyKind::Item).element(ElementShape::Item);
        let link =
            PropertyModel::new("link", 1, PropertyKind::Reference).element(ElementShape::Item);

        for prop in [&target, &link] {
            assert_eq!(
                normalize("p.Holder", prop, Value::Null),
                Err(AccessError::NonNullable {
                    type_path: "p.Holder".into(),
                    property: prop.name.clone(),
                })
            );
        }
        assert_eq!(normalize("p.Holder", &target.nullable(true), Value::Null), Ok(Value::Null));
    }

    #[test]
    fn ints_widen_into_float_slots() {
        let ratio = PropertyModel::new("ratio", 0, PropertyKind::Plain)
            .element(ElementShape::Primitive(Primitive::Float64));

        assert_eq!(normalize("T", &ratio, Value::Int(2)), Ok(Value::Float(2.0)));
    }
}
