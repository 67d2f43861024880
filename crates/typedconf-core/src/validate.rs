use crate::{
    Primitive, PropertyKind,
    error::AccessError,
    model::{ElementShape, PropertyModel},
    value::Value,
};

///
/// check_value
/// Validate the shape of a normalized value before it is committed.
///
pub fn check_value(
    type_path: &str,
    prop: &PropertyModel,
    value: &Value,
) -> Result<(), AccessError> {
    let mismatch = |expected: &str, found: &Value| AccessError::TypeMismatch {
        type_path: type_path.to_string(),
        property: prop.name.clone(),
        expected: expected.to_string(),
        found: found.kind_name().to_string(),
    };

    match prop.kind {
        PropertyKind::Derived => Ok(()),
        PropertyKind::Array | PropertyKind::List => {
            let items = value.as_list().ok_or_else(|| mismatch("list", value))?;
            items.iter().try_for_each(|item| {
                check_element(prop.element, item).map_err(|e| mismatch(e, item))
            })
        }
        PropertyKind::Map => {
            let entries = value.as_map().ok_or_else(|| mismatch("map", value))?;
            entries.iter().try_for_each(|(key, item)| {
                if key.is_null() {
                    return Err(mismatch("non-null key", key));
                }
                check_element(prop.element, item).map_err(|e| mismatch(e, item))
            })
        }
        PropertyKind::Item | PropertyKind::Reference => match value {
            Value::Null if !prop.nullable => Err(AccessError::NonNullable {
                type_path: type_path.to_string(),
                property: prop.name.clone(),
            }),
            Value::Null | Value::Item(_) => Ok(()),
            other => Err(mismatch("item", other)),
        },
        PropertyKind::Plain | PropertyKind::Complex => {
            if value.is_null() {
                return Ok(());
            }
            check_element(prop.element, value).map_err(|e| mismatch(e, value))
        }
    }
}

// Returns the expected shape on mismatch.
fn check_element(shape: ElementShape, value: &Value) -> Result<(), &'static str> {
    match shape {
        ElementShape::Any => Ok(()),
        ElementShape::Item => match value {
            Value::Null | Value::Item(_) => Ok(()),
            _ => Err("item"),
        },
        ElementShape::Primitive(p) => {
            if value.is_null() || primitive_accepts(p, value) {
                Ok(())
            } else {
                Err(primitive_label(p))
            }
        }
    }
}

fn primitive_accepts(p: Primitive, value: &Value) -> bool {
    match (p, value) {
        (Primitive::Bool, Value::Bool(_))
        | (Primitive::Char, Value::Char(_))
        | (Primitive::Text, Value::Text(_))
        | (Primitive::Float32 | Primitive::Float64, Value::Float(_) | Value::Int(_)) => true,
        (p, Value::Int(i)) if p.is_int() => int_in_range(p, *i),
        _ => false,
    }
}

fn int_in_range(p: Primitive, i: i64) -> bool {
    match p {
        Primitive::Int8 => i8::try_from(i).is_ok(),
        Primitive::Int16 => i16::try_from(i).is_ok(),
        Primitive::Int32 => i32::try_from(i).is_ok(),
        Primitive::Nat8 => u8::try_from(i).is_ok(),
        Primitive::Nat16 => u16::try_from(i).is_ok(),
        Primitive::Nat32 => u32::try_from(i).is_ok(),
        Primitive::Nat64 => i >= 0,
        _ => true,
    }
}

const fn primitive_label(p: Primitive) -> &'static str {
    match p {
        Primitive::Bool => "bool",
        Primitive::Char => "char",
        Primitive::Float32 | Primitive::Float64 => "float",
        Primitive::Int8 => "int8",
        Primitive::Int16 => "int16",
        Primitive::Int32 => "int32",
        Primitive::Int64 => "int64",
        Primitive::Nat8 => "nat8",
        Primitive::Nat16 => "nat16",
        Primitive::Nat32 => "nat32",
        Primitive::Nat64 => "nat64",
        Primitive::Text => "text",
    }
}
