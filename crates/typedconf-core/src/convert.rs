//! Conversions between typed storage and [`Value`].

use crate::{
    error::ValueError,
    value::{ItemRef, Value},
};

///
/// ValueType
///
/// Implemented by every Rust type a generated slot can hold.
///

pub trait ValueType: Sized {
    fn to_value(&self) -> Value;

    fn from_value(value: Value) -> Result<Self, ValueError>;
}

impl ValueType for Value {
    fn to_value(&self) -> Value {
        self.clone()
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        Ok(value)
    }
}

impl ValueType for bool {
    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        value
            .as_bool()
            .ok_or_else(|| ValueError::new("bool", value.kind_name()))
    }
}

macro_rules! impl_int {
    ($($ty:ty),* $(,)?) => {
        $(
            impl ValueType for $ty {
                fn to_value(&self) -> Value {
                    Value::Int(i64::from(*self))
                }

                fn from_value(value: Value) -> Result<Self, ValueError> {
                    let int = value
                        .as_int()
                        .ok_or_else(|| ValueError::new(stringify!($ty), value.kind_name()))?;

                    <$ty>::try_from(int)
                        .map_err(|_| ValueError::new(stringify!($ty), int.to_string()))
                }
            }
        )*
    };
}

impl_int!(i8, i16, i32, i64, u8, u16, u32);

// u64 does not fit `Value::Int` losslessly above i64::MAX
impl ValueType for u64 {
    fn to_value(&self) -> Value {
        Value::Int(i64::try_from(*self).unwrap_or(i64::MAX))
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        let int = value
            .as_int()
            .ok_or_else(|| ValueError::new("u64", value.kind_name()))?;

        Self::try_from(int).map_err(|_| ValueError::new("u64", int.to_string()))
    }
}

impl ValueType for f64 {
    fn to_value(&self) -> Value {
        Value::Float(*self)
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        value
            .as_float()
            .ok_or_else(|| ValueError::new("f64", value.kind_name()))
    }
}

impl ValueType for f32 {
    fn to_value(&self) -> Value {
        Value::Float(f64::from(*self))
    }

    #[allow(clippy::cast_possible_truncation)]
    fn from_value(value: Value) -> Result<Self, ValueError> {
        value
            .as_float()
            .map(|f| f as Self)
            .ok_or_else(|| ValueError::new("f32", value.kind_name()))
    }
}

impl ValueType for char {
    fn to_value(&self) -> Value {
        Value::Char(*self)
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        match &value {
            Value::Char(c) => Ok(*c),
            Value::Text(s) if s.chars().count() == 1 => s
                .chars()
                .next()
                .ok_or_else(|| ValueError::new("char", "empty text")),
            _ => Err(ValueError::new("char", value.kind_name())),
        }
    }
}

impl ValueType for String {
    fn to_value(&self) -> Value {
        Value::Text(self.clone())
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Text(s) => Ok(s),
            other => Err(ValueError::new("text", other.kind_name())),
        }
    }
}

impl ValueType for ItemRef {
    fn to_value(&self) -> Value {
        Value::Item(self.clone())
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Item(item) => Ok(item),
            other => Err(ValueError::new("item", other.kind_name())),
        }
    }
}

impl<T: ValueType> ValueType for Option<T> {
    fn to_value(&self) -> Value {
        self.as_ref().map_or(Value::Null, ValueType::to_value)
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl<T: ValueType> ValueType for Vec<T> {
    fn to_value(&self) -> Value {
        Value::List(self.iter().map(ValueType::to_value).collect())
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::List(items) => items.into_iter().map(T::from_value).collect(),
            Value::Null => Ok(Self::new()),
            other => Err(ValueError::new("list", other.kind_name())),
        }
    }
}
