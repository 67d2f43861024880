use thiserror::Error as ThisError;

///
/// AccessError
///
/// Runtime failure of a generated or in-memory accessor. These signal a
/// programming or schema error and are never retried.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum AccessError {
    #[error("type '{type_path}' has no property at index {index}")]
    MissingProperty { type_path: String, index: usize },

    #[error("property '{type_path}.{property}' cannot be null")]
    NonNullable { type_path: String, property: String },

    #[error("unimplemented visit case '{visit}' for type '{type_path}'")]
    UnimplementedVisit { visit: String, type_path: String },

    #[error("property '{type_path}.{property}' expects {expected}, found {found}")]
    TypeMismatch {
        type_path: String,
        property: String,
        expected: String,
        found: String,
    },

    #[error("index {index} is out of range for '{property}' (len {len})")]
    IndexOutOfRange {
        property: String,
        index: usize,
        len: usize,
    },

    #[error("'{type_path}' is frozen")]
    Frozen { type_path: String },

    #[error("type '{type_path}' has no property '{property}'")]
    UnknownProperty { type_path: String, property: String },

    #[error("property '{type_path}.{property}' is not {access}")]
    NotIndexed {
        type_path: String,
        property: String,
        access: &'static str,
    },

    #[error("type '{type_path}' is abstract")]
    AbstractType { type_path: String },
}

impl AccessError {
    pub fn missing_property(type_path: impl Into<String>, index: usize) -> Self {
        Self::MissingProperty {
            type_path: type_path.into(),
            index,
        }
    }

    pub fn unknown_property(type_path: impl Into<String>, property: impl Into<String>) -> Self {
        Self::UnknownProperty {
            type_path: type_path.into(),
            property: property.into(),
        }
    }

    pub fn unimplemented_visit(visit: impl Into<String>, type_path: impl Into<String>) -> Self {
        Self::UnimplementedVisit {
            visit: visit.into(),
            type_path: type_path.into(),
        }
    }

    pub fn frozen(type_path: impl Into<String>) -> Self {
        Self::Frozen {
            type_path: type_path.into(),
        }
    }
}

///
/// ValueError
///
/// A `Value` that does not convert to the requested Rust type. Accessors
/// attach the property it was meant for via [`ValueError::at`].
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
#[error("expected {expected}, found {found}")]
pub struct ValueError {
    pub expected: String,
    pub found: String,
}

impl ValueError {
    pub fn new(expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self {
            expected: expected.into(),
            found: found.into(),
        }
    }

    #[must_use]
    pub fn at(self, type_path: &str, property: &str) -> AccessError {
        AccessError::TypeMismatch {
            type_path: type_path.to_string(),
            property: property.to_string(),
            expected: self.expected,
            found: self.found,
        }
    }
}
