use thiserror::Error as ThisError;
use typedconf_schema::error::ErrorTree;

///
/// PlanError
///
/// Fatal to planning one type; no partial plan is usable. Every variant
/// names the type being planned so aggregated reports stay attributable.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum PlanError {
    #[error("unknown type '{0}'")]
    UnknownType(String),

    #[error("type '{0}' is marked no-implementation")]
    NoImplementation(String),

    #[error("type '{type_path}': property '{property}' has no reachable getter")]
    PropertyWithoutAccessor { type_path: String, property: String },

    #[error("type '{type_path}': unsupported type shape '{shape}'")]
    UnsupportedTypeShape { type_path: String, shape: String },

    #[error(
        "type '{type_path}': visit '{visit}' returns '{first}' in '{first_owner}' \
         but '{second}' in '{second_owner}'"
    )]
    VisitConflict {
        type_path: String,
        visit: String,
        first: String,
        first_owner: String,
        second: String,
        second_owner: String,
    },

    #[error("type '{type_path}': property '{property}' is declared as both {first} and {second}")]
    ConflictingKind {
        type_path: String,
        property: String,
        first: String,
        second: String,
    },

    #[error("type '{type_path}': property '{property}' has an invalid key: {reason}")]
    InvalidKey {
        type_path: String,
        property: String,
        reason: String,
    },

    #[error("type '{type_path}': ancestor cycle through '{through}'")]
    Cycle { type_path: String, through: String },

    #[error("type '{type_path}': primary ancestor '{ancestor}' failed: {source}")]
    AncestorFailed {
        type_path: String,
        ancestor: String,
        #[source]
        source: Box<Self>,
    },

    #[error("schema is invalid:\n{0}")]
    InvalidSchema(ErrorTree),
}

impl PlanError {
    /// Type the error is reported against.
    #[must_use]
    pub fn type_path(&self) -> Option<&str> {
        match self {
            Self::UnknownType(path) | Self::NoImplementation(path) => Some(path),
            Self::PropertyWithoutAccessor { type_path, .. }
            | Self::UnsupportedTypeShape { type_path, .. }
            | Self::VisitConflict { type_path, .. }
            | Self::ConflictingKind { type_path, .. }
            | Self::InvalidKey { type_path, .. }
            | Self::Cycle { type_path, .. }
            | Self::AncestorFailed { type_path, .. } => Some(type_path),
            Self::InvalidSchema(_) => None,
        }
    }
}
