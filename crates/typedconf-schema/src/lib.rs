//! Declarative model of configuration types.
//!
//! A [`Schema`](node::Schema) is a plain table of configuration types, their
//! properties, ancestor edges and visit-operation declarations. It carries no
//! behaviour beyond validation: analysis and code generation live in
//! `typedconf-build`.

pub mod error;
pub mod expr;
pub mod fingerprint;
pub mod load;
pub mod node;
pub mod types;
pub mod validate;

/// Maximum length for type identifiers.
pub const MAX_TYPE_NAME_LEN: usize = 64;

/// Maximum length for property names and accessor identifiers.
pub const MAX_PROPERTY_NAME_LEN: usize = 64;

/// Path of the universal root configuration type.
///
/// Every schema type implicitly extends it; it declares no properties and
/// always has an implementation.
pub const ROOT_TYPE: &str = "ConfigItem";

use crate::{error::ErrorTree, load::LoadError, node::NodeError};
use thiserror::Error as ThisError;

///
/// Prelude
///

pub mod prelude {
    pub use crate::{
        ROOT_TYPE, err,
        error::ErrorTree,
        expr::TypeExpr,
        node::*,
        types::{Literal, Primitive, PropertyKind},
    };
    pub use serde::{Deserialize, Serialize};
}

///
/// Error
///

#[derive(Debug, ThisError)]
pub enum Error {
    #[error(transparent)]
    LoadError(#[from] LoadError),

    #[error(transparent)]
    NodeError(#[from] NodeError),

    #[error("validation failed:\n{0}")]
    Validation(ErrorTree),
}
