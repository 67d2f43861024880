//! Runtime support for configuration objects: values, slot storage, the
//! per-type models that drive index dispatch, and the `ConfigItem` contract
//! shared by generated implementations and in-memory [`ConfigObject`]s.
#![warn(unreachable_pub)]

pub mod collection;
pub mod convert;
pub mod error;
pub mod item;
pub mod model;
pub mod object;
pub mod sanitize;
pub mod slot;
pub mod validate;
pub mod value;
pub mod visitor;

pub use object::ConfigObject;

// schema vocabulary used in runtime models
pub use typedconf_schema::types::{Primitive, PropertyKind};

///
/// Prelude
///
/// Everything generated implementations refer to.
///

pub mod prelude {
    pub use crate::{
        Primitive, PropertyKind,
        collection::{ItemList, ItemMap},
        convert::ValueType,
        error::{AccessError, ValueError},
        item::{ConfigItem, ItemState, RootItem, UpdateListener, structural_eq},
        model::{ElementShape, PropertyModel, Route},
        slot::Slot,
        value::{ItemRef, Value},
    };
}
