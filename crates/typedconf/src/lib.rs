//! ## Crate layout
//! - `schema`: the declarative type table, schema-file loading and validation.
//! - `build`: planning (analysis, primary selection, classification) and the
//!   source and in-memory backends.
//! - `core`: runtime support shared by generated types and `ConfigObject`.
//!
//! Generated modules refer to `::typedconf::core` unless configured
//! otherwise, so applications only depend on this crate.

pub use typedconf_build as build;
pub use typedconf_core as core;
pub use typedconf_schema as schema;

/// Workspace version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

///
/// Prelude
///

pub mod prelude {
    pub use crate::{
        build::{PlanCache, PlanError, PlanOptions},
        core::{ConfigObject, prelude::*, visitor::Visitor},
        schema::{
            node::{Property, Schema, SchemaType, VisitSignature},
            types::Literal,
        },
    };
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::prelude::*;
    use std::sync::Arc;

    #[test]
    fn prelude_covers_the_runtime_round_trip() {
        let schema = Schema::new().with_type(
            SchemaType::new("app", "Limits")
                .property_with(Property::plain("max", "Int32").default_value(Literal::Int(10))),
        );
        let cache = PlanCache::new(schema, PlanOptions::default());
        let model = cache.model("app.Limits").expect("Limits compiles");
        let mut limits = ConfigObject::new(Arc::clone(&model)).expect("Limits is concrete");
        let max = model.slot_of("max").expect("max has a slot");

        assert_eq!(limits.value(max).expect("readable"), Value::Int(10));
        limits.update(max, Value::Int(3), true).expect("writable");
        assert_eq!(limits.value(max).expect("readable"), Value::Int(3));
    }
}
