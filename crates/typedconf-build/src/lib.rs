//! The configuration-object compiler.
//!
//! Planning runs in stages: the analyzer linearizes a type's ancestors and
//! substitutes type parameters, the selector picks the primary ancestor and
//! the obligation set, and the classifier assigns every property a slot and
//! a classification. Plans are cached per type and compiled by one of two
//! backends: Rust source ([`emit`]) or in-memory runtime models ([`model`]).

pub mod analyze;
pub mod cache;
pub mod classify;
pub mod emit;
pub mod error;
pub mod model;
pub mod paths;
pub mod plan;
pub mod registry;
pub mod select;

pub use cache::PlanCache;
pub use error::PlanError;
pub use plan::{ImplementationPlan, PlanOptions, Planner};

///
/// Prelude
///

pub mod prelude {
    pub use crate::{
        cache::PlanCache,
        classify::{Classification, PropertyPlan, ValueShape},
        emit::{Artifact, EmitOptions, Emitter, Header},
        error::PlanError,
        plan::{DispatchLayout, ImplementationPlan, PlanOptions, Switch, VisitPlan},
        registry::IndexRegistry,
    };
}
