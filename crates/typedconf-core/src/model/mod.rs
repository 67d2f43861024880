//! Runtime models built by the compiler.
//!
//! A [`TypeModel`] is the in-memory equivalent of one generated
//! implementation: the per-type property descriptors, the dispatch table over
//! its local index range and a link to its primary ancestor's model.

pub mod dispatch;
pub mod item;
pub mod property;

pub use dispatch::{DispatchTable, Route};
pub use item::{TypeModel, VisitModel};
pub use property::{ElementShape, PropertyModel};
