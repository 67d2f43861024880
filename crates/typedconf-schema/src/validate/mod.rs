//! Schema validation orchestration and shared helpers.

pub mod graph;
pub mod naming;

use crate::{
    error::ErrorTree,
    node::{Schema, ValidateNode},
};

/// Run full schema validation in a staged, deterministic order.
pub(crate) fn validate_schema(schema: &Schema) -> Result<(), ErrorTree> {
    // Phase 1: validate each node (structural + local invariants).
    let mut errors = validate_nodes(schema);

    // Phase 2: enforce schema-wide invariants.
    validate_global(schema, &mut errors);

    errors.result()
}

// Validate all nodes, routing errors by type path.
fn validate_nodes(schema: &Schema) -> ErrorTree {
    let mut errors = ErrorTree::new();
    for (path, ty) in schema.types() {
        if let Err(errs) = ty.validate() {
            errors.merge_at(path, errs);
        }
    }

    errors
}

// Run global validation passes that require a full schema view.
fn validate_global(schema: &Schema, errors: &mut ErrorTree) {
    graph::validate_ancestors(schema, errors);
    graph::validate_cycles(schema, errors);
    graph::validate_visit_cases(schema, errors);
    graph::validate_item_types(schema, errors);
}
