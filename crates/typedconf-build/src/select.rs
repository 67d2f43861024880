//! Primary ancestor selection and the obligation set.

use crate::analyze::Hierarchy;
use std::collections::BTreeSet;
use typedconf_schema::node::Schema;

/// The first direct ancestor, in declaration order, that carries an
/// implementation. `None` means the universal root.
#[must_use]
pub fn select_primary(schema: &Schema, path: &str) -> Option<String> {
    schema
        .parents(path)
        .into_iter()
        .find(|parent| {
            schema
                .get(parent)
                .is_some_and(|ty| ty.requires_implementation())
        })
        .map(str::to_string)
}

/// Types whose declarations the queried type must answer for itself: the
/// type plus every ancestor reachable without passing through the primary
/// or one of the primary's ancestors. Preorder, the type first.
#[must_use]
pub fn obligations(schema: &Schema, hierarchy: &Hierarchy, primary: Option<&str>) -> Vec<String> {
    let covered: BTreeSet<String> = primary
        .map(|p| {
            let mut set: BTreeSet<String> = schema.ancestors(p).into_iter().collect();
            set.insert(p.to_string());
            set
        })
        .unwrap_or_default();

    let mut out = vec![hierarchy.path.clone()];
    let mut seen = BTreeSet::from([hierarchy.path.clone()]);
    collect(schema, &hierarchy.path, &covered, &mut seen, &mut out);

    out
}

fn collect(
    schema: &Schema,
    path: &str,
    covered: &BTreeSet<String>,
    seen: &mut BTreeSet<String>,
    out: &mut Vec<String>,
) {
    for parent in schema.parents(path) {
        if covered.contains(parent) || !seen.insert(parent.to_string()) {
            continue;
        }
        out.push(parent.to_string());
        collect(schema, parent, covered, seen, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyze::analyze;
    use typedconf_schema::node::SchemaType;

    fn schema() -> Schema {
        Schema::new()
            .with_type(SchemaType::new("p", "Marker").no_implementation())
            .with_type(SchemaType::new("p", "A"))
            .with_type(SchemaType::new("p", "B").extends("p.A"))
            .with_type(SchemaType::new("p", "D"))
            .with_type(SchemaType::new("p", "C").extends("p.Marker").extends("p.B").extends("p.D"))
            .with_type(SchemaType::new("p", "Lone").extends("ConfigItem").extends("p.D"))
    }

    #[test]
    fn primary_skips_unimplemented_ancestors() {
        assert_eq!(select_primary(&schema(), "p.C").as_deref(), Some("p.B"));
    }

    #[test]
    fn primary_skips_the_root() {
        assert_eq!(select_primary(&schema(), "p.Lone").as_deref(), Some("p.D"));
    }

    #[test]
    fn primary_falls_back_to_the_root() {
        assert_eq!(select_primary(&schema(), "p.A"), None);
    }

    #[test]
    fn obligations_exclude_the_primary_chain() {
        let schema = schema();
        let h = analyze(&schema, "p.C").expect("analyzable");
        let got = obligations(&schema, &h, Some("p.B"));

        assert_eq!(got, vec!["p.C", "p.Marker", "p.D"]);
    }

    #[test]
    fn obligations_reach_everything_without_a_primary() {
        let schema = schema();
        let h = analyze(&schema, "p.B").expect("analyzable");

        assert_eq!(obligations(&schema, &h, None), vec!["p.B", "p.A"]);
    }
}
