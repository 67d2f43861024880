use crate::{
    ROOT_TYPE,
    error::ErrorTree,
    expr::TypeExpr,
    node::Schema,
    types::PropertyKind,
};
use std::collections::{BTreeMap, BTreeSet};

// Ancestor edges must name known configuration types with a matching arity.
pub fn validate_ancestors(schema: &Schema, errs: &mut ErrorTree) {
    for (path, ty) in schema.types() {
        let mut seen = BTreeSet::new();

        for ancestor in &ty.ancestors {
            let Some(base) = ancestor.base_path() else {
                errs.add_at(path, format!("ancestor '{ancestor}' must be a named type"));
                continue;
            };
            if !seen.insert(base) {
                errs.add_at(path, format!("ancestor '{base}' is listed more than once"));
            }
            if base == path {
                errs.add_at(path, "a type cannot extend itself");
                continue;
            }
            if base == ROOT_TYPE {
                if !ancestor.args().is_empty() {
                    errs.add_at(path, format!("'{ROOT_TYPE}' takes no type arguments"));
                }
                continue;
            }

            let Some(target) = schema.get(base) else {
                errs.add_at(path, format!("unknown ancestor '{base}'"));
                continue;
            };

            // a raw reference (no arguments) leaves every parameter unbound
            let args = ancestor.args().len();
            let params = target.type_params.len();
            if args != 0 && args != params {
                errs.add_at(
                    path,
                    format!("ancestor '{base}' expects {params} type arguments, found {args}"),
                );
            }
        }
    }
}

// Ancestor edges must form a DAG.
pub fn validate_cycles(schema: &Schema, errs: &mut ErrorTree) {
    #[derive(Clone, Copy, Eq, PartialEq)]
    enum Mark {
        Active,
        Done,
    }

    fn visit<'a>(
        schema: &'a Schema,
        path: &'a str,
        marks: &mut BTreeMap<&'a str, Mark>,
        stack: &mut Vec<&'a str>,
        reported: &mut BTreeSet<String>,
        errs: &mut ErrorTree,
    ) {
        match marks.get(path) {
            Some(Mark::Done) => return,
            Some(Mark::Active) => {
                let start = stack.iter().position(|p| *p == path).unwrap_or(0);
                let mut cycle: Vec<&str> = stack[start..].to_vec();
                cycle.push(path);
                let key = stack[start..].iter().min().copied().unwrap_or(path).to_string();
                if reported.insert(key.clone()) {
                    errs.add_at(key, format!("ancestor cycle: {}", cycle.join(" -> ")));
                }
                return;
            }
            None => {}
        }

        marks.insert(path, Mark::Active);
        stack.push(path);
        for parent in schema.parents(path) {
            if schema.contains(parent) {
                visit(schema, parent, marks, stack, reported, errs);
            }
        }
        stack.pop();
        marks.insert(path, Mark::Done);
    }

    let mut marks = BTreeMap::new();
    let mut reported = BTreeSet::new();
    for (path, _) in schema.types() {
        visit(schema, path, &mut marks, &mut Vec::new(), &mut reported, errs);
    }
}

// A visit case must name a visit declared on the type or one of its ancestors.
pub fn validate_visit_cases(schema: &Schema, errs: &mut ErrorTree) {
    for (path, ty) in schema.types() {
        if ty.visit_cases.is_empty() {
            continue;
        }

        let ancestors = schema.ancestors(path);
        let declared: BTreeSet<&str> = std::iter::once(path)
            .chain(ancestors.iter().map(String::as_str))
            .filter_map(|p| schema.get(p))
            .flat_map(|t| t.visits.iter().map(|v| v.name.as_str()))
            .collect();

        for case in &ty.visit_cases {
            if !declared.contains(case.visit.as_str()) {
                errs.add_at(
                    path,
                    format!("visit case '{}' has no matching visit declaration", case.visit),
                );
            }
        }
    }
}

// Item and reference properties must point at configuration types.
pub fn validate_item_types(schema: &Schema, errs: &mut ErrorTree) {
    for (path, ty) in schema.types() {
        for prop in &ty.properties {
            if !matches!(prop.kind, PropertyKind::Item | PropertyKind::Reference) {
                continue;
            }

            match &prop.ty {
                TypeExpr::Param(_) | TypeExpr::Wildcard { .. } | TypeExpr::Union(_) => {}
                expr => match expr.base_path() {
                    Some(base) if base == ROOT_TYPE || schema.contains(base) => {}
                    _ => errs.add_at(
                        path,
                        format!("property '{}' refers to unknown type '{expr}'", prop.name),
                    ),
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{Property, SchemaType};

    fn messages(schema: &Schema) -> Vec<String> {
        schema
            .validate()
            .expect_err("schema should be invalid")
            .flatten()
            .into_iter()
            .map(|(route, msg)| format!("{route}: {msg}"))
            .collect()
    }

    #[test]
    fn unknown_ancestor_and_bad_arity() {
        let schema = Schema::new()
            .with_type(SchemaType::new("demo", "Pair").param("K").param("V"))
            .with_type(SchemaType::new("demo", "A").extends("demo.Missing"))
            .with_type(SchemaType::new("demo", "B").extends("demo.Pair<Int32>"));

        let msgs = messages(&schema);
        assert!(msgs.iter().any(|m| m.contains("unknown ancestor 'demo.Missing'")), "{msgs:?}");
        assert!(msgs.iter().any(|m| m.contains("expects 2 type arguments")), "{msgs:?}");
    }

    #[test]
    fn raw_parametrized_ancestor_is_allowed() {
        let schema = Schema::new()
            .with_type(SchemaType::new("demo", "Pair").param("K").param("V"))
            .with_type(SchemaType::new("demo", "Raw").extends("demo.Pair"));

        assert!(schema.validate().is_ok());
    }

    #[test]
    fn cycles_are_reported_once() {
        let schema = Schema::new()
            .with_type(SchemaType::new("demo", "A").extends("demo.C"))
            .with_type(SchemaType::new("demo", "B").extends("demo.A"))
            .with_type(SchemaType::new("demo", "C").extends("demo.B"));

        let cycles: Vec<_> = messages(&schema)
            .into_iter()
            .filter(|m| m.contains("ancestor cycle"))
            .collect();
        assert_eq!(cycles.len(), 1, "{cycles:?}");
    }

    #[test]
    fn visit_case_needs_a_declaration() {
        let schema =
            Schema::new().with_type(SchemaType::new("demo", "A").handles("render", "render_a"));

        let msgs = messages(&schema);
        assert!(msgs.iter().any(|m| m.contains("visit case 'render'")), "{msgs:?}");
    }

    #[test]
    fn item_property_must_name_a_schema_type() {
        let schema = Schema::new().with_type(
            SchemaType::new("demo", "A").property_with(
                Property::new("child", PropertyKind::Item, "demo.Nowhere").accessors(),
            ),
        );

        let msgs = messages(&schema);
        assert!(msgs.iter().any(|m| m.contains("unknown type 'demo.Nowhere'")), "{msgs:?}");
    }
}
