//! Stable content hashes for schema types.
//!
//! A type's fingerprint covers the type, its transitive ancestors and every
//! schema type reachable from their property and visit type expressions, so
//! any change that could alter its implementation plan changes the hash.

use crate::{
    expr::TypeExpr,
    node::{NodeError, Schema, SchemaType},
};
use std::{collections::BTreeSet, fmt};
use xxhash_rust::xxh3::Xxh3;

///
/// Fingerprint
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Fingerprint(pub u64);

impl Fingerprint {
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        u64::from_str_radix(text.trim(), 16).ok().map(Self)
    }

    /// Fold extra bytes into this fingerprint.
    #[must_use]
    pub fn mix(self, extra: &[u8]) -> Self {
        let mut hasher = Xxh3::new();
        hasher.update(&self.0.to_le_bytes());
        hasher.update(extra);

        Self(hasher.digest())
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Hash a type together with everything its plan can depend on, in
/// depth-first discovery order.
pub fn fingerprint(schema: &Schema, path: &str) -> Result<Fingerprint, NodeError> {
    let mut hasher = Xxh3::new();
    let mut seen = BTreeSet::from([path.to_string()]);
    let mut pending = vec![path.to_string()];

    while let Some(member) = pending.pop() {
        let ty = schema.try_get(&member)?;
        let bytes = serde_json::to_vec(ty)
            .map_err(|e| NodeError::Serialize(member.clone(), e.to_string()))?;
        hasher.update(member.as_bytes());
        hasher.update(&bytes);

        let mut next = schema.ancestors(&member);
        next.extend(referenced(ty));
        for reached in next.into_iter().rev().filter(|p| schema.contains(p)) {
            if seen.insert(reached.clone()) {
                pending.push(reached);
            }
        }
    }

    Ok(Fingerprint(hasher.digest()))
}

// Named paths in declaration order, primitives and foreign names included.
fn referenced(ty: &SchemaType) -> Vec<String> {
    fn collect(expr: &TypeExpr, out: &mut Vec<String>) {
        match expr {
            TypeExpr::Named(path) => out.push(path.clone()),
            TypeExpr::Parametrized { base, args } => {
                out.push(base.clone());
                args.iter().for_each(|arg| collect(arg, out));
            }
            TypeExpr::Wildcard { upper, lower } => {
                upper.iter().chain(lower).for_each(|bound| collect(bound, out));
            }
            TypeExpr::Array(element) => collect(element, out),
            TypeExpr::Union(members) => members.iter().for_each(|m| collect(m, out)),
            TypeExpr::Param(_) => {}
        }
    }

    let mut out = Vec::new();
    for expr in ty.ancestors.iter().chain(ty.type_params.iter().flat_map(|p| &p.bounds)) {
        collect(expr, &mut out);
    }
    for prop in &ty.properties {
        collect(&prop.ty, &mut out);
    }
    for visit in &ty.visits {
        for expr in [&visit.visitor, &visit.arg, &visit.result] {
            collect(expr, &mut out);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        node::{Property, SchemaType},
        types::PropertyKind,
    };

    fn schema(port_type: &str) -> Schema {
        Schema::new()
            .with_type(
                SchemaType::new("net", "Base").property_with(Property::plain("port", port_type)),
            )
            .with_type(SchemaType::new("net", "Leaf").extends("net.Base"))
            .with_type(SchemaType::new("net", "Other"))
    }

    #[test]
    fn ancestor_changes_reach_descendants() {
        let before = schema("Nat16");
        let after = schema("Nat32");

        assert_ne!(
            fingerprint(&before, "net.Leaf").expect("leaf"),
            fingerprint(&after, "net.Leaf").expect("leaf")
        );
        assert_eq!(
            fingerprint(&before, "net.Other").expect("other"),
            fingerprint(&after, "net.Other").expect("other")
        );
    }

    #[test]
    fn referenced_type_changes_reach_referrers() {
        let build = |key_type: &str| {
            Schema::new()
                .with_type(
                    SchemaType::new("lib", "Entry")
                        .property_with(Property::plain("name", key_type)),
                )
                .with_type(
                    SchemaType::new("lib", "Book").property_with(
                        Property::new("entries", PropertyKind::List, "lib.Entry")
                            .accessors()
                            .keyed("name", "entry"),
                    ),
                )
        };
        let before = build("Text");
        let after = build("Int32");

        assert_ne!(
            fingerprint(&before, "lib.Book").expect("book"),
            fingerprint(&after, "lib.Book").expect("book")
        );
    }

    #[test]
    fn mixing_changes_the_hash() {
        let fp = fingerprint(&schema("Nat16"), "net.Leaf").expect("leaf");

        assert_ne!(fp.mix(b"crate::core"), fp);
        assert_eq!(fp.mix(b"crate::core"), fp.mix(b"crate::core"));
    }

    #[test]
    fn display_parses_back() {
        let fp = fingerprint(&schema("Nat16"), "net.Leaf").expect("leaf");

        assert_eq!(Fingerprint::parse(&fp.to_string()), Some(fp));
        assert_eq!(fp.to_string().len(), 16);
    }

    #[test]
    fn missing_type_is_an_error() {
        assert!(fingerprint(&schema("Nat16"), "net.Nope").is_err());
    }
}
