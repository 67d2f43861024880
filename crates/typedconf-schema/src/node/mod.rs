mod property;
mod schema_type;
mod visit;

pub use property::*;
pub use schema_type::*;
pub use visit::*;

use crate::{ROOT_TYPE, error::ErrorTree, expr::TypeExpr};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error as ThisError;

///
/// NodeError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum NodeError {
    #[error("type '{0}' is defined more than once")]
    DuplicateType(String),

    #[error("type path '{0}' is reserved")]
    ReservedPath(String),

    #[error("type '{0}' not found")]
    TypeNotFound(String),

    #[error("type '{0}' could not be serialized: {1}")]
    Serialize(String, String),
}

///
/// ValidateNode
///
/// Local, schema-independent checks. Cross-type rules run afterwards in
/// `validate::validate_schema`.
///

pub trait ValidateNode {
    fn validate(&self) -> Result<(), ErrorTree> {
        Ok(())
    }
}

///
/// Def
///
/// Identity shared by every schema node.
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct Def {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub package: String,

    pub ident: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,
}

impl Def {
    #[must_use]
    pub fn new(package: impl Into<String>, ident: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            ident: ident.into(),
            comments: None,
        }
    }

    /// Fully qualified path, `package.Ident`.
    #[must_use]
    pub fn path(&self) -> String {
        if self.package.is_empty() {
            self.ident.clone()
        } else {
            format!("{}.{}", self.package, self.ident)
        }
    }
}

///
/// Schema
///
/// Immutable once loaded; analysis shares it behind an `Arc`.
///

#[derive(Clone, Debug, Default, Serialize)]
pub struct Schema {
    types: BTreeMap<String, SchemaType>,
}

impl Schema {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a type, resolving its parameter references.
    pub fn insert_type(&mut self, ty: SchemaType) -> Result<(), NodeError> {
        let path = ty.path();
        if path == ROOT_TYPE {
            return Err(NodeError::ReservedPath(path));
        }
        if self.types.contains_key(&path) {
            return Err(NodeError::DuplicateType(path));
        }

        self.types.insert(path, ty.resolve_params());

        Ok(())
    }

    #[must_use]
    pub fn with_type(mut self, ty: SchemaType) -> Self {
        // duplicates are dropped here; insert_type reports them
        let _ = self.insert_type(ty);
        self
    }

    #[must_use]
    pub fn get(&self, path: &str) -> Option<&SchemaType> {
        self.types.get(path)
    }

    pub fn try_get(&self, path: &str) -> Result<&SchemaType, NodeError> {
        self.get(path)
            .ok_or_else(|| NodeError::TypeNotFound(path.to_string()))
    }

    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.types.contains_key(path)
    }

    #[must_use]
    pub fn is_root(path: &str) -> bool {
        path == ROOT_TYPE
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// All types in path order.
    pub fn types(&self) -> impl Iterator<Item = (&str, &SchemaType)> {
        self.types.iter().map(|(path, ty)| (path.as_str(), ty))
    }

    /// Types that get an implementation, in path order.
    pub fn implemented_types(&self) -> impl Iterator<Item = (&str, &SchemaType)> {
        self.types().filter(|(_, ty)| ty.requires_implementation())
    }

    /// Direct ancestor paths in declaration order, the root excluded.
    #[must_use]
    pub fn parents(&self, path: &str) -> Vec<&str> {
        self.get(path)
            .map(|ty| {
                ty.ancestors
                    .iter()
                    .filter_map(TypeExpr::base_path)
                    .filter(|p| !Self::is_root(p))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Transitive ancestors, depth first in declaration order, each once.
    #[must_use]
    pub fn ancestors(&self, path: &str) -> Vec<String> {
        fn walk(schema: &Schema, path: &str, seen: &mut BTreeSet<String>, out: &mut Vec<String>) {
            for parent in schema.parents(path) {
                if seen.insert(parent.to_string()) {
                    out.push(parent.to_string());
                    walk(schema, parent, seen, out);
                }
            }
        }

        let mut seen = BTreeSet::from([path.to_string()]);
        let mut out = Vec::new();
        walk(self, path, &mut seen, &mut out);

        out
    }

    /// Every type that has `path` among its transitive ancestors.
    #[must_use]
    pub fn descendants(&self, path: &str) -> BTreeSet<String> {
        self.types
            .keys()
            .filter(|candidate| self.ancestors(candidate).iter().any(|a| a == path))
            .cloned()
            .collect()
    }

    /// Merge another schema into this one.
    pub fn extend(&mut self, other: Self) -> Result<(), NodeError> {
        for (_, ty) in other.types {
            self.insert_type(ty)?;
        }

        Ok(())
    }

    /// Run staged validation over the whole schema.
    pub fn validate(&self) -> Result<(), ErrorTree> {
        crate::validate::validate_schema(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diamond() -> Schema {
        Schema::new()
            .with_type(SchemaType::new("demo", "A"))
            .with_type(SchemaType::new("demo", "B").extends("demo.A"))
            .with_type(SchemaType::new("demo", "D").extends("demo.A"))
            .with_type(
                SchemaType::new("demo", "C")
                    .extends("demo.B")
                    .extends("demo.D"),
            )
    }

    #[test]
    fn ancestors_are_depth_first_and_unique() {
        let schema = diamond();

        assert_eq!(schema.ancestors("demo.C"), vec!["demo.B", "demo.A", "demo.D"]);
        assert!(schema.ancestors("demo.A").is_empty());
    }

    #[test]
    fn descendants_cover_every_path_through_the_diamond() {
        let schema = diamond();

        let below_a: Vec<_> = schema.descendants("demo.A").into_iter().collect();
        assert_eq!(below_a, vec!["demo.B", "demo.C", "demo.D"]);
        assert!(schema.descendants("demo.C").is_empty());
    }

    #[test]
    fn insert_rejects_duplicates_and_the_root() {
        let mut schema = diamond();

        assert_eq!(
            schema.insert_type(SchemaType::new("demo", "A")),
            Err(NodeError::DuplicateType("demo.A".into()))
        );
        assert_eq!(
            schema.insert_type(SchemaType::new("", ROOT_TYPE)),
            Err(NodeError::ReservedPath(ROOT_TYPE.into()))
        );
    }

    #[test]
    fn root_parent_is_not_listed() {
        let schema = Schema::new().with_type(SchemaType::new("demo", "A").extends(ROOT_TYPE));

        assert!(schema.parents("demo.A").is_empty());
    }
}
