//! Type graph analysis.
//!
//! Walks ancestor edges depth first in declaration order, composing type
//! parameter substitutions along the way, and collects every reachable
//! property declaration with its type expressed at the queried type.

use crate::error::PlanError;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use typedconf_schema::{
    ROOT_TYPE,
    expr::TypeExpr,
    node::{Property, Schema, SchemaType},
};

///
/// Binding
///
/// What a type parameter resolves to at the queried type. `Bound`
/// expressions are already fully substituted and are never substituted
/// again; `Unbound` is the explicit sentinel for a raw ancestor reference.
///

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub enum Binding {
    Identity,
    Bound(TypeExpr),
    Unbound,
}

///
/// TypeBinding
///
/// `(owner type, parameter) -> Binding` for every type in a hierarchy.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct TypeBinding {
    bindings: BTreeMap<(String, String), Binding>,
}

impl TypeBinding {
    #[must_use]
    pub fn get(&self, owner: &str, param: &str) -> Option<&Binding> {
        self.bindings.get(&(owner.to_string(), param.to_string()))
    }

    // first binding found wins
    fn bind(&mut self, owner: &str, param: &str, binding: Binding) {
        self.bindings
            .entry((owner.to_string(), param.to_string()))
            .or_insert(binding);
    }

    /// Express `expr`, written inside `owner`, at the queried type.
    /// Parameters unknown to `owner` are left untouched.
    #[must_use]
    pub fn substitute(&self, owner: &str, expr: &TypeExpr) -> TypeExpr {
        let all = |exprs: &[TypeExpr]| exprs.iter().map(|e| self.substitute(owner, e)).collect();

        match expr {
            TypeExpr::Param(name) => match self.get(owner, name) {
                Some(Binding::Bound(bound)) => bound.clone(),
                Some(Binding::Unbound) => TypeExpr::top(),
                Some(Binding::Identity) | None => expr.clone(),
            },
            TypeExpr::Named(_) => expr.clone(),
            TypeExpr::Parametrized { base, args } => TypeExpr::Parametrized {
                base: base.clone(),
                args: all(args),
            },
            TypeExpr::Wildcard { upper, lower } => TypeExpr::Wildcard {
                upper: all(upper),
                lower: all(lower),
            },
            TypeExpr::Array(element) => TypeExpr::array(self.substitute(owner, element)),
            TypeExpr::Union(members) => TypeExpr::Union(all(members)),
        }
    }
}

///
/// Declaration
///
/// One local declaration of a property, with its type substituted down to
/// the queried type.
///

#[derive(Clone, Debug, PartialEq)]
pub struct Declaration {
    pub owner: String,
    pub property: Property,
    pub ty: TypeExpr,
}

///
/// ResolvedProperty
///
/// Every declaration of one property identity, depth first in declaration
/// order starting at the queried type.
///

#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedProperty {
    pub name: String,
    pub declarations: Vec<Declaration>,
}

impl ResolvedProperty {
    /// First declaration exposing a getter or a setter.
    #[must_use]
    pub fn canonical(&self) -> Option<&Declaration> {
        self.declarations.iter().find(|d| d.property.has_accessor())
    }

    #[must_use]
    pub fn getter(&self) -> Option<&str> {
        self.declarations
            .iter()
            .find_map(|d| d.property.getter.as_deref())
    }

    #[must_use]
    pub fn setter(&self) -> Option<&str> {
        self.declarations
            .iter()
            .find_map(|d| d.property.setter.as_deref())
    }
}

///
/// Hierarchy
///

#[derive(Clone, Debug)]
pub struct Hierarchy {
    pub path: String,

    /// Transitive ancestors, depth first in declaration order, each once.
    pub ancestors: Vec<String>,

    pub bindings: TypeBinding,

    /// Ancestors first in declaration order, own properties last; first
    /// appearance of a name fixes its position.
    pub properties: Vec<ResolvedProperty>,
}

impl Hierarchy {
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&ResolvedProperty> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// The queried type followed by its ancestors.
    pub fn members(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.path.as_str()).chain(self.ancestors.iter().map(String::as_str))
    }
}

/// Analyze the type at `path`.
pub fn analyze(schema: &Schema, path: &str) -> Result<Hierarchy, PlanError> {
    let ty = schema
        .get(path)
        .ok_or_else(|| PlanError::UnknownType(path.to_string()))?;

    let mut walker = Walker {
        schema,
        path,
        bindings: TypeBinding::default(),
        ancestors: Vec::new(),
        seen: BTreeSet::from([path.to_string()]),
        stack: vec![path.to_string()],
    };
    for param in &ty.type_params {
        walker.bindings.bind(path, &param.name, Binding::Identity);
    }
    walker.walk(path, ty)?;

    let Walker {
        bindings, ancestors, ..
    } = walker;

    let properties = collect_properties(schema, path, &ancestors, &bindings)?;

    Ok(Hierarchy {
        path: path.to_string(),
        ancestors,
        bindings,
        properties,
    })
}

/// Owners of the nearest same-named declarations above `owner`.
#[must_use]
pub fn super_properties(schema: &Schema, owner: &str, name: &str) -> Vec<String> {
    fn walk(
        schema: &Schema,
        path: &str,
        name: &str,
        seen: &mut BTreeSet<String>,
        out: &mut Vec<String>,
    ) {
        for parent in schema.parents(path) {
            if !seen.insert(parent.to_string()) {
                continue;
            }
            match schema.get(parent) {
                Some(ty) if ty.property(name).is_some() => out.push(parent.to_string()),
                Some(_) => walk(schema, parent, name, seen, out),
                None => {}
            }
        }
    }

    let mut out = Vec::new();
    walk(schema, owner, name, &mut BTreeSet::new(), &mut out);

    out
}

///
/// Walker
///

struct Walker<'a> {
    schema: &'a Schema,
    path: &'a str,
    bindings: TypeBinding,
    ancestors: Vec<String>,
    seen: BTreeSet<String>,
    stack: Vec<String>,
}

impl Walker<'_> {
    fn walk(&mut self, owner: &str, ty: &SchemaType) -> Result<(), PlanError> {
        let schema = self.schema;

        for edge in &ty.ancestors {
            let base = edge
                .base_path()
                .ok_or_else(|| PlanError::UnsupportedTypeShape {
                    type_path: self.path.to_string(),
                    shape: edge.to_string(),
                })?;
            if base == ROOT_TYPE {
                continue;
            }
            if self.stack.iter().any(|p| p == base) {
                return Err(PlanError::Cycle {
                    type_path: self.path.to_string(),
                    through: base.to_string(),
                });
            }
            let target = schema
                .get(base)
                .ok_or_else(|| PlanError::UnknownType(base.to_string()))?;

            // Phase 1: bind the ancestor's parameters through this edge.
            let args = edge.args();
            for (i, param) in target.type_params.iter().enumerate() {
                let binding = args.get(i).map_or(Binding::Unbound, |arg| {
                    Binding::Bound(self.bindings.substitute(owner, arg))
                });
                self.bindings.bind(base, &param.name, binding);
            }

            // Phase 2: descend once per ancestor.
            if self.seen.insert(base.to_string()) {
                self.ancestors.push(base.to_string());
                self.stack.push(base.to_string());
                self.walk(base, target)?;
                self.stack.pop();
            }
        }

        Ok(())
    }
}

// Property order: ancestors first (declaration order), then own properties.
fn collect_properties(
    schema: &Schema,
    path: &str,
    ancestors: &[String],
    bindings: &TypeBinding,
) -> Result<Vec<ResolvedProperty>, PlanError> {
    fn order(schema: &Schema, path: &str, visited: &mut BTreeSet<String>, names: &mut Vec<String>) {
        if !visited.insert(path.to_string()) {
            return;
        }
        for parent in schema.parents(path) {
            order(schema, parent, visited, names);
        }
        if let Some(ty) = schema.get(path) {
            for prop in &ty.properties {
                if !names.contains(&prop.name) {
                    names.push(prop.name.clone());
                }
            }
        }
    }

    let mut names = Vec::new();
    order(schema, path, &mut BTreeSet::new(), &mut names);

    let members: Vec<&str> = std::iter::once(path)
        .chain(ancestors.iter().map(String::as_str))
        .collect();

    names
        .into_iter()
        .map(|name| {
            let mut declarations = Vec::new();
            for owner in &members {
                let ty = schema
                    .get(owner)
                    .ok_or_else(|| PlanError::UnknownType((*owner).to_string()))?;
                if let Some(prop) = ty.property(&name) {
                    declarations.push(Declaration {
                        owner: (*owner).to_string(),
                        property: prop.clone(),
                        ty: bindings.substitute(owner, &prop.ty),
                    });
                }
            }

            Ok(ResolvedProperty { name, declarations })
        })
        .collect()
}
