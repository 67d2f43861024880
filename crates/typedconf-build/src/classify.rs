//! Property classification.
//!
//! Relative to the selected primary ancestor every visible property is
//! either served entirely by the primary (`Inherited`), stored by the
//! primary but re-exposed here (`Redeclared`), or new storage owned by this
//! level (`Declared`).

use crate::{
    analyze::{Hierarchy, ResolvedProperty, super_properties},
    error::PlanError,
    registry::IndexRegistry,
};
use derive_more::Display;
use serde::Serialize;
use typedconf_core::model::Route;
use typedconf_schema::{
    expr::TypeExpr,
    node::Schema,
    types::{Literal, Primitive, PropertyKind},
};

///
/// Classification
///

#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq, Serialize)]
pub enum Classification {
    Declared,
    Inherited,
    Redeclared,
}

impl Classification {
    #[must_use]
    pub const fn route(self) -> Route {
        match self {
            Self::Declared => Route::Declared,
            Self::Inherited => Route::Inherited,
            Self::Redeclared => Route::Redeclared,
        }
    }
}

///
/// ValueShape
///
/// What one value (or collection element) of a property is at runtime.
///

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub enum ValueShape {
    Primitive(Primitive),

    /// A configuration item of the named schema type (or the root).
    Item(String),

    /// A named type outside the schema, carried through verbatim.
    Opaque(TypeExpr),

    /// Anything; unbound parameters and array-typed values.
    Dynamic,
}

impl ValueShape {
    /// Shape of a substituted type expression.
    pub fn of(schema: &Schema, type_path: &str, expr: &TypeExpr) -> Result<Self, PlanError> {
        match expr {
            TypeExpr::Named(name) => Ok(Primitive::from_name(name).map_or_else(
                || {
                    if schema.contains(name) || Schema::is_root(name) {
                        Self::Item(name.clone())
                    } else {
                        Self::Opaque(expr.clone())
                    }
                },
                Self::Primitive,
            )),
            TypeExpr::Parametrized { base, args } => {
                for arg in args {
                    Self::of(schema, type_path, arg)?;
                }
                if schema.contains(base) {
                    Ok(Self::Item(base.clone()))
                } else {
                    Ok(Self::Opaque(expr.clone()))
                }
            }
            TypeExpr::Wildcard { upper, .. } => upper
                .first()
                .map_or(Ok(Self::Dynamic), |bound| Self::of(schema, type_path, bound)),
            TypeExpr::Param(_) => Ok(Self::Dynamic),
            TypeExpr::Array(element) => {
                Self::of(schema, type_path, element)?;
                Ok(Self::Dynamic)
            }
            TypeExpr::Union(_) => Err(PlanError::UnsupportedTypeShape {
                type_path: type_path.to_string(),
                shape: expr.to_string(),
            }),
        }
    }

    #[must_use]
    pub const fn is_item(&self) -> bool {
        matches!(self, Self::Item(_))
    }
}

///
/// KeyPlan
///

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct KeyPlan {
    /// Key property on the element type.
    pub property: String,
    pub getter: String,
    pub shape: ValueShape,
}

///
/// PropertyPlan
///
/// One visible property of a concrete type, fully resolved.
///

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PropertyPlan {
    pub name: String,
    pub slot: usize,
    pub classification: Classification,

    /// Declaring type of the canonical declaration.
    pub owner: String,

    /// Ancestors of `owner` holding the declarations it refines.
    pub refines: Vec<String>,

    pub kind: PropertyKind,
    pub ty: TypeExpr,
    pub shape: ValueShape,
    pub nullable: bool,
    pub indexed: bool,
    pub key: Option<KeyPlan>,
    pub getter: String,
    pub setter: Option<String>,
    pub default: Option<Literal>,
    pub doc: Option<String>,
}

impl PropertyPlan {
    #[must_use]
    pub fn route(&self) -> Route {
        self.classification.route()
    }

    /// Whether generated accessors live at this level.
    #[must_use]
    pub fn is_local(&self) -> bool {
        self.classification != Classification::Inherited
    }
}

/// Classify every property of `hierarchy` against the primary's registry.
/// Returns the plans ordered by slot and this level's registry.
pub fn classify(
    schema: &Schema,
    hierarchy: &Hierarchy,
    obligations: &[String],
    primary: &IndexRegistry,
) -> Result<(Vec<PropertyPlan>, IndexRegistry), PlanError> {
    let path = hierarchy.path.as_str();

    // Phase 1: classify in property order.
    let mut classified = Vec::with_capacity(hierarchy.properties.len());
    for resolved in &hierarchy.properties {
        let classification = match primary.slot_of(&resolved.name) {
            Some(_) if redeclared(resolved, obligations) => Classification::Redeclared,
            Some(_) => Classification::Inherited,
            None => Classification::Declared,
        };
        classified.push((resolved, classification));
    }

    // Phase 2: append the declared slots after the primary's.
    let registry = primary.extend(
        classified
            .iter()
            .filter(|(_, c)| *c == Classification::Declared)
            .map(|(r, _)| r.name.as_str()),
    );

    // Phase 3: resolve each property against its canonical declaration.
    let mut plans = classified
        .into_iter()
        .map(|(resolved, classification)| {
            let slot = registry
                .slot_of(&resolved.name)
                .ok_or_else(|| PlanError::UnknownType(path.to_string()))?;

            resolve(schema, path, resolved, classification, slot)
        })
        .collect::<Result<Vec<_>, _>>()?;
    plans.sort_by_key(|p| p.slot);

    Ok((plans, registry))
}

// an accessor-bearing declaration this level must answer for
fn redeclared(resolved: &ResolvedProperty, obligations: &[String]) -> bool {
    resolved
        .declarations
        .iter()
        .any(|d| d.property.has_accessor() && obligations.contains(&d.owner))
}

fn resolve(
    schema: &Schema,
    path: &str,
    resolved: &ResolvedProperty,
    classification: Classification,
    slot: usize,
) -> Result<PropertyPlan, PlanError> {
    let without_accessor = || PlanError::PropertyWithoutAccessor {
        type_path: path.to_string(),
        property: resolved.name.clone(),
    };
    let canonical = resolved.canonical().ok_or_else(without_accessor)?;
    let getter = resolved.getter().ok_or_else(without_accessor)?;

    let kind = canonical.property.kind;
    if let Some(other) = resolved.declarations.iter().find(|d| d.property.kind != kind) {
        return Err(PlanError::ConflictingKind {
            type_path: path.to_string(),
            property: resolved.name.clone(),
            first: kind.to_string(),
            second: other.property.kind.to_string(),
        });
    }

    let shape = ValueShape::of(schema, path, &canonical.ty)?;
    let key = resolve_key(schema, path, resolved, kind, &shape)?;

    Ok(PropertyPlan {
        name: resolved.name.clone(),
        slot,
        classification,
        owner: canonical.owner.clone(),
        refines: super_properties(schema, &canonical.owner, &resolved.name),
        kind,
        ty: canonical.ty.clone(),
        shape,
        nullable: canonical.property.nullable,
        indexed: canonical.property.indexed,
        key,
        getter: getter.to_string(),
        setter: resolved.setter().map(str::to_string),
        default: resolved
            .declarations
            .iter()
            .find_map(|d| d.property.default.clone()),
        doc: resolved
            .declarations
            .iter()
            .find_map(|d| d.property.doc.clone()),
    })
}

fn resolve_key(
    schema: &Schema,
    path: &str,
    resolved: &ResolvedProperty,
    kind: PropertyKind,
    shape: &ValueShape,
) -> Result<Option<KeyPlan>, PlanError> {
    let invalid = |reason: String| PlanError::InvalidKey {
        type_path: path.to_string(),
        property: resolved.name.clone(),
        reason,
    };

    let Some(access) = resolved.declarations.iter().find_map(|d| d.property.key.as_ref()) else {
        return if kind == PropertyKind::Map {
            Err(invalid("map properties need a key".to_string()))
        } else {
            Ok(None)
        };
    };

    let ValueShape::Item(element) = shape else {
        return Err(invalid(format!(
            "element type of a keyed property must be a configuration type, found {shape:?}"
        )));
    };

    // the key property may live on the element type or any of its ancestors
    let key_ty = std::iter::once(element.clone())
        .chain(schema.ancestors(element))
        .find_map(|owner| {
            schema
                .get(&owner)
                .and_then(|ty| ty.property(&access.property))
                .map(|p| p.ty.clone())
        })
        .ok_or_else(|| {
            invalid(format!(
                "'{}' has no property '{}'",
                element, access.property
            ))
        })?;

    let key_shape = ValueShape::of(schema, path, &key_ty)?;
    if key_shape == ValueShape::Dynamic {
        return Err(invalid(format!("key property '{}' has no concrete type", access.property)));
    }

    Ok(Some(KeyPlan {
        property: access.property.clone(),
        getter: access.getter.clone(),
        shape: key_shape,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        analyze::analyze,
        select::{obligations, select_primary},
    };
    use typedconf_schema::node::{Property, SchemaType};

    fn run(
        schema: &Schema,
        path: &str,
        primary: &IndexRegistry,
    ) -> Result<Vec<PropertyPlan>, PlanError> {
        let h = analyze(schema, path)?;
        let p = select_primary(schema, path);
        let obl = obligations(schema, &h, p.as_deref());

        classify(schema, &h, &obl, primary).map(|(plans, _)| plans)
    }

    #[test]
    fn property_without_any_getter_is_rejected() {
        let schema = Schema::new().with_type(
            SchemaType::new("k", "A")
                .property_with(Property::new("x", PropertyKind::Plain, "Int32")),
        );

        assert!(matches!(
            run(&schema, "k.A", &IndexRegistry::root()),
            Err(PlanError::PropertyWithoutAccessor { .. })
        ));
    }

    #[test]
    fn accessor_may_come_from_any_declaration() {
        let schema = Schema::new()
            .with_type(SchemaType::new("k", "A").property_with(Property::plain("x", "Int32")))
            .with_type(
                SchemaType::new("k", "B")
                    .no_implementation()
                    .property_with(
                        Property::new("x", PropertyKind::Plain, "Int32").setter("put_x"),
                    ),
            )
            .with_type(SchemaType::new("k", "C").extends("k.B").extends("k.A"));

        let plans = run(&schema, "k.C", &IndexRegistry::root().extend(["x"])).expect("plannable");
        assert_eq!(plans[0].getter, "x");
        assert_eq!(plans[0].setter.as_deref(), Some("put_x"), "first setter found wins");
        assert_eq!(plans[0].classification, Classification::Redeclared);
    }

    #[test]
    fn redeclarations_record_what_they_refine() {
        let schema = Schema::new()
            .with_type(SchemaType::new("k", "A").property_with(Property::plain("x", "Int32")))
            .with_type(
                SchemaType::new("k", "B")
                    .extends("k.A")
                    .property_with(Property::plain("x", "Int32")),
            )
            .with_type(SchemaType::new("k", "C").extends("k.B"));

        let plans =
            run(&schema, "k.C", &IndexRegistry::root().extend(["x"])).expect("plannable");
        assert_eq!(plans[0].owner, "k.B");
        assert_eq!(plans[0].refines, vec!["k.A"]);
    }

    #[test]
    fn kinds_must_agree() {
        let schema = Schema::new()
            .with_type(SchemaType::new("k", "A").property_with(Property::plain("x", "Int32")))
            .with_type(
                SchemaType::new("k", "B")
                    .extends("k.A")
                    .property_with(Property::new("x", PropertyKind::List, "Int32").accessors()),
            );

        assert!(matches!(
            run(&schema, "k.B", &IndexRegistry::root().extend(["x"])),
            Err(PlanError::ConflictingKind { .. })
        ));
    }

    #[test]
    fn first_default_in_declaration_order_wins() {
        let schema = Schema::new()
            .with_type(
                SchemaType::new("k", "A")
                    .property_with(
                        Property::plain("port", "Int32").default_value(Literal::Int(80)),
                    ),
            )
            .with_type(
                SchemaType::new("k", "B")
                    .extends("k.A")
                    .property_with(
                        Property::plain("port", "Int32").default_value(Literal::Int(8080)),
                    ),
            );

        let plans =
            run(&schema, "k.B", &IndexRegistry::root().extend(["port"])).expect("plannable");
        assert_eq!(plans[0].default, Some(Literal::Int(8080)));
    }

    #[test]
    fn keyed_lists_resolve_the_key_type() {
        let schema = Schema::new()
            .with_type(SchemaType::new("k", "Entry").property_with(Property::plain("name", "Text")))
            .with_type(
                SchemaType::new("k", "Book").property_with(
                    Property::new("entries", PropertyKind::List, "k.Entry")
                        .accessors()
                        .keyed("name", "entry"),
                ),
            );

        let plans = run(&schema, "k.Book", &IndexRegistry::root()).expect("plannable");
        let key = plans[0].key.as_ref().expect("keyed");
        assert_eq!(key.shape, ValueShape::Primitive(Primitive::Text));
    }

    #[test]
    fn maps_without_a_key_are_rejected() {
        let schema = Schema::new()
            .with_type(SchemaType::new("k", "Entry").property_with(Property::plain("name", "Text")))
            .with_type(
                SchemaType::new("k", "Book")
                    .property_with(
                        Property::new("entries", PropertyKind::Map, "k.Entry").accessors(),
                    ),
            );

        assert!(matches!(
            run(&schema, "k.Book", &IndexRegistry::root()),
            Err(PlanError::InvalidKey { .. })
        ));
    }

    #[test]
    fn unions_are_unsupported() {
        let schema = Schema::new().with_type(
            SchemaType::new("k", "A").property_with(Property::plain("x", "Int32 | Text")),
        );

        assert!(matches!(
            run(&schema, "k.A", &IndexRegistry::root()),
            Err(PlanError::UnsupportedTypeShape { .. })
        ));
    }
}
