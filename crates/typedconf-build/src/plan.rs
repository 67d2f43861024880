//! Implementation plans.
//!
//! A plan is everything the synthesizers need to know about one concrete
//! type: its primary ancestor, obligation set, slot-ordered properties,
//! dispatch layout and visit stubs.

use crate::{
    analyze::{Hierarchy, analyze},
    classify::{Classification, PropertyPlan, classify},
    error::PlanError,
    registry::IndexRegistry,
    select::{obligations, select_primary},
};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;
use typedconf_core::model::Route;
use typedconf_schema::{expr::TypeExpr, node::Schema};

/// Inherited slot count up to which a full table is always emitted.
pub const FULL_SWITCH_MIN_INHERITED: usize = 5;

///
/// PlanOptions
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PlanOptions {
    pub full_switch_min_inherited: usize,
}

impl Default for PlanOptions {
    fn default() -> Self {
        Self {
            full_switch_min_inherited: FULL_SWITCH_MIN_INHERITED,
        }
    }
}

///
/// Switch
///

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub enum Switch {
    /// One entry per visible slot, inherited ones delegating explicitly.
    Full,

    /// Only the slots this level declares; everything else is delegated.
    Small,
}

///
/// DispatchLayout
///
/// Dense local range `start..start + routes.len()`.
///

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct DispatchLayout {
    pub switch: Switch,
    pub start: usize,
    pub routes: Vec<Route>,
}

impl DispatchLayout {
    #[must_use]
    pub fn layout(properties: &[PropertyPlan], inherited: usize, options: PlanOptions) -> Self {
        let declared = properties
            .iter()
            .filter(|p| p.classification == Classification::Declared)
            .count();

        if declared >= inherited / 2 || inherited <= options.full_switch_min_inherited {
            Self {
                switch: Switch::Full,
                start: 0,
                routes: properties.iter().map(PropertyPlan::route).collect(),
            }
        } else {
            Self {
                switch: Switch::Small,
                start: inherited,
                routes: properties
                    .iter()
                    .filter(|p| p.slot >= inherited)
                    .map(PropertyPlan::route)
                    .collect(),
            }
        }
    }

    #[must_use]
    pub fn end(&self) -> usize {
        self.start + self.routes.len()
    }

    #[must_use]
    pub fn route(&self, slot: usize) -> Option<Route> {
        slot.checked_sub(self.start)
            .and_then(|offset| self.routes.get(offset))
            .copied()
    }
}

///
/// VisitPlan
///
/// One deduplicated visit stub.
///

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct VisitPlan {
    pub name: String,

    /// Method name on the generated type; unique within the type.
    pub method: String,

    /// Type declaring the signature.
    pub owner: String,

    pub type_params: Vec<String>,
    pub visitor: TypeExpr,
    pub arg: TypeExpr,
    pub result: TypeExpr,

    /// Visitor method to forward to; `None` means unimplemented.
    pub handler: Option<String>,
}

///
/// ImplementationPlan
///

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ImplementationPlan {
    pub path: String,
    pub package: String,
    pub ident: String,

    /// `None` means the universal root.
    pub primary: Option<String>,

    pub ancestors: Vec<String>,
    pub obligations: Vec<String>,

    /// Every visible property, ordered by slot.
    pub properties: Vec<PropertyPlan>,

    pub registry: IndexRegistry,
    pub dispatch: DispatchLayout,
    pub visits: Vec<VisitPlan>,
    pub is_abstract: bool,
    pub value_equality: bool,
}

impl ImplementationPlan {
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&PropertyPlan> {
        self.properties.iter().find(|p| p.name == name)
    }

    #[must_use]
    pub fn slot_of(&self, name: &str) -> Option<usize> {
        self.registry.slot_of(name)
    }

    /// Number of slots served by the primary chain.
    #[must_use]
    pub fn inherited_len(&self) -> usize {
        self.properties
            .iter()
            .filter(|p| p.classification != Classification::Declared)
            .count()
    }

    pub fn declared(&self) -> impl Iterator<Item = &PropertyPlan> {
        self.properties
            .iter()
            .filter(|p| p.classification == Classification::Declared)
    }

    /// Properties with accessors generated at this level.
    pub fn local(&self) -> impl Iterator<Item = &PropertyPlan> {
        self.properties.iter().filter(|p| p.is_local())
    }
}

///
/// Planner
///
/// Builds plans straight from a schema. Callers that plan many types go
/// through [`crate::cache::PlanCache`], which shares primary plans.
///

#[derive(Clone, Copy, Debug)]
pub struct Planner<'a> {
    schema: &'a Schema,
    options: PlanOptions,
}

impl<'a> Planner<'a> {
    #[must_use]
    pub const fn new(schema: &'a Schema, options: PlanOptions) -> Self {
        Self { schema, options }
    }

    /// Plan `path`, planning its primary chain first.
    pub fn plan(&self, path: &str) -> Result<ImplementationPlan, PlanError> {
        self.check(path)?;

        let primary = match select_primary(self.schema, path) {
            Some(primary) => Some(self.plan(&primary).map_err(|e| PlanError::AncestorFailed {
                type_path: path.to_string(),
                ancestor: primary.clone(),
                source: Box::new(e),
            })?),
            None => None,
        };

        self.plan_with(path, primary.as_ref())
    }

    /// Plan `path` given the already built plan of its primary ancestor.
    pub fn plan_with(
        &self,
        path: &str,
        primary: Option<&ImplementationPlan>,
    ) -> Result<ImplementationPlan, PlanError> {
        let ty = self.check(path)?;

        // Phase 1: graph analysis and primary selection.
        let hierarchy = analyze(self.schema, path)?;
        let primary_path = select_primary(self.schema, path);
        let obligations = obligations(self.schema, &hierarchy, primary_path.as_deref());
        let primary_registry = primary.map_or_else(IndexRegistry::root, |p| p.registry.clone());

        // Phase 2: classification and slots.
        let (properties, registry) =
            classify(self.schema, &hierarchy, &obligations, &primary_registry)?;
        let dispatch = DispatchLayout::layout(&properties, primary_registry.len(), self.options);

        // Phase 3: visit stubs.
        let visits = self.visits(&hierarchy, &obligations)?;

        debug!(
            type_path = path,
            primary = primary_path.as_deref().unwrap_or(typedconf_schema::ROOT_TYPE),
            properties = properties.len(),
            visits = visits.len(),
            "planned type"
        );

        Ok(ImplementationPlan {
            path: path.to_string(),
            package: ty.def.package.clone(),
            ident: ty.def.ident.clone(),
            primary: primary_path,
            ancestors: hierarchy.ancestors.clone(),
            obligations,
            properties,
            registry,
            dispatch,
            visits,
            is_abstract: ty.flags.is_abstract,
            value_equality: ty.flags.value_equality,
        })
    }

    fn check(&self, path: &str) -> Result<&'a typedconf_schema::node::SchemaType, PlanError> {
        let ty = self
            .schema
            .get(path)
            .ok_or_else(|| PlanError::UnknownType(path.to_string()))?;
        if !ty.requires_implementation() {
            return Err(PlanError::NoImplementation(path.to_string()));
        }

        Ok(ty)
    }

    fn visits(
        &self,
        hierarchy: &Hierarchy,
        obligations: &[String],
    ) -> Result<Vec<VisitPlan>, PlanError> {
        let path = hierarchy.path.as_str();
        let mut plans: Vec<VisitPlan> = Vec::new();
        let mut methods: BTreeMap<String, usize> = BTreeMap::new();

        for obligation in obligations {
            let walk = std::iter::once(obligation.clone()).chain(self.schema.ancestors(obligation));
            for owner in walk {
                let Some(ty) = self.schema.get(&owner) else {
                    continue;
                };
                for sig in &ty.visits {
                    let visitor = hierarchy.bindings.substitute(&owner, &sig.visitor);
                    let arg = hierarchy.bindings.substitute(&owner, &sig.arg);
                    let result = hierarchy.bindings.substitute(&owner, &sig.result);

                    if let Some(existing) = plans
                        .iter()
                        .find(|v| v.name == sig.name && v.visitor == visitor && v.arg == arg)
                    {
                        if existing.result != result {
                            return Err(PlanError::VisitConflict {
                                type_path: path.to_string(),
                                visit: sig.name.clone(),
                                first: existing.result.to_string(),
                                first_owner: existing.owner.clone(),
                                second: result.to_string(),
                                second_owner: owner.clone(),
                            });
                        }
                        continue;
                    }

                    let count = methods.entry(sig.name.clone()).or_insert(0);
                    *count += 1;
                    let method = if *count == 1 {
                        sig.name.clone()
                    } else {
                        format!("{}_{count}", sig.name)
                    };

                    plans.push(VisitPlan {
                        name: sig.name.clone(),
                        method,
                        owner: owner.clone(),
                        type_params: sig.type_params.clone(),
                        visitor,
                        arg,
                        result,
                        handler: self.handler(hierarchy, &sig.name),
                    });
                }
            }
        }

        Ok(plans)
    }

    // first case for the visit, depth first from the queried type
    fn handler(&self, hierarchy: &Hierarchy, visit: &str) -> Option<String> {
        hierarchy.members().find_map(|member| {
            self.schema
                .get(member)
                .and_then(|ty| ty.visit_case(visit))
                .map(|case| case.handler.clone())
        })
    }
}
