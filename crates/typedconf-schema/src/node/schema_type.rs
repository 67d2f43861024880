use crate::{
    MAX_TYPE_NAME_LEN,
    error::ErrorTree,
    err,
    expr::TypeExpr,
    node::{Def, Property, ValidateNode, VisitCase, VisitSignature},
    validate::naming,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

///
/// TypeFlags
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct TypeFlags {
    #[serde(default, rename = "abstract")]
    pub is_abstract: bool,

    /// Never used as an implementation base; contributes declarations only.
    #[serde(default)]
    pub no_implementation: bool,

    /// Instances compare by property values instead of identity.
    #[serde(default)]
    pub value_equality: bool,
}

///
/// TypeParam
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct TypeParam {
    pub name: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bounds: Vec<TypeExpr>,
}

impl TypeParam {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bounds: Vec::new(),
        }
    }
}

///
/// SchemaType
///
/// A configuration type: identity, flags, ordered ancestor edges and the
/// properties and visit declarations it owns locally.
///

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct SchemaType {
    #[serde(flatten)]
    pub def: Def,

    #[serde(default)]
    pub flags: TypeFlags,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub type_params: Vec<TypeParam>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ancestors: Vec<TypeExpr>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<Property>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub visits: Vec<VisitSignature>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub visit_cases: Vec<VisitCase>,
}

impl SchemaType {
    #[must_use]
    pub fn new(package: impl Into<String>, ident: impl Into<String>) -> Self {
        Self {
            def: Def::new(package, ident),
            flags: TypeFlags::default(),
            type_params: Vec::new(),
            ancestors: Vec::new(),
            properties: Vec::new(),
            visits: Vec::new(),
            visit_cases: Vec::new(),
        }
    }

    #[must_use]
    pub fn path(&self) -> String {
        self.def.path()
    }

    #[must_use]
    pub const fn requires_implementation(&self) -> bool {
        !self.flags.no_implementation
    }

    #[must_use]
    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name == name)
    }

    #[must_use]
    pub fn visit(&self, name: &str) -> Option<&VisitSignature> {
        self.visits.iter().find(|v| v.name == name)
    }

    #[must_use]
    pub fn visit_case(&self, visit: &str) -> Option<&VisitCase> {
        self.visit_cases.iter().find(|c| c.visit == visit)
    }

    #[must_use]
    pub fn param_names(&self) -> Vec<&str> {
        self.type_params.iter().map(|p| p.name.as_str()).collect()
    }

    /// Turn bare references to this type's parameters into `TypeExpr::Param`.
    #[must_use]
    pub fn resolve_params(mut self) -> Self {
        let owned: Vec<String> = self.type_params.iter().map(|p| p.name.clone()).collect();
        let params: Vec<&str> = owned.iter().map(String::as_str).collect();
        let resolve = |expr: TypeExpr| expr.resolve_params(&params);

        self.ancestors = self.ancestors.into_iter().map(resolve).collect();
        for param in &mut self.type_params {
            param.bounds = std::mem::take(&mut param.bounds)
                .into_iter()
                .map(resolve)
                .collect();
        }
        for prop in &mut self.properties {
            prop.ty = resolve(prop.ty.clone());
        }
        for visit in &mut self.visits {
            let mut scoped = params.clone();
            scoped.extend(visit.type_params.iter().map(String::as_str));
            let resolve_scoped = |expr: TypeExpr| expr.resolve_params(&scoped);

            visit.visitor = resolve_scoped(visit.visitor.clone());
            visit.arg = resolve_scoped(visit.arg.clone());
            visit.result = resolve_scoped(visit.result.clone());
        }

        self
    }

    //
    // builders
    //

    #[must_use]
    pub fn extends(mut self, ancestor: &str) -> Self {
        match ancestor.parse() {
            Ok(expr) => self.ancestors.push(expr),
            Err(_) => self.ancestors.push(TypeExpr::named(ancestor)),
        }
        self
    }

    #[must_use]
    pub fn extends_expr(mut self, ancestor: TypeExpr) -> Self {
        self.ancestors.push(ancestor);
        self
    }

    #[must_use]
    pub fn param(mut self, name: &str) -> Self {
        self.type_params.push(TypeParam::new(name));
        self
    }

    #[must_use]
    pub fn property_with(mut self, property: Property) -> Self {
        self.properties.push(property);
        self
    }

    #[must_use]
    pub fn visit_with(mut self, visit: VisitSignature) -> Self {
        self.visits.push(visit);
        self
    }

    #[must_use]
    pub fn handles(mut self, visit: &str, handler: &str) -> Self {
        self.visit_cases.push(VisitCase::new(visit, handler));
        self
    }

    #[must_use]
    pub const fn abstract_type(mut self) -> Self {
        self.flags.is_abstract = true;
        self
    }

    #[must_use]
    pub const fn no_implementation(mut self) -> Self {
        self.flags.no_implementation = true;
        self
    }

    #[must_use]
    pub const fn value_equality(mut self) -> Self {
        self.flags.value_equality = true;
        self
    }

    #[must_use]
    pub fn comments(mut self, text: &str) -> Self {
        self.def.comments = Some(text.to_string());
        self
    }
}

impl ValidateNode for SchemaType {
    fn validate(&self) -> Result<(), ErrorTree> {
        let mut errs = ErrorTree::new();

        // identity
        if let Err(msg) = naming::check_type_ident(&self.def.ident, MAX_TYPE_NAME_LEN) {
            err!(errs, "{msg}");
        }
        if !self.def.package.is_empty() {
            for segment in self.def.package.split('.') {
                if let Err(msg) = naming::check_package_segment(segment) {
                    err!(errs, "{msg}");
                }
            }
        }

        // type params
        let mut params = BTreeSet::new();
        for param in &self.type_params {
            if !params.insert(param.name.as_str()) {
                err!(errs, "duplicate type parameter '{}'", param.name);
            }
            if let Err(msg) = naming::check_type_ident(&param.name, MAX_TYPE_NAME_LEN) {
                err!(errs, "type parameter: {msg}");
            }
        }

        // properties
        let mut names = BTreeSet::new();
        for prop in &self.properties {
            if !names.insert(prop.name.as_str()) {
                err!(errs, "duplicate property '{}'", prop.name);
            }
            errs.merge_at(prop.name.clone(), prop.validate().err().unwrap_or_default());
        }

        // visits
        let mut visits = BTreeSet::new();
        for visit in &self.visits {
            if !visits.insert(visit.name.as_str()) {
                err!(errs, "duplicate visit '{}'", visit.name);
            }
            errs.merge_at(visit.name.clone(), visit.validate().err().unwrap_or_default());
        }

        let mut cases = BTreeSet::new();
        for case in &self.visit_cases {
            if !cases.insert(case.visit.as_str()) {
                err!(errs, "more than one handler for visit '{}'", case.visit);
            }
            errs.add_result(case.validate());
        }

        errs.result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PropertyKind;

    #[test]
    fn resolve_params_reaches_ancestors_properties_and_visits() {
        let ty = SchemaType::new("demo", "Holder")
            .param("T")
            .extends("demo.Box<T>")
            .property_with(Property::new("value", PropertyKind::Item, "T"))
            .visit_with(VisitSignature::new("walk", "demo.Walker", "U", "T").type_param("U"))
            .resolve_params();

        assert_eq!(ty.ancestors[0].args(), &[TypeExpr::param("T")]);
        assert_eq!(ty.properties[0].ty, TypeExpr::param("T"));
        assert_eq!(ty.visits[0].arg, TypeExpr::param("U"));
        assert_eq!(ty.visits[0].result, TypeExpr::param("T"));
    }

    #[test]
    fn validation_reports_duplicates_under_the_type() {
        let ty = SchemaType::new("demo", "Widget")
            .property_with(Property::plain("size", "Int32"))
            .property_with(Property::plain("size", "Int64"));

        let errs = ty.validate().expect_err("duplicate property must fail");
        assert!(
            errs.to_string().contains("duplicate property 'size'"),
            "unexpected report: {errs}"
        );
    }

    #[test]
    fn lower_case_identifiers_are_rejected() {
        let ty = SchemaType::new("demo", "widget");

        assert!(ty.validate().is_err(), "type idents must be UpperCamelCase");
    }

    #[test]
    fn flags_use_schema_spelling() {
        let ty: SchemaType = serde_json::from_str(
            r#"{ "ident": "Base", "flags": { "abstract": true, "no_implementation": true } }"#,
        )
        .expect("schema type json");

        assert!(ty.flags.is_abstract);
        assert!(!ty.requires_implementation());
        assert!(!ty.flags.value_equality);
    }
}
