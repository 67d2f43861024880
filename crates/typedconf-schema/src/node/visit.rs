use crate::{
    MAX_PROPERTY_NAME_LEN, error::ErrorTree, err, expr::TypeExpr, node::ValidateNode,
    validate::naming,
};
use serde::{Deserialize, Serialize};

///
/// VisitSignature
///
/// One polymorphic visit operation: the concrete item is passed to a visitor
/// together with one caller-supplied argument and yields a typed result.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct VisitSignature {
    pub name: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub type_params: Vec<String>,

    pub visitor: TypeExpr,
    pub arg: TypeExpr,
    pub result: TypeExpr,
}

impl VisitSignature {
    #[must_use]
    pub fn new(name: &str, visitor: &str, arg: &str, result: &str) -> Self {
        let parse = |s: &str| s.parse().unwrap_or_else(|_| TypeExpr::named(s));

        Self {
            name: name.to_string(),
            type_params: Vec::new(),
            visitor: parse(visitor),
            arg: parse(arg),
            result: parse(result),
        }
    }

    #[must_use]
    pub fn type_param(mut self, name: &str) -> Self {
        self.type_params.push(name.to_string());
        self
    }
}

impl ValidateNode for VisitSignature {
    fn validate(&self) -> Result<(), ErrorTree> {
        let mut errs = ErrorTree::new();

        if let Err(msg) = naming::check_member_ident(&self.name, MAX_PROPERTY_NAME_LEN) {
            err!(errs, "{msg}");
        }
        if self.visitor.base_path().is_none() {
            err!(errs, "visitor must be a named type, found '{}'", self.visitor);
        }

        errs.result()
    }
}

///
/// VisitCase
///
/// Binds a visit operation to the visitor method that handles this type
/// and, unless overridden further down, its descendants.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct VisitCase {
    pub visit: String,
    pub handler: String,
}

impl VisitCase {
    #[must_use]
    pub fn new(visit: &str, handler: &str) -> Self {
        Self {
            visit: visit.to_string(),
            handler: handler.to_string(),
        }
    }
}

impl ValidateNode for VisitCase {
    fn validate(&self) -> Result<(), ErrorTree> {
        let mut errs = ErrorTree::new();

        if let Err(msg) = naming::check_member_ident(&self.handler, MAX_PROPERTY_NAME_LEN) {
            err!(errs, "handler for '{}': {msg}", self.visit);
        }

        errs.result()
    }
}
