use crate::{
    MAX_PROPERTY_NAME_LEN,
    error::ErrorTree,
    err,
    expr::TypeExpr,
    node::ValidateNode,
    types::{Literal, PropertyKind},
    validate::naming,
};
use serde::{Deserialize, Serialize};

///
/// KeyAccess
///
/// Keyed lookup into a sequence or map: `property` names the key property on
/// the element type, `getter` the generated lookup accessor.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct KeyAccess {
    pub property: String,
    pub getter: String,
}

///
/// Property
///

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Property {
    pub name: String,

    #[serde(default)]
    pub kind: PropertyKind,

    /// Value type for scalar kinds, element type for collection kinds.
    pub ty: TypeExpr,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub nullable: bool,

    /// Exposes positional get/set on sequence kinds.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub indexed: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<KeyAccess>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub getter: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub setter: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Literal>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
}

impl Property {
    /// A property with no accessors; it only contributes a declaration.
    #[must_use]
    pub fn new(name: &str, kind: PropertyKind, ty: &str) -> Self {
        Self {
            name: name.to_string(),
            kind,
            ty: ty.parse().unwrap_or_else(|_| TypeExpr::named(ty)),
            nullable: false,
            indexed: false,
            key: None,
            getter: None,
            setter: None,
            default: None,
            doc: None,
        }
    }

    /// A plain property with the conventional `name` / `set_name` accessors.
    #[must_use]
    pub fn plain(name: &str, ty: &str) -> Self {
        Self::new(name, PropertyKind::Plain, ty).accessors()
    }

    /// Attach the conventional accessor names.
    #[must_use]
    pub fn accessors(mut self) -> Self {
        self.getter = Some(self.name.clone());
        self.setter = Some(format!("set_{}", self.name));
        self
    }

    #[must_use]
    pub fn getter(mut self, ident: &str) -> Self {
        self.getter = Some(ident.to_string());
        self
    }

    #[must_use]
    pub fn setter(mut self, ident: &str) -> Self {
        self.setter = Some(ident.to_string());
        self
    }

    #[must_use]
    pub fn default_value(mut self, literal: Literal) -> Self {
        self.default = Some(literal);
        self
    }

    #[must_use]
    pub const fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    #[must_use]
    pub const fn indexed(mut self) -> Self {
        self.indexed = true;
        self
    }

    #[must_use]
    pub fn keyed(mut self, property: &str, getter: &str) -> Self {
        self.key = Some(KeyAccess {
            property: property.to_string(),
            getter: getter.to_string(),
        });
        self
    }

    #[must_use]
    pub fn doc(mut self, text: &str) -> Self {
        self.doc = Some(text.to_string());
        self
    }

    #[must_use]
    pub const fn has_accessor(&self) -> bool {
        self.getter.is_some() || self.setter.is_some()
    }
}

impl ValidateNode for Property {
    fn validate(&self) -> Result<(), ErrorTree> {
        let mut errs = ErrorTree::new();

        if let Err(msg) = naming::check_member_ident(&self.name, MAX_PROPERTY_NAME_LEN) {
            err!(errs, "{msg}");
        }
        for ident in [&self.getter, &self.setter].into_iter().flatten() {
            if let Err(msg) = naming::check_member_ident(ident, MAX_PROPERTY_NAME_LEN) {
                err!(errs, "accessor: {msg}");
            }
        }

        // key access
        if let Some(key) = &self.key {
            if !self.kind.supports_key() {
                err!(errs, "{} properties cannot be keyed", self.kind);
            }
            if let Err(msg) = naming::check_member_ident(&key.getter, MAX_PROPERTY_NAME_LEN) {
                err!(errs, "key getter: {msg}");
            }
        }
        if self.indexed && !matches!(self.kind, PropertyKind::Array | PropertyKind::List) {
            err!(errs, "{} properties cannot be indexed", self.kind);
        }

        // default literal
        if let Some(default) = &self.default {
            match (self.kind, self.ty.primitive()) {
                (PropertyKind::Plain, Some(p)) if !p.accepts(default) => {
                    err!(errs, "default {default:?} is not a valid {p}");
                }
                (PropertyKind::Array | PropertyKind::List, _)
                    if !matches!(default, Literal::List(_)) =>
                {
                    err!(errs, "default of a {} property must be a list", self.kind);
                }
                (PropertyKind::Item | PropertyKind::Reference | PropertyKind::Map, _) => {
                    err!(errs, "{} properties cannot declare a default", self.kind);
                }
                _ => {}
            }
        }

        errs.result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_properties_get_conventional_accessors() {
        let prop = Property::plain("timeout", "Int32");

        assert_eq!(prop.getter.as_deref(), Some("timeout"));
        assert_eq!(prop.setter.as_deref(), Some("set_timeout"));
        assert!(prop.has_accessor());
        assert!(!Property::new("x", PropertyKind::Plain, "Int32").has_accessor());
    }

    #[test]
    fn incompatible_default_is_reported() {
        let prop = Property::plain("timeout", "Int32").default_value(Literal::Text("soon".into()));

        assert!(prop.validate().is_err());
    }

    #[test]
    fn keys_are_limited_to_collections() {
        let prop = Property::plain("name", "Text").keyed("id", "name_by_id");
        let errs = prop.validate().expect_err("plain keyed property must fail");

        assert!(errs.to_string().contains("cannot be keyed"), "{errs}");
    }

    #[test]
    fn deserializes_with_defaults() {
        let prop: Property =
            serde_json::from_str(r#"{ "name": "tags", "kind": "list", "ty": "Text" }"#)
                .expect("property json");

        assert_eq!(prop.kind, PropertyKind::List);
        assert!(!prop.nullable && !prop.indexed);
        assert!(prop.getter.is_none());
    }
}
