//! Type rendering for generated source.

use crate::{
    classify::{PropertyPlan, ValueShape},
    error::PlanError,
};
use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use typedconf_core::value::Value;
use typedconf_schema::{expr::TypeExpr, node::Schema, types::PropertyKind};

///
/// TypeRenderer
///
/// Maps schema type expressions onto Rust types. Schema types are held as
/// `ItemRef`; other dotted paths are emitted as Rust paths; parameters that
/// are not in scope erase to `Value`.
///

pub struct TypeRenderer<'a> {
    schema: &'a Schema,
    type_path: &'a str,
}

impl<'a> TypeRenderer<'a> {
    #[must_use]
    pub const fn new(schema: &'a Schema, type_path: &'a str) -> Self {
        Self { schema, type_path }
    }

    /// Render `expr`; `generics` are the type parameters in scope.
    pub fn render(&self, expr: &TypeExpr, generics: &[String]) -> Result<TokenStream, PlanError> {
        match expr {
            TypeExpr::Named(name) => {
                if let Some(primitive) = expr.primitive() {
                    Ok(primitive.as_type())
                } else if self.is_item(name) {
                    Ok(quote!(ItemRef))
                } else {
                    self.path(name)
                }
            }
            TypeExpr::Parametrized { base, args } => {
                if self.is_item(base) {
                    return Ok(quote!(ItemRef));
                }
                let base = self.path(base)?;
                let args = args
                    .iter()
                    .map(|arg| self.render(arg, generics))
                    .collect::<Result<Vec<_>, _>>()?;

                Ok(quote!(#base<#(#args),*>))
            }
            TypeExpr::Param(name) if generics.contains(name) => {
                let ident = format_ident!("{}", name);
                Ok(quote!(#ident))
            }
            TypeExpr::Param(_) => Ok(quote!(Value)),
            TypeExpr::Wildcard { upper, .. } => upper
                .first()
                .map_or_else(|| Ok(quote!(Value)), |bound| self.render(bound, generics)),
            TypeExpr::Array(element) => {
                let element = self.render(element, generics)?;
                Ok(quote!(Vec<#element>))
            }
            TypeExpr::Union(_) => Err(self.unsupported(expr.to_string())),
        }
    }

    /// Rust type of one value (or element) of the given shape.
    pub fn element(&self, shape: &ValueShape) -> Result<TokenStream, PlanError> {
        match shape {
            ValueShape::Primitive(p) => Ok(p.as_type()),
            ValueShape::Item(_) => Ok(quote!(Option<ItemRef>)),
            ValueShape::Opaque(expr) => {
                let ty = self.render(expr, &[])?;
                Ok(quote!(Option<#ty>))
            }
            ValueShape::Dynamic => Ok(quote!(Value)),
        }
    }

    /// Type held by a single-value slot.
    pub fn scalar(&self, prop: &PropertyPlan) -> Result<TokenStream, PlanError> {
        let optional = prop.nullable
            || matches!(
                prop.kind,
                PropertyKind::Item | PropertyKind::Reference | PropertyKind::Derived
            );

        match &prop.shape {
            ValueShape::Primitive(p) if optional => {
                let ty = p.as_type();
                Ok(quote!(Option<#ty>))
            }
            shape => self.element(shape),
        }
    }

    /// Type of the value the property's public accessors exchange.
    pub fn value(&self, prop: &PropertyPlan) -> Result<TokenStream, PlanError> {
        match prop.kind {
            PropertyKind::Array | PropertyKind::List => {
                let element = self.element(&prop.shape)?;
                Ok(quote!(Vec<#element>))
            }
            PropertyKind::Map => {
                let (key, value) = self.map_types(prop)?;
                Ok(quote!(ItemMap<#key, #value>))
            }
            _ => self.scalar(prop),
        }
    }

    /// Type of the field backing a declared property.
    pub fn storage(&self, prop: &PropertyPlan) -> Result<TokenStream, PlanError> {
        match prop.kind {
            PropertyKind::Array => {
                let element = self.element(&prop.shape)?;
                Ok(quote!(Slot<Vec<#element>>))
            }
            PropertyKind::List => {
                let element = self.element(&prop.shape)?;
                Ok(quote!(ItemList<#element>))
            }
            PropertyKind::Map => {
                let (key, value) = self.map_types(prop)?;
                Ok(quote!(ItemMap<#key, #value>))
            }
            _ => {
                let scalar = self.scalar(prop)?;
                Ok(quote!(Slot<#scalar>))
            }
        }
    }

    /// Key type for keyed lookups; `Value` when the property is not keyed.
    pub fn key(&self, prop: &PropertyPlan) -> Result<TokenStream, PlanError> {
        prop.key
            .as_ref()
            .map_or_else(|| Ok(quote!(Value)), |key| self.element(&key.shape))
    }

    fn map_types(&self, prop: &PropertyPlan) -> Result<(TokenStream, TokenStream), PlanError> {
        Ok((self.key(prop)?, self.element(&prop.shape)?))
    }

    fn is_item(&self, path: &str) -> bool {
        self.schema.contains(path) || Schema::is_root(path)
    }

    fn path(&self, dotted: &str) -> Result<TokenStream, PlanError> {
        let path: syn::Path = syn::parse_str(&dotted.replace('.', "::"))
            .map_err(|_| self.unsupported(dotted.to_string()))?;

        Ok(quote!(#path))
    }

    fn unsupported(&self, shape: String) -> PlanError {
        PlanError::UnsupportedTypeShape {
            type_path: self.type_path.to_string(),
            shape,
        }
    }
}

/// Tokens rebuilding a runtime value.
#[must_use]
pub fn value_tokens(value: &Value) -> TokenStream {
    match value {
        Value::Bool(b) => quote!(Value::Bool(#b)),
        Value::Int(i) => quote!(Value::Int(#i)),
        Value::Float(f) if f.is_nan() => quote!(Value::Float(f64::NAN)),
        Value::Float(f) if f.is_infinite() && *f > 0.0 => quote!(Value::Float(f64::INFINITY)),
        Value::Float(f) if f.is_infinite() => quote!(Value::Float(f64::NEG_INFINITY)),
        Value::Float(f) => quote!(Value::Float(#f)),
        Value::Char(c) => quote!(Value::Char(#c)),
        Value::Text(s) => quote!(Value::Text(#s.to_string())),
        Value::List(items) => {
            let items = items.iter().map(value_tokens);
            quote!(Value::List(vec![#(#items),*]))
        }
        Value::Null | Value::Item(_) | Value::Map(_) => quote!(Value::Null),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use typedconf_schema::node::SchemaType;

    fn render(expr: &str, generics: &[String]) -> Result<String, PlanError> {
        let schema = Schema::new().with_type(SchemaType::new("demo", "Server"));
        let expr: TypeExpr = expr.parse().expect("valid expression");

        TypeRenderer::new(&schema, "demo.Server")
            .render(&expr, generics)
            .map(|t| t.to_string())
    }

    #[test]
    fn schema_types_become_item_refs() {
        assert_eq!(render("demo.Server", &[]).expect("renders"), "ItemRef");
        assert_eq!(render("ConfigItem", &[]).expect("renders"), "ItemRef");
    }

    #[test]
    fn foreign_paths_keep_their_arguments() {
        assert_eq!(
            render("std.collections.BTreeSet<Int32>", &[]).expect("renders"),
            quote!(std::collections::BTreeSet<i32>).to_string()
        );
    }

    #[test]
    fn arrays_and_wildcards() {
        assert_eq!(
            render("Text[]", &[]).expect("renders"),
            quote!(Vec<::std::string::String>).to_string()
        );
        assert_eq!(render("?", &[]).expect("renders"), "Value");
        assert_eq!(
            render("? extends demo.Server", &[]).expect("renders"),
            "ItemRef"
        );
    }

    #[test]
    fn unions_are_rejected() {
        assert!(matches!(
            render("Int32 | Text", &[]),
            Err(PlanError::UnsupportedTypeShape { .. })
        ));
    }

    #[test]
    fn non_finite_floats_render_as_constants() {
        assert_eq!(
            value_tokens(&Value::Float(f64::NAN)).to_string(),
            quote!(Value::Float(f64::NAN)).to_string()
        );
    }
}
