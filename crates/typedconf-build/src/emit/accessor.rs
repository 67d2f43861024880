//! Accessor synthesis: backing fields and typed accessors per property.

use crate::{
    classify::{Classification, PropertyPlan, ValueShape},
    emit::ty::TypeRenderer,
    error::PlanError,
};
use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use typedconf_schema::types::PropertyKind;

/// `name: Storage` for every property stored at this level.
pub fn fields(renderer: &TypeRenderer, props: &[&PropertyPlan]) -> Result<TokenStream, PlanError> {
    let mut tokens = quote!();
    for prop in props {
        let field = format_ident!("{}", prop.name);
        let storage = renderer.storage(prop)?;
        let doc = prop.doc.as_deref().map(|d| quote!(#[doc = #d]));

        tokens.extend(quote! {
            #doc
            #field: #storage,
        });
    }

    Ok(tokens)
}

/// Public accessors generated at this level.
pub fn accessors(renderer: &TypeRenderer, prop: &PropertyPlan) -> Result<TokenStream, PlanError> {
    let mut tokens = match prop.classification {
        Classification::Declared => declared_getter(renderer, prop)?,
        Classification::Redeclared => redeclared_getter(renderer, prop)?,
        Classification::Inherited => return Ok(quote!()),
    };

    tokens.extend(setter(renderer, prop)?);
    if prop.indexed {
        tokens.extend(indexed(renderer, prop)?);
    }
    if prop.key.is_some() {
        tokens.extend(keyed(renderer, prop)?);
    }

    Ok(tokens)
}

// Declared getters read the field directly.
fn declared_getter(renderer: &TypeRenderer, prop: &PropertyPlan) -> Result<TokenStream, PlanError> {
    let field = format_ident!("{}", prop.name);
    let getter = format_ident!("{}", prop.getter);
    let getter_mut = format_ident!("{}_mut", prop.getter);

    let tokens = match prop.kind {
        PropertyKind::List | PropertyKind::Map => {
            let storage = renderer.storage(prop)?;
            quote! {
                #[must_use]
                pub const fn #getter(&self) -> &#storage {
                    &self.#field
                }

                /// Live container; edits are tracked by the container itself.
                pub fn #getter_mut(&mut self) -> Result<&mut #storage, AccessError> {
                    <Self as ConfigItem>::check_set(self)?;
                    Ok(&mut self.#field)
                }
            }
        }
        PropertyKind::Array => {
            let element = renderer.element(&prop.shape)?;
            quote! {
                #[must_use]
                pub fn #getter(&self) -> &[#element] {
                    self.#field.get().as_slice()
                }
            }
        }
        _ => {
            let scalar = renderer.scalar(prop)?;
            if is_copy(prop) {
                quote! {
                    #[must_use]
                    pub const fn #getter(&self) -> #scalar {
                        *self.#field.get()
                    }
                }
            } else {
                quote! {
                    #[must_use]
                    pub const fn #getter(&self) -> &#scalar {
                        self.#field.get()
                    }
                }
            }
        }
    };

    Ok(tokens)
}

// Redeclared storage lives up the primary chain; read through the slot.
fn redeclared_getter(
    renderer: &TypeRenderer,
    prop: &PropertyPlan,
) -> Result<TokenStream, PlanError> {
    let getter = format_ident!("{}", prop.getter);
    let ty = renderer.value(prop)?;
    let slot = prop.slot;
    let name = &prop.name;

    Ok(quote! {
        pub fn #getter(&self) -> Result<#ty, AccessError> {
            let value = <Self as ConfigItem>::value(self, #slot)?;
            <#ty as ValueType>::from_value(value).map_err(|e| e.at(Self::TYPE_PATH, #name))
        }
    })
}

fn setter(renderer: &TypeRenderer, prop: &PropertyPlan) -> Result<TokenStream, PlanError> {
    let Some(setter) = &prop.setter else {
        return Ok(quote!());
    };
    let setter = format_ident!("{}", setter);
    let ty = renderer.value(prop)?;
    let slot = prop.slot;

    Ok(quote! {
        pub fn #setter(&mut self, value: #ty) -> Result<(), AccessError> {
            <Self as ConfigItem>::update(self, #slot, value.to_value(), true)
        }
    })
}

fn indexed(renderer: &TypeRenderer, prop: &PropertyPlan) -> Result<TokenStream, PlanError> {
    let element = renderer.element(&prop.shape)?;
    let getter = format_ident!("{}_at", prop.getter);
    let name = &prop.name;

    let mut tokens = quote! {
        pub fn #getter(&self, index: usize) -> Result<#element, AccessError> {
            let value = <Self as ConfigItem>::get_indexed(self, #name, index)?;
            <#element as ValueType>::from_value(value).map_err(|e| e.at(Self::TYPE_PATH, #name))
        }
    };

    if let Some(setter) = &prop.setter {
        let setter = format_ident!("{}_at", setter);
        tokens.extend(quote! {
            pub fn #setter(&mut self, index: usize, value: #element) -> Result<(), AccessError> {
                <Self as ConfigItem>::set_indexed(self, #name, index, value.to_value())
            }
        });
    }

    Ok(tokens)
}

fn keyed(renderer: &TypeRenderer, prop: &PropertyPlan) -> Result<TokenStream, PlanError> {
    let Some(key) = &prop.key else {
        return Ok(quote!());
    };
    let getter = format_ident!("{}", key.getter);
    let key_ty = renderer.key(prop)?;
    let element = renderer.element(&prop.shape)?;
    let name = &prop.name;

    Ok(quote! {
        /// Element whose key equals `key`, or the empty value when absent.
        pub fn #getter(&self, key: &#key_ty) -> Result<#element, AccessError> {
            let value = <Self as ConfigItem>::get_keyed(self, #name, &key.to_value())?;
            <#element as ValueType>::from_value(value).map_err(|e| e.at(Self::TYPE_PATH, #name))
        }
    })
}

fn is_copy(prop: &PropertyPlan) -> bool {
    matches!(&prop.shape, ValueShape::Primitive(p) if p.supports_copy())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::KeyPlan;
    use typedconf_schema::{expr::TypeExpr, node::Schema, types::Primitive};

    fn prop(kind: PropertyKind, classification: Classification) -> PropertyPlan {
        PropertyPlan {
            name: "port".into(),
            slot: 3,
            classification,
            owner: "demo.Server".into(),
            refines: Vec::new(),
            kind,
            ty: TypeExpr::named("Nat16"),
            shape: ValueShape::Primitive(Primitive::Nat16),
            nullable: false,
            indexed: false,
            key: None,
            getter: "port".into(),
            setter: Some("set_port".into()),
            default: None,
            doc: None,
        }
    }

    fn emit(prop: &PropertyPlan) -> String {
        let schema = Schema::new();
        accessors(&TypeRenderer::new(&schema, "demo.Server"), prop)
            .expect("renders")
            .to_string()
    }

    #[test]
    fn copy_getters_return_by_value() {
        let out = emit(&prop(PropertyKind::Plain, Classification::Declared));

        assert!(out.contains(&quote!(pub const fn port(&self) -> u16).to_string()));
        let update = quote!(<Self as ConfigItem>::update(self, 3usize, value.to_value(), true));
        assert!(out.contains(&update.to_string()));
    }

    #[test]
    fn redeclared_getters_go_through_the_slot() {
        let out = emit(&prop(PropertyKind::Plain, Classification::Redeclared));

        assert!(out.contains(&quote!(<Self as ConfigItem>::value(self, 3usize)).to_string()));
        assert!(out.contains("set_port"));
    }

    #[test]
    fn inherited_properties_get_nothing() {
        assert!(emit(&prop(PropertyKind::Plain, Classification::Inherited)).is_empty());
    }

    #[test]
    fn lists_expose_the_live_container() {
        let mut list = prop(PropertyKind::List, Classification::Declared);
        list.indexed = true;
        list.key = Some(KeyPlan {
            property: "id".into(),
            getter: "port_by_id".into(),
            shape: ValueShape::Primitive(Primitive::Int32),
        });
        let out = emit(&list);

        assert!(out.contains("port_mut"));
        assert!(out.contains("port_at"));
        assert!(out.contains("set_port_at"));
        assert!(out.contains(&quote!(pub fn port_by_id(&self, key: &i32)).to_string()));
    }
}
