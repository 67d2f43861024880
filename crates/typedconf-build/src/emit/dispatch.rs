//! Index-addressed storage dispatch.
//!
//! Each level implements `load`, `store`, `clear` and `flag` as a dense match
//! over its local range: declared slots hit local fields, delegated entries
//! in the range hand off to the primary explicitly, and everything outside
//! the range falls through to the primary.

use crate::{
    emit::ty::TypeRenderer,
    error::PlanError,
    plan::ImplementationPlan,
};
use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use typedconf_core::model::Route;
use typedconf_schema::types::PropertyKind;

///
/// StorageArms
///

#[derive(Default)]
pub struct StorageArms {
    pub load: TokenStream,
    pub store: TokenStream,
    pub clear: TokenStream,
    pub flag: TokenStream,
}

/// Match arms for the local range of `plan`.
pub fn storage_arms(
    renderer: &TypeRenderer,
    plan: &ImplementationPlan,
) -> Result<StorageArms, PlanError> {
    let mut arms = StorageArms::default();
    let mut delegated = Vec::new();

    for (offset, route) in plan.dispatch.routes.iter().enumerate() {
        let slot = plan.dispatch.start + offset;
        if *route != Route::Declared {
            delegated.push(slot);
            continue;
        }
        let Some(prop) = plan.properties.iter().find(|p| p.slot == slot) else {
            continue;
        };

        let field = format_ident!("{}", prop.name);
        let name = &prop.name;
        let storage = renderer.storage(prop)?;
        let convert = quote!(.map_err(|e| e.at(Self::TYPE_PATH, #name))?);

        match prop.kind {
            PropertyKind::List => {
                let value = renderer.value(prop)?;
                arms.load.extend(quote!(#slot => Ok(self.#field.to_value()),));
                arms.store.extend(quote! {
                    #slot => {
                        let items = <#value as ValueType>::from_value(value) #convert;
                        let old = self.#field.to_value();
                        self.#field.replace(items, is_set);
                        Ok(old)
                    }
                });
                arms.clear.extend(quote! {
                    #slot => {
                        let items = <#value as ValueType>::from_value(initial) #convert;
                        self.#field.replace(items, false);
                        Ok(())
                    }
                });
                arms.flag.extend(quote!(#slot => Ok(self.#field.is_modified()),));
            }
            PropertyKind::Map => {
                arms.load.extend(quote!(#slot => Ok(self.#field.to_value()),));
                arms.store.extend(quote! {
                    #slot => {
                        let map = <#storage as ValueType>::from_value(value) #convert;
                        let old = self.#field.to_value();
                        self.#field.replace(map.into_entries(), is_set);
                        Ok(old)
                    }
                });
                arms.clear.extend(quote! {
                    #slot => {
                        let map = <#storage as ValueType>::from_value(initial) #convert;
                        self.#field.replace(map.into_entries(), false);
                        Ok(())
                    }
                });
                arms.flag.extend(quote!(#slot => Ok(self.#field.is_modified()),));
            }
            _ => {
                let value = renderer.value(prop)?;
                arms.load.extend(quote!(#slot => Ok(self.#field.get().to_value()),));
                arms.store.extend(quote! {
                    #slot => {
                        let value = <#value as ValueType>::from_value(value) #convert;
                        Ok(self.#field.update(value, is_set).to_value())
                    }
                });
                arms.clear.extend(quote! {
                    #slot => {
                        let value = <#value as ValueType>::from_value(initial) #convert;
                        self.#field.reset(value);
                        Ok(())
                    }
                });
                arms.flag.extend(quote!(#slot => Ok(self.#field.is_set()),));
            }
        }
    }

    // explicit hand-off for delegated entries inside the local range
    if !delegated.is_empty() {
        arms.load.extend(quote!(#(#delegated)|* => ConfigItem::load(&self.__base, index),));
        arms.store.extend(quote! {
            #(#delegated)|* => ConfigItem::store(&mut self.__base, index, value, is_set),
        });
        arms.clear.extend(quote! {
            #(#delegated)|* => ConfigItem::clear(&mut self.__base, index, initial),
        });
        arms.flag.extend(quote!(#(#delegated)|* => ConfigItem::flag(&self.__base, index),));
    }

    Ok(arms)
}

/// `impl ConfigItem` for the generated type.
pub fn config_item(
    plan: &ImplementationPlan,
    ident: &syn::Ident,
    arms: StorageArms,
) -> TokenStream {
    let StorageArms {
        load,
        store,
        clear,
        flag,
    } = arms;
    let value_equality = plan.value_equality;

    quote! {
        impl ConfigItem for #ident {
            fn type_path(&self) -> &str {
                Self::TYPE_PATH
            }

            fn properties(&self) -> &[PropertyModel] {
                &PROPERTIES
            }

            fn state(&self) -> &ItemState {
                ConfigItem::state(&self.__base)
            }

            fn state_mut(&mut self) -> &mut ItemState {
                ConfigItem::state_mut(&mut self.__base)
            }

            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }

            fn value_equality(&self) -> bool {
                #value_equality
            }

            fn load(&self, index: usize) -> Result<Value, AccessError> {
                match index {
                    #load
                    _ => ConfigItem::load(&self.__base, index),
                }
            }

            fn store(
                &mut self,
                index: usize,
                value: Value,
                is_set: bool,
            ) -> Result<Value, AccessError> {
                match index {
                    #store
                    _ => ConfigItem::store(&mut self.__base, index, value, is_set),
                }
            }

            fn clear(&mut self, index: usize, initial: Value) -> Result<(), AccessError> {
                match index {
                    #clear
                    _ => ConfigItem::clear(&mut self.__base, index, initial),
                }
            }

            fn flag(&self, index: usize) -> Result<bool, AccessError> {
                match index {
                    #flag
                    _ => ConfigItem::flag(&self.__base, index),
                }
            }
        }
    }
}
