//! Visitor dispatch stubs.

use crate::{emit::ty::TypeRenderer, error::PlanError, plan::VisitPlan};
use proc_macro2::TokenStream;
use quote::{format_ident, quote};

/// One stub per deduplicated visit signature.
pub fn stubs(renderer: &TypeRenderer, visits: &[VisitPlan]) -> Result<TokenStream, PlanError> {
    let mut tokens = quote!();

    for visit in visits {
        let method = format_ident!("{}", visit.method);
        let name = &visit.name;
        let generics: Vec<_> = visit.type_params.iter().map(|p| format_ident!("{}", p)).collect();
        let generic_decl = (!generics.is_empty()).then(|| quote!(<#(#generics),*>));

        let visitor = renderer.render(&visit.visitor, &visit.type_params)?;
        let arg = renderer.render(&visit.arg, &visit.type_params)?;
        let result = renderer.render(&visit.result, &visit.type_params)?;

        let body = match &visit.handler {
            Some(handler) => {
                let handler = format_ident!("{}", handler);
                quote!(Ok(visitor.#handler(self, arg)))
            }
            None => quote! {
                let _ = (visitor, arg);
                Err(AccessError::unimplemented_visit(#name, Self::TYPE_PATH))
            },
        };

        tokens.extend(quote! {
            pub fn #method #generic_decl(
                &self,
                visitor: &mut (impl #visitor + ?Sized),
                arg: #arg,
            ) -> Result<#result, AccessError> {
                #body
            }
        });
    }

    Ok(tokens)
}
