//! Source backend: one Rust module per concrete type.

mod accessor;
mod dispatch;
mod module;
mod ty;
mod visit;

pub use module::module_files;
pub use ty::{TypeRenderer, value_tokens};

use crate::{
    classify::PropertyPlan,
    error::PlanError,
    model::property_model,
    paths::CratePaths,
    plan::ImplementationPlan,
};
use convert_case::{Case, Casing};
use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use std::path::PathBuf;
use tracing::info;
use typedconf_schema::{
    fingerprint::{Fingerprint, fingerprint},
    node::Schema,
};

/// First line of every generated file.
pub const GENERATED_MARKER: &str = "// @generated by typedconf; do not edit";

///
/// EmitOptions
///

#[derive(Clone, Debug)]
pub struct EmitOptions {
    /// Prefix of generated struct names.
    pub artifact_prefix: String,

    /// Prefix of generated file names.
    pub file_prefix: String,

    /// Rust path the output directory is mounted at.
    pub module_root: String,

    pub paths: CratePaths,
}

impl EmitOptions {
    /// Everything besides the schema that shapes emitted source.
    #[must_use]
    pub fn stamp(&self) -> String {
        format!(
            "{}\n{}\n{}\n{}",
            self.artifact_prefix, self.file_prefix, self.module_root, self.paths.core
        )
    }
}

impl Default for EmitOptions {
    fn default() -> Self {
        Self {
            artifact_prefix: "Gen".to_string(),
            file_prefix: "gen_".to_string(),
            module_root: "crate::generated".to_string(),
            paths: CratePaths::default(),
        }
    }
}

///
/// Header
///
/// What a generated file says about itself in its leading comments.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Header {
    Type {
        type_path: String,
        fingerprint: Fingerprint,
    },
    Module {
        package: String,
    },
}

impl Header {
    #[must_use]
    pub fn render(&self) -> String {
        match self {
            Self::Type {
                type_path,
                fingerprint,
            } => format!(
                "{GENERATED_MARKER}\n// type: {type_path}\n// fingerprint: {fingerprint}\n"
            ),
            Self::Module { package } => format!("{GENERATED_MARKER}\n// module: {package}\n"),
        }
    }

    /// Read the header back; `None` for files typedconf did not write.
    #[must_use]
    pub fn parse(source: &str) -> Option<Self> {
        let mut lines = source.lines();
        if lines.next()? != GENERATED_MARKER {
            return None;
        }

        let line = lines.next()?;
        if let Some(package) = line.strip_prefix("// module: ") {
            return Some(Self::Module {
                package: package.to_string(),
            });
        }

        let type_path = line.strip_prefix("// type: ")?.to_string();
        let fingerprint = lines
            .next()?
            .strip_prefix("// fingerprint: ")
            .and_then(Fingerprint::parse)?;

        Some(Self::Type {
            type_path,
            fingerprint,
        })
    }
}

///
/// Artifact
///

#[derive(Clone, Debug)]
pub struct Artifact {
    /// Path relative to the output root.
    pub relative_path: PathBuf,
    pub header: Header,
    pub source: String,
}

///
/// Emitter
///

pub struct Emitter<'a> {
    schema: &'a Schema,
    options: &'a EmitOptions,
}

impl<'a> Emitter<'a> {
    #[must_use]
    pub const fn new(schema: &'a Schema, options: &'a EmitOptions) -> Self {
        Self { schema, options }
    }

    /// Where the artifact of `type_path` lives, relative to the output root.
    #[must_use]
    pub fn relative_path(&self, type_path: &str) -> PathBuf {
        let (package, ident) = type_path.rsplit_once('.').unwrap_or(("", type_path));

        let mut path: PathBuf = package.split('.').filter(|s| !s.is_empty()).collect();
        path.push(format!(
            "{}{}.rs",
            self.options.file_prefix,
            ident.to_case(Case::Snake)
        ));

        path
    }

    /// Generate the artifact for one planned type.
    pub fn emit(&self, plan: &ImplementationPlan) -> Result<Artifact, PlanError> {
        let fingerprint = fingerprint(self.schema, &plan.path)
            .map_err(|_| PlanError::UnknownType(plan.path.clone()))?
            .mix(self.options.stamp().as_bytes())
            .mix(format!("{:?}", plan.dispatch).as_bytes());
        let header = Header::Type {
            type_path: plan.path.clone(),
            fingerprint,
        };
        let tokens = self.tokens(plan)?;

        info!(type_path = %plan.path, %fingerprint, "generated artifact");

        Ok(Artifact {
            relative_path: self.relative_path(&plan.path),
            source: format!("{}\n{tokens}\n", header.render()),
            header,
        })
    }

    /// The module body for one planned type.
    pub fn tokens(&self, plan: &ImplementationPlan) -> Result<TokenStream, PlanError> {
        let renderer = TypeRenderer::new(self.schema, &plan.path);
        let core = &self.options.paths.core;
        let ident = self.struct_ident(&plan.ident);
        let type_path = &plan.path;

        // -------------------------
        // Descriptors
        // -------------------------

        let descriptors = plan.properties.iter().map(descriptor);

        // -------------------------
        // Struct
        // -------------------------

        let base = match &plan.primary {
            Some(primary) => self.struct_path(primary)?,
            None => quote!(#core::item::RootItem),
        };
        let declared: Vec<&PropertyPlan> = plan.declared().collect();
        let fields = accessor::fields(&renderer, &declared)?;
        let doc = self
            .schema
            .get(&plan.path)
            .and_then(|ty| ty.def.comments.as_deref())
            .map(|c| quote!(#[doc = #c]));

        // -------------------------
        // Inherent impl
        // -------------------------

        let mut accessors = quote!();
        for prop in plan.local() {
            accessors.extend(accessor::accessors(&renderer, prop)?);
        }
        let visits = visit::stubs(&renderer, &plan.visits)?;
        let constructor = (!plan.is_abstract).then(|| {
            quote! {
                /// A fresh instance with every property in its initial state.
                pub fn new() -> Result<Self, AccessError> {
                    let mut item = Self::default();
                    <Self as ConfigItem>::init(&mut item)?;
                    Ok(item)
                }
            }
        });

        // -------------------------
        // ConfigItem
        // -------------------------

        let arms = dispatch::storage_arms(&renderer, plan)?;
        let config_item = dispatch::config_item(plan, &ident, arms);
        let partial_eq = plan.value_equality.then(|| {
            quote! {
                impl PartialEq for #ident {
                    fn eq(&self, other: &Self) -> bool {
                        structural_eq(self, other)
                    }
                }
            }
        });

        Ok(quote! {
            #![allow(clippy::all, clippy::pedantic, clippy::nursery, unused_imports)]

            use #core::prelude::*;

            static PROPERTIES: ::std::sync::LazyLock<Vec<PropertyModel>> =
                ::std::sync::LazyLock::new(|| vec![#(#descriptors),*]);

            #doc
            #[derive(Clone, Debug, Default)]
            pub struct #ident {
                __base: #base,
                #fields
            }

            impl #ident {
                pub const TYPE_PATH: &'static str = #type_path;

                #constructor

                /// Copy of every value and is-set flag, without listeners and
                /// not frozen.
                #[must_use]
                pub fn copy_of(&self) -> Self {
                    let mut copy = self.clone();
                    *<Self as ConfigItem>::state_mut(&mut copy) = ItemState::default();
                    copy
                }

                #accessors
                #visits
            }

            impl ::std::ops::Deref for #ident {
                type Target = #base;

                fn deref(&self) -> &Self::Target {
                    &self.__base
                }
            }

            impl ::std::ops::DerefMut for #ident {
                fn deref_mut(&mut self) -> &mut Self::Target {
                    &mut self.__base
                }
            }

            #config_item
            #partial_eq
        })
    }

    fn struct_ident(&self, ident: &str) -> syn::Ident {
        format_ident!("{}{}", self.options.artifact_prefix, ident)
    }

    /// Rust path of the generated struct for `type_path`.
    fn struct_path(&self, type_path: &str) -> Result<TokenStream, PlanError> {
        let (package, ident) = type_path.rsplit_once('.').unwrap_or(("", type_path));
        let stem = self.relative_path(type_path);
        let stem = stem
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut segments = vec![self.options.module_root.clone()];
        segments.extend(package.split('.').filter(|s| !s.is_empty()).map(str::to_string));
        segments.push(stem);
        segments.push(format!("{}{ident}", self.options.artifact_prefix));

        let path: syn::Path =
            syn::parse_str(&segments.join("::")).map_err(|_| PlanError::UnsupportedTypeShape {
                type_path: type_path.to_string(),
                shape: segments.join("::"),
            })?;

        Ok(quote!(#path))
    }
}

// `PropertyModel` builder rebuilding the runtime descriptor.
fn descriptor(prop: &PropertyPlan) -> TokenStream {
    use typedconf_core::model::ElementShape;

    let model = property_model(prop);
    let name = &model.name;
    let slot = model.slot;
    let kind = format_ident!("{}", format!("{:?}", model.kind));
    let element = match model.element {
        ElementShape::Primitive(p) => {
            let p = format_ident!("{}", p.to_string());
            quote!(ElementShape::Primitive(Primitive::#p))
        }
        ElementShape::Item => quote!(ElementShape::Item),
        ElementShape::Any => quote!(ElementShape::Any),
    };
    let nullable = model.nullable;
    let indexed = model.indexed;
    let key = model.key.as_deref().map(|k| quote!(.key(#k)));
    let default = (!model.default.is_null()).then(|| {
        let value = value_tokens(&model.default);
        quote!(.default_value(#value))
    });

    quote! {
        PropertyModel::new(#name, #slot, PropertyKind::#kind)
            .element(#element)
            .nullable(#nullable)
            .indexed(#indexed)
            #key
            #default
    }
}
