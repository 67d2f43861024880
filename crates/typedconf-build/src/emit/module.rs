//! Module files tying generated artifacts into a Rust module tree.

use crate::emit::{Artifact, EmitOptions, Header};
use quote::{format_ident, quote};
use std::{
    collections::{BTreeMap, BTreeSet},
    path::PathBuf,
};

/// One `mod.rs` per package directory plus the root, re-exporting every
/// generated type of the package.
#[must_use]
pub fn module_files(artifacts: &[Artifact], options: &EmitOptions) -> Vec<Artifact> {
    // package -> (child packages, (file stem, struct ident))
    let mut tree: BTreeMap<String, (BTreeSet<String>, Vec<(String, String)>)> = BTreeMap::new();
    tree.entry(String::new()).or_default();

    for artifact in artifacts {
        let Header::Type { type_path, .. } = &artifact.header else {
            continue;
        };
        let (package, ident) = type_path.rsplit_once('.').unwrap_or(("", type_path));
        let stem = artifact
            .relative_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        tree.entry(package.to_string())
            .or_default()
            .1
            .push((stem, format!("{}{ident}", options.artifact_prefix)));

        // register every package prefix with its parent
        let segments: Vec<&str> = package.split('.').filter(|s| !s.is_empty()).collect();
        for depth in 0..segments.len() {
            let parent = segments[..depth].join(".");
            tree.entry(parent).or_default().0.insert(segments[depth].to_string());
        }
    }

    tree.into_iter()
        .map(|(package, (children, types))| {
            let children = children.iter().map(|c| format_ident!("{}", c));
            let mods = types.iter().map(|(stem, _)| format_ident!("{}", stem));
            let uses = types
                .iter()
                .map(|(stem, ident)| (format_ident!("{}", stem), format_ident!("{}", ident)))
                .map(|(stem, ident)| quote!(pub use #stem::#ident;));

            let tokens = quote! {
                #(pub mod #children;)*
                #(pub mod #mods;)*
                #(#uses)*
            };
            let header = Header::Module {
                package: package.clone(),
            };

            let mut relative_path: PathBuf = package.split('.').filter(|s| !s.is_empty()).collect();
            relative_path.push("mod.rs");

            Artifact {
                source: format!("{}\n{tokens}\n", header.render()),
                relative_path,
                header,
            }
        })
        .collect()
}
