//! Schema-file loading.
//!
//! One file describes one package: `{ "package": "demo", "types": [..] }`
//! in JSON, or the same shape in TOML. Type idents inside a file are
//! relative to its package.

use crate::node::{NodeError, Schema, SchemaType};
use serde::{Deserialize, Serialize};
use std::{
    fs, io,
    path::{Path, PathBuf},
};
use thiserror::Error as ThisError;

///
/// LoadError
///

#[derive(Debug, ThisError)]
pub enum LoadError {
    #[error("failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid JSON schema file '{path}': {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid TOML schema file '{path}': {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("unsupported schema file format: '{0}'")]
    UnsupportedFormat(PathBuf),

    #[error("{path}: {source}")]
    Node {
        path: PathBuf,
        #[source]
        source: NodeError,
    },
}

///
/// SchemaFormat
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SchemaFormat {
    Json,
    Toml,
}

impl SchemaFormat {
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "json" => Some(Self::Json),
            "toml" => Some(Self::Toml),
            _ => None,
        }
    }
}

///
/// SchemaFile
///

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct SchemaFile {
    pub package: String,

    #[serde(default)]
    pub types: Vec<SchemaType>,
}

impl SchemaFile {
    pub fn parse(text: &str, format: SchemaFormat, path: &Path) -> Result<Self, LoadError> {
        match format {
            SchemaFormat::Json => serde_json::from_str(text).map_err(|source| LoadError::Json {
                path: path.to_path_buf(),
                source,
            }),
            SchemaFormat::Toml => toml::from_str(text).map_err(|source| LoadError::Toml {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    pub fn from_path(path: &Path) -> Result<Self, LoadError> {
        let format = SchemaFormat::from_path(path)
            .ok_or_else(|| LoadError::UnsupportedFormat(path.to_path_buf()))?;
        let text = fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Self::parse(&text, format, path)
    }

    /// Types with the file's package applied.
    #[must_use]
    pub fn into_types(self) -> Vec<SchemaType> {
        let package = self.package;

        self.types
            .into_iter()
            .map(|mut ty| {
                if ty.def.package.is_empty() {
                    ty.def.package.clone_from(&package);
                }
                ty
            })
            .collect()
    }
}

impl Schema {
    /// Load and merge schema files in the given order.
    pub fn from_files<P: AsRef<Path>>(paths: &[P]) -> Result<Self, LoadError> {
        let mut schema = Self::new();

        for path in paths {
            let path = path.as_ref();
            for ty in SchemaFile::from_path(path)?.into_types() {
                schema.insert_type(ty).map_err(|source| LoadError::Node {
                    path: path.to_path_buf(),
                    source,
                })?;
            }
        }

        Ok(schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{expr::TypeExpr, types::PropertyKind};

    const JSON: &str = r#"{
        "package": "net",
        "types": [
            {
                "ident": "Endpoint",
                "flags": { "abstract": true },
                "properties": [
                    {
                        "name": "host", "ty": "Text", "getter": "host", "setter": "set_host",
                        "default": "localhost"
                    }
                ]
            },
            {
                "ident": "HttpEndpoint",
                "ancestors": ["net.Endpoint"],
                "properties": [
                    { "name": "headers", "kind": "map", "ty": "Text", "getter": "headers" }
                ]
            }
        ]
    }"#;

    const TOML: &str = r#"
        package = "net"

        [[types]]
        ident = "Endpoint"

        [[types.properties]]
        name = "port"
        ty = "Nat16"
        getter = "port"
        default = 8080
    "#;

    #[test]
    fn json_file_applies_package() {
        let file = SchemaFile::parse(JSON, SchemaFormat::Json, Path::new("net.schema.json"))
            .expect("json schema file");
        let types = file.into_types();

        assert_eq!(types[0].path(), "net.Endpoint");
        assert_eq!(types[1].ancestors, vec![TypeExpr::named("net.Endpoint")]);
        assert_eq!(types[1].properties[0].kind, PropertyKind::Map);
    }

    #[test]
    fn toml_file_parses_the_same_shape() {
        let file = SchemaFile::parse(TOML, SchemaFormat::Toml, Path::new("net.schema.toml"))
            .expect("toml schema file");

        assert_eq!(file.types[0].properties[0].ty, TypeExpr::named("Nat16"));
    }

    #[test]
    fn from_files_reports_the_offending_path() {
        let dir = tempfile::tempdir().expect("temp dir");
        let a = dir.path().join("a.schema.json");
        let b = dir.path().join("b.schema.json");
        fs::write(&a, JSON).expect("write a");
        fs::write(&b, JSON).expect("write b");

        let err = Schema::from_files(&[&a, &b]).expect_err("duplicate types across files");
        assert!(
            matches!(
                &err,
                LoadError::Node { path, source: NodeError::DuplicateType(_) } if path == &b
            ),
            "unexpected error: {err}"
        );
    }

    #[test]
    fn unknown_extension_is_rejected() {
        assert!(matches!(
            SchemaFile::from_path(Path::new("schema.yaml")),
            Err(LoadError::UnsupportedFormat(_))
        ));
    }
}
