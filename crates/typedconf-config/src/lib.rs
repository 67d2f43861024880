//! `typedconf.toml` loading.
//!
//! The file is optional; every section and key falls back to a default.
//!
//! ```toml
//! [generate]
//! artifact_prefix = "Gen"
//! core_crate = "my_app::typedconf::core"
//!
//! [discover]
//! exclude = ["vendor"]
//! ```

use serde::{Deserialize, Serialize};
use std::{
    fs, io,
    path::{Component, Path, PathBuf},
};
use thiserror::Error as ThisError;

/// File name looked up at the application root.
pub const CONFIG_FILE: &str = "typedconf.toml";

pub const DEFAULT_ARTIFACT_PREFIX: &str = "Gen";
pub const DEFAULT_FILE_PREFIX: &str = "gen_";
pub const DEFAULT_MODULE_ROOT: &str = "crate::generated";
pub const DEFAULT_FULL_SWITCH_MIN_INHERITED: usize = 5;
pub const DEFAULT_SCHEMA_SUFFIXES: [&str; 2] = [".schema.json", ".schema.toml"];

///
/// ConfigError
///

#[derive(Debug, ThisError)]
pub enum ConfigError {
    #[error("failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid config file '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid value for '{key}': {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl ConfigError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

///
/// Config
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub generate: GenerateConfig,
    pub discover: DiscoverConfig,
}

impl Config {
    /// Load `typedconf.toml` from `app_root`; a missing file yields defaults.
    pub fn load(app_root: &Path) -> Result<Self, ConfigError> {
        let path = app_root.join(CONFIG_FILE);

        match fs::read_to_string(&path) {
            Ok(text) => Self::parse(&text, &path),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(ConfigError::Io { path, source }),
        }
    }

    /// Parse and validate config text; `path` is only used in errors.
    pub fn parse(text: &str, path: &Path) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.generate.validate()?;
        self.discover.validate()
    }
}

///
/// GenerateConfig
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct GenerateConfig {
    /// Prefix of generated struct names.
    pub artifact_prefix: String,

    /// Prefix of generated file names.
    pub file_prefix: String,

    /// Rust path of the runtime crate as seen from generated code.
    pub core_crate: Option<String>,

    /// Rust path the output directory is mounted at.
    pub module_root: String,

    pub full_switch_min_inherited: usize,
}

impl Default for GenerateConfig {
    fn default() -> Self {
        Self {
            artifact_prefix: DEFAULT_ARTIFACT_PREFIX.to_string(),
            file_prefix: DEFAULT_FILE_PREFIX.to_string(),
            core_crate: None,
            module_root: DEFAULT_MODULE_ROOT.to_string(),
            full_switch_min_inherited: DEFAULT_FULL_SWITCH_MIN_INHERITED,
        }
    }
}

impl GenerateConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if !is_ident_prefix(&self.artifact_prefix, true) {
            return Err(ConfigError::invalid(
                "generate.artifact_prefix",
                format!("'{}' must start an UpperCamel identifier", self.artifact_prefix),
            ));
        }
        if !is_ident_prefix(&self.file_prefix, false) {
            return Err(ConfigError::invalid(
                "generate.file_prefix",
                format!("'{}' must start a snake_case identifier", self.file_prefix),
            ));
        }
        if self.module_root.trim().is_empty() {
            return Err(ConfigError::invalid("generate.module_root", "must not be empty"));
        }
        if let Some(core) = &self.core_crate
            && core.trim().is_empty()
        {
            return Err(ConfigError::invalid("generate.core_crate", "must not be empty"));
        }

        Ok(())
    }
}

// leading character must be a letter (or `_` for file names); the rest
// alphanumeric or `_`
fn is_ident_prefix(s: &str, upper: bool) -> bool {
    let mut chars = s.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    let first_ok = if upper {
        first.is_ascii_uppercase()
    } else {
        first.is_ascii_lowercase() || first == '_'
    };

    first_ok && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

///
/// DiscoverConfig
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct DiscoverConfig {
    /// File-name suffixes that mark schema files.
    pub schema_suffixes: Vec<String>,

    /// Directories (relative to the app root) that are never searched.
    pub exclude: Vec<PathBuf>,
}

impl Default for DiscoverConfig {
    fn default() -> Self {
        Self {
            schema_suffixes: DEFAULT_SCHEMA_SUFFIXES.map(str::to_string).to_vec(),
            exclude: Vec::new(),
        }
    }
}

impl DiscoverConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.schema_suffixes.is_empty() {
            return Err(ConfigError::invalid("discover.schema_suffixes", "must not be empty"));
        }
        if let Some(suffix) = self
            .schema_suffixes
            .iter()
            .find(|s| !(s.ends_with(".json") || s.ends_with(".toml")))
        {
            return Err(ConfigError::invalid(
                "discover.schema_suffixes",
                format!("'{suffix}' must end in .json or .toml"),
            ));
        }
        if let Some(path) = self.exclude.iter().find(|p| !is_relative_dir(p)) {
            return Err(ConfigError::invalid(
                "discover.exclude",
                format!("'{}' must be a relative path inside the app root", path.display()),
            ));
        }

        Ok(())
    }

    /// Whether a file name carries one of the schema suffixes.
    #[must_use]
    pub fn is_schema_file(&self, path: &Path) -> bool {
        path.file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| self.schema_suffixes.iter().any(|s| name.ends_with(s.as_str())))
    }

    /// Whether a path relative to the app root lies under an excluded directory.
    #[must_use]
    pub fn is_excluded(&self, relative: &Path) -> bool {
        self.exclude.iter().any(|dir| relative.starts_with(dir))
    }
}

fn is_relative_dir(path: &Path) -> bool {
    path.components().next().is_some()
        && path.components().all(|c| matches!(c, Component::Normal(_)))
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn parse(text: &str) -> Result<Config, ConfigError> {
        Config::parse(text, Path::new(CONFIG_FILE))
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = TempDir::new().expect("temp dir should be created");
        let config = Config::load(dir.path()).expect("missing config should not be an error");

        assert_eq!(config, Config::default());
        assert_eq!(config.generate.artifact_prefix, "Gen");
        assert_eq!(config.discover.schema_suffixes.len(), 2);
    }

    #[test]
    fn load_reads_the_file_at_the_app_root() {
        let dir = TempDir::new().expect("temp dir should be created");
        fs::write(
            dir.path().join(CONFIG_FILE),
            "[generate]\nartifact_prefix = \"Cfg\"\ncore_crate = \"app::core\"\n",
        )
        .expect("config should be written");

        let config = Config::load(dir.path()).expect("config should load");

        assert_eq!(config.generate.artifact_prefix, "Cfg");
        assert_eq!(config.generate.core_crate.as_deref(), Some("app::core"));
        assert_eq!(config.generate.file_prefix, DEFAULT_FILE_PREFIX);
        assert_eq!(config.discover, DiscoverConfig::default());
    }

    #[test]
    fn partial_sections_keep_defaults() {
        let config = parse(
            r#"
[generate]
full_switch_min_inherited = 2

[discover]
exclude = ["vendor", "target/tmp"]
"#,
        )
        .expect("config should parse");

        assert_eq!(config.generate.full_switch_min_inherited, 2);
        assert_eq!(config.generate.module_root, DEFAULT_MODULE_ROOT);
        assert!(config.discover.is_excluded(Path::new("vendor/a.schema.json")));
        assert!(config.discover.is_excluded(Path::new("target/tmp/b.schema.json")));
        assert!(!config.discover.is_excluded(Path::new("target/b.schema.json")));
        assert!(!config.discover.is_excluded(Path::new("vendored/a.schema.json")));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = parse("[generate]\nprefix = \"X\"\n").expect_err("unknown key should fail");

        assert!(matches!(err, ConfigError::Parse { .. }), "got {err}");
    }

    #[test]
    fn invalid_values_name_the_key() {
        for (text, key) in [
            ("[generate]\nartifact_prefix = \"gen\"\n", "generate.artifact_prefix"),
            ("[generate]\nfile_prefix = \"Gen-\"\n", "generate.file_prefix"),
            ("[generate]\nmodule_root = \" \"\n", "generate.module_root"),
            ("[generate]\ncore_crate = \"\"\n", "generate.core_crate"),
            ("[discover]\nschema_suffixes = []\n", "discover.schema_suffixes"),
            ("[discover]\nschema_suffixes = [\".yaml\"]\n", "discover.schema_suffixes"),
            ("[discover]\nexclude = [\"../up\"]\n", "discover.exclude"),
        ] {
            let err = parse(text).expect_err("invalid value should fail");
            match err {
                ConfigError::Invalid { key: got, .. } => assert_eq!(got, key, "for {text:?}"),
                other => panic!("expected Invalid for {text:?}, got {other}"),
            }
        }
    }

    #[test]
    fn schema_files_are_matched_by_suffix() {
        let discover = DiscoverConfig::default();

        assert!(discover.is_schema_file(Path::new("a/b/app.schema.json")));
        assert!(discover.is_schema_file(Path::new("app.schema.toml")));
        assert!(!discover.is_schema_file(Path::new("app.json")));
        assert!(!discover.is_schema_file(Path::new("schema.json/dir")));
    }
}
