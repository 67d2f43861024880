//! Schema-file discovery under the application root.

use crate::error::CliError;
use std::path::{Path, PathBuf};
use tracing::debug;
use typedconf_config::DiscoverConfig;
use walkdir::{DirEntry, WalkDir};

/// Directory names never searched.
const SKIPPED_DIRS: [&str; 2] = ["target", "node_modules"];

/// Every schema file under `app_root`, sorted by path. Hidden directories,
/// build output, excluded directories and `skip` (the generation output)
/// are not searched.
pub fn discover(
    app_root: &Path,
    config: &DiscoverConfig,
    skip: Option<&Path>,
) -> Result<Vec<PathBuf>, CliError> {
    if !app_root.is_dir() {
        return Err(CliError::NotADirectory(app_root.to_path_buf()));
    }

    let skip = skip.and_then(|path| path.canonicalize().ok());
    let keep = |entry: &DirEntry| {
        if entry.depth() == 0 || !entry.file_type().is_dir() {
            return true;
        }
        let name = entry.file_name().to_string_lossy();
        if name.starts_with('.') || SKIPPED_DIRS.contains(&name.as_ref()) {
            return false;
        }
        if skip
            .as_deref()
            .is_some_and(|skip| entry.path().canonicalize().is_ok_and(|p| p == skip))
        {
            return false;
        }

        entry
            .path()
            .strip_prefix(app_root)
            .map_or(true, |relative| !config.is_excluded(relative))
    };

    let mut files = Vec::new();
    for entry in WalkDir::new(app_root).follow_links(false).into_iter().filter_entry(keep) {
        let entry = entry.map_err(|source| CliError::Walk {
            path: app_root.to_path_buf(),
            source,
        })?;

        if entry.file_type().is_file() && config.is_schema_file(entry.path()) {
            files.push(entry.into_path());
        }
    }
    files.sort();

    debug!(count = files.len(), root = %app_root.display(), "discovered schema files");

    if files.is_empty() {
        return Err(CliError::NoSchemaFiles(app_root.to_path_buf()));
    }

    Ok(files)
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(root: &Path, relative: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().expect("fixture path has a parent"))
            .expect("fixture dir should be created");
        fs::write(path, "{}").expect("fixture file should be written");
    }

    #[test]
    fn finds_schema_files_in_path_order() {
        let dir = TempDir::new().expect("temp dir should be created");
        let root = dir.path();
        touch(root, "b/app.schema.json");
        touch(root, "a/app.schema.toml");
        touch(root, "a/readme.json");
        touch(root, ".hidden/x.schema.json");
        touch(root, "target/y.schema.json");
        touch(root, "vendor/z.schema.json");
        touch(root, "out/gen.schema.json");

        let config = DiscoverConfig {
            exclude: vec![PathBuf::from("vendor")],
            ..DiscoverConfig::default()
        };
        let out = root.join("out");
        let files = discover(root, &config, Some(&out)).expect("discovery should succeed");

        let relative: Vec<_> = files
            .iter()
            .map(|f| f.strip_prefix(root).expect("under root").to_path_buf())
            .collect();
        assert_eq!(
            relative,
            vec![
                PathBuf::from("a/app.schema.toml"),
                PathBuf::from("b/app.schema.json")
            ]
        );
    }

    #[test]
    fn empty_root_is_an_error() {
        let dir = TempDir::new().expect("temp dir should be created");
        let err = discover(dir.path(), &DiscoverConfig::default(), None)
            .expect_err("no schema files should fail");

        assert!(matches!(err, CliError::NoSchemaFiles(_)), "got {err}");
    }

    #[test]
    fn missing_root_is_an_error() {
        let dir = TempDir::new().expect("temp dir should be created");
        let err = discover(&dir.path().join("nope"), &DiscoverConfig::default(), None)
            .expect_err("missing root should fail");

        assert!(matches!(err, CliError::NotADirectory(_)), "got {err}");
    }
}
