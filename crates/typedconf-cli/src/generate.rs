//! Generation driver: plan every concrete type, emit its artifact, write
//! what changed and remove what is stale.

use crate::{discover::discover, error::CliError};
use rayon::ThreadPoolBuilder;
use std::{
    collections::BTreeSet,
    fmt, fs,
    path::{Path, PathBuf},
    sync::Arc,
};
use tracing::{debug, info, warn};
use typedconf_build::{
    ImplementationPlan, PlanCache, PlanError, PlanOptions,
    emit::{Artifact, EmitOptions, Emitter, Header, module_files},
    paths::CratePaths,
};
use typedconf_config::Config;
use typedconf_schema::node::Schema;
use walkdir::WalkDir;

///
/// Workspace
///
/// A loaded application: its config, schema and plan cache.
///

pub struct Workspace {
    pub config: Config,
    pub cache: PlanCache,
    pub emit: EmitOptions,
}

impl Workspace {
    /// Discover and load every schema file under `app_root`. `skip` is a
    /// directory left out of discovery, normally the output root.
    pub fn load(app_root: &Path, config: Config, skip: Option<&Path>) -> Result<Self, CliError> {
        let files = discover(app_root, &config.discover, skip)?;
        let schema = Schema::from_files(&files)?;
        info!(files = files.len(), types = schema.types().count(), "schema loaded");

        let options = PlanOptions {
            full_switch_min_inherited: config.generate.full_switch_min_inherited,
        };
        let emit = EmitOptions {
            artifact_prefix: config.generate.artifact_prefix.clone(),
            file_prefix: config.generate.file_prefix.clone(),
            module_root: config.generate.module_root.clone(),
            paths: CratePaths::new(config.generate.core_crate.as_deref()),
        };

        Ok(Self {
            config,
            cache: PlanCache::new(schema, options),
            emit,
        })
    }

    /// Plan every concrete type, on a dedicated pool when `jobs` is set.
    pub fn plan_all(
        &self,
        jobs: Option<usize>,
    ) -> Result<Vec<(String, Result<Arc<ImplementationPlan>, PlanError>)>, CliError> {
        self.cache.validate()?;

        // only the cache crosses into the pool; emit options hold tokens
        let cache = &self.cache;
        let results = match jobs {
            Some(jobs) => ThreadPoolBuilder::new()
                .num_threads(jobs)
                .build()?
                .install(|| cache.plan_all()),
            None => cache.plan_all(),
        };

        Ok(results)
    }

    /// Artifacts of every type that planned and emitted cleanly; the rest
    /// become failures.
    fn artifacts(&self, jobs: Option<usize>) -> Result<(Vec<Artifact>, Vec<Failure>), CliError> {
        let schema = self.cache.schema();
        let emitter = Emitter::new(&schema, &self.emit);

        let mut artifacts = Vec::new();
        let mut failures = Vec::new();
        for (type_path, result) in self.plan_all(jobs)? {
            match result.and_then(|plan| emitter.emit(&plan)) {
                Ok(artifact) => artifacts.push(artifact),
                Err(error) => {
                    warn!(%type_path, %error, "type failed");
                    failures.push(Failure { type_path, error });
                }
            }
        }

        Ok((artifacts, failures))
    }
}

///
/// Failure
///

#[derive(Clone, Debug)]
pub struct Failure {
    pub type_path: String,
    pub error: PlanError,
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.type_path, self.error)
    }
}

///
/// GenerateReport
///
/// Paths are relative to the output root.
///

#[derive(Debug, Default)]
pub struct GenerateReport {
    pub written: Vec<PathBuf>,
    pub unchanged: Vec<PathBuf>,
    pub removed: Vec<PathBuf>,
    pub failures: Vec<Failure>,
}

impl fmt::Display for GenerateReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for path in &self.written {
            writeln!(f, "wrote    {}", path.display())?;
        }
        for path in &self.removed {
            writeln!(f, "removed  {}", path.display())?;
        }
        for failure in &self.failures {
            writeln!(f, "failed   {failure}")?;
        }
        write!(
            f,
            "{} written, {} unchanged, {} removed, {} failed",
            self.written.len(),
            self.unchanged.len(),
            self.removed.len(),
            self.failures.len()
        )
    }
}

///
/// CheckReport
///

#[derive(Debug, Default)]
pub struct CheckReport {
    pub checked: usize,
    pub failures: Vec<Failure>,
}

impl fmt::Display for CheckReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for failure in &self.failures {
            writeln!(f, "failed   {failure}")?;
        }
        write!(f, "{} checked, {} failed", self.checked, self.failures.len())
    }
}

// -----------------------------------------------------------------------------
// Commands
// -----------------------------------------------------------------------------

/// Write every artifact under `out_root` and remove stale ones. Artifacts
/// whose header already matches on disk are left alone unless `force`.
pub fn generate(
    workspace: &Workspace,
    out_root: &Path,
    force: bool,
    jobs: Option<usize>,
) -> Result<GenerateReport, CliError> {
    // Phase 1: plan + emit
    let (mut artifacts, failures) = workspace.artifacts(jobs)?;
    artifacts.extend(module_files(&artifacts, &workspace.emit));

    // Phase 2: write
    let mut report = GenerateReport::default();
    for artifact in &artifacts {
        if write_artifact(out_root, artifact, force)? {
            report.written.push(artifact.relative_path.clone());
        } else {
            report.unchanged.push(artifact.relative_path.clone());
        }
    }

    // Phase 3: remove stale; failed types keep their last good artifact
    let schema = workspace.cache.schema();
    let emitter = Emitter::new(&schema, &workspace.emit);
    let keep: BTreeSet<PathBuf> = artifacts
        .iter()
        .map(|a| a.relative_path.clone())
        .chain(failures.iter().map(|f| emitter.relative_path(&f.type_path)))
        .collect();
    report.removed = remove_generated(out_root, &keep)?;
    report.failures = failures;

    info!(
        written = report.written.len(),
        unchanged = report.unchanged.len(),
        removed = report.removed.len(),
        failed = report.failures.len(),
        "generation finished"
    );

    Ok(report)
}

/// Plan and emit every type without writing anything.
pub fn check(workspace: &Workspace, jobs: Option<usize>) -> Result<CheckReport, CliError> {
    let (artifacts, failures) = workspace.artifacts(jobs)?;

    Ok(CheckReport {
        checked: artifacts.len() + failures.len(),
        failures,
    })
}

/// Remove every typedconf-generated file under `out_root`.
pub fn clean(out_root: &Path) -> Result<Vec<PathBuf>, CliError> {
    remove_generated(out_root, &BTreeSet::new())
}

// -----------------------------------------------------------------------------
// Files
// -----------------------------------------------------------------------------

/// Returns whether the file was written.
fn write_artifact(out_root: &Path, artifact: &Artifact, force: bool) -> Result<bool, CliError> {
    let target = out_root.join(&artifact.relative_path);

    if target.exists() {
        let existing =
            fs::read_to_string(&target).map_err(CliError::io("failed to read", &target))?;
        let Some(header) = Header::parse(&existing) else {
            return Err(CliError::NotGenerated(target));
        };

        let unchanged = match &artifact.header {
            Header::Type { .. } => header == artifact.header,
            Header::Module { .. } => existing == artifact.source,
        };
        if unchanged && !force {
            debug!(path = %artifact.relative_path.display(), "unchanged");
            return Ok(false);
        }
    }

    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).map_err(CliError::io("failed to create", parent))?;
    }
    fs::write(&target, &artifact.source).map_err(CliError::io("failed to write", &target))?;
    debug!(path = %artifact.relative_path.display(), "written");

    Ok(true)
}

/// Delete generated files under `out_root` that are not in `keep`, then any
/// directory this left empty. Files without a typedconf header are never
/// touched.
fn remove_generated(out_root: &Path, keep: &BTreeSet<PathBuf>) -> Result<Vec<PathBuf>, CliError> {
    if !out_root.is_dir() {
        return Ok(Vec::new());
    }

    let mut removed = Vec::new();
    let mut emptied = BTreeSet::new();

    for entry in WalkDir::new(out_root).contents_first(true).sort_by_file_name() {
        let entry = entry.map_err(|source| CliError::Walk {
            path: out_root.to_path_buf(),
            source,
        })?;
        let path = entry.path();

        if entry.file_type().is_dir() {
            if entry.depth() > 0 && emptied.contains(path) && is_empty_dir(path)? {
                fs::remove_dir(path).map_err(CliError::io("failed to remove", path))?;
                if let Some(parent) = path.parent() {
                    emptied.insert(parent.to_path_buf());
                }
            }
            continue;
        }

        let Ok(relative) = path.strip_prefix(out_root) else {
            continue;
        };
        if path.extension().is_none_or(|ext| ext != "rs") || keep.contains(relative) {
            continue;
        }
        let text = fs::read_to_string(path).map_err(CliError::io("failed to read", path))?;
        if Header::parse(&text).is_none() {
            continue;
        }

        fs::remove_file(path).map_err(CliError::io("failed to remove", path))?;
        info!(path = %relative.display(), "removed stale artifact");
        removed.push(relative.to_path_buf());
        if let Some(parent) = path.parent() {
            emptied.insert(parent.to_path_buf());
        }
    }

    Ok(removed)
}

fn is_empty_dir(path: &Path) -> Result<bool, CliError> {
    let mut entries = fs::read_dir(path).map_err(CliError::io("failed to read", path))?;

    Ok(entries.next().is_none())
}
