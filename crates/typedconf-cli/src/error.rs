use std::{io, path::PathBuf};
use thiserror::Error as ThisError;
use typedconf_build::PlanError;
use typedconf_config::ConfigError;
use typedconf_schema::load::LoadError;

///
/// CliError
///

#[derive(Debug, ThisError)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Plan(#[from] PlanError),

    #[error("'{0}' is not a directory")]
    NotADirectory(PathBuf),

    #[error("refusing to overwrite '{0}': not generated by typedconf")]
    NotGenerated(PathBuf),

    #[error("no schema files found under '{0}'")]
    NoSchemaFiles(PathBuf),

    #[error("failed to walk '{path}': {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("{op} '{path}': {source}")]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to start worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),

    #[error("failed to encode plan: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0} type(s) failed")]
    Failed(usize),
}

impl CliError {
    pub(crate) fn io(op: &'static str, path: impl Into<PathBuf>) -> impl FnOnce(io::Error) -> Self {
        let path = path.into();
        move |source| Self::Io { op, path, source }
    }
}
