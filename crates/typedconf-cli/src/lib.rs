//! The `typedconf` command.
//!
//! - `typedconf generate` writes one Rust module per concrete type
//! - `typedconf plan <type>` dumps a type's implementation plan as JSON,
//!   with `--stats` adding the plan cache counters
//! - `typedconf check` plans and emits every type without writing
//! - `typedconf clean` removes every generated file

pub mod discover;
pub mod error;
pub mod generate;
pub mod logging;

pub use error::CliError;

use crate::generate::{Workspace, check, clean, generate};
use clap::{ArgAction, Args, Parser, Subcommand};
use std::{io::Write, path::PathBuf};
use typedconf_config::Config;

///
/// Cli
///

#[derive(Debug, Parser)]
#[command(name = "typedconf", version, about = "Schema-driven configuration-object compiler")]
pub struct Cli {
    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate Rust sources for every concrete type
    Generate(GenerateArgs),

    /// Print the implementation plan of one type as JSON
    Plan(PlanArgs),

    /// Plan and emit every type without writing anything
    Check(CheckArgs),

    /// Remove every generated file from the output root
    Clean(CleanArgs),
}

#[derive(Debug, Args)]
pub struct AppRoot {
    /// Application root; searched for schema files and typedconf.toml
    #[arg(long, default_value = ".")]
    pub app_root: PathBuf,
}

impl AppRoot {
    fn config(&self) -> Result<Config, CliError> {
        Ok(Config::load(&self.app_root)?)
    }
}

#[derive(Debug, Args)]
pub struct GenerateArgs {
    #[command(flatten)]
    pub root: AppRoot,

    /// Directory generated modules are written to
    #[arg(long)]
    pub out_root: PathBuf,

    /// Rewrite artifacts even when their header is current
    #[arg(long)]
    pub force: bool,

    /// Worker threads used for planning
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Rust path of the runtime crate, overriding typedconf.toml
    #[arg(long)]
    pub core_crate: Option<String>,
}

#[derive(Debug, Args)]
pub struct PlanArgs {
    #[command(flatten)]
    pub root: AppRoot,

    /// Dotted type path, e.g. `demo.Server`
    pub type_path: String,

    /// Print plan cache counters after the plan
    #[arg(long)]
    pub stats: bool,
}

#[derive(Debug, Args)]
pub struct CheckArgs {
    #[command(flatten)]
    pub root: AppRoot,

    #[arg(short, long)]
    pub jobs: Option<usize>,
}

#[derive(Debug, Args)]
pub struct CleanArgs {
    /// Directory generated modules were written to
    #[arg(long)]
    pub out_root: PathBuf,
}

/// Run one command, writing its report to `out`.
pub fn run(cli: &Cli, out: &mut dyn Write) -> Result<(), CliError> {
    match &cli.command {
        Command::Generate(args) => {
            let mut config = args.root.config()?;
            if let Some(core) = &args.core_crate {
                config.generate.core_crate = Some(core.clone());
            }
            config.validate()?;

            let workspace = Workspace::load(&args.root.app_root, config, Some(&args.out_root))?;
            let report = generate(&workspace, &args.out_root, args.force, args.jobs)?;
            writeln!(out, "{report}").map_err(CliError::io("failed to write", "<stdout>"))?;

            finish(report.failures.len())
        }

        Command::Plan(args) => {
            let workspace = Workspace::load(&args.root.app_root, args.root.config()?, None)?;
            let plan = workspace.cache.plan(&args.type_path)?;
            let json = serde_json::to_string_pretty(&*plan)?;
            writeln!(out, "{json}").map_err(CliError::io("failed to write", "<stdout>"))?;
            if args.stats {
                writeln!(out, "cache: {}", workspace.cache.stats())
                    .map_err(CliError::io("failed to write", "<stdout>"))?;
            }

            Ok(())
        }

        Command::Check(args) => {
            let workspace = Workspace::load(&args.root.app_root, args.root.config()?, None)?;
            let report = check(&workspace, args.jobs)?;
            writeln!(out, "{report}").map_err(CliError::io("failed to write", "<stdout>"))?;

            finish(report.failures.len())
        }

        Command::Clean(args) => {
            let removed = clean(&args.out_root)?;
            for path in &removed {
                writeln!(out, "removed  {}", path.display())
                    .map_err(CliError::io("failed to write", "<stdout>"))?;
            }

            Ok(())
        }
    }
}

fn finish(failed: usize) -> Result<(), CliError> {
    if failed == 0 {
        Ok(())
    } else {
        Err(CliError::Failed(failed))
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn generate_parses_every_flag() {
        let cli = Cli::try_parse_from([
            "typedconf",
            "-vv",
            "generate",
            "--app-root",
            "app",
            "--out-root",
            "out",
            "--force",
            "--jobs",
            "4",
            "--core-crate",
            "app::core",
        ])
        .expect("arguments should parse");

        assert_eq!(cli.verbose, 2);
        let Command::Generate(args) = cli.command else {
            panic!("expected generate");
        };
        assert_eq!(args.root.app_root, PathBuf::from("app"));
        assert_eq!(args.out_root, PathBuf::from("out"));
        assert!(args.force);
        assert_eq!(args.jobs, Some(4));
        assert_eq!(args.core_crate.as_deref(), Some("app::core"));
    }

    #[test]
    fn plan_requires_a_type() {
        assert!(Cli::try_parse_from(["typedconf", "plan"]).is_err());

        let cli = Cli::try_parse_from(["typedconf", "plan", "demo.Server"])
            .expect("arguments should parse");
        let Command::Plan(args) = cli.command else {
            panic!("expected plan");
        };
        assert_eq!(args.type_path, "demo.Server");
        assert_eq!(args.root.app_root, PathBuf::from("."));
        assert!(!args.stats);
    }
}
