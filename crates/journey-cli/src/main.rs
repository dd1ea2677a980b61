//! `journey-schema` — inspect and validate the journey-map data model.
//!
//! # Usage
//!
//! ```text
//! journey-schema ddl --dialect sqlite
//! journey-schema describe insert-journey-map
//! journey-schema validate insert-journey-map payload.json --strict-references
//! echo '{"username":"ada","password":"..."}' | journey-schema validate insert-user
//! ```
//!
//! Settings are read from `journey.toml` (or `--config`) and `JOURNEY_*`
//! environment variables; see [`settings::CliConfig`].

mod commands;
mod settings;

use std::{io, path::PathBuf, process::ExitCode};

use clap::{Parser, Subcommand};
use commands::{Outcome, ShapeName};
use journey_core::ddl::Dialect;
use settings::CliConfig;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Inspect and validate the journey-map data model")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "journey.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Print `CREATE TABLE` statements for every table.
  Ddl {
    /// `postgres` or `sqlite`; defaults to the configured dialect.
    #[arg(long)]
    dialect: Option<Dialect>,
  },

  /// Print a shape descriptor as JSON.
  Describe {
    #[arg(value_enum)]
    shape: ShapeName,
  },

  /// Validate a JSON payload from FILE (or stdin) against a shape.
  Validate {
    #[arg(value_enum)]
    shape: ShapeName,

    /// Payload file; `-` or absent reads stdin.
    file: Option<PathBuf>,

    /// Reject connections whose endpoints name no element of the map.
    #[arg(long)]
    strict_references: bool,
  },
}

fn main() -> anyhow::Result<ExitCode> {
  // Logs go to stderr; stdout carries command output.
  tracing_subscriber::fmt()
    .with_writer(io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let cfg = CliConfig::load(&cli.config)?;
  tracing::debug!(?cfg, "configuration loaded");

  let mut stdout = io::stdout().lock();

  match cli.command {
    Command::Ddl { dialect } => {
      commands::ddl(dialect.unwrap_or(cfg.dialect), &mut stdout)?;
    }
    Command::Describe { shape } => commands::describe(shape, &mut stdout)?,
    Command::Validate { shape, file, strict_references } => {
      let mut options = cfg.validation_options();
      options.strict_references |= strict_references;

      let input = commands::read_input(file.as_deref())?;
      if commands::validate(shape, &input, &options, &mut stdout)? == Outcome::Rejected {
        return Ok(ExitCode::FAILURE);
      }
    }
  }

  Ok(ExitCode::SUCCESS)
}
