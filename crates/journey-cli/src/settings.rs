//! Runtime configuration, read from an optional TOML file and `JOURNEY_*`
//! environment variables. Command-line flags override both.

use std::path::Path;

use anyhow::Context as _;
use config::{ConfigBuilder, builder::DefaultState};
use journey_core::{ValidationOptions, ddl::Dialect};
use serde::Deserialize;

/// Settings shared by all subcommands.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CliConfig {
  /// Dialect used by `ddl` when `--dialect` is not given.
  pub dialect:           Dialect,
  /// Check connection endpoints against element ids when validating maps.
  pub strict_references: bool,
}

impl CliConfig {
  /// Load from `path` (if it exists) layered under the environment.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let builder = config::Config::builder()
      .add_source(config::File::from(path.to_path_buf()).required(false))
      .add_source(config::Environment::with_prefix("JOURNEY").try_parsing(true));
    Self::from_builder(builder)
  }

  fn from_builder(builder: ConfigBuilder<DefaultState>) -> anyhow::Result<Self> {
    builder
      .build()
      .context("failed to read configuration")?
      .try_deserialize()
      .context("failed to deserialise CliConfig")
  }

  pub fn validation_options(&self) -> ValidationOptions {
    ValidationOptions { strict_references: self.strict_references }
  }
}
