//! Error types for `journey-core`.

use thiserror::Error;

use crate::validate::ValidationErrors;

#[derive(Debug, Error)]
pub enum Error {
  #[error("table {table} has no column for field {field:?}")]
  UnknownColumn { table: &'static str, field: String },

  #[error("field {field:?} of table {table} is system-generated")]
  GeneratedColumn { table: &'static str, field: String },

  #[error("unknown SQL dialect: {0:?}")]
  UnknownDialect(String),

  #[error("validation failed: {0}")]
  Validation(#[from] ValidationErrors),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

impl Error {
  /// The violation list, if this is a validation failure.
  pub fn violations(&self) -> Option<&ValidationErrors> {
    match self {
      Self::Validation(errors) => Some(errors),
      _ => None,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
