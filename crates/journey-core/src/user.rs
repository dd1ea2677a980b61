//! Users — account records that own journey maps.
//!
//! `password` is carried as an opaque credential string. Whatever encoding
//! the caller stores (a password hash, normally) is its own concern; this
//! crate never inspects it and keeps it out of `Debug` output.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
  Result,
  table::{INSERT_USER, USERS},
};

const REDACTED: &str = "<redacted>";

/// A stored user, as read back from the `users` table.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct User {
  pub id:       i32,
  pub username: String,
  pub password: String,
}

impl User {
  /// Build the record a storage engine would persist for `input`.
  pub fn from_insert(id: i32, input: NewUser) -> Self {
    Self { id, username: input.username, password: input.password }
  }

  /// Validate a stored row against [`USERS`] and decode it.
  pub fn from_row(value: Value) -> Result<Self> {
    USERS.validate_row(&value)?;
    Ok(serde_json::from_value(value)?)
  }
}

impl fmt::Debug for User {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("User")
      .field("id", &self.id)
      .field("username", &self.username)
      .field("password", &REDACTED)
      .finish()
  }
}

/// Input for registering a user. `id` is assigned by storage.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewUser {
  pub username: String,
  pub password: String,
}

impl NewUser {
  pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
    Self { username: username.into(), password: password.into() }
  }

  /// Validate untrusted JSON against [`INSERT_USER`] and decode it.
  pub fn from_json(value: Value) -> Result<Self> { INSERT_USER.parse(value) }
}

impl fmt::Debug for NewUser {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("NewUser")
      .field("username", &self.username)
      .field("password", &REDACTED)
      .finish()
  }
}
