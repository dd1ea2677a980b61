//! Journey maps — the persisted canvas record and its insert payload.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, de::Error as _};
use serde_json::Value;

use crate::{
  Result,
  element::{Connection, Element},
  table::{INSERT_JOURNEY_MAP, JOURNEY_MAPS},
  validate::{ValidationErrors, ValidationOptions, check_references, parse_timestamp},
};

/// Stored when an insert omits `style`.
pub const DEFAULT_STYLE: &str = "marker";

/// Stored when an insert omits `complexity`.
pub const DEFAULT_COMPLEXITY: &str = "simple";

/// A stored journey map, as read back from the `journey_maps` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct JourneyMap {
  pub id:          i32,
  pub title:       String,
  pub description: String,
  pub style:       Option<String>,
  pub complexity:  Option<String>,
  pub elements:    Vec<Element>,
  pub connections: Vec<Connection>,
  /// Set by storage at creation.
  #[serde(default, deserialize_with = "stored_timestamp")]
  pub created_at:  Option<DateTime<Utc>>,
  /// Set by storage at creation; the owning storage logic refreshes it on
  /// update (see [`JourneyMap::touch`]).
  #[serde(default, deserialize_with = "stored_timestamp")]
  pub updated_at:  Option<DateTime<Utc>>,
  /// Owner, if any. Not checked against `users` here.
  pub user_id:     Option<i32>,
}

impl JourneyMap {
  /// Build the record a storage engine would persist for `input`: column
  /// defaults fill an absent `style` / `complexity`, both timestamps are
  /// `now`. An explicit `null` is stored as `NULL`, as SQL does.
  pub fn from_insert(id: i32, input: NewJourneyMap, now: DateTime<Utc>) -> Self {
    Self {
      id,
      title: input.title,
      description: input.description,
      style: input
        .style
        .unwrap_or_else(|| Some(DEFAULT_STYLE.to_owned())),
      complexity: input
        .complexity
        .unwrap_or_else(|| Some(DEFAULT_COMPLEXITY.to_owned())),
      elements: input.elements,
      connections: input.connections,
      created_at: Some(now),
      updated_at: Some(now),
      user_id: input.user_id,
    }
  }

  /// Mark the record as modified at `now`.
  pub fn touch(&mut self, now: DateTime<Utc>) { self.updated_at = Some(now); }

  /// Validate a stored row against [`JOURNEY_MAPS`] and decode it.
  pub fn from_row(value: Value) -> Result<Self> {
    JOURNEY_MAPS.validate_row(&value)?;
    Ok(serde_json::from_value(value)?)
  }
}

/// Input for creating a journey map. `id`, `createdAt` and `updatedAt` are
/// assigned by storage and are not accepted here.
///
/// `style` and `complexity` are `None` when the key is absent (the column
/// default applies) and `Some(None)` for an explicit `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewJourneyMap {
  pub title:       String,
  pub description: String,
  #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
  pub style:       Option<Option<String>>,
  #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
  pub complexity:  Option<Option<String>>,
  pub elements:    Vec<Element>,
  pub connections: Vec<Connection>,
  #[serde(default)]
  pub user_id:     Option<i32>,
}

impl NewJourneyMap {
  /// Convenience constructor with all optional fields unset.
  pub fn new(
    title: impl Into<String>,
    description: impl Into<String>,
    elements: Vec<Element>,
    connections: Vec<Connection>,
  ) -> Self {
    Self {
      title: title.into(),
      description: description.into(),
      style: None,
      complexity: None,
      elements,
      connections,
      user_id: None,
    }
  }

  /// Validate untrusted JSON against [`INSERT_JOURNEY_MAP`] and decode it.
  /// Connections are not checked against element ids.
  pub fn from_json(value: Value) -> Result<Self> {
    Self::from_json_with(value, &ValidationOptions::default())
  }

  /// As [`NewJourneyMap::from_json`], applying `options` after the
  /// structural check.
  pub fn from_json_with(value: Value, options: &ValidationOptions) -> Result<Self> {
    let input: Self = INSERT_JOURNEY_MAP.parse(value)?;
    if options.strict_references {
      input.check_references()?;
    }
    Ok(input)
  }

  /// Report duplicate element ids and dangling connection endpoints.
  pub fn check_references(&self) -> Result<(), ValidationErrors> {
    let violations = check_references(&self.elements, &self.connections);
    if !violations.is_empty() {
      tracing::debug!(
        violations = violations.len(),
        "journey map rejected: unresolved element references"
      );
    }
    ValidationErrors::into_result(violations)
  }
}

// ─── Serde helpers ───────────────────────────────────────────────────────────

/// Any value that reaches the deserializer was present in the input, `null`
/// included. Absent keys fall back to `#[serde(default)]`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
  D: Deserializer<'de>,
  T: Deserialize<'de>,
{
  Option::<T>::deserialize(deserializer).map(Some)
}

/// Timestamps as storage returns them: RFC 3339, or zone-less UTC.
fn stored_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
  D: Deserializer<'de>,
{
  Option::<String>::deserialize(deserializer)?
    .map(|s| {
      parse_timestamp(&s).ok_or_else(|| D::Error::custom(format!("invalid timestamp {s:?}")))
    })
    .transpose()
}
