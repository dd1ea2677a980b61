//! Embedded values of a journey map: elements placed on the canvas and the
//! connections drawn between them.
//!
//! Neither has an identity outside the map that holds it; both are stored
//! inside the map's `elements` / `connections` JSON columns.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
  Result,
  shape::{CONNECTION, ELEMENT},
};

/// Canvas coordinates of an element.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Position {
  pub x: f64,
  pub y: f64,
}

/// A step, touchpoint or stage on a journey map.
///
/// `id` is expected to be unique within one map; see
/// [`crate::validate::check_references`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Element {
  pub id:            String,
  pub title:         String,
  pub description:   String,
  pub position:      Position,
  pub width:         f64,
  pub height:        f64,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub color:         Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub category:      Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub duration:      Option<f64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub duration_unit: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub notes:         Option<String>,
}

impl Element {
  /// An element with only the required fields set.
  pub fn new(
    id: impl Into<String>,
    title: impl Into<String>,
    description: impl Into<String>,
    position: Position,
    width: f64,
    height: f64,
  ) -> Self {
    Self {
      id: id.into(),
      title: title.into(),
      description: description.into(),
      position,
      width,
      height,
      color: None,
      category: None,
      duration: None,
      duration_unit: None,
      notes: None,
    }
  }

  /// Validate untrusted JSON against [`ELEMENT`] and decode it.
  pub fn from_json(value: Value) -> Result<Self> { ELEMENT.parse(value) }
}

/// A directed link from one element to another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Connection {
  pub id:        String,
  pub source_id: String,
  pub target_id: String,
}

impl Connection {
  pub fn new(
    id: impl Into<String>,
    source_id: impl Into<String>,
    target_id: impl Into<String>,
  ) -> Self {
    Self {
      id:        id.into(),
      source_id: source_id.into(),
      target_id: target_id.into(),
    }
  }

  /// Validate untrusted JSON against [`CONNECTION`] and decode it.
  pub fn from_json(value: Value) -> Result<Self> { CONNECTION.parse(value) }
}
