//! Structural validation of untrusted JSON against shape descriptors.
//!
//! Validation is strict and non-coercing: a string never satisfies a number
//! field, unknown keys are rejected, and every violation in the payload is
//! reported rather than only the first.

use std::{collections::HashSet, fmt};

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{
  element::{Connection, Element},
  shape::{Field, ValueShape},
};

// ─── Violations ──────────────────────────────────────────────────────────────

/// What went wrong at a given path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ViolationKind {
  /// A required key is absent (or `null` where null is not allowed for a
  /// required field).
  MissingField,
  /// The value does not have the declared type.
  TypeMismatch {
    expected: &'static str,
    found:    &'static str,
  },
  /// The key is not part of the shape.
  UnknownField,
  /// Two elements of one map share an id.
  DuplicateElementId,
  /// A connection endpoint names no element of the map.
  DanglingReference { target: String },
}

/// A single field-level violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
  /// Dotted path to the offending value, e.g. `elements[0].position.x`.
  /// The payload itself is `$`.
  pub path: String,
  #[serde(flatten)]
  pub kind: ViolationKind,
}

impl Violation {
  pub fn new(path: impl Into<String>, kind: ViolationKind) -> Self {
    Self { path: path.into(), kind }
  }
}

impl fmt::Display for Violation {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match &self.kind {
      ViolationKind::MissingField => {
        write!(f, "{}: missing required field", self.path)
      }
      ViolationKind::TypeMismatch { expected, found } => {
        write!(f, "{}: expected {expected}, found {found}", self.path)
      }
      ViolationKind::UnknownField => write!(f, "{}: unknown field", self.path),
      ViolationKind::DuplicateElementId => {
        write!(f, "{}: duplicate element id", self.path)
      }
      ViolationKind::DanglingReference { target } => {
        write!(f, "{}: no element with id {target:?}", self.path)
      }
    }
  }
}

/// The non-empty list of violations found in one payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<Violation>);

impl ValidationErrors {
  pub fn violations(&self) -> &[Violation] { &self.0 }

  pub fn len(&self) -> usize { self.0.len() }

  pub fn is_empty(&self) -> bool { self.0.is_empty() }

  /// The violation reported at `path`, if any.
  pub fn at(&self, path: &str) -> Option<&ViolationKind> {
    self.0.iter().find(|v| v.path == path).map(|v| &v.kind)
  }

  /// `Ok(())` for an empty list, `Err(self)` otherwise.
  pub(crate) fn into_result(violations: Vec<Violation>) -> Result<(), Self> {
    if violations.is_empty() {
      Ok(())
    } else {
      Err(Self(violations))
    }
  }
}

impl fmt::Display for ValidationErrors {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for (i, violation) in self.0.iter().enumerate() {
      if i > 0 {
        f.write_str("; ")?;
      }
      write!(f, "{violation}")?;
    }
    Ok(())
  }
}

impl std::error::Error for ValidationErrors {}

// ─── Options ─────────────────────────────────────────────────────────────────

/// Checks beyond plain structure, applied to journey map inserts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationOptions {
  /// Reject duplicate element ids and connections whose `sourceId` or
  /// `targetId` names no element of the same map. Off by default.
  pub strict_references: bool,
}

// ─── Structural walk ─────────────────────────────────────────────────────────

/// Validate `value` as a closed record with `fields`.
pub(crate) fn validate_fields(
  shape_name: &'static str,
  fields: &[Field],
  value: &Value,
) -> Result<(), ValidationErrors> {
  let mut walker = Walker::default();
  match value {
    Value::Object(obj) => walker.check_object(fields, obj, ""),
    other => walker.mismatch("$", "object", other),
  }

  if !walker.violations.is_empty() {
    tracing::debug!(
      shape = shape_name,
      violations = walker.violations.len(),
      "payload rejected"
    );
  }
  ValidationErrors::into_result(walker.violations)
}

#[derive(Default)]
struct Walker {
  violations: Vec<Violation>,
}

impl Walker {
  fn push(&mut self, path: String, kind: ViolationKind) {
    self.violations.push(Violation { path, kind });
  }

  fn mismatch(&mut self, path: &str, expected: &'static str, found: &Value) {
    self.push(
      path.to_owned(),
      ViolationKind::TypeMismatch { expected, found: json_type_name(found) },
    );
  }

  fn check_object(&mut self, fields: &[Field], obj: &Map<String, Value>, prefix: &str) {
    for field in fields {
      let path = join_key(prefix, field.name);
      match obj.get(field.name) {
        None => {
          if field.presence.is_required() {
            self.push(path, ViolationKind::MissingField);
          }
        }
        Some(Value::Null) if field.presence.accepts_null() => {}
        Some(Value::Null) if field.presence.is_required() => {
          self.push(path, ViolationKind::MissingField);
        }
        Some(value) => self.check_value(&field.shape, value, &path),
      }
    }

    for key in obj.keys() {
      if !fields.iter().any(|f| f.name == key) {
        self.push(join_key(prefix, key), ViolationKind::UnknownField);
      }
    }
  }

  fn check_value(&mut self, shape: &ValueShape, value: &Value, path: &str) {
    match (shape, value) {
      (ValueShape::String, Value::String(_)) => {}
      (ValueShape::Number, Value::Number(_)) => {}
      (ValueShape::Integer, Value::Number(n)) => {
        // Must deserialize into an `i32` without loss.
        let fits = n.as_i64().is_some_and(|i| i32::try_from(i).is_ok());
        if !fits {
          self.mismatch(path, "integer", value);
        }
      }
      (ValueShape::Timestamp, Value::String(s)) => {
        if parse_timestamp(s).is_none() {
          self.mismatch(path, "timestamp", value);
        }
      }
      (ValueShape::Record(record), Value::Object(obj)) => {
        self.check_object(record.fields, obj, path);
      }
      (ValueShape::Array(item), Value::Array(items)) => {
        for (i, v) in items.iter().enumerate() {
          self.check_value(item, v, &format!("{path}[{i}]"));
        }
      }
      (expected, found) => self.mismatch(path, expected.type_name(), found),
    }
  }
}

/// Zone-less layouts produced by `CURRENT_TIMESTAMP` and Postgres
/// `timestamp` columns. `%.f` also matches no fraction.
const NAIVE_TIMESTAMP_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// Parse a timestamp as RFC 3339, or as a zone-less UTC date-time.
pub(crate) fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
  if let Ok(t) = DateTime::parse_from_rfc3339(s) {
    return Some(t.with_timezone(&Utc));
  }
  NAIVE_TIMESTAMP_FORMATS
    .iter()
    .find_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
    .map(|naive| naive.and_utc())
}

fn join_key(prefix: &str, key: &str) -> String {
  if prefix.is_empty() {
    key.to_owned()
  } else {
    format!("{prefix}.{key}")
  }
}

/// JSON type name used in mismatch reports. Integers and floats are both
/// `number`; `Walker::check_value` refines integer failures itself.
fn json_type_name(value: &Value) -> &'static str {
  match value {
    Value::Null => "null",
    Value::Bool(_) => "boolean",
    Value::Number(_) => "number",
    Value::String(_) => "string",
    Value::Array(_) => "array",
    Value::Object(_) => "object",
  }
}

// ─── Cross-references ────────────────────────────────────────────────────────

/// Report duplicate element ids and connections whose endpoints name no
/// element. Paths index into the `elements` and `connections` arrays.
pub fn check_references(elements: &[Element], connections: &[Connection]) -> Vec<Violation> {
  let mut violations = Vec::new();
  let mut ids = HashSet::with_capacity(elements.len());

  for (i, element) in elements.iter().enumerate() {
    if !ids.insert(element.id.as_str()) {
      violations.push(Violation::new(
        format!("elements[{i}].id"),
        ViolationKind::DuplicateElementId,
      ));
    }
  }

  for (i, connection) in connections.iter().enumerate() {
    let endpoints = [
      ("sourceId", &connection.source_id),
      ("targetId", &connection.target_id),
    ];
    for (key, target) in endpoints {
      if !ids.contains(target.as_str()) {
        violations.push(Violation::new(
          format!("connections[{i}].{key}"),
          ViolationKind::DanglingReference { target: target.clone() },
        ));
      }
    }
  }

  violations
}
