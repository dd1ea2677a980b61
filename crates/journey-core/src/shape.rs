//! Shape descriptors — the field-level vocabulary shared by tables, insert
//! shapes and embedded values.
//!
//! Every descriptor is `'static` data built at compile time. Validation walks
//! these descriptors; it never consults the Rust types.

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::{Result, validate};

// ─── Value shapes ────────────────────────────────────────────────────────────

/// The type a JSON value must have to satisfy a field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "type", content = "of", rename_all = "snake_case")]
pub enum ValueShape {
  String,
  /// A whole number that fits in 32 bits (`serial` / `integer` columns).
  Integer,
  /// Any finite number.
  Number,
  /// An RFC 3339 timestamp string.
  Timestamp,
  Record(&'static RecordShape),
  /// An ordered sequence whose items all share one shape.
  Array(&'static ValueShape),
}

impl ValueShape {
  /// Name used in type-mismatch reports.
  pub fn type_name(&self) -> &'static str {
    match self {
      Self::String => "string",
      Self::Integer => "integer",
      Self::Number => "number",
      Self::Timestamp => "timestamp",
      Self::Record(_) => "object",
      Self::Array(_) => "array",
    }
  }
}

// ─── Fields ──────────────────────────────────────────────────────────────────

/// Whether a field may be omitted, and whether an explicit `null` is allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Presence {
  /// Must be present and non-null.
  Required,
  /// May be omitted; `null` is a type mismatch.
  Optional,
  /// May be omitted or set to `null`.
  Nullable,
}

impl Presence {
  pub fn is_required(self) -> bool { matches!(self, Self::Required) }

  pub fn accepts_null(self) -> bool { matches!(self, Self::Nullable) }
}

/// A named field with its value shape and presence rule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Field {
  pub name:     &'static str,
  pub shape:    ValueShape,
  pub presence: Presence,
}

impl Field {
  pub const fn required(name: &'static str, shape: ValueShape) -> Self {
    Self { name, shape, presence: Presence::Required }
  }

  pub const fn optional(name: &'static str, shape: ValueShape) -> Self {
    Self { name, shape, presence: Presence::Optional }
  }

  pub const fn nullable(name: &'static str, shape: ValueShape) -> Self {
    Self { name, shape, presence: Presence::Nullable }
  }
}

// ─── Record shapes ───────────────────────────────────────────────────────────

/// A closed record: exactly the listed fields, nothing else.
#[derive(Debug, PartialEq, Serialize)]
pub struct RecordShape {
  pub name:   &'static str,
  pub fields: &'static [Field],
}

impl RecordShape {
  pub fn field(&self, name: &str) -> Option<&'static Field> {
    self.fields.iter().find(|f| f.name == name)
  }

  pub fn field_names(&self) -> impl Iterator<Item = &'static str> {
    self.fields.iter().map(|f| f.name)
  }

  /// Check `value` against this shape, collecting every violation.
  pub fn validate(&self, value: &Value) -> Result<(), validate::ValidationErrors> {
    validate::validate_fields(self.name, self.fields, value)
  }

  /// Validate `value`, then deserialize it into `T`.
  pub fn parse<T: DeserializeOwned>(&self, value: Value) -> Result<T> {
    self.validate(&value)?;
    Ok(serde_json::from_value(value)?)
  }
}

// ─── Embedded value shapes ───────────────────────────────────────────────────

pub static POSITION: RecordShape = RecordShape {
  name:   "Position",
  fields: &[
    Field::required("x", ValueShape::Number),
    Field::required("y", ValueShape::Number),
  ],
};

/// A visual node placed on a journey map canvas.
pub static ELEMENT: RecordShape = RecordShape {
  name:   "Element",
  fields: &[
    Field::required("id", ValueShape::String),
    Field::required("title", ValueShape::String),
    Field::required("description", ValueShape::String),
    Field::required("position", ValueShape::Record(&POSITION)),
    Field::required("width", ValueShape::Number),
    Field::required("height", ValueShape::Number),
    Field::optional("color", ValueShape::String),
    Field::optional("category", ValueShape::String),
    Field::optional("duration", ValueShape::Number),
    Field::optional("durationUnit", ValueShape::String),
    Field::optional("notes", ValueShape::String),
  ],
};

/// A directed edge between two elements of the same map, by element id.
pub static CONNECTION: RecordShape = RecordShape {
  name:   "Connection",
  fields: &[
    Field::required("id", ValueShape::String),
    Field::required("sourceId", ValueShape::String),
    Field::required("targetId", ValueShape::String),
  ],
};

pub static ELEMENT_ITEM: ValueShape = ValueShape::Record(&ELEMENT);

pub static CONNECTION_ITEM: ValueShape = ValueShape::Record(&CONNECTION);
