//! Persisted shapes and the insert shapes picked from them.
//!
//! The tables here are the authoritative column layout of everything stored.
//!
//! A storage layer reads these descriptors to create, query and update rows
//! (see [`crate::ddl`] for the SQL rendering). A column must be declared here
//! before any stored record may carry it.

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::{
  Error, Result,
  journey_map::{DEFAULT_COMPLEXITY, DEFAULT_STYLE},
  shape::{CONNECTION_ITEM, ELEMENT_ITEM, Field, Presence, ValueShape},
  validate::{self, ValidationErrors},
};

// ─── Column metadata ─────────────────────────────────────────────────────────

/// Storage type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
  /// Auto-incrementing 32-bit integer key.
  Serial,
  Text,
  Integer,
  /// Structured JSON document.
  Jsonb,
  Timestamp,
}

/// Value written by the storage engine when an insert omits the column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ColumnDefault {
  Text(&'static str),
  /// The time of the insert.
  Now,
}

/// A reference to another table's column. Declared only; enforcement and
/// cascading behavior belong to the storage engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Reference {
  pub table:  &'static str,
  pub column: &'static str,
}

/// A single stored column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Column {
  /// Field name on the wire and in insert payloads (camelCase).
  pub field:       &'static str,
  /// Column name in the database (snake_case).
  pub name:        &'static str,
  pub ty:          ColumnType,
  /// Shape of the column's value as seen by validation.
  pub value:       ValueShape,
  pub not_null:    bool,
  pub unique:      bool,
  pub primary_key: bool,
  pub default:     Option<ColumnDefault>,
  pub references:  Option<Reference>,
  /// Assigned by the system; never accepted from callers.
  pub generated:   bool,
}

impl Column {
  const fn new(
    field: &'static str,
    name: &'static str,
    ty: ColumnType,
    value: ValueShape,
  ) -> Self {
    Self {
      field,
      name,
      ty,
      value,
      not_null: false,
      unique: false,
      primary_key: false,
      default: None,
      references: None,
      generated: false,
    }
  }

  const fn serial_key(field: &'static str, name: &'static str) -> Self {
    Self {
      not_null: true,
      primary_key: true,
      generated: true,
      ..Self::new(field, name, ColumnType::Serial, ValueShape::Integer)
    }
  }

  const fn not_null(self) -> Self { Self { not_null: true, ..self } }

  const fn unique(self) -> Self { Self { unique: true, ..self } }

  const fn with_default(self, default: ColumnDefault) -> Self {
    Self { default: Some(default), ..self }
  }

  const fn references(self, table: &'static str, column: &'static str) -> Self {
    Self { references: Some(Reference { table, column }), ..self }
  }

  const fn generated(self) -> Self { Self { generated: true, ..self } }

  /// Presence rule of this column in an insert payload: nullable columns
  /// accept `null`, columns with a default may be omitted, the rest are
  /// required.
  pub fn insert_presence(&self) -> Presence {
    if !self.not_null {
      Presence::Nullable
    } else if self.default.is_some() {
      Presence::Optional
    } else {
      Presence::Required
    }
  }

  /// Presence rule of this column in a stored row: every column is present,
  /// nullable ones may hold `null`.
  pub fn row_presence(&self) -> Presence {
    if self.not_null {
      Presence::Required
    } else {
      Presence::Nullable
    }
  }
}

// ─── Tables ──────────────────────────────────────────────────────────────────

/// The persisted shape of one table.
#[derive(Debug, PartialEq, Serialize)]
pub struct Table {
  pub name:    &'static str,
  pub columns: &'static [Column],
}

impl Table {
  pub fn column(&self, field: &str) -> Option<&'static Column> {
    self.columns.iter().find(|c| c.field == field)
  }

  pub fn field_names(&self) -> impl Iterator<Item = &'static str> {
    self.columns.iter().map(|c| c.field)
  }

  /// Fields callers may supply: every column not marked generated.
  pub fn insertable_fields(&self) -> impl Iterator<Item = &'static str> {
    self.columns.iter().filter(|c| !c.generated).map(|c| c.field)
  }

  /// Field descriptors of a complete stored row.
  pub fn row_fields(&self) -> Vec<Field> {
    self
      .columns
      .iter()
      .map(|c| Field { name: c.field, shape: c.value, presence: c.row_presence() })
      .collect()
  }

  /// Check a full stored row (as read back from storage) against this table.
  pub fn validate_row(&self, value: &Value) -> Result<(), ValidationErrors> {
    validate::validate_fields(self.name, &self.row_fields(), value)
  }
}

pub static USERS: Table = Table {
  name:    "users",
  columns: &[
    Column::serial_key("id", "id"),
    Column::new("username", "username", ColumnType::Text, ValueShape::String)
      .not_null()
      .unique(),
    Column::new("password", "password", ColumnType::Text, ValueShape::String).not_null(),
  ],
};

pub static JOURNEY_MAPS: Table = Table {
  name:    "journey_maps",
  columns: &[
    Column::serial_key("id", "id"),
    Column::new("title", "title", ColumnType::Text, ValueShape::String).not_null(),
    Column::new("description", "description", ColumnType::Text, ValueShape::String)
      .not_null(),
    Column::new("style", "style", ColumnType::Text, ValueShape::String)
      .with_default(ColumnDefault::Text(DEFAULT_STYLE)),
    Column::new("complexity", "complexity", ColumnType::Text, ValueShape::String)
      .with_default(ColumnDefault::Text(DEFAULT_COMPLEXITY)),
    Column::new("elements", "elements", ColumnType::Jsonb, ValueShape::Array(&ELEMENT_ITEM))
      .not_null(),
    Column::new(
      "connections",
      "connections",
      ColumnType::Jsonb,
      ValueShape::Array(&CONNECTION_ITEM),
    )
    .not_null(),
    Column::new("createdAt", "created_at", ColumnType::Timestamp, ValueShape::Timestamp)
      .with_default(ColumnDefault::Now)
      .generated(),
    Column::new("updatedAt", "updated_at", ColumnType::Timestamp, ValueShape::Timestamp)
      .with_default(ColumnDefault::Now)
      .generated(),
    Column::new("userId", "user_id", ColumnType::Integer, ValueShape::Integer)
      .references("users", "id"),
  ],
};

/// Every table, in creation order (referenced tables first).
pub static TABLES: [&Table; 2] = [&USERS, &JOURNEY_MAPS];

// ─── Insert shapes ───────────────────────────────────────────────────────────

/// Fields a caller supplies when registering a user.
pub const USER_INSERT_FIELDS: &[&str] = &["username", "password"];

/// Fields a caller supplies when creating a journey map.
pub const JOURNEY_MAP_INSERT_FIELDS: &[&str] = &[
  "title",
  "description",
  "style",
  "complexity",
  "elements",
  "connections",
  "userId",
];

/// A validator over an explicit allow-list of a table's columns.
///
/// The allow-list is written out by hand next to the table rather than
/// computed from it; [`InsertShape::pick`] checks it is a subset of the
/// table's caller-settable columns.
#[derive(Debug, PartialEq)]
pub struct InsertShape {
  name:   &'static str,
  table:  &'static Table,
  fields: &'static [&'static str],
}

pub static INSERT_USER: InsertShape = InsertShape {
  name:   "InsertUser",
  table:  &USERS,
  fields: USER_INSERT_FIELDS,
};

pub static INSERT_JOURNEY_MAP: InsertShape = InsertShape {
  name:   "InsertJourneyMap",
  table:  &JOURNEY_MAPS,
  fields: JOURNEY_MAP_INSERT_FIELDS,
};

impl InsertShape {
  /// Build an insert shape from `table`, accepting exactly `fields`.
  ///
  /// Fails if a name is not a column of `table` or names a system-generated
  /// column.
  pub fn pick(
    name: &'static str,
    table: &'static Table,
    fields: &'static [&'static str],
  ) -> Result<Self> {
    let shape = Self { name, table, fields };
    shape.check()?;
    Ok(shape)
  }

  /// Verify the allow-list against the table.
  pub fn check(&self) -> Result<()> {
    for &field in self.fields {
      let column = self.table.column(field).ok_or_else(|| Error::UnknownColumn {
        table: self.table.name,
        field: field.to_owned(),
      })?;
      if column.generated {
        return Err(Error::GeneratedColumn {
          table: self.table.name,
          field: field.to_owned(),
        });
      }
    }
    Ok(())
  }

  pub fn field_names(&self) -> &'static [&'static str] { self.fields }

  /// Allow-listed columns, in table order.
  pub fn columns(&self) -> impl Iterator<Item = &'static Column> + '_ {
    self.table.columns.iter().filter(|c| self.fields.contains(&c.field))
  }

  /// Field descriptors with insert presence rules applied.
  pub fn fields(&self) -> Vec<Field> {
    self
      .columns()
      .map(|c| Field { name: c.field, shape: c.value, presence: c.insert_presence() })
      .collect()
  }

  pub fn validate(&self, value: &Value) -> Result<(), ValidationErrors> {
    validate::validate_fields(self.name, &self.fields(), value)
  }

  /// Validate `value`, then deserialize it into `T`.
  pub fn parse<T: DeserializeOwned>(&self, value: Value) -> Result<T> {
    self.validate(&value)?;
    Ok(serde_json::from_value(value)?)
  }
}

impl Serialize for InsertShape {
  fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    #[derive(Serialize)]
    struct Described<'a> {
      name:   &'a str,
      table:  &'a str,
      fields: Vec<Field>,
    }

    Described { name: self.name, table: self.table.name, fields: self.fields() }
      .serialize(serializer)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn built_in_allow_lists_pass_their_own_check() {
    INSERT_USER.check().unwrap();
    INSERT_JOURNEY_MAP.check().unwrap();
  }

  #[test]
  fn allow_lists_match_caller_settable_columns() {
    let users: Vec<_> = USERS.insertable_fields().collect();
    assert_eq!(users, USER_INSERT_FIELDS);

    let maps: Vec<_> = JOURNEY_MAPS.insertable_fields().collect();
    assert_eq!(maps, JOURNEY_MAP_INSERT_FIELDS);
  }

  #[test]
  fn pick_rejects_unknown_field() {
    let err = InsertShape::pick("Bad", &USERS, &["username", "email"]).unwrap_err();
    assert!(matches!(
      err,
      Error::UnknownColumn { table: "users", ref field } if field == "email"
    ));
  }

  #[test]
  fn pick_rejects_generated_field() {
    let err = InsertShape::pick("Bad", &JOURNEY_MAPS, &["title", "createdAt"]).unwrap_err();
    assert!(matches!(
      err,
      Error::GeneratedColumn { table: "journey_maps", ref field } if field == "createdAt"
    ));
  }

  #[test]
  fn insert_presence_follows_nullability_and_defaults() {
    let presence = |field: &str| JOURNEY_MAPS.column(field).unwrap().insert_presence();
    assert_eq!(presence("title"), Presence::Required);
    assert_eq!(presence("elements"), Presence::Required);
    assert_eq!(presence("style"), Presence::Nullable);
    assert_eq!(presence("userId"), Presence::Nullable);
    assert_eq!(USERS.column("username").unwrap().insert_presence(), Presence::Required);
  }

  #[test]
  fn user_id_references_users() {
    let column = JOURNEY_MAPS.column("userId").unwrap();
    assert_eq!(column.name, "user_id");
    assert_eq!(column.references, Some(Reference { table: "users", column: "id" }));
    assert!(!column.not_null);
  }

  #[test]
  fn timestamps_and_ids_are_generated() {
    let generated: Vec<_> =
      JOURNEY_MAPS.columns.iter().filter(|c| c.generated).map(|c| c.field).collect();
    assert_eq!(generated, ["id", "createdAt", "updatedAt"]);
  }

  #[test]
  fn insert_shape_describes_its_fields() {
    let described = serde_json::to_value(&INSERT_USER).unwrap();
    assert_eq!(described["table"], "users");
    assert_eq!(described["fields"][0]["name"], "username");
    assert_eq!(described["fields"][0]["presence"], "required");
    assert_eq!(described["fields"][0]["shape"]["type"], "string");
  }
}
