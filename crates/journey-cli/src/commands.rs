//! Subcommand implementations. Each writes its result to `out` so the
//! binary can target stdout and tests can target a buffer.

use std::{
  io::{self, Read as _, Write},
  path::Path,
};

use anyhow::Context as _;
use clap::ValueEnum;
use journey_core::{
  ValidationOptions,
  ddl::{Dialect, schema_ddl},
  element::{Connection, Element},
  journey_map::{JourneyMap, NewJourneyMap},
  shape::{CONNECTION, ELEMENT},
  table::{INSERT_JOURNEY_MAP, INSERT_USER, JOURNEY_MAPS, USERS},
  user::{NewUser, User},
};
use serde::Serialize;
use serde_json::{Value, json};

/// Every shape the tool can describe or validate against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ShapeName {
  /// A stored `users` row.
  User,
  /// A stored `journey_maps` row.
  JourneyMap,
  InsertUser,
  InsertJourneyMap,
  Element,
  Connection,
}

/// Result of `validate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
  Accepted,
  Rejected,
}

// ─── ddl ─────────────────────────────────────────────────────────────────────

pub fn ddl(dialect: Dialect, out: &mut impl Write) -> anyhow::Result<()> {
  write!(out, "{}", schema_ddl(dialect))?;
  Ok(())
}

// ─── describe ────────────────────────────────────────────────────────────────

pub fn describe(shape: ShapeName, out: &mut impl Write) -> anyhow::Result<()> {
  let described = match shape {
    ShapeName::User => serde_json::to_value(&USERS)?,
    ShapeName::JourneyMap => serde_json::to_value(&JOURNEY_MAPS)?,
    ShapeName::InsertUser => serde_json::to_value(&INSERT_USER)?,
    ShapeName::InsertJourneyMap => serde_json::to_value(&INSERT_JOURNEY_MAP)?,
    ShapeName::Element => serde_json::to_value(&ELEMENT)?,
    ShapeName::Connection => serde_json::to_value(&CONNECTION)?,
  };
  write_json(out, &described)
}

// ─── validate ────────────────────────────────────────────────────────────────

/// Validate `input` as `shape`. On success the decoded value is echoed back;
/// on failure the violation list is written as `{"violations": [...]}`.
pub fn validate(
  shape: ShapeName,
  input: &str,
  options: &ValidationOptions,
  out: &mut impl Write,
) -> anyhow::Result<Outcome> {
  let payload: Value = serde_json::from_str(input).context("input is not valid JSON")?;

  let decoded = match shape {
    ShapeName::User => reencode(User::from_row(payload)),
    ShapeName::JourneyMap => reencode(JourneyMap::from_row(payload)),
    ShapeName::InsertUser => reencode(NewUser::from_json(payload)),
    ShapeName::InsertJourneyMap => reencode(NewJourneyMap::from_json_with(payload, options)),
    ShapeName::Element => reencode(Element::from_json(payload)),
    ShapeName::Connection => reencode(Connection::from_json(payload)),
  };

  match decoded {
    Ok(value) => {
      tracing::debug!(?shape, "payload accepted");
      write_json(out, &value)?;
      Ok(Outcome::Accepted)
    }
    Err(err) => match err.violations() {
      Some(errors) => {
        tracing::info!(?shape, violations = errors.len(), "payload rejected");
        write_json(out, &json!({ "violations": errors }))?;
        Ok(Outcome::Rejected)
      }
      None => Err(err.into()),
    },
  }
}

/// Read the payload from `file`, or stdin when absent or `-`.
pub fn read_input(file: Option<&Path>) -> anyhow::Result<String> {
  match file {
    Some(path) if path != Path::new("-") => std::fs::read_to_string(path)
      .with_context(|| format!("failed to read {}", path.display())),
    _ => {
      let mut input = String::new();
      io::stdin()
        .read_to_string(&mut input)
        .context("failed to read stdin")?;
      Ok(input)
    }
  }
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

fn reencode<T: Serialize>(decoded: journey_core::Result<T>) -> journey_core::Result<Value> {
  Ok(serde_json::to_value(decoded?)?)
}

fn write_json(out: &mut impl Write, value: &Value) -> anyhow::Result<()> {
  serde_json::to_writer_pretty(&mut *out, value)?;
  writeln!(out)?;
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  fn run_validate(shape: ShapeName, input: &str, strict: bool) -> (Outcome, Value) {
    let mut out = Vec::new();
    let options = ValidationOptions { strict_references: strict };
    let outcome = validate(shape, input, &options, &mut out).unwrap();
    (outcome, serde_json::from_slice(&out).unwrap())
  }

  const DANGLING_MAP: &str = r#"{
    "title": "Onboarding",
    "description": "",
    "elements": [{ "id": "e1", "title": "Start", "description": "",
                   "position": { "x": 0, "y": 0 }, "width": 100, "height": 50 }],
    "connections": [{ "id": "c1", "sourceId": "e1", "targetId": "missing" }]
  }"#;

  #[test]
  fn ddl_renders_requested_dialect() {
    let mut out = Vec::new();
    ddl(Dialect::Sqlite, &mut out).unwrap();
    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("CREATE TABLE IF NOT EXISTS users"));
    assert!(text.contains("id INTEGER PRIMARY KEY AUTOINCREMENT"));
    assert!(text.contains("elements TEXT NOT NULL"));
  }

  #[test]
  fn describe_element_lists_optional_fields() {
    let mut out = Vec::new();
    describe(ShapeName::Element, &mut out).unwrap();
    let described: Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(described["name"], "Element");
    let unit = described["fields"]
      .as_array()
      .unwrap()
      .iter()
      .find(|f| f["name"] == "durationUnit")
      .unwrap();
    assert_eq!(unit["presence"], "optional");
  }

  #[test]
  fn valid_insert_user_is_echoed() {
    let (outcome, out) =
      run_validate(ShapeName::InsertUser, r#"{"username":"ada","password":"x"}"#, false);
    assert_eq!(outcome, Outcome::Accepted);
    assert_eq!(out, json!({ "username": "ada", "password": "x" }));
  }

  #[test]
  fn rejected_payload_lists_violations() {
    let (outcome, out) = run_validate(ShapeName::InsertUser, r#"{"username":1}"#, false);
    assert_eq!(outcome, Outcome::Rejected);
    assert_eq!(
      out["violations"],
      json!([
        { "path": "username", "kind": "type_mismatch", "expected": "string", "found": "number" },
        { "path": "password", "kind": "missing_field" },
      ])
    );
  }

  #[test]
  fn strict_references_follow_options() {
    let (outcome, _) = run_validate(ShapeName::InsertJourneyMap, DANGLING_MAP, false);
    assert_eq!(outcome, Outcome::Accepted);

    let (outcome, out) = run_validate(ShapeName::InsertJourneyMap, DANGLING_MAP, true);
    assert_eq!(outcome, Outcome::Rejected);
    assert_eq!(out["violations"][0]["path"], "connections[0].targetId");
    assert_eq!(out["violations"][0]["kind"], "dangling_reference");
  }

  #[test]
  fn malformed_json_is_an_error() {
    let mut out = Vec::new();
    let result = validate(ShapeName::Element, "{", &ValidationOptions::default(), &mut out);
    assert!(result.is_err());
    assert!(out.is_empty());
  }
}
