//! SQL rendering of the persisted shapes.
//!
//! The DDL is generated from [`crate::table`] so the database layout cannot
//! drift from the descriptors. Statements are idempotent
//! (`CREATE TABLE IF NOT EXISTS`).

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{
  Error,
  table::{Column, ColumnDefault, ColumnType, TABLES, Table},
};

/// Target SQL dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
  #[default]
  Postgres,
  /// JSON and timestamp columns become `TEXT`.
  Sqlite,
}

impl fmt::Display for Dialect {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Self::Postgres => "postgres",
      Self::Sqlite => "sqlite",
    })
  }
}

impl FromStr for Dialect {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_ascii_lowercase().as_str() {
      "postgres" | "postgresql" | "pg" => Ok(Self::Postgres),
      "sqlite" => Ok(Self::Sqlite),
      other => Err(Error::UnknownDialect(other.to_owned())),
    }
  }
}

impl ColumnType {
  pub fn sql(self, dialect: Dialect) -> &'static str {
    match (self, dialect) {
      (Self::Serial, Dialect::Postgres) => "SERIAL",
      (Self::Serial | Self::Integer, Dialect::Sqlite) => "INTEGER",
      (Self::Integer, Dialect::Postgres) => "INTEGER",
      (Self::Text, _) => "TEXT",
      (Self::Jsonb, Dialect::Postgres) => "JSONB",
      (Self::Timestamp, Dialect::Postgres) => "TIMESTAMP",
      (Self::Jsonb | Self::Timestamp, Dialect::Sqlite) => "TEXT",
    }
  }
}

impl Column {
  /// The column definition inside `CREATE TABLE`.
  pub fn ddl(&self, dialect: Dialect) -> String {
    let mut parts = vec![self.name.to_owned(), self.ty.sql(dialect).to_owned()];

    if self.primary_key {
      parts.push(match (dialect, self.ty) {
        (Dialect::Sqlite, ColumnType::Serial) => "PRIMARY KEY AUTOINCREMENT".into(),
        _ => "PRIMARY KEY".into(),
      });
    } else if self.not_null {
      parts.push("NOT NULL".into());
    }
    if self.unique {
      parts.push("UNIQUE".into());
    }
    match self.default {
      Some(ColumnDefault::Text(text)) => {
        parts.push(format!("DEFAULT '{}'", text.replace('\'', "''")));
      }
      Some(ColumnDefault::Now) => parts.push(
        match dialect {
          Dialect::Postgres => "DEFAULT now()",
          Dialect::Sqlite => "DEFAULT CURRENT_TIMESTAMP",
        }
        .into(),
      ),
      None => {}
    }
    if let Some(reference) = self.references {
      parts.push(format!("REFERENCES {}({})", reference.table, reference.column));
    }

    parts.join(" ")
  }
}

impl Table {
  /// `CREATE TABLE IF NOT EXISTS` for this table.
  pub fn ddl(&self, dialect: Dialect) -> String {
    let columns: Vec<String> = self.columns.iter().map(|c| c.ddl(dialect)).collect();
    format!(
      "CREATE TABLE IF NOT EXISTS {} (\n    {}\n);\n",
      self.name,
      columns.join(",\n    ")
    )
  }
}

/// DDL for every table, referenced tables first.
pub fn schema_ddl(dialect: Dialect) -> String {
  TABLES
    .iter()
    .map(|t| t.ddl(dialect))
    .collect::<Vec<_>>()
    .join("\n")
}

#[cfg(test)]
mod tests {
  use rusqlite::{Connection, params};

  use chrono::Utc;
  use serde_json::{Value, json};

  use super::*;
  use crate::{
    journey_map::{DEFAULT_COMPLEXITY, DEFAULT_STYLE, JourneyMap, NewJourneyMap},
    table::{JOURNEY_MAPS, USERS},
  };

  fn sqlite() -> Connection {
    let conn = Connection::open_in_memory().expect("in-memory database");
    conn.execute_batch(&schema_ddl(Dialect::Sqlite)).expect("schema applies");
    conn
  }

  #[test]
  fn postgres_users_table() {
    assert_eq!(
      USERS.ddl(Dialect::Postgres),
      "CREATE TABLE IF NOT EXISTS users (\n    \
       id SERIAL PRIMARY KEY,\n    \
       username TEXT NOT NULL UNIQUE,\n    \
       password TEXT NOT NULL\n);\n"
    );
  }

  #[test]
  fn postgres_journey_map_columns() {
    let ddl = JOURNEY_MAPS.ddl(Dialect::Postgres);
    assert!(ddl.contains("style TEXT DEFAULT 'marker'"));
    assert!(ddl.contains("complexity TEXT DEFAULT 'simple'"));
    assert!(ddl.contains("elements JSONB NOT NULL"));
    assert!(ddl.contains("created_at TIMESTAMP DEFAULT now()"));
    assert!(ddl.contains("user_id INTEGER REFERENCES users(id)"));
  }

  #[test]
  fn users_come_before_journey_maps() {
    let ddl = schema_ddl(Dialect::Postgres);
    let users = ddl.find("TABLE IF NOT EXISTS users").unwrap();
    let maps = ddl.find("TABLE IF NOT EXISTS journey_maps").unwrap();
    assert!(users < maps);
  }

  #[test]
  fn dialect_parses_case_insensitively() {
    assert_eq!("SQLite".parse::<Dialect>().unwrap(), Dialect::Sqlite);
    assert_eq!("pg".parse::<Dialect>().unwrap(), Dialect::Postgres);
    assert!(matches!("mysql".parse::<Dialect>(), Err(Error::UnknownDialect(_))));
  }

  #[test]
  fn sqlite_applies_text_defaults() {
    let conn = sqlite();
    conn
      .execute(
        "INSERT INTO journey_maps (title, description, elements, connections)
         VALUES (?1, ?2, '[]', '[]')",
        params!["Onboarding", "First week"],
      )
      .unwrap();

    let (style, complexity, created_at): (String, String, Option<String>) = conn
      .query_row(
        "SELECT style, complexity, created_at FROM journey_maps",
        [],
        |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
      )
      .unwrap();
    assert_eq!(style, DEFAULT_STYLE);
    assert_eq!(complexity, DEFAULT_COMPLEXITY);
    assert!(created_at.is_some());
  }

  /// Read the only `journey_maps` row back as the JSON a storage layer
  /// hands to [`JourneyMap::from_row`].
  fn stored_map_row(conn: &Connection) -> Value {
    conn
      .query_row(
        "SELECT id, title, description, style, complexity, elements, connections,
                created_at, updated_at, user_id
         FROM journey_maps",
        [],
        |row| {
          let elements: String = row.get(5)?;
          let connections: String = row.get(6)?;
          Ok(json!({
            "id":          row.get::<_, i32>(0)?,
            "title":       row.get::<_, String>(1)?,
            "description": row.get::<_, String>(2)?,
            "style":       row.get::<_, Option<String>>(3)?,
            "complexity":  row.get::<_, Option<String>>(4)?,
            "elements":    serde_json::from_str::<Value>(&elements).unwrap(),
            "connections": serde_json::from_str::<Value>(&connections).unwrap(),
            "createdAt":   row.get::<_, Option<String>>(7)?,
            "updatedAt":   row.get::<_, Option<String>>(8)?,
            "userId":      row.get::<_, Option<i32>>(9)?,
          }))
        },
      )
      .unwrap()
  }

  #[test]
  fn sqlite_defaulted_row_decodes_as_journey_map() {
    let conn = sqlite();
    conn
      .execute(
        "INSERT INTO journey_maps (title, description, elements, connections)
         VALUES ('Onboarding', 'First week', '[]', '[]')",
        [],
      )
      .unwrap();

    let map = JourneyMap::from_row(stored_map_row(&conn)).unwrap();
    assert_eq!(map.id, 1);
    assert_eq!(map.style.as_deref(), Some(DEFAULT_STYLE));
    assert!(map.created_at.is_some());
    assert_eq!(map.created_at, map.updated_at);
  }

  #[test]
  fn explicit_null_style_matches_sqlite() {
    let conn = sqlite();
    conn
      .execute(
        "INSERT INTO journey_maps (title, description, style, elements, connections)
         VALUES ('t', 'd', NULL, '[]', '[]')",
        [],
      )
      .unwrap();
    let stored = JourneyMap::from_row(stored_map_row(&conn)).unwrap();

    let input = NewJourneyMap {
      style: Some(None),
      ..NewJourneyMap::new("t", "d", vec![], vec![])
    };
    let built = JourneyMap::from_insert(1, input, Utc::now());
    assert_eq!(stored.style, None);
    assert_eq!(built.style, stored.style);
    assert_eq!(built.complexity, stored.complexity);
  }

  #[test]
  fn sqlite_enforces_required_columns() {
    let conn = sqlite();
    let result = conn.execute(
      "INSERT INTO journey_maps (title, elements, connections) VALUES ('t', '[]', '[]')",
      [],
    );
    assert!(result.is_err());
  }

  #[test]
  fn sqlite_enforces_unique_username() {
    let conn = sqlite();
    let insert = "INSERT INTO users (username, password) VALUES (?1, ?2)";
    conn.execute(insert, params!["ada", "x"]).unwrap();
    assert!(conn.execute(insert, params!["ada", "y"]).is_err());
  }

  #[test]
  fn sqlite_assigns_serial_ids() {
    let conn = sqlite();
    let insert = "INSERT INTO users (username, password) VALUES (?1, ?2)";
    conn.execute(insert, params!["ada", "x"]).unwrap();
    conn.execute(insert, params!["grace", "y"]).unwrap();
    assert_eq!(conn.last_insert_rowid(), 2);
  }
}
