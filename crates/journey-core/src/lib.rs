//! Data model for the journey-map application.
//!
//! Every entity is described in one place, in three views:
//!
//! - persisted shapes ([`table`]): the column layout a storage layer
//!   creates and queries, rendered to SQL by [`ddl`];
//! - insert shapes ([`table::INSERT_USER`], [`table::INSERT_JOURNEY_MAP`]) and
//!   embedded value shapes ([`shape`]), which validate untrusted input;
//! - Rust types ([`user`], [`journey_map`], [`element`]) for code that builds
//!   or consumes these values.
//!
//! This crate performs no I/O. All descriptors are immutable `'static` data,
//! safe to share across threads.

pub mod ddl;
pub mod element;
pub mod error;
pub mod journey_map;
pub mod shape;
pub mod table;
pub mod user;
pub mod validate;

pub use error::{Error, Result};
pub use validate::{ValidationErrors, ValidationOptions, Violation, ViolationKind};
