//! auditrail - audit-capturing unit of work for a JSON entity store
//!
//! Every create, update and delete committed through the audited commit is
//! recorded with its key values, old and new field values, and the actor
//! and method that caused it. Store-generated values such as identity keys
//! are reconciled into the records after the primary write.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `config`: Path resolution and settings, including the schema registry
//! - `error`: Custom error types
//! - `models`: Entity schemas, identifiers and the actor context
//! - `storage`: JSON table storage and the unit of work
//! - `audit`: Change capture, reconciliation and the audit log
//! - `display`: Terminal tables
//! - `export`: Audit log export (JSON, YAML, CSV)
//! - `cli`: Command handlers for the `auditrail` binary
//!
//! # Example
//!
//! ```rust,ignore
//! use auditrail::config::{AuditrailPaths, Settings};
//! use auditrail::models::ActorContext;
//! use auditrail::storage::Database;
//!
//! let paths = AuditrailPaths::new()?;
//! let settings = Settings::load_or_create(&paths)?;
//! let db = Database::open(paths, settings)?;
//!
//! let mut uow = db.begin();
//! uow.add("Product", row)?;
//! let report = db.pipeline().commit(&mut uow, Some(&ActorContext::new("u-1", "POST")))?;
//! ```

pub mod audit;
pub mod cli;
pub mod config;
pub mod display;
pub mod error;
pub mod export;
pub mod models;
pub mod storage;

pub use error::{AuditrailError, AuditrailResult};
