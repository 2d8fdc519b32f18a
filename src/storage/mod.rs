//! Storage layer for auditrail
//!
//! Entity rows live in one JSON document replaced atomically on every
//! commit. A `UnitOfWork` tracks pending changes and implements the
//! collaborator traits the audit pipeline works against.

pub mod file_io;
pub mod init;
pub mod session;
pub mod tables;
pub mod tracker;

pub use file_io::{read_json, write_json_atomic};
pub use init::initialize_storage;
pub use session::{parse_key, parse_value, Database, UnitOfWork};
pub use tables::TableRepository;
pub use tracker::{AuditCommit, ChangeTracker, EntityState, Store, TrackedField, TrackedMutation};
