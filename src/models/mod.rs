//! Core data models
//!
//! Entity schemas, identifiers and the actor context attached to audited
//! commits.

pub mod actor;
pub mod ids;
pub mod schema;

pub use actor::{ActorContext, SOFT_DELETE_METHOD};
pub use ids::{AuditRecordId, EntryHandle};
pub use schema::{describe_key, EntitySchema, FieldSchema, Generated, KeyValues, Row};
