//! CLI command handlers
//!
//! Bridges the clap argument parsing with the storage layer and the audit
//! pipeline.

pub mod audit;
pub mod entity;

pub use audit::{handle_audit_command, AuditCommands, ExportFormat};
pub use entity::{handle_entity_command, AuditOptions, EntityCommands};
