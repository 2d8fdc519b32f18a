//! Display formatting for terminal output
//!
//! Tables for entity rows and audit records.

pub mod audit;
pub mod entity;

pub use audit::{format_audit_details, format_audit_table};
pub use entity::{format_rows, format_value};
