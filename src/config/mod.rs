//! Configuration module for auditrail
//!
//! This module provides configuration management including:
//! - Path resolution for settings, tables and audit logs
//! - Settings persistence, including the entity schema registry

pub mod paths;
pub mod settings;

pub use paths::AuditrailPaths;
pub use settings::Settings;
