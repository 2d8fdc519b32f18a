//! User settings for auditrail
//!
//! Holds the entity schema registry and the knobs of the audit pipeline.

use serde::{Deserialize, Serialize};

use super::paths::AuditrailPaths;
use crate::error::AuditrailError;
use crate::models::{EntitySchema, SOFT_DELETE_METHOD};

/// User settings for auditrail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Schema version for migration support
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Method token that turns a modification into a delete
    #[serde(default = "default_soft_delete_method")]
    pub soft_delete_method: String,

    /// Entity kind of audit records themselves, never audited
    #[serde(default = "default_audit_entity_kind")]
    pub audit_entity_kind: String,

    /// Keep records whose audit write failed in the outbox file
    #[serde(default = "default_outbox_enabled")]
    pub outbox_enabled: bool,

    /// Registered entity kinds
    #[serde(default = "EntitySchema::defaults")]
    pub entities: Vec<EntitySchema>,
}

fn default_schema_version() -> u32 {
    1
}

fn default_soft_delete_method() -> String {
    SOFT_DELETE_METHOD.to_string()
}

fn default_audit_entity_kind() -> String {
    "AuditLog".to_string()
}

fn default_outbox_enabled() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            soft_delete_method: default_soft_delete_method(),
            audit_entity_kind: default_audit_entity_kind(),
            outbox_enabled: default_outbox_enabled(),
            entities: EntitySchema::defaults(),
        }
    }
}

impl Settings {
    /// Look up a registered schema by kind
    pub fn schema(&self, kind: &str) -> Option<&EntitySchema> {
        self.entities.iter().find(|s| s.kind == kind)
    }

    /// Validate every registered schema
    pub fn validate(&self) -> Result<(), AuditrailError> {
        for schema in &self.entities {
            schema
                .validate()
                .map_err(|e| AuditrailError::Config(e.to_string()))?;
        }

        Ok(())
    }

    /// Load settings from disk, or create default settings if file doesn't exist
    pub fn load_or_create(paths: &AuditrailPaths) -> Result<Self, AuditrailError> {
        let settings_path = paths.settings_file();

        if settings_path.exists() {
            let contents = std::fs::read_to_string(&settings_path).map_err(|e| {
                AuditrailError::Io(format!("Failed to read settings file: {}", e))
            })?;

            let settings: Settings = serde_json::from_str(&contents).map_err(|e| {
                AuditrailError::Config(format!("Failed to parse settings file: {}", e))
            })?;

            settings.validate()?;
            Ok(settings)
        } else {
            // Don't save yet - let caller decide when to persist
            Ok(Settings::default())
        }
    }

    /// Save settings to disk
    pub fn save(&self, paths: &AuditrailPaths) -> Result<(), AuditrailError> {
        paths.ensure_directories()?;

        let settings_path = paths.settings_file();
        let contents = serde_json::to_string_pretty(self).map_err(|e| {
            AuditrailError::Config(format!("Failed to serialize settings: {}", e))
        })?;

        std::fs::write(&settings_path, contents).map_err(|e| {
            AuditrailError::Io(format!("Failed to write settings file: {}", e))
        })?;

        Ok(())
    }
}
