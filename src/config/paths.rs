//! Path management for auditrail
//!
//! ## Path Resolution Order
//!
//! 1. `AUDITRAIL_DATA_DIR` environment variable (if set)
//! 2. The platform configuration directory (`~/.config/auditrail` on Linux,
//!    `%APPDATA%\auditrail` on Windows)

use std::path::PathBuf;

use directories::BaseDirs;

use crate::error::AuditrailError;

/// Environment variable that overrides the base directory
pub const DATA_DIR_ENV: &str = "AUDITRAIL_DATA_DIR";

/// Manages all paths used by auditrail
#[derive(Debug, Clone)]
pub struct AuditrailPaths {
    /// Base directory for all auditrail data
    base_dir: PathBuf,
}

impl AuditrailPaths {
    /// Create a new AuditrailPaths instance
    ///
    /// # Errors
    ///
    /// Returns an error if no home directory can be determined and no
    /// override is set.
    pub fn new() -> Result<Self, AuditrailError> {
        let base_dir = if let Ok(custom) = std::env::var(DATA_DIR_ENV) {
            PathBuf::from(custom)
        } else {
            resolve_default_path()?
        };

        Ok(Self { base_dir })
    }

    /// Create AuditrailPaths with a custom base directory (useful for testing)
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Get the base directory
    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Get the data directory (<base>/data/)
    pub fn data_dir(&self) -> PathBuf {
        self.base_dir.join("data")
    }

    /// Get the path to the settings file
    pub fn settings_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    /// Get the path to the entity tables
    pub fn tables_file(&self) -> PathBuf {
        self.data_dir().join("tables.json")
    }

    /// Get the path to the audit log
    pub fn audit_log(&self) -> PathBuf {
        self.base_dir.join("audit.log")
    }

    /// Get the path to the outbox holding undelivered audit records
    pub fn audit_outbox(&self) -> PathBuf {
        self.base_dir.join("audit.outbox.log")
    }

    /// Ensure the base and data directories exist
    pub fn ensure_directories(&self) -> Result<(), AuditrailError> {
        std::fs::create_dir_all(&self.base_dir)
            .map_err(|e| AuditrailError::Io(format!("Failed to create base directory: {}", e)))?;

        std::fs::create_dir_all(self.data_dir())
            .map_err(|e| AuditrailError::Io(format!("Failed to create data directory: {}", e)))?;

        Ok(())
    }

    /// Check if auditrail has been initialized (config file exists)
    pub fn is_initialized(&self) -> bool {
        self.settings_file().exists()
    }
}

fn resolve_default_path() -> Result<PathBuf, AuditrailError> {
    let dirs = BaseDirs::new()
        .ok_or_else(|| AuditrailError::Config("Could not determine home directory".into()))?;
    Ok(dirs.config_dir().join("auditrail"))
}
