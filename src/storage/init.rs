//! Storage initialization
//!
//! Handles first-run setup and seed data

use serde_json::json;

use crate::config::{AuditrailPaths, Settings};
use crate::error::AuditrailResult;
use crate::models::Row;

use super::session::Database;

/// Categories present in a fresh installation
const SEED_CATEGORIES: &[&str] = &["Electronics", "Books"];

/// Initialize storage for a fresh installation
///
/// Writes default settings when they are missing and seeds categories into
/// an empty `Category` table. Seed rows go through a plain commit and are
/// not audited.
pub fn initialize_storage(paths: &AuditrailPaths, settings: &Settings) -> AuditrailResult<()> {
    paths.ensure_directories()?;

    if needs_initialization(paths) {
        settings.save(paths)?;
    }

    let db = Database::open(paths.clone(), settings.clone())?;
    seed_categories(&db)?;

    Ok(())
}

fn seed_categories(db: &Database) -> AuditrailResult<()> {
    let Ok(schema) = db.schema("Category") else {
        return Ok(());
    };
    if schema.field("name").is_none() || db.count("Category")? > 0 {
        return Ok(());
    }

    let mut uow = db.begin();
    for name in SEED_CATEGORIES {
        let mut row = Row::new();
        row.insert("name".into(), json!(name));
        uow.add("Category", row)?;
    }
    let report = db.pipeline().commit(&mut uow, None)?;

    tracing::info!(count = report.rows_affected, "seeded default categories");
    Ok(())
}

/// Check if storage needs initialization
pub fn needs_initialization(paths: &AuditrailPaths) -> bool {
    !paths.settings_file().exists()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EntitySchema, FieldSchema, Generated};
    use tempfile::TempDir;

    #[test]
    fn test_initialize_seeds_categories() {
        let temp_dir = TempDir::new().unwrap();
        let paths = AuditrailPaths::with_base_dir(temp_dir.path().to_path_buf());
        assert!(needs_initialization(&paths));

        initialize_storage(&paths, &Settings::default()).unwrap();

        assert!(!needs_initialization(&paths));
        let db = Database::open(paths, Settings::default()).unwrap();
        let rows = db.rows("Category").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["name"], json!("Electronics"));
        assert_eq!(rows[0]["id"], json!(1));
        assert_eq!(rows[1]["id"], json!(2));
        assert!(!db.audit_log().exists());
    }

    #[test]
    fn test_seed_rows_get_generated_values() {
        let temp_dir = TempDir::new().unwrap();
        let paths = AuditrailPaths::with_base_dir(temp_dir.path().to_path_buf());

        initialize_storage(&paths, &Settings::default()).unwrap();

        let db = Database::open(paths, Settings::default()).unwrap();
        for row in db.rows("Category").unwrap() {
            assert!(row["created_at"].is_string());
        }
    }

    #[test]
    fn test_seed_follows_custom_category_schema() {
        let temp_dir = TempDir::new().unwrap();
        let paths = AuditrailPaths::with_base_dir(temp_dir.path().to_path_buf());
        let mut settings = Settings::default();
        settings.entities.retain(|s| s.kind != "Category");
        settings.entities.push(EntitySchema::new(
            "Category",
            vec![
                FieldSchema::new("code").key().generated(Generated::Identity),
                FieldSchema::new("name").required(),
            ],
        ));

        initialize_storage(&paths, &settings).unwrap();

        let db = Database::open(paths, settings).unwrap();
        let rows = db.rows("Category").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["code"], json!(1));
        assert!(!rows[0].contains_key("id"));
    }

    #[test]
    fn test_initialize_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let paths = AuditrailPaths::with_base_dir(temp_dir.path().to_path_buf());

        initialize_storage(&paths, &Settings::default()).unwrap();
        initialize_storage(&paths, &Settings::default()).unwrap();

        let db = Database::open(paths, Settings::default()).unwrap();
        assert_eq!(db.rows("Category").unwrap().len(), 2);
        assert_eq!(db.count("Category").unwrap(), 2);
    }
}
