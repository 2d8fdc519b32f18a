//! End-to-end tests for the `auditrail` binary

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn auditrail(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("auditrail").unwrap();
    cmd.env("AUDITRAIL_DATA_DIR", dir.path())
        .env_remove("AUDITRAIL_ACTOR")
        .env_remove("AUDITRAIL_LOG");
    cmd
}

fn initialized() -> TempDir {
    let dir = TempDir::new().unwrap();
    auditrail(&dir).arg("init").assert().success();
    dir
}

#[test]
fn init_seeds_categories_without_audit() {
    let dir = TempDir::new().unwrap();

    auditrail(&dir)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialization complete!"));

    auditrail(&dir)
        .args(["show", "Category"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Electronics").and(predicate::str::contains("Books")));

    auditrail(&dir)
        .args(["audit", "log"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No audit records found."));
}

#[test]
fn add_update_delete_are_audited() {
    let dir = initialized();

    auditrail(&dir)
        .args(["--actor", "ana", "add", "Product", "--set", "name=Lamp", "--set", "price=20"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created Product id=1"))
        .stdout(predicate::str::contains("Audited 1 change(s)"));

    auditrail(&dir)
        .args(["--actor", "ana", "update", "Product", "1", "--set", "price=25"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Updated Product id=1"));

    auditrail(&dir)
        .args(["--actor", "ben", "delete", "Product", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Deleted Product id=1"));

    auditrail(&dir)
        .args(["audit", "log"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("CREATE")
                .and(predicate::str::contains("UPDATE"))
                .and(predicate::str::contains("DELETE"))
                .and(predicate::str::contains("ben")),
        );
}

#[test]
fn no_audit_flag_skips_capture() {
    let dir = initialized();

    auditrail(&dir)
        .args(["--no-audit", "add", "Product", "--set", "name=Lamp"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Audited").not());

    auditrail(&dir)
        .args(["audit", "log"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No audit records found."));
}

#[test]
fn soft_delete_keeps_row() {
    let dir = initialized();
    auditrail(&dir)
        .args(["add", "Product", "--set", "name=Lamp", "--set", "is_deleted=false"])
        .assert()
        .success();

    auditrail(&dir)
        .args(["delete", "Product", "1", "--soft"])
        .assert()
        .success();

    auditrail(&dir)
        .args(["show", "Product"])
        .assert()
        .success()
        .stdout(predicate::str::contains("true"));

    auditrail(&dir)
        .args(["audit", "log", "--kind", "Product", "--recent", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("DELETE"));
}

#[test]
fn composite_key_update() {
    let dir = initialized();
    auditrail(&dir)
        .args(["add", "ProductInCategory", "--set", "product_id=1", "--set", "category_id=2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("category_id=2,product_id=1"));

    auditrail(&dir)
        .args(["delete", "ProductInCategory", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("composite key"));

    auditrail(&dir)
        .args(["delete", "ProductInCategory", "product_id=1,category_id=2"])
        .assert()
        .success();
}

#[test]
fn missing_entity_is_an_error() {
    let dir = initialized();

    auditrail(&dir)
        .args(["update", "Product", "99", "--set", "name=x"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));

    auditrail(&dir)
        .args(["show", "Spaceship"])
        .assert()
        .failure();
}

#[test]
fn required_field_violation_fails_without_audit() {
    let dir = initialized();

    auditrail(&dir)
        .args(["add", "Product", "--set", "price=3"])
        .assert()
        .failure();

    auditrail(&dir)
        .args(["show", "Product"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No Product rows found."));
}

#[test]
fn export_formats() {
    let dir = initialized();
    auditrail(&dir)
        .args(["--actor", "ana", "add", "Product", "--set", "name=Lamp"])
        .assert()
        .success();

    auditrail(&dir)
        .args(["audit", "export", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"record_count\": 1"));

    auditrail(&dir)
        .args(["audit", "export", "--format", "yaml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("entity_kind: Product"));

    let output = dir.path().join("audit.csv");
    auditrail(&dir)
        .args(["audit", "export", "--format", "csv", "--output"])
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("Exported 1 audit record(s)"));

    let csv = std::fs::read_to_string(output).unwrap();
    assert!(csv.starts_with("id,timestamp,entity_kind"));
    assert!(csv.contains("CREATE"));
}

#[test]
fn replay_with_empty_outbox() {
    let dir = initialized();

    auditrail(&dir)
        .args(["audit", "replay"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Outbox is empty."));
}

#[test]
fn failed_audit_write_is_reported_and_replayed() {
    let dir = initialized();
    std::fs::create_dir_all(dir.path().join("audit.log")).unwrap();

    auditrail(&dir)
        .args(["add", "Product", "--set", "name=Lamp"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created Product id=1"))
        .stderr(predicate::str::contains("audit replay"));

    std::fs::remove_dir(dir.path().join("audit.log")).unwrap();

    auditrail(&dir)
        .args(["audit", "replay"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Replayed 1 audit record(s)"));

    auditrail(&dir)
        .args(["audit", "log"])
        .assert()
        .success()
        .stdout(predicate::str::contains("CREATE"));
}
