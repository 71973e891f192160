//! Binary-level tests for offline CLI behavior

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

const CATALOG: &str = r#"[
    {
        "id": "invoices",
        "name": "Recent Invoices",
        "description": "Invoices in a trailing window",
        "endpoint": "https://api.xero.com/api.xro/2.0/Invoices"
    },
    {
        "id": "contacts",
        "name": "Contacts",
        "endpoint": "https://api.xero.com/api.xro/2.0/Contacts"
    }
]"#;

fn catalog_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("scenarios.json"), CATALOG).unwrap();
    dir
}

fn xeroq() -> Command {
    Command::cargo_bin("xeroq").unwrap()
}

#[test]
fn scenarios_lists_catalog_entries() {
    let dir = catalog_dir();
    xeroq()
        .arg("--catalog")
        .arg(dir.path().join("scenarios.json"))
        .arg("scenarios")
        .assert()
        .success()
        .stdout(predicate::str::contains("invoices"))
        .stdout(predicate::str::contains("Recent Invoices"))
        .stdout(predicate::str::contains("contacts"));
}

#[test]
fn missing_catalog_file_is_a_clear_error() {
    xeroq()
        .arg("--catalog")
        .arg("/nonexistent/scenarios.json")
        .arg("scenarios")
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to load scenario catalog"));
}

#[test]
fn unknown_scenario_names_the_alternatives() {
    let dir = catalog_dir();
    xeroq()
        .arg("--catalog")
        .arg(dir.path().join("scenarios.json"))
        .args(["query", "--scenario", "nope"])
        .env_remove("XERO_CLIENT_ID")
        .env_remove("XERO_CLIENT_SECRET")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown scenario 'nope'"))
        .stderr(predicate::str::contains("invoices"));
}

#[test]
fn missing_credentials_fail_before_any_network_call() {
    let dir = catalog_dir();
    xeroq()
        .arg("--catalog")
        .arg(dir.path().join("scenarios.json"))
        .args(["query", "--scenario", "invoices"])
        .env_remove("XERO_CLIENT_ID")
        .env_remove("XERO_CLIENT_SECRET")
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "Client ID and Client Secret are required",
        ));
}

#[test]
fn malformed_param_is_rejected() {
    let dir = catalog_dir();
    xeroq()
        .arg("--catalog")
        .arg(dir.path().join("scenarios.json"))
        .args(["query", "--scenario", "invoices", "--param", "not-a-pair"])
        .env_remove("XERO_CLIENT_ID")
        .env_remove("XERO_CLIENT_SECRET")
        .assert()
        .failure()
        .stderr(predicate::str::contains("expected name=value"));
}
