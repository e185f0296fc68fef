use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

use invoice_cli::config::paths::DATA_DIR_ENV;

fn invoice(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("invoice").unwrap();
    cmd.env(DATA_DIR_ENV, home.path()).env("RUST_LOG", "off");
    cmd
}

fn stdout_of(cmd: &mut Command) -> String {
    let output = cmd.assert().success().get_output().stdout.clone();
    String::from_utf8(output).unwrap()
}

fn write_pdf(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, b"%PDF-1.4 receipt").unwrap();
    path
}

fn attachment_count(home: &TempDir) -> usize {
    fs::read_dir(home.path().join("invoices_pdf")).unwrap().count()
}

fn snapshot_count(home: &TempDir) -> usize {
    fs::read_dir(home.path().join("backups"))
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().ends_with(".db"))
        .count()
}

#[test]
fn add_list_filter_delete() {
    let home = TempDir::new().unwrap();
    let files = TempDir::new().unwrap();
    let receipt = write_pdf(files.path(), "toner.pdf");

    invoice(&home)
        .args(["add", "Printer toner", "100", "--pdf"])
        .arg(&receipt)
        .assert()
        .success()
        .stdout(predicate::str::contains("ID: 1"));
    invoice(&home)
        .args(["add", "Stapler", "50", "--platform", "JD"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ID: 2"));

    assert_eq!(attachment_count(&home), 1);
    assert!(receipt.exists());

    // Newest first
    let listing = stdout_of(invoice(&home).arg("list"));
    let stapler = listing.find("Stapler").unwrap();
    let toner = listing.find("Printer toner").unwrap();
    assert!(stapler < toner);
    assert!(listing.contains("2 invoices   Total: ¥ 150.00"));

    invoice(&home)
        .args(["list", "--search", "TONER"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Printer toner"))
        .stdout(predicate::str::contains("Stapler").not());

    invoice(&home)
        .args(["delete", "1", "--force"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Deleted invoice 1"));

    assert_eq!(attachment_count(&home), 0);
    invoice(&home)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("Printer toner").not())
        .stdout(predicate::str::contains("1 invoice   Total: ¥ 50.00"));
}

#[test]
fn delete_without_force_keeps_record() {
    let home = TempDir::new().unwrap();
    invoice(&home).args(["add", "Taxi", "35"]).assert().success();

    invoice(&home)
        .args(["delete", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--force"));

    invoice(&home)
        .args(["show", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Content:     Taxi"));
}

#[test]
fn add_rejects_invalid_input() {
    let home = TempDir::new().unwrap();
    let files = TempDir::new().unwrap();

    invoice(&home)
        .args(["add", "  ", "10"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Validation error"));
    invoice(&home)
        .args(["add", "Taxi", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Validation error"));
    invoice(&home)
        .args(["add", "Taxi", "ten"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid amount"));
    invoice(&home)
        .args(["add", "Taxi", "10", "--type", "borrowed"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown expense type"));

    let image = files.path().join("photo.png");
    fs::write(&image, b"png").unwrap();
    invoice(&home)
        .args(["add", "Taxi", "10", "--pdf"])
        .arg(&image)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Attachment error"));

    invoice(&home)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("No invoices found."));
}

#[test]
fn sort_toggles_direction() {
    let home = TempDir::new().unwrap();
    invoice(&home).args(["add", "Mid", "20"]).assert().success();
    invoice(&home).args(["add", "Big", "1,000"]).assert().success();
    invoice(&home).args(["add", "Small", "3"]).assert().success();

    let order = |listing: &str| -> Vec<usize> {
        ["Big", "Mid", "Small"]
            .iter()
            .map(|name| listing.find(name).unwrap())
            .collect()
    };

    // First sort of a column is descending
    let descending = order(&stdout_of(invoice(&home).args(["list", "--sort", "amount"])));
    assert!(descending[0] < descending[1] && descending[1] < descending[2]);

    let ascending = order(&stdout_of(
        invoice(&home).args(["list", "--sort", "amount", "--sort", "amount"]),
    ));
    assert!(ascending[2] < ascending[1] && ascending[1] < ascending[0]);

    invoice(&home)
        .args(["list", "--sort", "colour"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown column"));
}

#[test]
fn edit_toggle_and_open() {
    let home = TempDir::new().unwrap();
    let files = TempDir::new().unwrap();
    invoice(&home).args(["add", "Hotel", "200"]).assert().success();

    invoice(&home)
        .args(["open", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("has no attachment"));

    let receipt = write_pdf(files.path(), "hotel.pdf");
    invoice(&home)
        .args(["edit", "1", "--amount", "250.5", "--pdf"])
        .arg(&receipt)
        .assert()
        .success();

    invoice(&home)
        .args(["open", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Hotel_250.50.pdf"));

    invoice(&home)
        .args(["toggle", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("now reimbursed"));

    invoice(&home)
        .args(["show", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Amount:      ¥ 250.50"))
        .stdout(predicate::str::contains("Reimbursed:  Yes"));

    invoice(&home)
        .args(["edit", "1", "--remove-pdf"])
        .assert()
        .success();
    assert_eq!(attachment_count(&home), 0);

    invoice(&home)
        .args(["show", "42"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invoice not found: 42"));
}

#[test]
fn backups_are_bounded_and_restorable() {
    let home = TempDir::new().unwrap();
    invoice(&home).args(["add", "Kept", "10"]).assert().success();

    for _ in 0..6 {
        invoice(&home).args(["backup", "create"]).assert().success();
    }
    assert_eq!(snapshot_count(&home), 5);

    invoice(&home)
        .args(["backup", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Total: 5 snapshot(s)"));

    invoice(&home)
        .args(["backup", "info", "latest"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Invoices: 1"));

    invoice(&home).args(["add", "Lost", "20"]).assert().success();

    invoice(&home)
        .args(["backup", "restore", "latest", "--force"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Restored 1 invoices"));

    invoice(&home)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("Kept"))
        .stdout(predicate::str::contains("Lost").not());

    // The pre-restore snapshot pushed the oldest one out
    assert_eq!(snapshot_count(&home), 5);
}

#[test]
fn export_csv_and_json() {
    let home = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    invoice(&home)
        .args(["add", "Taxi, airport", "35", "--type", "自费"])
        .assert()
        .success();

    let csv_path = out.path().join("invoices.csv");
    invoice(&home)
        .args(["export", "csv", "--output"])
        .arg(&csv_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Exported 1 invoices"));
    let csv = fs::read_to_string(&csv_path).unwrap();
    assert!(csv.starts_with("ID,Content,Platform,Type,Amount"));
    assert!(csv.contains("\"Taxi, airport\""));
    assert!(csv.contains("self-paid"));

    invoice(&home)
        .args(["export", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"invoice_count\":1"));

    let json_path = out.path().join("invoices.json");
    invoice(&home)
        .args(["export", "json", "--pretty", "--output"])
        .arg(&json_path)
        .assert()
        .success();
    invoice(&home)
        .args(["export", "verify"])
        .arg(&json_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Invoices:       1"));

    fs::write(&json_path, "{not json").unwrap();
    invoice(&home)
        .args(["export", "verify"])
        .arg(&json_path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid export file"));

    invoice(&home)
        .args(["list", "--search", "自费"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Taxi, airport"));
}

#[test]
fn session_runs_scheduler_and_quits() {
    let home = TempDir::new().unwrap();
    invoice(&home).args(["add", "Taxi", "35"]).assert().success();

    invoice(&home)
        .arg("session")
        .write_stdin("search taxi\nstatus\nquit\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("invoice> "))
        .stdout(predicate::str::contains("1 invoice   Total: ¥ 35.00"))
        .stdout(predicate::str::contains("Scheduler:"));

    // The scheduler snapshots as soon as it starts
    assert_eq!(snapshot_count(&home), 1);
}

#[test]
fn config_shows_paths() {
    let home = TempDir::new().unwrap();

    invoice(&home)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialization complete!"));
    assert!(home.path().join("config.json").exists());

    invoice(&home)
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("Snapshots kept:   5"))
        .stdout(predicate::str::contains("invoices.db"));
}
