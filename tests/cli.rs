use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn tally(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("tally").unwrap();
    cmd.env("HOME", home.path())
        .env("NO_COLOR", "1")
        .env_remove("TALLY_LOG");
    cmd
}

fn initialized() -> TempDir {
    let home = tempfile::tempdir().unwrap();
    let data_dir = home.path().join("data");
    tally(&home)
        .args(["init", "--data-dir", data_dir.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created account 'Checking'"));
    home
}

#[test]
fn commands_require_init() {
    let home = tempfile::tempdir().unwrap();
    tally(&home)
        .args(["accounts", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("tally init"));
}

#[test]
fn init_creates_default_account() {
    let home = initialized();
    tally(&home)
        .args(["accounts", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Checking"))
        .stdout(predicate::str::contains("$0.00"));
    // second init leaves the existing account alone
    tally(&home)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("nothing to create"));
}

#[test]
fn rollover_carries_balance() {
    let home = initialized();
    tally(&home).args(["tx", "add", "Paycheck", "200.00"]).assert().success();
    tally(&home).args(["tx", "add", "Groceries", "-50"]).assert().success();
    tally(&home)
        .arg("balance")
        .assert()
        .success()
        .stdout(predicate::str::contains("$150.00"));

    tally(&home)
        .args(["periods", "rollover"])
        .assert()
        .success()
        .stdout(predicate::str::contains("opening balance $150.00"));
    tally(&home)
        .args(["balance", "--all"])
        .assert()
        .success()
        .stdout(predicate::str::contains("$300.00"));
}

#[test]
fn recurring_applies_once() {
    let home = initialized();
    tally(&home)
        .args(["recurring", "add", "Rent", "-1200.00", "--day", "1"])
        .assert()
        .success();
    tally(&home)
        .args(["recurring", "apply", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("-$1,200.00"));
    tally(&home)
        .args(["recurring", "apply", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already accounted for"));
}

#[test]
fn default_account_and_opening_balance_are_protected() {
    let home = initialized();
    tally(&home)
        .args(["accounts", "delete", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Forbidden"));
    tally(&home)
        .args(["tx", "delete", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Forbidden"));
}

#[test]
fn export_writes_csv() {
    let home = initialized();
    tally(&home).args(["tx", "add", "Coffee", "-4.50"]).assert().success();
    let out = home.path().join("register.csv");
    tally(&home)
        .args(["export", "--output", out.to_str().unwrap()])
        .assert()
        .success();
    let text = std::fs::read_to_string(out).unwrap();
    assert!(text.starts_with("id,date,name,amount"));
    assert!(text.contains("Coffee,-4.50"));
}

#[test]
fn status_reports_counts() {
    let home = initialized();
    tally(&home)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Accounts:      1"))
        .stdout(predicate::str::contains("Open periods:  1"));
}
