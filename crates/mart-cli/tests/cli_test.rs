//! End-to-end tests of the `stablemart` binary.

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;

fn stablemart(state: &Path) -> Command {
    let mut cmd = Command::cargo_bin("stablemart").expect("binary");
    for var in [
        "STABLEMART_CONFIG",
        "STABLEMART_ACCOUNT",
        "STABLEMART_CHAIN_ID",
        "STABLEMART_ETH_USD",
    ] {
        cmd.env_remove(var);
    }
    cmd.arg("--state-dir").arg(state);
    cmd
}

// ============================================================================
// Full lifecycle
// ============================================================================

#[test]
fn list_quote_buy_round() {
    let dir = tempfile::tempdir().expect("tempdir");
    let state = dir.path();

    stablemart(state)
        .args(["-a", "alice", "mint"])
        .assert()
        .success()
        .stdout("Minted asset #1 to alice\n");

    stablemart(state)
        .args(["-a", "alice", "post", "1", "--usd", "100"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Posted order 0 for asset #1 at 100 USD"));

    stablemart(state)
        .args(["-a", "bob", "faucet", "5"])
        .assert()
        .success()
        .stdout("bob: 5 ETH\n");

    stablemart(state)
        .args(["--eth-usd", "100", "quote", "0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Required:  1 ETH"));

    stablemart(state)
        .args(["--eth-usd", "100", "-a", "bob", "buy", "0", "--payment", "0.99"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("insufficient payment"));

    stablemart(state)
        .args(["--eth-usd", "100", "-a", "bob", "buy", "0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Order 0 filled"));

    stablemart(state)
        .args(["-a", "bob", "owned"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#1"));

    stablemart(state)
        .args(["-a", "alice", "balance"])
        .assert()
        .success()
        .stdout("alice: 1 ETH\n");
}

#[test]
fn cancel_then_buy_fails() {
    let dir = tempfile::tempdir().expect("tempdir");
    let state = dir.path();

    stablemart(state).args(["-a", "alice", "mint"]).assert().success();
    stablemart(state)
        .args(["-a", "alice", "post", "1", "--eth", "1"])
        .assert()
        .success();

    stablemart(state)
        .args(["-a", "bob", "cancel", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("is not the creator of order 0"));

    stablemart(state)
        .args(["-a", "alice", "cancel", "0"])
        .assert()
        .success()
        .stdout("Cancelled order 0\n");

    stablemart(state).args(["-a", "bob", "faucet"]).assert().success();
    stablemart(state)
        .args(["-a", "bob", "buy", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("is not open (status: Cancelled)"));
}

#[test]
fn escrow_account_cannot_buy() {
    let dir = tempfile::tempdir().expect("tempdir");
    let state = dir.path();

    stablemart(state).args(["-a", "alice", "mint"]).assert().success();
    stablemart(state)
        .args(["-a", "alice", "post", "1", "--eth", "1"])
        .assert()
        .success();
    stablemart(state)
        .args(["-a", "marketplace", "faucet", "5"])
        .assert()
        .success();

    stablemart(state)
        .args(["-a", "marketplace", "buy", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("escrow account and cannot trade"));

    stablemart(state)
        .args(["orders"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Open"));
}

// ============================================================================
// Listing
// ============================================================================

#[test]
fn orders_json_lists_history() {
    let dir = tempfile::tempdir().expect("tempdir");
    let state = dir.path();

    stablemart(state).args(["-a", "alice", "mint"]).assert().success();
    stablemart(state).args(["-a", "alice", "mint"]).assert().success();
    stablemart(state)
        .args(["-a", "alice", "post", "1", "--eth", "1"])
        .assert()
        .success();
    stablemart(state)
        .args(["-a", "alice", "post", "2", "--eth", "2"])
        .assert()
        .success();
    stablemart(state)
        .args(["-a", "alice", "cancel", "0"])
        .assert()
        .success();

    let output = stablemart(state)
        .args(["--format", "json", "orders", "--all"])
        .output()
        .expect("run");
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json");
    let orders = value["orders"].as_array().expect("orders");
    assert_eq!(orders.len(), 2);
    assert_eq!(orders[0]["status"], "Cancelled");
    assert_eq!(orders[1]["status"], "Open");

    stablemart(state)
        .arg("orders")
        .assert()
        .success()
        .stdout(predicate::str::contains("Total: 1 order(s)"));
}

// ============================================================================
// Failure reporting
// ============================================================================

#[test]
fn unsupported_network_hints_reconnect() {
    let dir = tempfile::tempdir().expect("tempdir");
    stablemart(dir.path())
        .args(["--chain-id", "1", "orders"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("kovan"));
}

#[test]
fn faucet_refused_on_kovan() {
    let dir = tempfile::tempdir().expect("tempdir");
    stablemart(dir.path())
        .args(["--chain-id", "42", "-a", "bob", "faucet"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("faucet is not available on kovan"));
}

#[test]
fn missing_account() {
    let dir = tempfile::tempdir().expect("tempdir");
    stablemart(dir.path())
        .arg("mint")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--account"));
}

#[test]
fn init_config_writes_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("stablemart.toml");

    stablemart(dir.path())
        .arg("init-config")
        .arg("--output")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Config written to"));
    assert!(path.exists());

    stablemart(dir.path())
        .arg("init-config")
        .arg("--output")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));
}
