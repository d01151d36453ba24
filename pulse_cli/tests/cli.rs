use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;

fn pulse() -> Command {
    let mut cmd = Command::cargo_bin("pulse").unwrap();
    cmd.env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_list_shows_every_exporter() {
    pulse()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("console"))
        .stdout(predicate::str::contains("grpc"))
        .stdout(predicate::str::contains("http"))
        .stdout(predicate::str::contains("pull"));
}

#[test]
fn test_validate_accepts_good_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("demo.yaml");
    fs::write(
        &path,
        "service:\n  name: checkout\nworkload:\n  iterations: 5\n  interval: 100ms\n",
    )
    .unwrap();

    pulse()
        .arg("validate")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Config is valid"))
        .stdout(predicate::str::contains("checkout"));
}

#[test]
fn test_validate_rejects_zero_iterations() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("demo.toml");
    fs::write(&path, "[workload]\niterations = 0\n").unwrap();

    pulse()
        .arg("validate")
        .arg(&path)
        .assert()
        .failure()
        .stdout(predicate::str::contains("Config is invalid"));
}

#[test]
fn test_run_console_exports_final_totals() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot_path = dir.path().join("snapshot.json");

    pulse()
        .args([
            "run",
            "--iterations",
            "3",
            "--interval",
            "10ms",
            "--flush-interval",
            "50ms",
            "--seed",
            "7",
            "--output-json",
        ])
        .arg(&snapshot_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Iteration 3: Counter +1"))
        .stdout(predicate::str::contains("requests_total [counter]"))
        .stdout(predicate::str::contains("le=+Inf"))
        .stdout(predicate::str::contains("Completed successfully"));

    pulse()
        .args(["report", "--format", "prometheus"])
        .arg(&snapshot_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("request_duration_count"))
        .stdout(predicate::str::contains("# TYPE cpu_usage gauge"));
}

#[test]
fn test_run_reads_env_overrides() {
    pulse()
        .arg("run")
        .env("PULSE_ITERATIONS", "2")
        .env("PULSE_INTERVAL", "5ms")
        .env("PULSE_FORMAT", "json")
        .assert()
        .success()
        .stdout(predicate::str::contains("Iteration 2:"))
        .stdout(predicate::str::contains("\"service.name\": \"otel-demo\""));
}

#[test]
fn test_run_rejects_unknown_exporter() {
    pulse()
        .args(["run", "--exporter", "carrier-pigeon"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown exporter"));
}
