use std::process::Command;

fn cli() -> Command {
    Command::new(env!("CARGO_BIN_EXE_ferrite-monitor"))
}

#[test]
fn unknown_dataset_fails_before_creating_output() {
    let dir = tempfile::tempdir().unwrap();
    let out_dir = dir.path().join("profiles");

    let output = cli()
        .args(["foo", "run-1", "--output-dir"])
        .arg(&out_dir)
        .env("DEVICE", "0")
        .output()
        .unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unsupported dataset 'foo'"), "{}", stderr);
    assert!(!out_dir.exists());
}

#[test]
fn zero_monitoring_interval_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let out_dir = dir.path().join("profiles");

    let output = cli()
        .args(["mnist", "run-1", "--monitoring-interval", "0", "--output-dir"])
        .arg(&out_dir)
        .env("DEVICE", "0")
        .output()
        .unwrap();

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("monitoring_interval"));
    assert!(!out_dir.exists());
}

#[test]
fn device_is_required() {
    let output = cli().args(["mnist", "run-1"]).env_remove("DEVICE").output().unwrap();
    assert!(!output.status.success());
}
