use std::process::Command;

fn temp_path(label: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!(
        "fleet-cli-{label}-{}",
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos()
    ))
}

#[test]
fn cli_list_policies_writes_output() {
    let exe = env!("CARGO_BIN_EXE_fleet-runner");
    let output_path = temp_path("list");
    let status = Command::new(exe)
        .args(["--list-policies", "--output"])
        .arg(&output_path)
        .status()
        .expect("run cli");
    assert!(status.success());
    let content = std::fs::read_to_string(output_path).expect("read output");
    assert!(content.contains("Available policies"));
    assert!(content.contains("greedy"));
}

#[test]
fn cli_runs_all_policies_with_json_report() {
    let exe = env!("CARGO_BIN_EXE_fleet-runner");
    let output_path = temp_path("run");
    let output = Command::new(exe)
        .args([
            "--policy",
            "all",
            "--seeds",
            "1,2",
            "--episodes",
            "1",
            "--report",
            "json",
            "--output",
        ])
        .arg(&output_path)
        .output()
        .expect("run cli");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Fleet Rotation Runner"));

    let content = std::fs::read_to_string(output_path).expect("read output");
    let parsed: serde_json::Value = serde_json::from_str(&content).expect("json report");
    let episodes = parsed.as_array().expect("episode array");
    assert_eq!(episodes.len(), 6);
    assert!(
        episodes
            .iter()
            .all(|episode| episode["violation_count"] == 0)
    );
}

#[test]
fn cli_rejects_unknown_policy_and_bad_config() {
    let exe = env!("CARGO_BIN_EXE_fleet-runner");
    let output = Command::new(exe)
        .args(["--policy", "clairvoyant"])
        .output()
        .expect("run cli");
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("clairvoyant"));

    let config_path = temp_path("config");
    std::fs::write(&config_path, r#"{ "horizon": 0 }"#).expect("write config");
    let output = Command::new(exe)
        .arg("--config")
        .arg(&config_path)
        .output()
        .expect("run cli");
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("horizon"));
}
