use std::{fs, process::Command};

#[test]
fn cli_runs_a_short_encounter_to_completion() {
    let output = Command::new(env!("CARGO_BIN_EXE_wave-siege"))
        .args(["--max-waves", "2", "--tick-ms", "250", "--damage-per-tick", "1000"])
        .env("RUST_LOG", "warn")
        .output()
        .expect("failed to launch the wave-siege binary");

    assert!(output.status.success(), "wave-siege should exit cleanly");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("Complete") && stdout.contains("2 waves cleared") && stdout.contains("7 kills"),
        "unexpected summary: {stdout}"
    );
}

#[test]
fn cli_rejects_an_invalid_config_file() {
    let path = std::env::temp_dir().join(format!("wave-siege-invalid-{}.toml", std::process::id()));
    fs::write(&path, "escalation_factor = 0.5\n").expect("failed to write config");

    let status = Command::new(env!("CARGO_BIN_EXE_wave-siege"))
        .arg("--config")
        .arg(&path)
        .status()
        .expect("failed to launch the wave-siege binary");
    let _ = fs::remove_file(&path);

    assert!(!status.success(), "an invalid config should be rejected");
}
