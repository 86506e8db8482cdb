//! End-to-end checks of the `fairclip` binary that need no model files.

use std::process::{Command, Output};

/// Run the binary in an isolated home/cwd so no user config or .env leaks in.
fn fairclip(args: &[&str]) -> (Output, tempfile::TempDir) {
    let home = tempfile::tempdir().unwrap();
    let output = Command::new(env!("CARGO_BIN_EXE_fairclip"))
        .args(args)
        .current_dir(home.path())
        .env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path().join(".config"))
        .env_remove("FAIRFACE_PATH")
        .env_remove("RUST_LOG")
        .output()
        .unwrap();
    (output, home)
}

#[test]
fn unknown_pair_exits_with_error_naming_it() {
    let (output, _home) = fairclip(&["--backbone", "ViT-Z-1", "--datasource", "nowhere"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("(ViT-Z-1, nowhere)"), "stderr: {stderr}");
}

#[test]
fn classify_unknown_pair_fails_before_dataset_lookup() {
    let (output, _home) = fairclip(&["classify", "0", "--backbone", "RN-0", "--datasource", "x"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("(RN-0, x)"), "stderr: {stderr}");
    assert!(!stderr.contains("FAIRFACE_PATH"), "stderr: {stderr}");
}

#[test]
fn missing_dataset_root_is_reported() {
    let (output, _home) = fairclip(&["classify", "0"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("FAIRFACE_PATH"), "stderr: {stderr}");
}

#[test]
fn models_list_shows_registry() {
    let (output, _home) = fairclip(&["models", "list"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("ViT-B-32"));
    assert!(stdout.contains("laion2b_s34b_b79k"));
    assert!(stdout.contains("not installed"));
}

#[test]
fn skip_encode_conflicts_with_skip_existing() {
    let (output, _home) = fairclip(&["--skip_encode", "--skip_existing"]);
    assert!(!output.status.success());
}

#[test]
fn rejects_unknown_label_set() {
    let (output, _home) = fairclip(&["--labels", "argp"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ARGP"), "stderr: {stderr}");
}
