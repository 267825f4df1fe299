//! Integration tests for resonode-cli.
//!
//! Each test runs the `resonode` binary with its config directory pointed at
//! a temporary directory, so user documents and settings never leak in.

use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

/// `resonode` with HOME and XDG_CONFIG_HOME inside `home`.
fn resonode_bin(home: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_resonode"));
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .env_remove("RUST_LOG");
    cmd
}

fn run(home: &Path, args: &[&str]) -> Output {
    resonode_bin(home)
        .args(args)
        .output()
        .expect("failed to run resonode")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

const CYCLIC: &str = r#"{
  "nodes": [
    {"id": "n1", "name": "Gain", "data": {"gain": 0.5}},
    {"id": "n2", "name": "Gain", "data": {"gain": 0.5}},
    {"id": "n3", "name": "Audio Output", "data": {}}
  ],
  "connections": [
    {"source": "n1", "sourceOutput": "signal", "target": "n2", "targetInput": "signal"},
    {"source": "n2", "sourceOutput": "signal", "target": "n1", "targetInput": "signal"},
    {"source": "n2", "sourceOutput": "signal", "target": "n3", "targetInput": "signal"}
  ]
}"#;

const UNKNOWN_KIND: &str = r#"{
  "nodes": [
    {"id": "n1", "name": "Oscillator", "data": {}},
    {"id": "n2", "name": "Theremin", "data": {}},
    {"id": "n3", "name": "Audio Output", "data": {}}
  ],
  "connections": [
    {"source": "n1", "sourceOutput": "signal", "target": "n3", "targetInput": "signal"},
    {"source": "n2", "sourceOutput": "signal", "target": "n3", "targetInput": "signal"}
  ]
}"#;

// ===========================================================================
// kinds
// ===========================================================================

#[test]
fn kinds_lists_every_category() {
    let home = TempDir::new().unwrap();
    let output = run(home.path(), &["kinds"]);
    assert!(output.status.success());

    let text = stdout(&output);
    assert!(text.contains("Available Node Kinds"));
    for label in [
        "Oscillator",
        "Biquad Filter",
        "Keyboard Oscillator",
        "Universal Output",
        "Console Debugger",
    ] {
        assert!(text.contains(label), "listing should contain '{label}'");
    }
}

#[test]
fn kinds_category_filter() {
    let home = TempDir::new().unwrap();
    let output = run(home.path(), &["kinds", "--category", "notes"]);
    assert!(output.status.success());

    let text = stdout(&output);
    assert!(text.contains("Transpose"));
    assert!(!text.contains("Dynamics Compressor"));
}

#[test]
fn kinds_detail_shows_controls() {
    let home = TempDir::new().unwrap();
    let output = run(home.path(), &["kinds", "delay"]);
    assert!(output.status.success());

    let text = stdout(&output);
    assert!(text.contains("maxDelay"));
    assert!(text.contains("[live]"));
}

#[test]
fn kinds_unknown_name_fails() {
    let home = TempDir::new().unwrap();
    let output = run(home.path(), &["kinds", "theremin"]);
    assert!(!output.status.success());
}

// ===========================================================================
// check
// ===========================================================================

#[test]
fn check_factory_document_builds() {
    let home = TempDir::new().unwrap();
    let output = run(home.path(), &["check", "filtered_noise"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let text = stdout(&output);
    assert!(text.contains("5 nodes"));
    assert!(text.contains("biquad filter"));
}

#[test]
fn check_reports_cycle_and_fails() {
    let home = TempDir::new().unwrap();
    let doc = home.path().join("cyclic.json");
    std::fs::write(&doc, CYCLIC).unwrap();

    let output = run(home.path(), &["check", doc.to_str().unwrap()]);
    assert!(!output.status.success());
    assert!(stdout(&output).contains("cycle detected"));
}

#[test]
fn check_drops_unknown_kind_and_writes_cleaned_copy() {
    let home = TempDir::new().unwrap();
    let doc = home.path().join("unknown.json");
    let cleaned = home.path().join("cleaned.json");
    std::fs::write(&doc, UNKNOWN_KIND).unwrap();

    let output = run(
        home.path(),
        &[
            "check",
            doc.to_str().unwrap(),
            "--output",
            cleaned.to_str().unwrap(),
        ],
    );
    assert!(!output.status.success());
    let text = stdout(&output);
    assert!(text.contains("dropped node n2"));

    let written = std::fs::read_to_string(&cleaned).unwrap();
    assert!(written.contains("Oscillator"));
    assert!(!written.contains("Theremin"));
}

// ===========================================================================
// codegen
// ===========================================================================

#[test]
fn codegen_writes_script_file() {
    let home = TempDir::new().unwrap();
    let out = home.path().join("basic_tone.js");

    let output = run(
        home.path(),
        &["codegen", "basic_tone", "-o", out.to_str().unwrap()],
    );
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let script = std::fs::read_to_string(&out).unwrap();
    assert!(script.contains("export { ctx, master, sources };"));
    assert!(script.contains("440"));
}

#[test]
fn codegen_uses_settings_master_gain() {
    let home = TempDir::new().unwrap();
    let settings = home.path().join("settings.toml");
    std::fs::write(&settings, "[output]\nmaster_gain = 0.25\n").unwrap();

    let output = run(
        home.path(),
        &[
            "codegen",
            "basic_tone",
            "--settings",
            settings.to_str().unwrap(),
        ],
    );
    assert!(output.status.success());
    assert!(stdout(&output).contains("0.25"));
}

// ===========================================================================
// documents / settings
// ===========================================================================

#[test]
fn documents_list_shows_factory_documents() {
    let home = TempDir::new().unwrap();
    let output = run(home.path(), &["documents", "list"]);
    assert!(output.status.success());

    let text = stdout(&output);
    assert!(text.contains("Keyboard Synth"));
    assert!(text.contains("Modulated Delay"));
    assert!(text.contains("(none)"));
}

#[test]
fn documents_copy_then_show() {
    let home = TempDir::new().unwrap();
    let target = home.path().join("tone.json");

    let output = run(
        home.path(),
        &["documents", "copy", "basic_tone", "-o", target.to_str().unwrap()],
    );
    assert!(output.status.success());
    assert!(target.exists());

    let again = run(
        home.path(),
        &["documents", "copy", "basic_tone", "-o", target.to_str().unwrap()],
    );
    assert!(!again.status.success(), "copy should refuse to overwrite");

    let show = run(home.path(), &["documents", "show", target.to_str().unwrap()]);
    assert!(show.status.success());
    let text = stdout(&show);
    assert!(text.contains("Nodes (2):"));
    assert!(text.contains("n1.signal"));
}

#[test]
fn settings_init_writes_defaults() {
    let home = TempDir::new().unwrap();
    let path = home.path().join("conf").join("settings.toml");

    let output = run(
        home.path(),
        &["settings", "init", "--path", path.to_str().unwrap()],
    );
    assert!(output.status.success());

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.contains("fade_ms = 50"));
    assert!(text.contains("sample_rate = 48000"));

    let show = run(
        home.path(),
        &["settings", "show", "--path", path.to_str().unwrap()],
    );
    assert!(show.status.success());
    assert!(stdout(&show).contains("ramp_ms = 20"));
}

#[test]
fn invalid_settings_are_rejected() {
    let home = TempDir::new().unwrap();
    let path = home.path().join("settings.toml");
    std::fs::write(&path, "[backend]\nsample_rate = 12\n").unwrap();

    let output = run(
        home.path(),
        &["settings", "show", "--path", path.to_str().unwrap()],
    );
    assert!(!output.status.success());
}

// ===========================================================================
// simulate
// ===========================================================================

#[test]
fn simulate_keyboard_synth_plays_a_key() {
    let home = TempDir::new().unwrap();
    let output = run(
        home.path(),
        &[
            "simulate",
            "keyboard_synth",
            "--keys",
            "KeyZ,Escape",
            "--hold",
            "0.2",
            "--samples",
            "4",
        ],
    );
    // Escape is not a key code on the layout.
    assert!(!output.status.success());

    let output = run(
        home.path(),
        &[
            "simulate",
            "keyboard_synth",
            "--keys",
            "KeyZ",
            "--hold",
            "0.2",
            "--samples",
            "4",
        ],
    );
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let text = stdout(&output);
    assert!(text.contains("Pass 1:"));
    assert!(text.contains("25 voices"));
    assert!(text.contains("KeyZ voice 1"));
    assert!(text.contains("gain="));
}
