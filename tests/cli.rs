//! Drives the `lens` binary.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;

fn lens_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_lens"))
}

/// Config with both remote services disabled and the store under `root`.
fn write_config(root: &Path) -> PathBuf {
    fs::create_dir_all(root.join("config")).unwrap();
    let path = root.join("config").join("lens.toml");
    fs::write(
        &path,
        format!(
            r#"[store]
backend = "sqlite"
path = "{}/data/lens.sqlite"

[embedding]
provider = "disabled"

[generation]
provider = "disabled"
"#,
            root.display()
        ),
    )
    .unwrap();
    path
}

fn run_lens(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let output = Command::new(lens_binary())
        .arg("--config")
        .arg(config_path)
        .args(args)
        .env("RUST_LOG", "legal_lens=warn")
        .output()
        .unwrap_or_else(|e| panic!("Failed to run lens: {}", e));
    (
        String::from_utf8_lossy(&output.stdout).to_string(),
        String::from_utf8_lossy(&output.stderr).to_string(),
        output.status.success(),
    )
}

#[test]
fn extract_prints_text_without_config_file() {
    let tmp = TempDir::new().unwrap();
    let doc = tmp.path().join("clause.txt");
    fs::write(&doc, "Either party may terminate with notice.").unwrap();

    let (stdout, stderr, ok) = run_lens(&tmp.path().join("missing.toml"), &["extract", doc.to_str().unwrap()]);
    assert!(ok, "stderr: {}", stderr);
    assert_eq!(stdout.trim(), "Either party may terminate with notice.");
}

#[test]
fn extract_rejects_unsupported_extension() {
    let tmp = TempDir::new().unwrap();
    let doc = tmp.path().join("deck.key");
    fs::write(&doc, "x").unwrap();

    let (_, stderr, ok) = run_lens(&tmp.path().join("missing.toml"), &["extract", doc.to_str().unwrap()]);
    assert!(!ok);
    assert!(stderr.contains("unsupported format"), "stderr: {}", stderr);
}

#[test]
fn strict_extract_surfaces_decode_errors() {
    let tmp = TempDir::new().unwrap();
    let doc = tmp.path().join("latin1.txt");
    fs::write(&doc, [0x66, 0x6f, 0xff, 0xfe]).unwrap();
    let config = tmp.path().join("missing.toml");

    let (stdout, _, ok) = run_lens(&config, &["extract", doc.to_str().unwrap()]);
    assert!(ok);
    assert!(stdout.trim().is_empty());

    let (_, stderr, ok) = run_lens(&config, &["extract", "--strict", doc.to_str().unwrap()]);
    assert!(!ok);
    assert!(stderr.contains("not valid UTF-8"), "stderr: {}", stderr);
}

#[test]
fn detect_text_prints_language_tag() {
    let tmp = TempDir::new().unwrap();
    let config = tmp.path().join("missing.toml");

    let (stdout, _, ok) = run_lens(
        &config,
        &[
            "detect",
            "--text",
            "The employee shall not disclose confidential information to third parties.",
        ],
    );
    assert!(ok);
    assert_eq!(stdout.trim(), "eng");

    let (stdout, _, ok) = run_lens(&config, &["detect", "--text", "ok"]);
    assert!(ok);
    assert_eq!(stdout.trim(), "unknown");
}

#[test]
fn init_creates_store() {
    let tmp = TempDir::new().unwrap();
    let config = write_config(tmp.path());

    let (stdout, stderr, ok) = run_lens(&config, &["init"]);
    assert!(ok, "stderr: {}", stderr);
    assert!(stdout.contains("initialized"));
    assert!(tmp.path().join("data/lens.sqlite").exists());

    // Idempotent
    let (_, _, ok) = run_lens(&config, &["init"]);
    assert!(ok);
}

#[test]
fn ingest_without_services_still_reports_document() {
    let tmp = TempDir::new().unwrap();
    let config = write_config(tmp.path());
    let doc = tmp.path().join("lease.txt");
    fs::write(&doc, "The tenant shall keep the premises in good repair.").unwrap();

    let (stdout, stderr, ok) = run_lens(&config, &["ingest", doc.to_str().unwrap()]);
    assert!(ok, "stderr: {}", stderr);
    assert!(stdout.contains("Document:  lease.txt"));
    assert!(stdout.contains("Indexed:   no"));
    assert!(stdout.contains("Error: "), "summary should carry the generation error");
}

#[test]
fn invalid_config_is_rejected() {
    let tmp = TempDir::new().unwrap();
    let config = tmp.path().join("lens.toml");
    fs::write(&config, "[retrieval]\ntop_k = 0\n").unwrap();

    let (_, stderr, ok) = run_lens(&config, &["init"]);
    assert!(!ok);
    assert!(stderr.contains("top_k"), "stderr: {}", stderr);
}
