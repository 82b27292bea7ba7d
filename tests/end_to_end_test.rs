use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn run_command(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_slide-deck"))
        .args(args)
        .env_remove("DEFAULT_CSS")
        .env_remove("DEFAULT_JS")
        .output()
        .expect("Failed to execute command")
}

fn path_arg(path: &Path) -> &str {
    path.to_str().expect("Temp paths are valid UTF-8")
}

#[test]
fn test_no_command_prints_hint() {
    let output = run_command(&[]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("--help"));
}

#[test]
fn test_init_then_build() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let deck_dir = temp_dir.path().join("deck");

    let init = run_command(&["init", path_arg(&deck_dir)]);
    assert!(
        init.status.success(),
        "init failed: {}",
        String::from_utf8_lossy(&init.stderr)
    );
    assert!(deck_dir.join("slides.json").is_file());

    let build = run_command(&[
        "build",
        "--root",
        path_arg(&deck_dir),
        "--css",
        "style.css",
        "--js",
        "https://cdn.jsdelivr.net/npm/mermaid@10/dist/mermaid.min.js",
        "--title",
        "Starter",
    ]);
    assert!(
        build.status.success(),
        "build failed: {}",
        String::from_utf8_lossy(&build.stderr)
    );

    let html = fs::read_to_string(deck_dir.join("index.html")).expect("index.html was not written");
    assert!(html.contains("<title>Starter</title>"));
    assert!(html.contains("@page"), "stylesheet should be embedded");
    assert!(html.contains(r#"<script src="https://cdn.jsdelivr.net/npm/mermaid@10/dist/mermaid.min.js"></script>"#));
    assert_eq!(html.matches(r#"<section class="slide"#).count(), 4);
    assert!(html.contains(r#"class="slide active""#));
}

#[test]
fn test_init_refuses_existing_deck() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    assert!(run_command(&["init", path_arg(temp_dir.path())]).status.success());

    let again = run_command(&["init", path_arg(temp_dir.path())]);
    assert_eq!(again.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&again.stderr).starts_with("Error:"));
}

#[test]
fn test_export_missing_root_exits_with_error() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let missing = temp_dir.path().join("nowhere");
    let pdf = temp_dir.path().join("out.pdf");

    let output = run_command(&["export", path_arg(&pdf), "--root", path_arg(&missing)]);

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Path not found"));
    assert!(!pdf.exists());
}

#[test]
#[ignore] // Ignore by default as it requires Chrome to be installed
fn test_full_export() {
    let _ = env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .is_test(true)
        .try_init();

    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let deck_dir = temp_dir.path();

    assert!(run_command(&["init", path_arg(deck_dir)]).status.success());

    // A local script instead of the CDN diagram library keeps the test offline
    fs::write(deck_dir.join("deck.js"), "window.deckLoaded = true;").expect("Failed to write script");
    let build = run_command(&[
        "build",
        "--root",
        path_arg(deck_dir),
        "--css",
        "style.css",
        "--js",
        "deck.js",
        "--mode",
        "embed",
    ]);
    assert!(build.status.success());

    let pdf = deck_dir.join("out/deck.pdf");
    let export = run_command(&["export", path_arg(&pdf), "--root", path_arg(deck_dir)]);
    assert!(
        export.status.success(),
        "export failed: {}",
        String::from_utf8_lossy(&export.stderr)
    );
    assert!(String::from_utf8_lossy(&export.stdout).contains("PDF generated:"));

    let bytes = fs::read(&pdf).expect("PDF was not written");
    assert!(bytes.starts_with(b"%PDF"));
}
