//! Integration tests for the command-line interface
//!
//! Exit status, dry run, diff output and the CONFLICT diagnostics

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

const TARGET: &str = "src/components/NovidadesModal.tsx";

fn fixture(name: &str) -> String {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name);
    fs::read_to_string(path).unwrap()
}

/// Helper to create a front-end project with the given modal contents
fn setup_project(modal: &str) -> TempDir {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join(TARGET);
    fs::create_dir_all(file.parent().unwrap()).unwrap();
    fs::write(&file, modal).unwrap();
    dir
}

fn patcher(args: &[&str], cwd: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_novidades-patcher"))
        .args(args)
        .current_dir(cwd)
        .env("NO_COLOR", "1")
        .output()
        .unwrap()
}

#[test]
fn test_help() {
    let cwd = TempDir::new().unwrap();
    let output = patcher(&["--help"], cwd.path());

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Rewrite the Novidades modal"));
    assert!(stdout.contains("--dry-run"));
}

#[test]
fn test_no_arguments_patches_current_directory() {
    let project = setup_project(&fixture("NovidadesModal.tsx.input"));

    let output = patcher(&[], project.path());

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("novidades-list"));
    assert!(stdout.contains("novidade-title-link"));
    assert!(stdout.contains("Patched"));

    let patched = fs::read_to_string(project.path().join(TARGET)).unwrap();
    assert_eq!(patched, fixture("NovidadesModal.tsx.expected"));
}

#[test]
fn test_root_flag() {
    let project = setup_project(&fixture("NovidadesModal.tsx.input"));
    let elsewhere = TempDir::new().unwrap();

    let output = patcher(
        &["--root", project.path().to_str().unwrap()],
        elsewhere.path(),
    );

    assert!(output.status.success());
    let patched = fs::read_to_string(project.path().join(TARGET)).unwrap();
    assert_eq!(patched, fixture("NovidadesModal.tsx.expected"));
}

#[test]
fn test_dry_run_with_diff() {
    let input = fixture("NovidadesModal.tsx.input");
    let project = setup_project(&input);

    let output = patcher(&["--dry-run", "--diff"], project.path());

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("DRY RUN"));
    assert!(stdout.contains("Would patch"));
    assert!(stdout.contains("+      link: \"https://europa4.vercel.app/\""));
    assert!(stdout.contains("-      titulo: \"Consulta FGTS em lote\","));

    let unchanged = fs::read_to_string(project.path().join(TARGET)).unwrap();
    assert_eq!(unchanged, input);
}

#[test]
fn test_second_run_exits_nonzero() {
    let project = setup_project(&fixture("NovidadesModal.tsx.input"));

    assert!(patcher(&[], project.path()).status.success());
    let output = patcher(&[], project.path());

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("target block not found"));
    assert!(stderr.contains("CONFLICT"));
    assert!(stderr.contains("No changes written."));
}

#[test]
fn test_missing_list_exits_nonzero() {
    let project = setup_project("export default function NovidadesModal() {}\r\n");

    let output = patcher(&[], project.path());

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("rule 'novidades-list' not replaced"));
    assert!(stderr.contains("matched 0 times"));
}

#[test]
fn test_missing_target_exits_nonzero() {
    let empty = TempDir::new().unwrap();

    let output = patcher(&[], empty.path());

    assert!(!output.status.success());
}

#[test]
fn test_missing_root_exits_nonzero() {
    let cwd = TempDir::new().unwrap();

    let output = patcher(&["--root", "/nonexistent/frontend"], cwd.path());

    assert!(!output.status.success());
}

#[test]
fn test_custom_rules_file() {
    let project = TempDir::new().unwrap();
    fs::write(project.path().join("banner.txt"), "Hello\r\nold world\r\n").unwrap();
    let rules = project.path().join("banner.toml");
    fs::write(
        &rules,
        r#"
[meta]
name = "banner"
target = "banner.txt"

[[patches]]
id = "greeting"
line_endings = "crlf"

[patches.query]
type = "text"
search = "Hello\nold world"

[patches.operation]
type = "replace"
text = "Hello\nnew world"
"#,
    )
    .unwrap();

    let output = patcher(&["--rules", rules.to_str().unwrap()], project.path());

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("greeting"));
    assert!(stdout.contains("banner.txt"));
    let patched = fs::read_to_string(project.path().join("banner.txt")).unwrap();
    assert_eq!(patched, "Hello\r\nnew world\r\n");
}

#[test]
fn test_missing_rules_file_exits_nonzero() {
    let project = setup_project(&fixture("NovidadesModal.tsx.input"));

    let output = patcher(&["--rules", "missing.toml"], project.path());

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("failed to read patch config"));
    assert!(stderr.contains("missing.toml"));

    let unchanged = fs::read_to_string(project.path().join(TARGET)).unwrap();
    assert_eq!(unchanged, fixture("NovidadesModal.tsx.input"));
}
