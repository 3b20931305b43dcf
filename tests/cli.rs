use std::io::Write;
use std::process::{Command, Output};
use tempfile::NamedTempFile;

fn block_file(source: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(source.as_bytes()).unwrap();
    file
}

fn ilocalloc(args: &[&str], file: &NamedTempFile) -> Output {
    Command::new(env!("CARGO_BIN_EXE_ilocalloc"))
        .args(args)
        .arg(file.path())
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

const BLOCK: &str = "\
loadI 1024 => r7
loadI 3 => r2
store r2 => r7
output 1024
";

#[test]
fn test_allocate() {
    let file = block_file(BLOCK);
    let output = ilocalloc(&["-k", "4"], &file);

    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        "loadI 1024 => r0\nloadI 3 => r1\nstore r1 => r0\noutput 1024\n"
    );
    assert!(output.stderr.is_empty());
}

#[test]
fn test_simulate_appends_outputs_as_comments() {
    let file = block_file(BLOCK);
    let output = ilocalloc(&["-k", "3", "-s"], &file);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.lines().last(), Some("// output 3"));
}

#[test]
fn test_rename_only() {
    let file = block_file(BLOCK);
    let output = ilocalloc(&["-x"], &file);

    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        "loadI 1024 => r0\nloadI 3 => r1\nstore r1 => r0\noutput 1024\n"
    );
}

#[test]
fn test_parse_only() {
    let file = block_file(BLOCK);
    let output = ilocalloc(&["-p"], &file);

    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout), "Parse succeeded: 4 operation(s)\n");
}

#[test]
fn test_syntax_errors_exit_with_failure() {
    let file = block_file("loadI 1 => r1\nadd r1 r1 => r2\nloadI => r3\n");
    let output = ilocalloc(&["-p"], &file);

    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    assert_eq!(
        String::from_utf8_lossy(&output.stderr),
        "ERROR 2: incorrect syntax for arithmetic\nERROR 3: incorrect syntax for loadI\n"
    );
}

#[test]
fn test_registers_required_when_allocating() {
    let file = block_file(BLOCK);
    let output = ilocalloc(&[], &file);

    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
}

#[test]
fn test_too_few_registers() {
    let file = block_file(BLOCK);
    let output = ilocalloc(&["-k", "1"], &file);

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("need at least 2 physical registers"));
}
