//! Runs the `minigo` binary on scratch directories.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

fn minigo(args: &[&str], cwd: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_minigo"))
        .args(args)
        .current_dir(cwd)
        .output()
        .unwrap()
}

fn stdout(out: &Output) -> String {
    String::from_utf8_lossy(&out.stdout).into_owned()
}

fn stderr(out: &Output) -> String {
    String::from_utf8_lossy(&out.stderr).into_owned()
}

#[test]
fn test_build_writes_output_file() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("main.go"), include_str!("../../../testdata/hello.go")).unwrap();
    let out = minigo(&["build", "main.go", "-o", "main.s"], dir.path());
    assert!(out.status.success(), "{}", stderr(&out));
    let asm = fs::read_to_string(dir.path().join("main.s")).unwrap();
    assert!(asm.contains("main.main:"));
    assert!(asm.contains("FUNCALL iruntime.printstring"));
    assert!(stdout(&out).is_empty());
}

#[test]
fn test_build_to_stdout_with_positions() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("main.go"), include_str!("../../../testdata/loops.go")).unwrap();
    let out = minigo(&["build", ".", "--emit-position"], dir.path());
    assert!(out.status.success(), "{}", stderr(&out));
    assert!(stdout(&out).contains("main.go:"));
    assert!(stdout(&out).contains("FUNCALL main.sum"));
}

#[test]
fn test_build_with_stdlib() {
    let dir = tempfile::tempdir().unwrap();
    let std = dir.path().join("std").join("strs");
    fs::create_dir_all(&std).unwrap();
    fs::write(
        std.join("strs.go"),
        "package strs\nfunc Twice(s string) string { return s + s }\n",
    )
    .unwrap();
    fs::write(
        dir.path().join("main.go"),
        "package main\nimport \"strs\"\nfunc main() { println(strs.Twice(\"ab\")) }\n",
    )
    .unwrap();
    let out = minigo(&["build", "main.go", "--stdlib", "std"], dir.path());
    assert!(out.status.success(), "{}", stderr(&out));
    let asm = stdout(&out);
    assert!(asm.contains("strs.Twice:"));
    assert!(asm.contains("FUNCALL iruntime.strcat"));
}

#[test]
fn test_type_error_fails() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("main.go"),
        "package main\nfunc main() { var x int = \"s\"\nprintln(x) }\n",
    )
    .unwrap();
    let out = minigo(&["check", "main.go"], dir.path());
    assert_eq!(out.status.code(), Some(1));
    let err = stderr(&out);
    assert!(err.contains("error: could not compile package main"), "{}", err);
}

#[test]
fn test_missing_main_fails() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("main.go"), "package main\nfunc helper() {}\n").unwrap();
    let out = minigo(&["check", "main.go"], dir.path());
    assert!(out.status.success());
    assert_eq!(stdout(&out), "ok\tmain\n");

    let out = minigo(&["build", "main.go"], dir.path());
    assert_eq!(out.status.code(), Some(1));
    assert!(stderr(&out).contains("function main is undeclared"));
}

#[test]
fn test_tokens_and_parse() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a.go"), "package main\nvar x = 1\n").unwrap();

    let out = minigo(&["tokens", "a.go"], dir.path());
    assert!(out.status.success(), "{}", stderr(&out));
    let tokens = stdout(&out);
    let first = tokens.lines().next().unwrap();
    assert!(first.starts_with("1:1\t"), "{}", first);
    // package main ; var x = 1 ; and the end of input
    assert_eq!(tokens.lines().count(), 9);

    let out = minigo(&["parse", "a.go"], dir.path());
    assert!(out.status.success(), "{}", stderr(&out));
    assert!(stdout(&out).contains("x"));
}

#[test]
fn test_syntax_error_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("bad.go"), "package main\nfunc main( {}\n").unwrap();
    let out = minigo(&["parse", "bad.go"], dir.path());
    assert_eq!(out.status.code(), Some(1));
    assert!(stderr(&out).contains("error: could not parse bad.go"));
}
