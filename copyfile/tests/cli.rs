use std::fs;
use std::os::unix::fs::MetadataExt;
use std::process::Command;

use tempfile::tempdir;

fn copyfile() -> Command {
    Command::new(env!("CARGO_BIN_EXE_copyfile"))
}

#[test]
fn test_copies_file_and_exits_zero() {
    let dir = tempdir().unwrap();
    let src = dir.path().join("src.txt");
    let dst = dir.path().join("dst.txt");
    fs::write(&src, b"hello from copyfile").unwrap();

    let status = copyfile().arg(&src).arg(&dst).status().unwrap();

    assert!(status.success());
    assert_eq!(fs::read(&dst).unwrap(), b"hello from copyfile");
    assert!(src.exists());
}

#[test]
fn test_moves_file_with_m_flag() {
    let dir = tempdir().unwrap();
    let src = dir.path().join("src.txt");
    let dst = dir.path().join("dst.txt");
    fs::write(&src, b"moving").unwrap();
    let inode = fs::metadata(&src).unwrap().ino();

    let status = copyfile().arg("-m").arg(&src).arg(&dst).status().unwrap();

    assert!(status.success());
    assert!(!src.exists());
    assert_eq!(fs::metadata(&dst).unwrap().ino(), inode);
}

#[test]
fn test_same_file_fails_with_causal_chain() {
    let dir = tempdir().unwrap();
    let src = dir.path().join("same.txt");
    fs::write(&src, b"untouched").unwrap();

    let output = copyfile().arg(&src).arg(dir.path()).output().unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("copy failed"), "stderr: {stderr}");
    assert!(stderr.contains("is the same file as"), "stderr: {stderr}");
    assert_eq!(fs::read(&src).unwrap(), b"untouched");
}

#[test]
fn test_missing_source_exits_non_zero() {
    let dir = tempdir().unwrap();

    let status = copyfile()
        .arg(dir.path().join("missing"))
        .arg(dir.path().join("dst"))
        .status()
        .unwrap();

    assert!(!status.success());
}

#[test]
fn test_conflicting_flags_exit_non_zero() {
    let dir = tempdir().unwrap();
    let src = dir.path().join("src");
    fs::write(&src, b"x").unwrap();

    let status = copyfile()
        .args(["-m", "-a"])
        .arg(&src)
        .arg(dir.path().join("dst"))
        .status()
        .unwrap();

    assert!(!status.success());
    assert!(src.exists());
}

#[test]
fn test_help_exits_zero() {
    let output = copyfile().arg("--help").output().unwrap();

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("Usage"));
}
