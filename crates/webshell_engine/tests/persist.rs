use std::fs;
use std::io::Write;

use tempfile::TempDir;
use webshell_engine::{
    ensure_output_dir, partial_file_in, relocate, stage_copy, write_unique, PersistError,
};

#[test]
fn creates_missing_output_dir() {
    let temp = TempDir::new().unwrap();
    let new_dir = temp.path().join("out");
    assert!(!new_dir.exists());
    ensure_output_dir(&new_dir).unwrap();
    assert!(new_dir.is_dir());
}

#[test]
fn relocate_replaces_existing_artifact() {
    let temp = TempDir::new().unwrap();

    let mut first = partial_file_in(temp.path()).unwrap();
    first.write_all(b"hello").unwrap();
    let first = relocate(first, temp.path(), "doc.bin").unwrap();
    assert_eq!(first.file_name().unwrap(), "doc.bin");
    assert_eq!(fs::read_to_string(&first).unwrap(), "hello");

    let mut second = partial_file_in(temp.path()).unwrap();
    second.write_all(b"world").unwrap();
    let second = relocate(second, temp.path(), "doc.bin").unwrap();
    assert_eq!(first, second);
    assert_eq!(fs::read_to_string(&second).unwrap(), "world");
}

#[test]
fn partial_file_needs_a_directory() {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join("not_a_dir");
    fs::write(&file_path, "x").unwrap();

    assert!(partial_file_in(&file_path).is_err());
}

#[test]
fn staging_keeps_the_name_and_never_overwrites() {
    let source_dir = TempDir::new().unwrap();
    let staging = TempDir::new().unwrap();
    let source = source_dir.path().join("IMG_0001.HEIC");
    fs::write(&source, b"one").unwrap();
    let first = stage_copy(&source, staging.path()).unwrap();

    fs::write(&source, b"two").unwrap();
    let second = stage_copy(&source, staging.path()).unwrap();

    assert_ne!(first, second);
    for staged in [&first, &second] {
        assert_eq!(staged.file_name().unwrap(), "IMG_0001.HEIC");
        assert_eq!(staged.parent().unwrap().parent(), Some(staging.path()));
    }
    assert_eq!(fs::read(&first).unwrap(), b"one");
    assert_eq!(fs::read(&second).unwrap(), b"two");
    assert!(source.exists());
}

#[test]
fn unique_files_do_not_collide() {
    let temp = TempDir::new().unwrap();
    let write = |file: &mut fs::File| file.write_all(b"x").map_err(PersistError::from);
    let a = write_unique(temp.path(), "capture-", ".jpg", write).unwrap();
    let b = write_unique(temp.path(), "capture-", ".jpg", write).unwrap();
    assert_ne!(a, b);
    assert!(a.exists() && b.exists());
    assert!(a.file_name().unwrap().to_string_lossy().ends_with(".jpg"));
}
