use pomdep_util::fs::{child_dirs, read_if_exists};

#[test]
fn read_missing_file_is_none() {
    let tmp = tempfile::tempdir().unwrap();
    let result = read_if_exists(&tmp.path().join("absent.pom")).unwrap();
    assert!(result.is_none());
}

#[test]
fn read_existing_file() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("lib.pom");
    std::fs::write(&path, "<project/>").unwrap();
    assert_eq!(read_if_exists(&path).unwrap().as_deref(), Some("<project/>"));
}

#[test]
fn child_dirs_sorted_and_skips_files() {
    let tmp = tempfile::tempdir().unwrap();
    std::fs::create_dir(tmp.path().join("2.0")).unwrap();
    std::fs::create_dir(tmp.path().join("1.0")).unwrap();
    std::fs::write(tmp.path().join("maven-metadata.xml"), "").unwrap();

    let dirs = child_dirs(tmp.path()).unwrap();
    let names: Vec<_> = dirs
        .iter()
        .map(|d| d.file_name().unwrap().to_string_lossy().to_string())
        .collect();
    assert_eq!(names, vec!["1.0", "2.0"]);
}

#[test]
fn child_dirs_of_missing_dir_is_empty() {
    let tmp = tempfile::tempdir().unwrap();
    assert!(child_dirs(&tmp.path().join("nope")).unwrap().is_empty());
}
