use std::fs;
use std::path::Path;
use tempfile::tempdir;

use orphansweep::catalog::{Catalog, Role, SENTINEL};
use orphansweep::db::IdentifierSet;
use orphansweep::sweep::{self, scan, OutputMode, SweepOptions};

fn opts(delete: bool) -> SweepOptions {
    SweepOptions {
        delete,
        output: OutputMode::Silent,
        raw: true,
    }
}

fn ids(values: &[&str]) -> IdentifierSet {
    values.iter().map(|v| v.to_string()).collect()
}

fn list_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

fn tar_entry_names(archive: &Path) -> Vec<String> {
    let file = fs::File::open(archive).unwrap();
    let mut tar = tar::Archive::new(file);
    let mut names: Vec<String> = tar
        .entries()
        .unwrap()
        .map(|entry| {
            entry
                .unwrap()
                .path()
                .unwrap()
                .to_string_lossy()
                .into_owned()
        })
        .collect();
    names.sort();
    names
}

/// Scenario from the design notes: one known file, one orphan, one
/// sentinel. A dry run reports the orphan without touching the disk.
#[test]
fn test_dry_run_reports_without_deleting() {
    let scan_dir = tempdir().unwrap();
    let backup_dir = tempdir().unwrap();

    fs::write(scan_dir.path().join("A.bin"), vec![0u8; 500]).unwrap();
    fs::write(scan_dir.path().join("B.bin"), vec![0u8; 1200]).unwrap();
    fs::write(scan_dir.path().join(SENTINEL), b"sentinel").unwrap();

    let result = scan::scan_directory(
        Role::Uuid,
        scan_dir.path(),
        backup_dir.path(),
        &ids(&["A"]),
        opts(false),
    )
    .unwrap();

    assert_eq!(result.count, 1);
    assert_eq!(result.bytes, 1200);
    assert_eq!(result.fails, 0);

    // Nothing deleted, no archive written.
    let mut expected = vec![SENTINEL.to_string(), "A.bin".to_string(), "B.bin".to_string()];
    expected.sort();
    assert_eq!(list_names(scan_dir.path()), expected);
    assert!(list_names(backup_dir.path()).is_empty());
}

#[test]
fn test_delete_archives_then_removes_orphans() {
    let scan_dir = tempdir().unwrap();
    let backup_dir = tempdir().unwrap();

    fs::write(scan_dir.path().join("aaaa.png"), b"known").unwrap();
    fs::write(scan_dir.path().join("bbbb.png"), b"orphan one").unwrap();
    fs::write(scan_dir.path().join("cccc.zip"), b"orphan two!!").unwrap();
    fs::write(scan_dir.path().join(SENTINEL), b"sentinel").unwrap();

    let result = scan::scan_directory(
        Role::Uuid,
        scan_dir.path(),
        backup_dir.path(),
        &ids(&["aaaa"]),
        opts(true),
    )
    .unwrap();

    assert_eq!(result.count, 2);
    assert_eq!(result.fails, 0);
    assert_eq!(result.bytes, 22);

    // Orphans removed, known file and sentinel kept.
    let remaining = list_names(scan_dir.path());
    assert!(remaining.contains(&"aaaa.png".to_string()));
    assert!(remaining.contains(&SENTINEL.to_string()));
    assert!(!remaining.contains(&"bbbb.png".to_string()));
    assert!(!remaining.contains(&"cccc.zip".to_string()));

    // Exactly one timestamped archive holding exactly the orphans.
    let archives = list_names(backup_dir.path());
    assert_eq!(archives.len(), 1);
    assert!(archives[0].starts_with("bak-uuid-"));
    assert!(archives[0].ends_with(".tar"));
    let entries = tar_entry_names(&backup_dir.path().join(&archives[0]));
    assert_eq!(entries, vec!["bbbb.png".to_string(), "cccc.zip".to_string()]);
}

/// The safety net: when the archive cannot be written, deletion for the
/// directory is aborted and every file survives.
#[test]
fn test_failed_archive_aborts_deletion() {
    let scan_dir = tempdir().unwrap();
    let blocked = tempdir().unwrap();
    fs::write(blocked.path().join("blocker"), b"").unwrap();
    // A path below a regular file can never be created.
    let backup_dir = blocked.path().join("blocker").join("backups");

    fs::write(scan_dir.path().join("bbbb.png"), b"orphan").unwrap();

    let result = scan::scan_directory(
        Role::Uuid,
        scan_dir.path(),
        &backup_dir,
        &ids(&[]),
        opts(true),
    )
    .unwrap();

    assert_eq!(result.count, 1);
    assert_eq!(result.fails, 0);
    assert!(scan_dir.path().join("bbbb.png").exists());
    assert!(!backup_dir.exists());
}

/// Roles without a backup label are deleted without an archival pass, and
/// their role-specific infrastructure files are never treated as orphans.
#[test]
fn test_json_role_deletes_without_archive() {
    let scan_dir = tempdir().unwrap();
    let backup_dir = tempdir().unwrap();

    fs::write(scan_dir.path().join("file.list.json"), b"infra").unwrap();
    fs::write(scan_dir.path().join("dddd.json"), b"orphan").unwrap();

    let result = scan::scan_directory(
        Role::Json,
        scan_dir.path(),
        backup_dir.path(),
        &ids(&[]),
        opts(true),
    )
    .unwrap();

    assert_eq!(result.count, 1);
    assert!(scan_dir.path().join("file.list.json").exists());
    assert!(!scan_dir.path().join("dddd.json").exists());
    assert!(list_names(backup_dir.path()).is_empty());
}

#[test]
fn test_subdirectories_are_skipped() {
    let scan_dir = tempdir().unwrap();
    let backup_dir = tempdir().unwrap();

    fs::create_dir(scan_dir.path().join("nested")).unwrap();
    fs::write(scan_dir.path().join("nested").join("eeee.png"), b"inner").unwrap();
    fs::write(scan_dir.path().join("ffff.png"), b"orphan").unwrap();

    let result = scan::scan_directory(
        Role::Uuid,
        scan_dir.path(),
        backup_dir.path(),
        &ids(&[]),
        opts(false),
    )
    .unwrap();

    // Only the immediate file counts; the tool never descends.
    assert_eq!(result.count, 1);
    assert_eq!(result.bytes, 6);
}

#[test]
fn test_missing_directory_is_an_error() {
    let backup_dir = tempdir().unwrap();
    let missing = backup_dir.path().join("does-not-exist");
    let outcome = scan::scan_directory(
        Role::Uuid,
        &missing,
        backup_dir.path(),
        &ids(&[]),
        opts(false),
    );
    assert!(outcome.is_err());
}

/// Aggregation across directories: the run summary is the sum of the
/// per-directory results, and a failing directory contributes zeros.
#[test]
fn test_run_aggregates_directories() {
    let base = tempdir().unwrap();
    let catalog = Catalog::resolve(base.path());
    catalog.create().unwrap();

    fs::write(catalog.uuid.join("bbbb.png"), vec![0u8; 100]).unwrap();
    fs::write(catalog.uuid.join("cccc.png"), vec![0u8; 150]).unwrap();
    fs::write(catalog.json.join("dddd.json"), vec![0u8; 50]).unwrap();
    fs::write(catalog.json.join(SENTINEL), b"x").unwrap();

    let summary = sweep::run(
        &catalog,
        &[Role::Uuid, Role::Json],
        &ids(&[]),
        42,
        opts(false),
    );

    assert_eq!(summary.count, 3);
    assert_eq!(summary.bytes, 300);
    assert_eq!(summary.fails, 0);
    assert_eq!(summary.known_rows, 42);
    assert_eq!(summary.dirs_scanned, 2);

    // Dry run: everything is still on disk.
    assert!(catalog.uuid.join("bbbb.png").exists());
    assert!(catalog.json.join("dddd.json").exists());
}
