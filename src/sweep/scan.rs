use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{error, warn};

use super::backup;
use super::delete::{self, Outcome};
use super::report;
use super::SweepOptions;
use crate::catalog::{Role, SENTINEL};
use crate::db::IdentifierSet;
use crate::error::Error;

/// One file listed during a directory scan. Recreated on every listing,
/// never persisted.
#[derive(Debug, Clone)]
pub struct FileEntry {
    pub name: String,
    pub path: PathBuf,
    pub size: u64,
    pub modified: Option<SystemTime>,
    pub mode: u32,
}

/// Per-directory totals: orphans found, deletion failures, orphan bytes.
#[derive(Debug, Default, Clone, Copy)]
pub struct ScanResult {
    pub count: u64,
    pub fails: u64,
    pub bytes: u64,
}

/// Filenames that must never be treated as orphans in the given role,
/// regardless of identifier membership.
pub fn ignore_list(role: Role) -> HashSet<&'static str> {
    let mut ignore: HashSet<&'static str> = HashSet::from([SENTINEL, "blank.png"]);
    match role {
        Role::Json => {
            ignore.extend([
                "file.list.json",
                "file.update.json",
                "organisation.list.json",
            ]);
        }
        Role::EmulationZip => {
            ignore.extend([
                "g_drive.zip",
                "s_drive.zip",
                "u_drive.zip",
                "dosee-core.js",
                "dosee-core.mem",
            ]);
        }
        _ => {}
    }
    ignore
}

/// Strip the extension suffix to obtain the bare identifier. A leading-dot
/// name without another dot is returned whole.
pub fn bare_identifier(name: &str) -> &str {
    match name.rfind('.') {
        Some(idx) if idx > 0 => &name[..idx],
        _ => name,
    }
}

/// List the immediate files of a directory. Subdirectories are skipped
/// entirely; this tool never descends while scanning.
pub fn list_entries(dir: &Path) -> Result<Vec<FileEntry>, Error> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            continue;
        }
        let metadata = entry.metadata()?;
        entries.push(FileEntry {
            name: entry.file_name().to_string_lossy().into_owned(),
            path: entry.path(),
            size: metadata.len(),
            modified: metadata.modified().ok(),
            mode: mode_of(&metadata),
        });
    }
    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(entries)
}

#[cfg(unix)]
fn mode_of(metadata: &fs::Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode()
}

#[cfg(not(unix))]
fn mode_of(_metadata: &fs::Metadata) -> u32 {
    0
}

/// Classify the listed entries against the identifier set. An entry is an
/// orphan iff its name is not ignored and its bare identifier has no
/// database record. The comparison is purely string based: a `.png` and a
/// `.json` sharing one identifier are both non-orphans.
pub fn find_orphans<'a>(
    entries: &'a [FileEntry],
    ids: &IdentifierSet,
    ignore: &HashSet<&str>,
) -> Vec<&'a FileEntry> {
    entries
        .iter()
        .filter(|entry| !ignore.contains(entry.name.as_str()))
        .filter(|entry| !ids.contains(bare_identifier(&entry.name)))
        .collect()
}

/// Scan one directory: classify orphans once, archive them when deletion is
/// requested for a backed-up role, then list and (when permitted) delete.
/// The archive step and the deletion pass consume the same classification.
pub fn scan_directory(
    role: Role,
    dir: &Path,
    backup_dir: &Path,
    ids: &IdentifierSet,
    opts: SweepOptions,
) -> Result<ScanResult, Error> {
    report::render_directory_header(dir, opts.output);

    let entries = list_entries(dir)?;
    let ignore = ignore_list(role);
    let orphans = find_orphans(&entries, ids, &ignore);

    // The safety net: deletion in a backed-up role may only proceed once the
    // orphans are captured in an archive. Zero captures or any archive error
    // demotes this directory's pass to a non-destructive listing.
    let mut allow_delete = opts.delete;
    if opts.delete && !orphans.is_empty() {
        if let Some(label) = role.backup_label() {
            let manifest: HashSet<String> =
                orphans.iter().map(|entry| entry.name.clone()).collect();
            match backup::archive_orphans(dir, backup_dir, label, &manifest, opts.output) {
                Ok(Some(archive)) => {
                    tracing::debug!("archived orphans to {}", archive.display());
                }
                Ok(None) => {
                    warn!(
                        "no files captured for backup in {}, skipping deletion",
                        dir.display()
                    );
                    allow_delete = false;
                }
                Err(err) => {
                    error!(
                        "backup failed for {}, skipping deletion: {}",
                        dir.display(),
                        err
                    );
                    report::announce_error(dir, &err, opts.output);
                    allow_delete = false;
                }
            }
        }
    }

    let mut result = ScanResult::default();
    for entry in &orphans {
        result.count += 1;
        result.bytes += entry.size;
        let outcome = if allow_delete {
            delete::delete_orphan(entry)
        } else {
            Outcome::Skipped
        };
        if outcome == Outcome::Failed {
            result.fails += 1;
        }
        report::render_entry(result.count, entry, outcome, opts);
    }
    report::render_directory_footer(&result, opts);
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_identifier() {
        assert_eq!(bare_identifier("abc.png"), "abc");
        assert_eq!(bare_identifier("abc"), "abc");
        assert_eq!(bare_identifier("a.b.c"), "a.b");
        assert_eq!(bare_identifier(".hidden"), ".hidden");
        assert_eq!(
            bare_identifier("ea9ba9bb-2c0c-40a4-8de6-cf6b8bcf44fa.json"),
            "ea9ba9bb-2c0c-40a4-8de6-cf6b8bcf44fa"
        );
    }

    #[test]
    fn test_ignore_list_per_role() {
        let base = ignore_list(Role::Uuid);
        assert!(base.contains(SENTINEL));
        assert!(base.contains("blank.png"));
        assert!(!base.contains("g_drive.zip"));

        let json = ignore_list(Role::Json);
        assert!(json.contains("file.list.json"));
        assert!(json.contains("organisation.list.json"));

        let emu = ignore_list(Role::EmulationZip);
        assert!(emu.contains("g_drive.zip"));
        assert!(emu.contains("dosee-core.mem"));
        assert!(!emu.contains("file.list.json"));
    }

    fn entry(name: &str, size: u64) -> FileEntry {
        FileEntry {
            name: name.to_string(),
            path: PathBuf::from(name),
            size,
            modified: None,
            mode: 0o100644,
        }
    }

    #[test]
    fn test_find_orphans_extension_agnostic() {
        let ids: IdentifierSet = ["aaaa-1111".to_string()].into_iter().collect();
        let entries = vec![
            entry("aaaa-1111.png", 10),
            entry("aaaa-1111.json", 20),
            entry("bbbb-2222.png", 30),
            entry(SENTINEL, 40),
        ];
        let ignore = ignore_list(Role::Uuid);
        let orphans = find_orphans(&entries, &ids, &ignore);

        // Both extensions of the known identifier survive, the sentinel is
        // ignored, only the unknown identifier is an orphan.
        assert_eq!(orphans.len(), 1);
        assert_eq!(orphans[0].name, "bbbb-2222.png");
    }

    #[test]
    fn test_find_orphans_empty_identifier_set() {
        let ids = IdentifierSet::new();
        let entries = vec![entry("cccc-3333.zip", 5), entry("blank.png", 6)];
        let ignore = ignore_list(Role::Uuid);
        let orphans = find_orphans(&entries, &ids, &ignore);
        assert_eq!(orphans.len(), 1);
        assert_eq!(orphans[0].name, "cccc-3333.zip");
    }
}
