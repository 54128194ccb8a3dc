use chrono::{DateTime, Datelike, Local, Timelike};
use std::collections::HashSet;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

use super::report::OutputMode;
use crate::error::Error;

/// Write every manifest-listed orphan under `dir` into a timestamped tar
/// archive in `backup_dir` before any deletion takes place.
///
/// Returns the archive path when at least one file was captured. Zero
/// captures, or any walk or tar error, removes the partial archive and
/// returns `None`/`Err` — an empty or corrupt archive must never stand in
/// as proof of backup for a destructive pass.
pub fn archive_orphans(
    dir: &Path,
    backup_dir: &Path,
    label: &str,
    manifest: &HashSet<String>,
    output: OutputMode,
) -> Result<Option<PathBuf>, Error> {
    if manifest.is_empty() {
        return Ok(None);
    }
    let dest = backup_dir.join(archive_name(label, Local::now()));
    match write_archive(dir, &dest, manifest, output) {
        Ok(0) => {
            let _ = fs::remove_file(&dest);
            Ok(None)
        }
        Ok(captured) => {
            debug!("captured {} files into {}", captured, dest.display());
            Ok(Some(dest))
        }
        Err(err) => {
            let _ = fs::remove_file(&dest);
            Err(err)
        }
    }
}

/// Archive filename: `bak-<label>-<year>-<month>-<day>-<hms>.tar`.
pub fn archive_name(label: &str, t: DateTime<Local>) -> String {
    format!(
        "bak-{}-{}-{}-{}-{}{}{}.tar",
        label,
        t.year(),
        t.month(),
        t.day(),
        t.hour(),
        t.minute(),
        t.second()
    )
}

fn write_archive(
    dir: &Path,
    dest: &Path,
    manifest: &HashSet<String>,
    output: OutputMode,
) -> Result<usize, Error> {
    let file = File::create(dest)?;
    let mut builder = tar::Builder::new(file);
    // Symlinks are archived as symlink headers, never dereferenced.
    builder.follow_symlinks(false);

    let mut captured = 0usize;
    for entry in WalkDir::new(dir) {
        let entry = entry?;
        let path = entry.path();
        if path == dir {
            continue;
        }
        let relative = path
            .strip_prefix(dir)
            .map_err(|err| Error::Other(err.to_string()))?;
        if !manifest.contains(relative.to_string_lossy().as_ref()) {
            continue; // no match
        }
        captured += 1;
        if captured == 1 && output.is_text() {
            println!("Archiving these files before deletion\n");
        }
        builder.append_path_with_name(path, relative)?;
    }
    builder.into_inner()?.sync_all()?;
    Ok(captured)
}
