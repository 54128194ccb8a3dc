use std::fs;
use tracing::error;

use super::scan::FileEntry;

/// Outcome of a single orphan deletion attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Deleted,
    Failed,
    Skipped,
}

/// Remove one confirmed orphan. A failure is counted and flagged by the
/// caller but never aborts the remaining scan.
pub fn delete_orphan(entry: &FileEntry) -> Outcome {
    match fs::remove_file(&entry.path) {
        Ok(()) => Outcome::Deleted,
        Err(err) => {
            error!("failed to remove '{}': {}", entry.path.display(), err);
            Outcome::Failed
        }
    }
}
