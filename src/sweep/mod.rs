pub mod backup;
pub mod delete;
pub mod report;
pub mod scan;

use std::time::Instant;
use tracing::{debug, info};

use crate::catalog::{Catalog, Role};
use crate::db::IdentifierSet;

pub use report::{OutputMode, RunSummary};
pub use scan::ScanResult;

/// Options for one reconciliation run, fixed for its duration.
#[derive(Debug, Clone, Copy)]
pub struct SweepOptions {
    /// Archive then delete all discovered orphaned files.
    pub delete: bool,
    pub output: OutputMode,
    /// Print raw byte counts and timestamps instead of humanized values.
    pub raw: bool,
}

/// Scan every given role directory against the identifier set, aggregating
/// per-directory results into a run summary. A directory that cannot be
/// listed is reported and contributes zeros; the run continues.
pub fn run(
    catalog: &Catalog,
    roles: &[Role],
    ids: &IdentifierSet,
    known_rows: usize,
    opts: SweepOptions,
) -> RunSummary {
    let start = Instant::now();
    let mut summary = RunSummary::new(known_rows, roles.len());

    report::render_preamble(opts.output);
    for &role in roles {
        let dir = catalog.path(role);
        match scan::scan_directory(role, dir, &catalog.backup, ids, opts) {
            Ok(result) => summary.add(&result),
            Err(err) => report::announce_error(dir, &err, opts.output),
        }
    }
    report::render_summary(&summary, opts);

    info!(
        "{} orphaned files found across {} directories",
        summary.count, summary.dirs_scanned
    );
    debug!(
        "sweep completed in {:.2}s",
        start.elapsed().as_secs_f64()
    );
    summary
}
