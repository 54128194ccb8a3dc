use chrono::{DateTime, Local};
use indicatif::{HumanBytes, HumanCount};
use std::path::Path;
use std::time::SystemTime;
use tracing::error;

use super::delete::Outcome;
use super::scan::{FileEntry, ScanResult};
use super::SweepOptions;
use crate::error::Error;

/// Rendering mode for scan results. Silent runs route errors to the
/// diagnostic log instead of standard output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Text,
    Silent,
}

impl OutputMode {
    pub fn is_text(self) -> bool {
        self == OutputMode::Text
    }
}

/// Aggregate of every per-directory result plus the total identifier count,
/// used only for reporting.
#[derive(Debug, Clone, Copy)]
pub struct RunSummary {
    pub count: u64,
    pub fails: u64,
    pub bytes: u64,
    pub known_rows: usize,
    pub dirs_scanned: usize,
}

impl RunSummary {
    pub fn new(known_rows: usize, dirs_scanned: usize) -> Self {
        RunSummary {
            count: 0,
            fails: 0,
            bytes: 0,
            known_rows,
            dirs_scanned,
        }
    }

    pub fn add(&mut self, result: &ScanResult) {
        self.count += result.count;
        self.fails += result.fails;
        self.bytes += result.bytes;
    }
}

pub fn render_preamble(output: OutputMode) {
    if output.is_text() {
        println!("\nThe following files do not match any UUIDs in the database");
    }
}

pub fn render_directory_header(dir: &Path, output: OutputMode) {
    if output.is_text() {
        println!("\nResults from {}\n", dir.display());
    }
}

pub fn render_entry(n: u64, entry: &FileEntry, outcome: Outcome, opts: SweepOptions) {
    if opts.output.is_text() {
        println!("{}", entry_line(n, entry, outcome, opts.raw));
    }
}

pub fn render_directory_footer(result: &ScanResult, opts: SweepOptions) {
    if opts.output.is_text() {
        println!(
            "\n{} orphaned files\n{} drive space consumed",
            result.count,
            format_space(result.bytes, opts.raw)
        );
    }
}

pub fn render_summary(summary: &RunSummary, opts: SweepOptions) {
    if opts.output.is_text() {
        println!();
        for line in summary_lines(summary, opts.raw) {
            println!("{}", line);
        }
    }
}

/// Errors from a directory that cannot be scanned: printed in text mode,
/// logged in silent mode. The run continues either way.
pub fn announce_error(dir: &Path, err: &Error, output: OutputMode) {
    if output.is_text() {
        println!("Error: {}", err);
    } else {
        error!("{}: {}", dir.display(), err);
    }
}

/// One listing line: index, name, size, permission bits, modification time
/// and the deletion-outcome glyph.
pub fn entry_line(n: u64, entry: &FileEntry, outcome: Outcome, raw: bool) -> String {
    let glyph = match outcome {
        Outcome::Deleted => "  ✔",
        Outcome::Failed => "  ✖",
        Outcome::Skipped => "",
    };
    let size = if raw {
        entry.size.to_string()
    } else {
        HumanBytes(entry.size).to_string()
    };
    format!(
        "{}.\t{:<44}\t{}\t{}  {}{}",
        n,
        entry.name,
        size,
        format_mode(entry.mode),
        format_mtime(entry.modified, raw),
        glyph
    )
}

/// Summary lines: totals, a failure line only when failures occurred, and
/// an aggregate space line only when more than one directory was scanned.
pub fn summary_lines(summary: &RunSummary, raw: bool) -> Vec<String> {
    let mut lines = vec![format!(
        "Total orphaned files discovered {} out of {}",
        HumanCount(summary.count),
        HumanCount(summary.known_rows as u64)
    )];
    if summary.fails > 0 {
        lines.push(format!(
            "Due to errors, {} files could not be deleted",
            summary.fails
        ));
    }
    if summary.dirs_scanned > 1 {
        lines.push(format!(
            "{} drive space consumed",
            format_space(summary.bytes, raw)
        ));
    }
    lines
}

pub fn format_space(bytes: u64, raw: bool) -> String {
    if raw {
        format!("{} B", bytes)
    } else {
        HumanBytes(bytes).to_string()
    }
}

pub fn format_mtime(modified: Option<SystemTime>, raw: bool) -> String {
    let Some(modified) = modified else {
        return String::new();
    };
    let when: DateTime<Local> = modified.into();
    if raw {
        when.to_rfc3339()
    } else {
        when.format("%Y-%b-%d %H:%M:%S").to_string()
    }
}

/// Render unix permission bits as `-rwxrwxrwx` text.
pub fn format_mode(mode: u32) -> String {
    let mut text = String::with_capacity(10);
    text.push('-');
    for shift in [6u32, 3, 0] {
        let bits = (mode >> shift) & 0o7;
        text.push(if bits & 0o4 != 0 { 'r' } else { '-' });
        text.push(if bits & 0o2 != 0 { 'w' } else { '-' });
        text.push(if bits & 0o1 != 0 { 'x' } else { '-' });
    }
    text
}
