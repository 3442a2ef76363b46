//! Per-run accounting of shift outcomes
//!
//! Every entry the traversal touches is recorded exactly once. Warnings and
//! failures are logged when they are recorded and kept in the report so a
//! caller can inspect them after the run.

use crate::entry::EntryOutcome;
use crate::error::{EntryError, EntryWarning, WalkError};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{error, warn};

/// Accumulated result of a tree shift
#[derive(Debug, Default)]
pub struct ShiftReport {
    /// Entries whose ownership changed, with or without warnings
    pub shifted: u64,
    /// Entries already at their shifted ownership
    pub unchanged: u64,
    /// Entries that were shifted but lost some metadata
    pub entries_with_warnings: u64,
    /// Every warning, with the entry it belongs to
    pub warnings: Vec<(PathBuf, EntryWarning)>,
    /// Entries that could not be shifted and directories that could not be listed
    pub failures: Vec<(PathBuf, EntryError)>,
}

impl ShiftReport {
    /// Record the outcome of one entry
    pub fn record(&mut self, path: &Path, outcome: EntryOutcome) {
        match outcome {
            EntryOutcome::Unchanged => self.unchanged += 1,
            EntryOutcome::Shifted(_) => self.shifted += 1,
            EntryOutcome::Warning(_, warnings) => {
                self.shifted += 1;
                self.entries_with_warnings += 1;
                for warning in warnings {
                    warn!("{}: {warning}", path.display());
                    self.warnings.push((path.to_path_buf(), warning));
                }
            }
            EntryOutcome::Fatal(e) => self.record_failure(path, e),
        }
    }

    /// Record an entry that could not be shifted
    pub fn record_failure(&mut self, path: &Path, err: EntryError) {
        error!("Error shifting {}: {err}", path.display());
        self.failures.push((path.to_path_buf(), err));
    }

    /// Record a directory whose subtree was skipped
    pub fn record_walk_error(&mut self, err: WalkError) {
        let WalkError { path, source } = err;
        self.record_failure(&path, EntryError::ReadDir(source));
    }

    /// Entries that reached the shift protocol
    ///
    /// Unlistable directories are not counted.
    #[must_use]
    pub fn entries_visited(&self) -> u64 {
        let entry_failures = self
            .failures
            .iter()
            .filter(|(_, e)| !matches!(e, EntryError::ReadDir(_)))
            .count() as u64;
        self.shifted + self.unchanged + entry_failures
    }

    /// True when nothing was lost or skipped
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty() && self.failures.is_empty()
    }
}

impl fmt::Display for ShiftReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} shifted, {} unchanged, {} warnings, {} failed",
            self.shifted,
            self.unchanged,
            self.warnings.len(),
            self.failures.len()
        )
    }
}
