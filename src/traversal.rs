//! Bottom-up traversal that shifts every entry of a tree exactly once
//!
//! Per level, in this order:
//!
//! 1. every non-directory entry (files, symlinks to non-directories, devices, ...)
//! 2. every symlink to a directory; the walk never descends into these, so
//!    this is the only place they get shifted
//! 3. the directory itself
//!
//! Real subdirectories are shifted as the last step of their own level,
//! which the walker yields before their parent's. A directory's ownership
//! therefore only changes once nothing below it remains to be touched, and
//! the root is the very last entry of the run.

use crate::entry::shift_entry;
use crate::fs::ShiftFs;
use crate::shift::ShiftConfig;
use crate::stats::ShiftReport;
use crate::walk::{BottomUpWalker, DirLevel};
use std::path::Path;
use tracing::debug;

/// Shift every entry under `root`, `root` included
///
/// Never fails as a whole: per-entry failures and unreadable directories are
/// collected in the returned report.
pub async fn shift_tree<F: ShiftFs>(fs: &F, root: &Path, config: &ShiftConfig) -> ShiftReport {
    let mut report = ShiftReport::default();
    let mut walker = BottomUpWalker::new(fs, root);

    while let Some(level) = walker.next_level().await {
        match level {
            Ok(level) => shift_level(fs, &level, config, &mut report).await,
            Err(e) => report.record_walk_error(e),
        }
    }

    report
}

async fn shift_level<F: ShiftFs>(
    fs: &F,
    level: &DirLevel,
    config: &ShiftConfig,
    report: &mut ShiftReport,
) {
    debug!(
        "Shifting {} ({} files, {} subdirectories)",
        level.dir.display(),
        level.files.len(),
        level.subdirs.len()
    );

    for name in &level.files {
        let path = level.dir.join(name);
        let outcome = shift_entry(fs, &path, config).await;
        report.record(&path, outcome);
    }

    for sub in level.subdirs.iter().filter(|sub| sub.symlink) {
        let path = level.dir.join(&sub.name);
        let outcome = shift_entry(fs, &path, config).await;
        report.record(&path, outcome);
    }

    let outcome = shift_entry(fs, &level.dir, config).await;
    report.record(&level.dir, outcome);
}
