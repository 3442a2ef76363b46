//! Directory listing with entry classification
//!
//! Uses `std::fs::read_dir` on the blocking pool because the kernel has no
//! `IORING_OP_GETDENTS64` (see <https://lwn.net/Articles/878873/>).

use crate::error::{syscall_error, Result};
use std::ffi::OsString;
use std::path::Path;

/// How a directory entry is treated by a bottom-up walk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// A real directory, walked into
    Directory,
    /// A symlink whose target is a directory; listed among directories but
    /// never walked into
    SymlinkToDirectory,
    /// Anything else: regular files, other symlinks (including dangling
    /// ones), devices, fifos, sockets
    Other,
}

/// One child of a listed directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    /// Entry name (basename only)
    pub name: OsString,
    /// Classification of the entry
    pub kind: EntryKind,
}

impl DirEntry {
    /// Create a new entry
    pub fn new(name: impl Into<OsString>, kind: EntryKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// List the children of `path` in the order the filesystem returns them
///
/// `.` and `..` are never returned. An entry whose type cannot be determined
/// (it vanished mid-listing) is classified as [`EntryKind::Other`].
///
/// # Errors
///
/// Returns an error if the directory cannot be opened or an entry cannot be read
pub async fn read_dir(path: &Path) -> Result<Vec<DirEntry>> {
    let path = path.to_path_buf();
    crate::run_blocking(move || {
        let mut entries = Vec::new();
        for entry in std::fs::read_dir(&path).map_err(|e| syscall_error("opendir", e))? {
            let entry = entry.map_err(|e| syscall_error("readdir", e))?;
            let kind = match entry.file_type() {
                Ok(file_type) if file_type.is_dir() => EntryKind::Directory,
                Ok(file_type) if file_type.is_symlink() => {
                    // Follows the link: only the target tells whether it is a directory
                    if std::fs::metadata(entry.path()).is_ok_and(|m| m.is_dir()) {
                        EntryKind::SymlinkToDirectory
                    } else {
                        EntryKind::Other
                    }
                }
                _ => EntryKind::Other,
            };
            entries.push(DirEntry::new(entry.file_name(), kind));
        }
        Ok(entries)
    })
    .await
}
