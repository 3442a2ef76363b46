//! Per-entry metadata captured before an ownership change
//!
//! # Architecture
//!
//! - `Ownership`: the (uid, gid) pair and its shifted counterpart
//! - `XattrSnapshot`: every extended attribute value read before `lchown`,
//!   ACLs already remapped
//! - `EntryMetadata`: everything the shift protocol needs to put back
//!
//! A snapshot lives for exactly one entry: it is captured, written back and
//! dropped before the next entry is touched.

use crate::error::IdOverflow;
use crate::shift::{shift_id, ShiftOffset};
use idshift_fs::FileMetadata;
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Path, PathBuf};

/// Owner and group of an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ownership {
    /// User ID of owner
    pub uid: u32,
    /// Group ID of owner
    pub gid: u32,
}

impl Ownership {
    /// Create an ownership pair
    #[must_use]
    pub const fn new(uid: u32, gid: u32) -> Self {
        Self { uid, gid }
    }

    /// Both ids shifted by `offset`
    ///
    /// # Errors
    ///
    /// Returns [`IdOverflow`] if either id would leave the 32-bit range
    pub fn shifted(self, offset: ShiftOffset) -> Result<Self, IdOverflow> {
        Ok(Self {
            uid: shift_id(self.uid, offset)?,
            gid: shift_id(self.gid, offset)?,
        })
    }
}

impl fmt::Display for Ownership {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.uid, self.gid)
    }
}

/// Extended attributes of one entry in listing order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XattrSnapshot {
    entries: Vec<(OsString, Vec<u8>)>,
}

impl XattrSnapshot {
    /// Empty snapshot
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Record a value, replacing an earlier value of the same name
    pub fn insert(&mut self, name: OsString, value: Vec<u8>) {
        if let Some(slot) = self.entries.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = value;
        } else {
            self.entries.push((name, value));
        }
    }

    /// Value recorded for `name`
    #[must_use]
    pub fn get(&self, name: &OsStr) -> Option<&[u8]> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, value)| value.as_slice())
    }

    /// Iterate over `(name, value)` in listing order
    pub fn iter(&self) -> impl Iterator<Item = (&OsStr, &[u8])> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_os_str(), value.as_slice()))
    }

    /// Number of attributes
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if nothing was captured
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Metadata of one entry captured at the start of the shift protocol
#[derive(Debug, Clone)]
pub struct EntryMetadata {
    /// Path of the entry
    pub path: PathBuf,
    /// Raw mode, type bits included
    pub mode: u32,
    /// Owner and group before the shift
    pub owner: Ownership,
    /// Whether the entry itself is a symlink
    pub symlink: bool,
    /// Attribute backup, filled in after the ownership check
    pub xattrs: XattrSnapshot,
}

impl EntryMetadata {
    /// Capture from an `lstat` result
    #[must_use]
    pub fn from_stat(path: &Path, stat: &FileMetadata) -> Self {
        Self {
            path: path.to_path_buf(),
            mode: stat.mode,
            owner: Ownership::new(stat.uid, stat.gid),
            symlink: stat.is_symlink(),
            xattrs: XattrSnapshot::new(),
        }
    }

    /// Permission bits including setuid/setgid/sticky
    #[must_use]
    pub const fn permissions(&self) -> u32 {
        self.mode & 0o7777
    }

    /// `ls -l` style mode string, e.g. `-rwsr-sr-x`
    #[must_use]
    pub fn mode_string(&self) -> String {
        mode_string(self.mode)
    }
}

/// Render a raw mode as `ls -l` does
#[must_use]
pub fn mode_string(mode: u32) -> String {
    let kind = match mode & 0o170_000 {
        0o140_000 => 's',
        0o120_000 => 'l',
        0o100_000 => '-',
        0o060_000 => 'b',
        0o040_000 => 'd',
        0o020_000 => 'c',
        0o010_000 => 'p',
        _ => '?',
    };

    // (read, write, execute, special bit, special char when executable / not)
    let triplets = [
        (0o400, 0o200, 0o100, 0o4000, ('s', 'S')),
        (0o040, 0o020, 0o010, 0o2000, ('s', 'S')),
        (0o004, 0o002, 0o001, 0o1000, ('t', 'T')),
    ];

    let mut out = String::with_capacity(10);
    out.push(kind);
    for (read, write, exec, special, (with_exec, without_exec)) in triplets {
        out.push(if mode & read != 0 { 'r' } else { '-' });
        out.push(if mode & write != 0 { 'w' } else { '-' });
        out.push(match (mode & special != 0, mode & exec != 0) {
            (true, true) => with_exec,
            (true, false) => without_exec,
            (false, true) => 'x',
            (false, false) => '-',
        });
    }
    out
}
