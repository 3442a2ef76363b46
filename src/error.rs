//! Error taxonomy for shift operations
//!
//! - [`EntryWarning`]: one attribute or the mode restore failed; the entry is
//!   still shifted and processing continues
//! - [`EntryError`]: the entry could not be shifted at all; the walk moves on
//! - [`IdOverflow`]: a shifted id would not fit the id width
//!
//! Configuration errors are reported by the CLI layer with `anyhow` before
//! anything is touched.

use crate::acl::PassThrough;
use idshift_fs::ExtendedError;
use std::ffi::OsString;
use std::path::PathBuf;

/// A shifted id would leave the range of its integer type or hit its reserved all-ones value
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("id {id} shifted by {offset:+} is not a usable {bits}-bit id")]
pub struct IdOverflow {
    /// Id before shifting
    pub id: u64,
    /// Offset that was applied
    pub offset: i64,
    /// Width of the id type
    pub bits: u32,
}

/// Non-fatal problem while shifting one entry
#[derive(Debug, thiserror::Error)]
pub enum EntryWarning {
    /// Listing attributes failed for a reason other than missing xattr support
    #[error("could not list extended attributes: {0}")]
    ListXattrs(#[source] ExtendedError),

    /// One attribute could not be read; it is not restored
    #[error("could not read xattr {name:?}: {source}")]
    ReadXattr {
        /// Attribute name
        name: OsString,
        /// Underlying failure
        #[source]
        source: ExtendedError,
    },

    /// An ACL could not be remapped and is restored as it was
    #[error("ACL {name:?} restored without shifting: {reason}")]
    AclNotShifted {
        /// Attribute name
        name: OsString,
        /// Why the blob passed through
        reason: PassThrough,
    },

    /// Permission bits could not be put back after the ownership change
    #[error("could not restore mode {mode:04o}: {source}")]
    RestoreMode {
        /// Mode that was being restored
        mode: u32,
        /// Underlying failure
        #[source]
        source: ExtendedError,
    },

    /// One backed-up attribute could not be written back
    #[error("could not restore xattr {name:?}: {source}")]
    RestoreXattr {
        /// Attribute name
        name: OsString,
        /// Underlying failure
        #[source]
        source: ExtendedError,
    },
}

/// Failure that abandons one entry
#[derive(Debug, thiserror::Error)]
pub enum EntryError {
    /// `lstat` failed
    #[error("could not stat entry: {0}")]
    Stat(#[source] ExtendedError),

    /// The shifted owner or group is not a usable 32-bit id
    #[error("ownership cannot be shifted: {0}")]
    IdOverflow(#[from] IdOverflow),

    /// The ownership change itself failed
    #[error("could not change ownership to {uid}:{gid}: {source}")]
    Chown {
        /// Target uid
        uid: u32,
        /// Target gid
        gid: u32,
        /// Underlying failure
        #[source]
        source: ExtendedError,
    },

    /// A directory could not be listed, so its subtree was skipped
    #[error("could not read directory: {0}")]
    ReadDir(#[source] ExtendedError),
}

/// A directory that could not be listed during the walk
#[derive(Debug, thiserror::Error)]
#[error("could not read directory {}: {source}", .path.display())]
pub struct WalkError {
    /// Directory that failed to list
    pub path: PathBuf,
    /// Underlying failure
    #[source]
    pub source: ExtendedError,
}
