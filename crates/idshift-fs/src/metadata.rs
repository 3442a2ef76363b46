//! Path-based metadata operations that act on the entry itself
//!
//! # Operations
//!
//! - **lstat_at_path**: metadata of the entry, never its symlink target
//! - **lchown_at_path**: change ownership using `fchownat(2)` with `AT_SYMLINK_NOFOLLOW`
//! - **chmod_at_path**: set permission bits (including setuid/setgid/sticky) using `fchmodat(2)`
//!
//! Changing ownership makes the kernel drop setuid/setgid bits and file
//! capabilities. Callers that need those preserved read them first and put
//! them back afterwards with `chmod_at_path` and the xattr helpers.

use crate::error::{errno_error, Result};
use nix::sys::stat::{FchmodatFlags, Mode};
use std::path::Path;

/// Mask of the file type bits in `st_mode`
const S_IFMT: u32 = 0o170_000;
/// Regular file type bits
const S_IFREG: u32 = 0o100_000;
/// Symbolic link type bits
const S_IFLNK: u32 = 0o120_000;

/// Metadata of one filesystem entry as reported by `lstat(2)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileMetadata {
    /// File size in bytes
    pub size: u64,
    /// File mode (type + permissions)
    pub mode: u32,
    /// User ID of owner
    pub uid: u32,
    /// Group ID of owner
    pub gid: u32,
}

impl FileMetadata {
    /// Build metadata from raw mode and ownership, leaving the rest zeroed
    #[must_use]
    pub const fn new(mode: u32, uid: u32, gid: u32) -> Self {
        Self {
            size: 0,
            mode,
            uid,
            gid,
        }
    }

    /// Check if this is a regular file
    #[must_use]
    pub const fn is_file(&self) -> bool {
        (self.mode & S_IFMT) == S_IFREG
    }

    /// Check if this is a symlink
    #[must_use]
    pub const fn is_symlink(&self) -> bool {
        (self.mode & S_IFMT) == S_IFLNK
    }

    /// Get file permissions (mode & 0o7777)
    #[must_use]
    pub const fn permissions(&self) -> u32 {
        self.mode & 0o7777
    }
}

impl From<&nix::sys::stat::FileStat> for FileMetadata {
    #[allow(clippy::cast_sign_loss)] // st_size is never negative for an existing entry
    #[allow(clippy::unnecessary_cast)] // field widths differ between platforms
    fn from(stat: &nix::sys::stat::FileStat) -> Self {
        Self {
            size: stat.st_size as u64,
            mode: stat.st_mode as u32,
            uid: stat.st_uid,
            gid: stat.st_gid,
        }
    }
}

/// Get metadata of `path` without following a trailing symlink
///
/// # Errors
///
/// Returns an error if `lstat(2)` fails (missing entry, permission denied, ...)
pub async fn lstat_at_path(path: &Path) -> Result<FileMetadata> {
    let path = path.to_path_buf();
    let operation = move || {
        nix::sys::stat::lstat(path.as_path())
            .map(|stat| FileMetadata::from(&stat))
            .map_err(|e| errno_error("lstat", e))
    };

    #[cfg(feature = "cheap_calls_sync")]
    {
        operation()
    }

    #[cfg(not(feature = "cheap_calls_sync"))]
    {
        crate::run_blocking(operation).await
    }
}

/// Change ownership of `path` itself, not of a symlink target
///
/// # Errors
///
/// Returns an error if `fchownat(2)` fails, most commonly `EPERM` when the
/// caller lacks `CAP_CHOWN`
pub async fn lchown_at_path(path: &Path, uid: u32, gid: u32) -> Result<()> {
    let path = path.to_path_buf();
    let operation = move || {
        use nix::fcntl::AtFlags;
        use nix::unistd::{fchownat, Gid, Uid};

        fchownat(
            None,
            path.as_path(),
            Some(Uid::from_raw(uid)),
            Some(Gid::from_raw(gid)),
            AtFlags::AT_SYMLINK_NOFOLLOW, // Don't follow symlinks!
        )
        .map_err(|e| errno_error("lchown", e))
    };

    #[cfg(feature = "cheap_calls_sync")]
    {
        operation()
    }

    #[cfg(not(feature = "cheap_calls_sync"))]
    {
        crate::run_blocking(operation).await
    }
}

/// Set the permission bits of `path`, special bits included
///
/// Only the low 12 bits of `mode` are applied. Must not be called on
/// symlinks: Linux has no way to chmod a link itself and this call would
/// change the target instead.
///
/// # Errors
///
/// Returns an error if `fchmodat(2)` fails
pub async fn chmod_at_path(path: &Path, mode: u32) -> Result<()> {
    let path = path.to_path_buf();
    #[allow(clippy::cast_possible_truncation)] // mode_t is u16 on some BSDs, bits fit
    let mode = Mode::from_bits_truncate((mode & 0o7777) as libc::mode_t);
    let operation = move || {
        nix::sys::stat::fchmodat(None, path.as_path(), mode, FchmodatFlags::FollowSymlink)
            .map_err(|e| errno_error("chmod", e))
    };

    #[cfg(feature = "cheap_calls_sync")]
    {
        operation()
    }

    #[cfg(not(feature = "cheap_calls_sync"))]
    {
        crate::run_blocking(operation).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_type_bits() {
        assert!(FileMetadata::new(0o100_644, 0, 0).is_file());
        assert!(!FileMetadata::new(0o040_755, 0, 0).is_file());
        assert!(!FileMetadata::new(0o040_755, 0, 0).is_symlink());
        assert!(FileMetadata::new(0o120_777, 0, 0).is_symlink());
        assert!(!FileMetadata::new(0o120_777, 0, 0).is_file());
    }

    #[test]
    fn test_permissions_keep_special_bits() {
        let meta = FileMetadata::new(0o106_755, 1000, 1000);
        assert_eq!(meta.permissions(), 0o6755);
    }
}
