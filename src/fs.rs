//! Filesystem capability consumed by the shift protocol and the walker
//!
//! `ShiftFs` is the seam between shift logic and the operating system. Every
//! call acts on the entry named by the path, never on a symlink target, except
//! [`ShiftFs::chmod`], which callers must not use on symlinks.
//!
//! [`LocalFs`] is the real implementation on top of `idshift-fs`. Tests
//! substitute an in-memory implementation to observe call order and inject
//! failures.

use idshift_fs::{DirEntry, FileMetadata, Result};
use std::ffi::{OsStr, OsString};
use std::path::Path;

/// Non-dereferencing filesystem operations needed to shift one tree
///
/// # Example
///
/// ```rust,no_run
/// use idshift::fs::{LocalFs, ShiftFs};
/// use std::path::Path;
///
/// # async fn example() -> idshift_fs::Result<()> {
/// let fs = LocalFs;
/// let link = Path::new("rootfs/etc/localtime");
/// let meta = fs.lstat(link).await?;
/// // Moves the symlink itself, the zoneinfo file it points to is untouched
/// fs.lchown(link, meta.uid + 100_000, meta.gid + 100_000).await?;
/// # Ok(())
/// # }
/// ```
#[allow(async_fn_in_trait)]
pub trait ShiftFs {
    /// Metadata of the entry itself (`lstat`)
    ///
    /// # Errors
    ///
    /// Returns an error if the entry cannot be stat'ed
    async fn lstat(&self, path: &Path) -> Result<FileMetadata>;

    /// Change owner and group of the entry itself
    ///
    /// # Arguments
    ///
    /// * `path` - Entry to change; a symlink is changed, not its target
    /// * `uid` - New owner
    /// * `gid` - New group
    ///
    /// # Errors
    ///
    /// Returns an error if the ownership change is refused
    async fn lchown(&self, path: &Path, uid: u32, gid: u32) -> Result<()>;

    /// Set permission bits (low 12 bits of `mode`)
    ///
    /// # Arguments
    ///
    /// * `path` - Entry to change, never a symlink
    /// * `mode` - Permission bits including setuid/setgid/sticky; type bits are ignored
    ///
    /// # Errors
    ///
    /// Returns an error if the mode cannot be set
    async fn chmod(&self, path: &Path, mode: u32) -> Result<()>;

    /// Names of all extended attributes of the entry itself
    ///
    /// # Errors
    ///
    /// Returns an error if the attributes cannot be listed
    async fn list_xattrs(&self, path: &Path) -> Result<Vec<OsString>>;

    /// One attribute value, `None` if it no longer exists
    ///
    /// # Errors
    ///
    /// Returns an error if the attribute exists but cannot be read
    async fn get_xattr(&self, path: &Path, name: &OsStr) -> Result<Option<Vec<u8>>>;

    /// Create or replace one attribute on the entry itself
    ///
    /// # Arguments
    ///
    /// * `path` - Entry to write to
    /// * `name` - Full attribute name including its namespace, e.g. `security.capability`
    /// * `value` - Raw bytes to store
    ///
    /// # Errors
    ///
    /// Returns an error if the attribute cannot be written
    async fn set_xattr(&self, path: &Path, name: &OsStr, value: &[u8]) -> Result<()>;

    /// Children of a directory with their classification
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be listed
    async fn read_dir(&self, path: &Path) -> Result<Vec<DirEntry>>;
}

/// The local filesystem, through `idshift-fs`
///
/// Stateless; every call goes straight to the corresponding syscall.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs;

impl ShiftFs for LocalFs {
    async fn lstat(&self, path: &Path) -> Result<FileMetadata> {
        idshift_fs::metadata::lstat_at_path(path).await
    }

    async fn lchown(&self, path: &Path, uid: u32, gid: u32) -> Result<()> {
        idshift_fs::metadata::lchown_at_path(path, uid, gid).await
    }

    async fn chmod(&self, path: &Path, mode: u32) -> Result<()> {
        idshift_fs::metadata::chmod_at_path(path, mode).await
    }

    async fn list_xattrs(&self, path: &Path) -> Result<Vec<OsString>> {
        idshift_fs::xattr::llist_xattr_at_path(path).await
    }

    async fn get_xattr(&self, path: &Path, name: &OsStr) -> Result<Option<Vec<u8>>> {
        idshift_fs::xattr::lget_xattr_at_path(path, name).await
    }

    async fn set_xattr(&self, path: &Path, name: &OsStr, value: &[u8]) -> Result<()> {
        idshift_fs::xattr::lset_xattr_at_path(path, name, value).await
    }

    async fn read_dir(&self, path: &Path) -> Result<Vec<DirEntry>> {
        idshift_fs::directory::read_dir(path).await
    }
}
