//! Extended attribute operations on the entry itself
//!
//! Every function here is the "l" flavour: on Linux `llistxattr`,
//! `lgetxattr` and `lsetxattr`, on macOS the same calls with
//! `XATTR_NOFOLLOW`. A symlink's own attributes are read and written, never
//! its target's. The calls go through the safe `xattr` crate and run on
//! compio's blocking pool since a value can be arbitrarily large.
//!
//! Names are kept as `OsString` so attributes with non-UTF-8 names survive a
//! backup/restore cycle untouched.

use crate::error::{syscall_error, Result};
use std::ffi::{OsStr, OsString};
use std::path::Path;

/// List all extended attributes of `path` (symlinks are not followed)
///
/// # Errors
///
/// Returns an error if `llistxattr(2)` fails. Filesystems without xattr
/// support report `ENOTSUP`, see [`crate::ExtendedError::is_unsupported`].
pub async fn llist_xattr_at_path(path: &Path) -> Result<Vec<OsString>> {
    let path = path.to_path_buf();
    crate::run_blocking(move || {
        ::xattr::list(&path)
            .map(|attrs| attrs.collect())
            .map_err(|e| syscall_error("llistxattr", e))
    })
    .await
}

/// Get one extended attribute value of `path` (symlinks are not followed)
///
/// Returns `Ok(None)` when the attribute does not exist, which happens when it
/// was removed between listing and reading.
///
/// # Errors
///
/// Returns an error if `lgetxattr(2)` fails for any other reason
pub async fn lget_xattr_at_path(path: &Path, name: &OsStr) -> Result<Option<Vec<u8>>> {
    let path = path.to_path_buf();
    let name = name.to_os_string();
    crate::run_blocking(move || {
        ::xattr::get(&path, &name).map_err(|e| syscall_error("lgetxattr", e))
    })
    .await
}

/// Set one extended attribute value on `path` (symlinks are not followed)
///
/// The attribute is created or replaced.
///
/// # Errors
///
/// Returns an error if `lsetxattr(2)` fails (permission denied, unsupported
/// namespace, `EPERM` for `user.*` attributes on symlinks, ...)
pub async fn lset_xattr_at_path(path: &Path, name: &OsStr, value: &[u8]) -> Result<()> {
    let path = path.to_path_buf();
    let name = name.to_os_string();
    let value = value.to_vec();
    crate::run_blocking(move || {
        ::xattr::set(&path, &name, &value).map_err(|e| syscall_error("lsetxattr", e))
    })
    .await
}
