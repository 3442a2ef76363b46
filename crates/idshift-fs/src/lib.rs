//! # idshift-fs
//!
//! Filesystem primitives used when remapping ownership in place:
//! - `lstat` metadata (never follows symlinks)
//! - Ownership change on the entry itself (`fchownat` + `AT_SYMLINK_NOFOLLOW`)
//! - Permission restore including setuid/setgid/sticky bits
//! - Extended attributes (xattr) listed, read and written on the entry itself
//! - Directory listing with symlink-to-directory classification
//!
//! All operations are `async` so they compose with a compio runtime. Cheap
//! metadata syscalls run inline (feature `cheap_calls_sync`, on by default);
//! everything else goes through `compio::runtime::spawn_blocking`.
//!
//! ## Example
//!
//! ```rust,no_run
//! use idshift_fs::metadata::{lchown_at_path, lstat_at_path};
//! use std::path::Path;
//!
//! # async fn example() -> idshift_fs::Result<()> {
//! let path = Path::new("rootfs/usr/bin/passwd");
//! let meta = lstat_at_path(path).await?;
//! lchown_at_path(path, meta.uid + 100_000, meta.gid + 100_000).await?;
//! # Ok(())
//! # }
//! ```

pub mod directory;
pub mod error;
pub mod metadata;
pub mod xattr;

pub use directory::{DirEntry, EntryKind};
pub use error::{ExtendedError, Result};
pub use metadata::FileMetadata;

/// Run a closure on compio's blocking pool and flatten the join error
pub(crate) async fn run_blocking<T, F>(operation: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    compio::runtime::spawn_blocking(operation)
        .await
        .map_err(|e| ExtendedError::SpawnJoin(format!("{e:?}")))?
}
