//! Error types for idshift-fs

use std::io;

/// Result alias used by every primitive in this crate
pub type Result<T> = std::result::Result<T, ExtendedError>;

/// Errors raised by the filesystem primitives
#[derive(Debug, thiserror::Error)]
pub enum ExtendedError {
    /// A syscall returned an error
    #[error("{op} failed: {source}")]
    Syscall {
        /// Name of the failing syscall (`lstat`, `lchown`, `lsetxattr`, ...)
        op: &'static str,
        /// Underlying OS error
        #[source]
        source: io::Error,
    },

    /// The blocking task running the syscall panicked or was cancelled
    #[error("blocking task failed: {0}")]
    SpawnJoin(String),
}

impl ExtendedError {
    /// Raw OS error code, when the failure came from a syscall
    #[must_use]
    pub fn raw_os_error(&self) -> Option<i32> {
        match self {
            Self::Syscall { source, .. } => source.raw_os_error(),
            Self::SpawnJoin(_) => None,
        }
    }

    /// True when the filesystem does not support the operation at all
    /// (`ENOTSUP` / `EOPNOTSUPP`), e.g. listing xattrs on tmpfs without xattr support
    #[must_use]
    pub fn is_unsupported(&self) -> bool {
        matches!(
            self.raw_os_error(),
            Some(code) if code == libc::ENOTSUP || code == libc::EOPNOTSUPP
        )
    }
}

/// Build a syscall error from an `io::Error`
pub(crate) fn syscall_error(op: &'static str, source: io::Error) -> ExtendedError {
    ExtendedError::Syscall { op, source }
}

/// Build a syscall error from a nix errno
pub(crate) fn errno_error(op: &'static str, errno: nix::errno::Errno) -> ExtendedError {
    ExtendedError::Syscall {
        op,
        source: io::Error::from(errno),
    }
}
