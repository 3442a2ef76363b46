//! idshift - shift uid/gid ownership of a directory tree by a fixed offset
//!
//! Every entry of the tree, symlinks included, gets its owner and group moved
//! by a signed offset. The ownership change is done without dereferencing
//! symlinks, and everything the kernel clears on `lchown` (setuid/setgid
//! bits, file capabilities) is put back afterwards. User and group ids
//! embedded in POSIX ACLs are remapped with the same rule.
//!
//! ```rust,ignore
//! use idshift::fs::LocalFs;
//! use idshift::shift::{ShiftConfig, ShiftOffset};
//! use idshift::traversal::shift_tree;
//!
//! #[compio::main]
//! async fn main() {
//!     let offset = ShiftOffset::new(-1_000_000).unwrap();
//!     let report = shift_tree(&LocalFs, "rootfs".as_ref(), &ShiftConfig::new(offset)).await;
//!     println!("{report}");
//! }
//! ```

pub mod acl;
pub mod cli;
pub mod entry;
pub mod error;
pub mod fs;
pub mod metadata;
pub mod shift;
pub mod stats;
pub mod traversal;
pub mod walk;

pub use entry::{shift_entry, EntryOutcome, ShiftRecord};
pub use error::{EntryError, EntryWarning, IdOverflow, WalkError};
pub use shift::{shift_id, ShiftConfig, ShiftOffset};
pub use stats::ShiftReport;
pub use traversal::shift_tree;
