//! Lazy bottom-up directory enumeration
//!
//! [`BottomUpWalker`] yields one [`DirLevel`] per directory, every
//! descendant level before the level of the directory containing it, the
//! root last. Symlinks to directories are listed among a level's
//! subdirectories but never walked into.
//!
//! Directories are listed only when the walk reaches them, so memory grows
//! with depth times fan-out rather than with the size of the tree.

use crate::error::WalkError;
use crate::fs::ShiftFs;
use idshift_fs::{DirEntry, EntryKind};
use std::ffi::OsString;
use std::path::PathBuf;

/// A subdirectory entry of a level
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subdir {
    /// Entry name
    pub name: OsString,
    /// True for a symlink pointing at a directory
    pub symlink: bool,
}

/// One listed directory: `(directory, subdirectory names, file names)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirLevel {
    /// The directory itself
    pub dir: PathBuf,
    /// Real directories and symlinks to directories, in listing order
    pub subdirs: Vec<Subdir>,
    /// Everything else, in listing order
    pub files: Vec<OsString>,
}

impl DirLevel {
    fn from_entries(dir: PathBuf, entries: Vec<DirEntry>) -> Self {
        let mut subdirs = Vec::new();
        let mut files = Vec::new();
        for entry in entries {
            match entry.kind {
                EntryKind::Directory => subdirs.push(Subdir {
                    name: entry.name,
                    symlink: false,
                }),
                EntryKind::SymlinkToDirectory => subdirs.push(Subdir {
                    name: entry.name,
                    symlink: true,
                }),
                EntryKind::Other => files.push(entry.name),
            }
        }
        Self {
            dir,
            subdirs,
            files,
        }
    }
}

enum Step {
    /// List this directory and schedule its children
    Enter(PathBuf),
    /// All children have been yielded; yield this level
    Leave(DirLevel),
}

/// Post-order walk over a directory tree
pub struct BottomUpWalker<'a, F> {
    fs: &'a F,
    stack: Vec<Step>,
}

impl<'a, F: ShiftFs> BottomUpWalker<'a, F> {
    /// Start a walk at `root`; nothing is listed until the first call to
    /// [`next_level`](Self::next_level)
    pub fn new(fs: &'a F, root: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            stack: vec![Step::Enter(root.into())],
        }
    }

    /// Next level in bottom-up order, `None` once the root has been yielded
    ///
    /// A directory that cannot be listed is reported as an `Err` and its
    /// subtree is skipped; the walk can continue afterwards.
    pub async fn next_level(&mut self) -> Option<Result<DirLevel, WalkError>> {
        while let Some(step) = self.stack.pop() {
            match step {
                Step::Leave(level) => return Some(Ok(level)),
                Step::Enter(dir) => match self.fs.read_dir(&dir).await {
                    Ok(entries) => {
                        let level = DirLevel::from_entries(dir, entries);
                        let children: Vec<PathBuf> = level
                            .subdirs
                            .iter()
                            .filter(|sub| !sub.symlink)
                            .map(|sub| level.dir.join(&sub.name))
                            .collect();
                        self.stack.push(Step::Leave(level));
                        // Reversed so children come off the stack in listing order
                        self.stack.extend(children.into_iter().rev().map(Step::Enter));
                    }
                    Err(source) => return Some(Err(WalkError { path: dir, source })),
                },
            }
        }
        None
    }
}
