//! In-memory `ShiftFs` used by the integration tests
//!
//! Mirrors the kernel side effects the shift protocol has to undo: an
//! ownership change on a non-directory clears setuid/setgid and drops
//! `security.capability`. Every call is logged so tests can assert on order,
//! and any operation can be made to fail for a given path.

#![allow(dead_code)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use idshift::fs::ShiftFs;
use idshift_fs::{DirEntry, EntryKind, ExtendedError, FileMetadata, Result};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashSet};
use std::ffi::{OsStr, OsString};
use std::io;
use std::path::{Path, PathBuf};

pub const S_IFREG: u32 = 0o100_000;
pub const S_IFDIR: u32 = 0o040_000;
pub const S_IFLNK: u32 = 0o120_000;

pub const CAPABILITY: &str = "security.capability";

/// What kind of entry a node is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    File,
    Dir,
    Symlink { to_dir: bool },
}

/// One entry of the fake tree
#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    pub mode: u32,
    pub uid: u32,
    pub gid: u32,
    pub xattrs: BTreeMap<OsString, Vec<u8>>,
}

impl Node {
    fn new(kind: NodeKind, perm: u32, uid: u32, gid: u32) -> Self {
        let type_bits = match kind {
            NodeKind::File => S_IFREG,
            NodeKind::Dir => S_IFDIR,
            NodeKind::Symlink { .. } => S_IFLNK,
        };
        Self {
            kind,
            mode: type_bits | (perm & 0o7777),
            uid,
            gid,
            xattrs: BTreeMap::new(),
        }
    }

    pub const fn perm(&self) -> u32 {
        self.mode & 0o7777
    }
}

/// Operations that can be logged or made to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Lstat,
    Lchown,
    Chmod,
    ListXattrs,
    GetXattr,
    SetXattr,
    ReadDir,
}

/// One logged call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub op: Op,
    pub path: PathBuf,
}

#[derive(Default)]
pub struct MemoryFs {
    nodes: RefCell<BTreeMap<PathBuf, Node>>,
    calls: RefCell<Vec<Call>>,
    failures: RefCell<HashSet<(Op, PathBuf)>>,
    no_xattr_support: RefCell<bool>,
}

impl MemoryFs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dir(&self, path: &str, perm: u32, uid: u32, gid: u32) -> &Self {
        self.insert(path, Node::new(NodeKind::Dir, perm, uid, gid))
    }

    pub fn file(&self, path: &str, perm: u32, uid: u32, gid: u32) -> &Self {
        self.insert(path, Node::new(NodeKind::File, perm, uid, gid))
    }

    pub fn symlink(&self, path: &str, to_dir: bool, uid: u32, gid: u32) -> &Self {
        self.insert(path, Node::new(NodeKind::Symlink { to_dir }, 0o777, uid, gid))
    }

    pub fn xattr(&self, path: &str, name: &str, value: &[u8]) -> &Self {
        self.nodes
            .borrow_mut()
            .get_mut(Path::new(path))
            .expect("xattr on unknown node")
            .xattrs
            .insert(OsString::from(name), value.to_vec());
        self
    }

    fn insert(&self, path: &str, node: Node) -> &Self {
        self.nodes.borrow_mut().insert(PathBuf::from(path), node);
        self
    }

    /// Make `op` fail with EPERM on `path`
    pub fn fail(&self, op: Op, path: &str) -> &Self {
        self.failures.borrow_mut().insert((op, PathBuf::from(path)));
        self
    }

    /// Make every xattr listing fail with ENOTSUP
    pub fn without_xattr_support(&self) -> &Self {
        *self.no_xattr_support.borrow_mut() = true;
        self
    }

    pub fn node(&self, path: &str) -> Node {
        self.nodes
            .borrow()
            .get(Path::new(path))
            .cloned()
            .expect("unknown node")
    }

    pub fn owner(&self, path: &str) -> (u32, u32) {
        let node = self.node(path);
        (node.uid, node.gid)
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn calls_of(&self, op: Op) -> Vec<PathBuf> {
        self.calls
            .borrow()
            .iter()
            .filter(|call| call.op == op)
            .map(|call| call.path.clone())
            .collect()
    }

    pub fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
    }

    fn enter(&self, op: Op, path: &Path) -> Result<()> {
        self.calls.borrow_mut().push(Call {
            op,
            path: path.to_path_buf(),
        });
        if self.failures.borrow().contains(&(op, path.to_path_buf())) {
            return Err(errno(op, nix::libc::EPERM));
        }
        Ok(())
    }

    fn with_node<T>(&self, op: Op, path: &Path, f: impl FnOnce(&mut Node) -> T) -> Result<T> {
        self.nodes
            .borrow_mut()
            .get_mut(path)
            .map(f)
            .ok_or_else(|| errno(op, nix::libc::ENOENT))
    }
}

fn errno(op: Op, code: i32) -> ExtendedError {
    let op = match op {
        Op::Lstat => "lstat",
        Op::Lchown => "lchown",
        Op::Chmod => "chmod",
        Op::ListXattrs => "llistxattr",
        Op::GetXattr => "lgetxattr",
        Op::SetXattr => "lsetxattr",
        Op::ReadDir => "read_dir",
    };
    ExtendedError::Syscall {
        op,
        source: io::Error::from_raw_os_error(code),
    }
}

impl ShiftFs for MemoryFs {
    async fn lstat(&self, path: &Path) -> Result<FileMetadata> {
        self.enter(Op::Lstat, path)?;
        self.with_node(Op::Lstat, path, |node| {
            FileMetadata::new(node.mode, node.uid, node.gid)
        })
    }

    async fn lchown(&self, path: &Path, uid: u32, gid: u32) -> Result<()> {
        self.enter(Op::Lchown, path)?;
        self.with_node(Op::Lchown, path, |node| {
            node.uid = uid;
            node.gid = gid;
            if node.kind != NodeKind::Dir {
                node.mode &= !0o6000;
                node.xattrs.remove(OsStr::new(CAPABILITY));
            }
        })
    }

    async fn chmod(&self, path: &Path, mode: u32) -> Result<()> {
        self.enter(Op::Chmod, path)?;
        self.with_node(Op::Chmod, path, |node| {
            node.mode = (node.mode & !0o7777) | (mode & 0o7777);
        })
    }

    async fn list_xattrs(&self, path: &Path) -> Result<Vec<OsString>> {
        self.enter(Op::ListXattrs, path)?;
        if *self.no_xattr_support.borrow() {
            return Err(errno(Op::ListXattrs, nix::libc::ENOTSUP));
        }
        self.with_node(Op::ListXattrs, path, |node| {
            node.xattrs.keys().cloned().collect()
        })
    }

    async fn get_xattr(&self, path: &Path, name: &OsStr) -> Result<Option<Vec<u8>>> {
        self.enter(Op::GetXattr, path)?;
        self.with_node(Op::GetXattr, path, |node| node.xattrs.get(name).cloned())
    }

    async fn set_xattr(&self, path: &Path, name: &OsStr, value: &[u8]) -> Result<()> {
        self.enter(Op::SetXattr, path)?;
        self.with_node(Op::SetXattr, path, |node| {
            node.xattrs.insert(name.to_os_string(), value.to_vec());
        })
    }

    async fn read_dir(&self, path: &Path) -> Result<Vec<DirEntry>> {
        self.enter(Op::ReadDir, path)?;
        let nodes = self.nodes.borrow();
        if !nodes.contains_key(path) {
            return Err(errno(Op::ReadDir, nix::libc::ENOENT));
        }
        Ok(nodes
            .iter()
            .filter(|(child, _)| child.parent() == Some(path))
            .filter_map(|(child, node)| {
                let kind = match node.kind {
                    NodeKind::Dir => EntryKind::Directory,
                    NodeKind::Symlink { to_dir: true } => EntryKind::SymlinkToDirectory,
                    _ => EntryKind::Other,
                };
                child.file_name().map(|name| DirEntry::new(name, kind))
            })
            .collect())
    }
}

/// Build a POSIX ACL xattr blob
pub fn acl_blob(version: u32, entries: &[(u16, u16, u32)]) -> Vec<u8> {
    let mut out = version.to_le_bytes().to_vec();
    for (tag, perm, id) in entries {
        out.extend_from_slice(&tag.to_le_bytes());
        out.extend_from_slice(&perm.to_le_bytes());
        out.extend_from_slice(&id.to_le_bytes());
    }
    out
}
