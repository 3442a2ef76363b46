//! Metadata-preserving ownership shift of a single entry
//!
//! `lchown` has side effects: the kernel drops setuid/setgid bits and the
//! `security.capability` attribute of the entry. The protocol therefore runs
//! in this order:
//!
//! 1. `lstat` the entry and compute the shifted owner; stop if nothing changes
//! 2. back up every extended attribute, remapping ACL blobs on the way
//! 3. `lchown` to the shifted owner
//! 4. restore the permission bits (not on symlinks)
//! 5. restore every backed-up attribute
//!
//! Failing steps 1 or 3 abandons the entry ([`EntryOutcome::Fatal`]). Failures
//! in steps 2, 4 and 5 are collected as warnings and the protocol carries on.
//! Nothing is rolled back.

use crate::acl::{decode_and_shift, is_acl_xattr, AclShift};
use crate::error::{EntryError, EntryWarning};
use crate::fs::ShiftFs;
use crate::metadata::{mode_string, EntryMetadata, Ownership};
use crate::shift::{ShiftConfig, ShiftOffset};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// What happened to one shifted entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShiftRecord {
    /// Path of the entry
    pub path: PathBuf,
    /// Ownership before the shift
    pub from: Ownership,
    /// Ownership after the shift
    pub to: Ownership,
    /// Mode captured before the shift
    pub mode: u32,
}

impl fmt::Display for ShiftRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} -> {}) {}",
            self.path.display(),
            self.from,
            self.to,
            mode_string(self.mode)
        )
    }
}

/// Outcome of the shift protocol for one entry
#[derive(Debug)]
pub enum EntryOutcome {
    /// Owner and group already equal their shifted values; nothing was touched
    Unchanged,
    /// Shifted with every piece of metadata restored
    Shifted(ShiftRecord),
    /// Shifted, but some metadata could not be restored
    Warning(ShiftRecord, Vec<EntryWarning>),
    /// The entry was not shifted
    Fatal(EntryError),
}

/// Shift the owner and group of `path` and put back everything the ownership
/// change clears
pub async fn shift_entry<F: ShiftFs>(fs: &F, path: &Path, config: &ShiftConfig) -> EntryOutcome {
    let mut warnings = Vec::new();
    match run_protocol(fs, path, config, &mut warnings).await {
        Ok(None) => EntryOutcome::Unchanged,
        Ok(Some(record)) if warnings.is_empty() => EntryOutcome::Shifted(record),
        Ok(Some(record)) => EntryOutcome::Warning(record, warnings),
        Err(e) => EntryOutcome::Fatal(e),
    }
}

async fn run_protocol<F: ShiftFs>(
    fs: &F,
    path: &Path,
    config: &ShiftConfig,
    warnings: &mut Vec<EntryWarning>,
) -> Result<Option<ShiftRecord>, EntryError> {
    let stat = fs.lstat(path).await.map_err(EntryError::Stat)?;
    let mut meta = EntryMetadata::from_stat(path, &stat);

    let target = meta.owner.shifted(config.offset)?;
    if target == meta.owner {
        return Ok(None);
    }

    capture_xattrs(fs, &mut meta, config.offset, warnings).await;

    fs.lchown(path, target.uid, target.gid)
        .await
        .map_err(|source| EntryError::Chown {
            uid: target.uid,
            gid: target.gid,
            source,
        })?;

    if !meta.symlink {
        let mode = meta.permissions();
        if let Err(source) = fs.chmod(path, mode).await {
            warnings.push(EntryWarning::RestoreMode { mode, source });
        }
    }

    for (name, value) in meta.xattrs.iter() {
        if let Err(source) = fs.set_xattr(path, name, value).await {
            warnings.push(EntryWarning::RestoreXattr {
                name: name.to_os_string(),
                source,
            });
        }
    }

    let record = ShiftRecord {
        path: meta.path,
        from: meta.owner,
        to: target,
        mode: meta.mode,
    };
    if config.trace {
        info!("Shifted: {record}");
    } else {
        debug!("Shifted: {record}");
    }
    Ok(Some(record))
}

/// Read every attribute of the entry into its snapshot, remapping ACLs
async fn capture_xattrs<F: ShiftFs>(
    fs: &F,
    meta: &mut EntryMetadata,
    offset: ShiftOffset,
    warnings: &mut Vec<EntryWarning>,
) {
    let names = match fs.list_xattrs(&meta.path).await {
        Ok(names) => names,
        Err(e) if e.is_unsupported() => {
            debug!("{}: no xattr support: {e}", meta.path.display());
            return;
        }
        Err(e) => {
            warnings.push(EntryWarning::ListXattrs(e));
            return;
        }
    };

    for name in names {
        let value = match fs.get_xattr(&meta.path, &name).await {
            Ok(Some(value)) => value,
            Ok(None) => {
                debug!("{}: xattr {name:?} vanished before it was read", meta.path.display());
                continue;
            }
            Err(source) => {
                warnings.push(EntryWarning::ReadXattr { name, source });
                continue;
            }
        };

        let value = if is_acl_xattr(&name) {
            match decode_and_shift(&value, offset) {
                AclShift::Shifted(bytes) => bytes,
                AclShift::Unchanged { blob, reason } => {
                    if reason.is_structural() {
                        debug!("{}: ACL {name:?} copied as-is: {reason}", meta.path.display());
                    } else {
                        warnings.push(EntryWarning::AclNotShifted {
                            name: name.clone(),
                            reason,
                        });
                    }
                    blob
                }
            }
        } else {
            value
        };

        meta.xattrs.insert(name, value);
    }
}
