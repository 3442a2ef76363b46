//! POSIX ACL extended-attribute codec
//!
//! Layout of `system.posix_acl_access` / `system.posix_acl_default` values,
//! all fields little-endian:
//!
//! ```text
//! +------------------+
//! | version   u32    |  always 2
//! +------------------+
//! | tag  u16 | perm u16 | id u32 |  repeated, 8 bytes each
//! +------------------+
//! ```
//!
//! Only `ACL_USER` and `ACL_GROUP` entries carry a real id. The other tags
//! store `ACL_UNDEFINED_ID` and are copied through untouched.
//!
//! Anything that does not parse is handed back as-is: an unreadable ACL
//! must never stop the owner of its entry from being shifted.

use crate::error::IdOverflow;
use crate::shift::{shift_id, ShiftOffset};
use std::ffi::OsStr;

/// The only ACL xattr version the kernel writes
pub const ACL_EA_VERSION: u32 = 2;
/// Size of the version header
pub const ACL_HEADER_SIZE: usize = 4;
/// Size of one entry
pub const ACL_ENTRY_SIZE: usize = 8;

/// Access ACL attribute name
pub const ACL_XATTR_ACCESS: &str = "system.posix_acl_access";
/// Default ACL attribute name (directories only)
pub const ACL_XATTR_DEFAULT: &str = "system.posix_acl_default";

/// True for the two attribute names that hold an ACL blob
///
/// # Example
///
/// ```rust
/// use idshift::acl::is_acl_xattr;
/// use std::ffi::OsStr;
///
/// assert!(is_acl_xattr(OsStr::new("system.posix_acl_default")));
/// assert!(!is_acl_xattr(OsStr::new("security.capability")));
/// ```
#[must_use]
pub fn is_acl_xattr(name: &OsStr) -> bool {
    name == ACL_XATTR_ACCESS || name == ACL_XATTR_DEFAULT
}

/// ACL entry tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AclTag {
    /// `ACL_USER_OBJ` (0x01): the owning user
    UserObj,
    /// `ACL_USER` (0x02): a named user, id is a uid
    User,
    /// `ACL_GROUP_OBJ` (0x04): the owning group
    GroupObj,
    /// `ACL_GROUP` (0x08): a named group, id is a gid
    Group,
    /// `ACL_MASK` (0x10)
    Mask,
    /// `ACL_OTHER` (0x20)
    Other,
    /// A tag value this codec does not know; preserved verbatim
    Unknown(u16),
}

impl AclTag {
    /// Decode a raw tag value
    #[must_use]
    pub const fn from_raw(raw: u16) -> Self {
        match raw {
            0x01 => Self::UserObj,
            0x02 => Self::User,
            0x04 => Self::GroupObj,
            0x08 => Self::Group,
            0x10 => Self::Mask,
            0x20 => Self::Other,
            other => Self::Unknown(other),
        }
    }

    /// Raw tag value as stored on disk
    #[must_use]
    pub const fn raw(self) -> u16 {
        match self {
            Self::UserObj => 0x01,
            Self::User => 0x02,
            Self::GroupObj => 0x04,
            Self::Group => 0x08,
            Self::Mask => 0x10,
            Self::Other => 0x20,
            Self::Unknown(raw) => raw,
        }
    }

    /// True if the entry's id field is a uid/gid that gets remapped
    #[must_use]
    pub const fn carries_id(self) -> bool {
        matches!(self, Self::User | Self::Group)
    }
}

/// One ACL entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AclEntry {
    /// Entry tag
    pub tag: AclTag,
    /// rwx permission bits
    pub perm: u16,
    /// uid/gid for `User`/`Group`, undefined otherwise
    pub id: u32,
}

impl AclEntry {
    fn decode(raw: &[u8; ACL_ENTRY_SIZE]) -> Self {
        let [t0, t1, p0, p1, i0, i1, i2, i3] = *raw;
        Self {
            tag: AclTag::from_raw(u16::from_le_bytes([t0, t1])),
            perm: u16::from_le_bytes([p0, p1]),
            id: u32::from_le_bytes([i0, i1, i2, i3]),
        }
    }

    fn encode_into(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.tag.raw().to_le_bytes());
        out.extend_from_slice(&self.perm.to_le_bytes());
        out.extend_from_slice(&self.id.to_le_bytes());
    }
}

/// Why a blob was returned without modification
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PassThrough {
    /// Not even a version header
    #[error("blob of {len} bytes is shorter than the 4-byte header")]
    TooShort {
        /// Blob length
        len: usize,
    },

    /// Header is not version 2
    #[error("unsupported ACL version {0}")]
    UnsupportedVersion(u32),

    /// Body is not a whole number of entries
    #[error("body of {len} bytes is not a multiple of the 8-byte entry size")]
    Misaligned {
        /// Body length after the header
        len: usize,
    },

    /// A named user/group id cannot be shifted
    #[error(transparent)]
    IdOverflow(#[from] IdOverflow),
}

impl PassThrough {
    /// True for blobs that were never a valid version-2 ACL
    #[must_use]
    pub const fn is_structural(&self) -> bool {
        !matches!(self, Self::IdOverflow(_))
    }
}

/// A parsed version-2 ACL, entry order preserved
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AclBlob {
    /// Entries in on-disk order
    pub entries: Vec<AclEntry>,
}

impl AclBlob {
    /// Parse an xattr value
    ///
    /// # Arguments
    ///
    /// * `bytes` - Raw value of `system.posix_acl_access` or `system.posix_acl_default`
    ///
    /// # Returns
    ///
    /// The entries in on-disk order, unknown tags included
    ///
    /// # Errors
    ///
    /// Returns the [`PassThrough`] reason if the blob is not a version-2 ACL
    pub fn parse(bytes: &[u8]) -> Result<Self, PassThrough> {
        let Some((header, body)) = bytes.split_first_chunk::<ACL_HEADER_SIZE>() else {
            return Err(PassThrough::TooShort { len: bytes.len() });
        };

        let version = u32::from_le_bytes(*header);
        if version != ACL_EA_VERSION {
            return Err(PassThrough::UnsupportedVersion(version));
        }

        let (chunks, remainder) = body.as_chunks::<ACL_ENTRY_SIZE>();
        if !remainder.is_empty() {
            return Err(PassThrough::Misaligned { len: body.len() });
        }

        Ok(Self {
            entries: chunks.iter().map(AclEntry::decode).collect(),
        })
    }

    /// Serialize in the kernel's layout
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(ACL_HEADER_SIZE + self.entries.len() * ACL_ENTRY_SIZE);
        out.extend_from_slice(&ACL_EA_VERSION.to_le_bytes());
        for entry in &self.entries {
            entry.encode_into(&mut out);
        }
        out
    }

    /// Shift the id of every `User`/`Group` entry
    ///
    /// Either every qualifying entry is shifted or, on overflow, none is.
    ///
    /// # Arguments
    ///
    /// * `offset` - Offset applied with the same boundary rule as owners
    ///
    /// # Errors
    ///
    /// Returns [`IdOverflow`] for the first id that is not a usable 32-bit id
    pub fn shift_ids(&mut self, offset: ShiftOffset) -> Result<(), IdOverflow> {
        let shifted = self
            .entries
            .iter()
            .map(|entry| -> Result<AclEntry, IdOverflow> {
                if entry.tag.carries_id() {
                    Ok(AclEntry {
                        id: shift_id(entry.id, offset)?,
                        ..*entry
                    })
                } else {
                    Ok(*entry)
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
        self.entries = shifted;
        Ok(())
    }
}

/// Result of running a blob through the codec
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AclShift {
    /// Parsed, remapped and re-encoded
    Shifted(Vec<u8>),
    /// Returned exactly as given
    Unchanged {
        /// The original bytes
        blob: Vec<u8>,
        /// Why the codec left it alone
        reason: PassThrough,
    },
}

impl AclShift {
    /// Bytes to write back, whichever way the codec went
    ///
    /// # Example
    ///
    /// ```rust
    /// use idshift::acl::decode_and_shift;
    /// use idshift::shift::ShiftOffset;
    ///
    /// let offset = ShiftOffset::new(1000).unwrap();
    /// // Too short to be an ACL: handed back untouched
    /// assert_eq!(decode_and_shift(&[2, 0], offset).as_bytes(), &[2_u8, 0][..]);
    /// ```
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Shifted(bytes) | Self::Unchanged { blob: bytes, .. } => bytes,
        }
    }

    /// Consume into the bytes to write back
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            Self::Shifted(bytes) | Self::Unchanged { blob: bytes, .. } => bytes,
        }
    }

    /// True if the blob went through the codec
    #[must_use]
    pub const fn is_shifted(&self) -> bool {
        matches!(self, Self::Shifted(_))
    }
}

/// Decode an ACL xattr value, shift its named user/group ids and re-encode it
///
/// Never fails. A blob is returned unchanged, with the reason, when it is too
/// short, is not version 2, is not a whole number of entries or when one of
/// its ids would overflow.
///
/// # Arguments
///
/// * `blob` - Raw ACL xattr value as read from the entry
/// * `offset` - Offset to apply to named user/group ids
///
/// # Example
///
/// ```rust
/// use idshift::acl::{decode_and_shift, AclShift};
/// use idshift::shift::ShiftOffset;
///
/// // version 2, one ACL_USER entry (tag 0x02, perm rw-) for uid 1000
/// let mut blob = 2_u32.to_le_bytes().to_vec();
/// blob.extend_from_slice(&0x02_u16.to_le_bytes());
/// blob.extend_from_slice(&6_u16.to_le_bytes());
/// blob.extend_from_slice(&1000_u32.to_le_bytes());
///
/// let AclShift::Shifted(out) = decode_and_shift(&blob, ShiftOffset::new(100_000).unwrap()) else {
///     panic!("valid ACL");
/// };
/// assert_eq!(u32::from_le_bytes(out[8..12].try_into().unwrap()), 101_000);
/// ```
#[must_use]
pub fn decode_and_shift(blob: &[u8], offset: ShiftOffset) -> AclShift {
    let shifted = AclBlob::parse(blob).and_then(|mut acl| {
        acl.shift_ids(offset)?;
        Ok(acl.encode())
    });

    match shifted {
        Ok(bytes) => AclShift::Shifted(bytes),
        Err(reason) => AclShift::Unchanged {
            blob: blob.to_vec(),
            reason,
        },
    }
}
