//! Boundary-aware id shifting
//!
//! An offset translates ids between two namespaces, typically container ids
//! starting at 0 and the host range they are mapped to:
//!
//! - positive offset `o`: ids below `o` move up by `o`; ids at or above `o`
//!   are taken to be host ids already and stay put
//! - negative offset `-o`: ids at or above `o` move down by `o`; ids below
//!   `o` are taken to be unshifted already (root stays root)
//!
//! Arithmetic is checked: an id that would leave its integer width is
//! rejected with [`IdOverflow`] instead of wrapping. The all-ones value of
//! the width is rejected too: `(uid_t)-1` tells `chown(2)` to leave the id
//! alone, so a shift landing on it would silently do nothing.

use crate::error::IdOverflow;
use std::fmt;
use std::num::NonZeroI64;

/// Signed, non-zero offset added to qualifying ids
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShiftOffset(NonZeroI64);

impl ShiftOffset {
    /// Create an offset, `None` for zero
    #[must_use]
    pub const fn new(offset: i64) -> Option<Self> {
        match NonZeroI64::new(offset) {
            Some(value) => Some(Self(value)),
            None => None,
        }
    }

    /// The signed offset value
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0.get()
    }

    /// Absolute value of the offset, which is also the shift threshold
    #[must_use]
    pub const fn magnitude(self) -> u64 {
        self.0.get().unsigned_abs()
    }

    /// True when ids are shifted up
    #[must_use]
    pub const fn is_up(self) -> bool {
        self.0.get() > 0
    }
}

impl fmt::Display for ShiftOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:+}", self.get())
    }
}

/// Fixed-width unsigned id type that can be shifted
pub trait Id: Copy + Into<u64> + TryFrom<u64> {
    /// Width of the type in bits
    const BITS: u32;
    /// All-ones value, reserved as "no change" by the ownership syscalls
    const RESERVED: u64;
}

macro_rules! impl_id {
    ($($ty:ty),*) => {
        $(impl Id for $ty {
            const BITS: u32 = <$ty>::BITS;
            const RESERVED: u64 = <$ty>::MAX as u64;
        })*
    };
}

impl_id!(u8, u16, u32, u64);

/// Per-run settings threaded through traversal and the entry protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShiftConfig {
    /// Offset applied to every qualifying id
    pub offset: ShiftOffset,
    /// Emit one trace line per shifted entry at INFO level instead of DEBUG
    pub trace: bool,
}

impl ShiftConfig {
    /// Settings with trace lines off
    #[must_use]
    pub const fn new(offset: ShiftOffset) -> Self {
        Self {
            offset,
            trace: false,
        }
    }
}

/// Shift one id by `offset` following the boundary rule
///
/// # Errors
///
/// Returns [`IdOverflow`] if an upward shift would exceed `T`'s range or land
/// on its reserved all-ones value. Downward shifts cannot fail.
pub fn shift_id<T: Id>(id: T, offset: ShiftOffset) -> Result<T, IdOverflow> {
    let raw: u64 = id.into();
    let magnitude = offset.magnitude();
    let overflow = IdOverflow {
        id: raw,
        offset: offset.get(),
        bits: T::BITS,
    };

    if offset.is_up() {
        if raw >= magnitude {
            return Ok(id);
        }
        raw.checked_add(magnitude)
            .filter(|&shifted| shifted < T::RESERVED)
            .and_then(|shifted| T::try_from(shifted).ok())
            .ok_or(overflow)
    } else {
        if raw < magnitude {
            return Ok(id);
        }
        T::try_from(raw - magnitude).map_err(|_| overflow)
    }
}
