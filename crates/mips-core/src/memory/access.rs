//! Access widths and the engine-side alignment policy.
//!
//! The bus never checks alignment. The engine calls these validators before
//! any halfword or word data access and skips the access when they fail.

use std::fmt;

use crate::Fault;

/// Access granularity supported by the bus and its regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum AccessWidth {
    /// 8-bit access.
    Byte,
    /// 16-bit access.
    Half,
    /// 32-bit access.
    Word,
    /// 64-bit access.
    Double,
}

impl AccessWidth {
    /// Width in bits.
    #[must_use]
    pub const fn bits(self) -> u32 {
        match self {
            Self::Byte => 8,
            Self::Half => 16,
            Self::Word => 32,
            Self::Double => 64,
        }
    }

    /// Width in bytes.
    #[must_use]
    pub const fn bytes(self) -> usize {
        match self {
            Self::Byte => 1,
            Self::Half => 2,
            Self::Word => 4,
            Self::Double => 8,
        }
    }

    /// Maps a bit count back to a width.
    #[must_use]
    pub const fn from_bits(bits: u32) -> Option<Self> {
        match bits {
            8 => Some(Self::Byte),
            16 => Some(Self::Half),
            32 => Some(Self::Word),
            64 => Some(Self::Double),
            _ => None,
        }
    }

    /// Mask of the low address bits that must be clear for a natural access.
    #[must_use]
    pub const fn alignment_mask(self) -> u32 {
        match self {
            Self::Byte => 0,
            Self::Half => 1,
            Self::Word => 3,
            Self::Double => 7,
        }
    }
}

impl fmt::Display for AccessWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-bit", self.bits())
    }
}

/// Validates natural alignment of a data access.
///
/// # Errors
///
/// Returns [`Fault::MisalignedAccess`] when any bit under the width's
/// alignment mask is set.
pub const fn validate_alignment(address: u32, width: AccessWidth) -> Result<(), Fault> {
    if address & width.alignment_mask() == 0 {
        Ok(())
    } else {
        Err(Fault::MisalignedAccess { address, width })
    }
}

/// Validates alignment for halfword accesses.
///
/// # Errors
///
/// Returns [`Fault::MisalignedAccess`] when `address` is odd.
pub const fn validate_half_alignment(address: u32) -> Result<(), Fault> {
    validate_alignment(address, AccessWidth::Half)
}

/// Validates alignment for word accesses.
///
/// # Errors
///
/// Returns [`Fault::MisalignedAccess`] when either of the low two bits is set.
pub const fn validate_word_alignment(address: u32) -> Result<(), Fault> {
    validate_alignment(address, AccessWidth::Word)
}
