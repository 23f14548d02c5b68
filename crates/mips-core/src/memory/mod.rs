//! Memory bus, region contract, and data access policy.

/// Access widths and alignment validation.
pub mod access;
/// Segment list and address decoding.
pub mod bus;
/// Region trait and byte-array backing store.
pub mod region;

pub use access::{
    validate_alignment, validate_half_alignment, validate_word_alignment, AccessWidth,
};
pub use bus::{BusError, MemoryBus, RegionHandle, Segment};
pub use region::{MemoryRegion, Ram, RegionError};
