//! Address decoding from bus addresses to registered regions.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use log::debug;
use thiserror::Error;

use super::{AccessWidth, MemoryRegion, RegionError};

/// Shared handle to a region. The machine's constructor keeps its own clone,
/// so regions are not owned by the bus and remain inspectable from outside.
pub type RegionHandle = Rc<RefCell<dyn MemoryRegion>>;

/// Failure of a bus access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum BusError {
    /// No registered segment matches the address.
    #[error("no such address 0x{address:08x}")]
    NoSuchAddress {
        /// The unmapped bus address.
        address: u64,
    },
    /// The owning region rejected the access.
    #[error("region rejected access at 0x{address:08x}: {source}")]
    Region {
        /// Bus address of the access.
        address: u64,
        /// Failure reported by the region.
        #[source]
        source: RegionError,
    },
}

/// One registered address range.
///
/// A segment matches address `a` when `(a & !address_mask) == base_offset`;
/// the mask holds the address bits that vary inside the region.
pub struct Segment {
    base_offset: u64,
    address_mask: u64,
    region: RegionHandle,
}

impl Segment {
    /// Base address of the range.
    #[must_use]
    pub const fn base_offset(&self) -> u64 {
        self.base_offset
    }

    /// Mask of address bits decoded by the region itself.
    #[must_use]
    pub const fn address_mask(&self) -> u64 {
        self.address_mask
    }

    /// Returns true if this segment decodes `address`.
    #[must_use]
    pub const fn matches(&self, address: u64) -> bool {
        address & !self.address_mask == self.base_offset
    }

    /// Region behind this segment.
    #[must_use]
    pub const fn region(&self) -> &RegionHandle {
        &self.region
    }
}

impl fmt::Debug for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Segment")
            .field("base_offset", &format_args!("{:#010x}", self.base_offset))
            .field("address_mask", &format_args!("{:#010x}", self.address_mask))
            .finish_non_exhaustive()
    }
}

/// Ordered list of segments, scanned linearly on every access.
///
/// Overlapping segments may be registered. Lookup always takes the first
/// match in registration order, so a later segment is unreachable wherever
/// an earlier one also matches.
#[derive(Debug, Default)]
pub struct MemoryBus {
    segments: Vec<Segment>,
}

impl MemoryBus {
    /// Creates a bus with no segments. Every access fails until regions are registered.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a segment. Overlap is neither validated nor resolved.
    pub fn register_region(&mut self, base_offset: u64, address_mask: u64, region: RegionHandle) {
        debug!(
            target: "mips_core::bus",
            "segment {} at {base_offset:#010x} mask {address_mask:#010x}",
            self.segments.len()
        );
        self.segments.push(Segment {
            base_offset,
            address_mask,
            region,
        });
    }

    /// Wraps `region` in a handle, registers it, and returns the typed handle.
    pub fn register<R>(&mut self, base_offset: u64, address_mask: u64, region: R) -> Rc<RefCell<R>>
    where
        R: MemoryRegion + 'static,
    {
        let handle = Rc::new(RefCell::new(region));
        self.register_region(base_offset, address_mask, handle.clone());
        handle
    }

    /// Registered segments in lookup order.
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Finds the first segment decoding `address` and the region-local offset.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::NoSuchAddress`] when no segment matches.
    pub fn locate(&self, address: u64) -> Result<(&Segment, u64), BusError> {
        self.segments
            .iter()
            .find(|segment| segment.matches(address))
            .map(|segment| (segment, address - segment.base_offset))
            .ok_or(BusError::NoSuchAddress { address })
    }

    fn with_region<T>(
        &self,
        address: u64,
        access: impl FnOnce(&mut dyn MemoryRegion, u64) -> Result<T, RegionError>,
    ) -> Result<T, BusError> {
        let (segment, offset) = self.locate(address)?;
        let mut region = segment.region.borrow_mut();
        access(&mut *region, offset).map_err(|source| BusError::Region { address, source })
    }

    /// Reads `width` bits at `address`, zero-extended to 64 bits.
    ///
    /// # Errors
    ///
    /// Returns [`BusError`] when the address is unmapped or the region fails.
    pub fn read(&self, width: AccessWidth, address: u64) -> Result<u64, BusError> {
        match width {
            AccessWidth::Byte => self.read_u8(address).map(u64::from),
            AccessWidth::Half => self.read_u16(address).map(u64::from),
            AccessWidth::Word => self.read_u32(address).map(u64::from),
            AccessWidth::Double => self.read_u64(address),
        }
    }

    /// Writes the low `width` bits of `value` at `address`.
    ///
    /// # Errors
    ///
    /// Returns [`BusError`] when the address is unmapped or the region fails.
    #[allow(clippy::cast_possible_truncation)]
    pub fn write(&self, width: AccessWidth, address: u64, value: u64) -> Result<(), BusError> {
        match width {
            AccessWidth::Byte => self.write_u8(address, value as u8),
            AccessWidth::Half => self.write_u16(address, value as u16),
            AccessWidth::Word => self.write_u32(address, value as u32),
            AccessWidth::Double => self.write_u64(address, value),
        }
    }

    /// Reads one byte.
    ///
    /// # Errors
    ///
    /// Returns [`BusError`] when the address is unmapped or the region fails.
    pub fn read_u8(&self, address: u64) -> Result<u8, BusError> {
        self.with_region(address, |region, offset| region.read_u8(offset))
    }

    /// Reads a 16-bit value.
    ///
    /// # Errors
    ///
    /// Returns [`BusError`] when the address is unmapped or the region fails.
    pub fn read_u16(&self, address: u64) -> Result<u16, BusError> {
        self.with_region(address, |region, offset| region.read_u16(offset))
    }

    /// Reads a 32-bit value.
    ///
    /// # Errors
    ///
    /// Returns [`BusError`] when the address is unmapped or the region fails.
    pub fn read_u32(&self, address: u64) -> Result<u32, BusError> {
        self.with_region(address, |region, offset| region.read_u32(offset))
    }

    /// Reads a 64-bit value.
    ///
    /// # Errors
    ///
    /// Returns [`BusError`] when the address is unmapped or the region fails.
    pub fn read_u64(&self, address: u64) -> Result<u64, BusError> {
        self.with_region(address, |region, offset| region.read_u64(offset))
    }

    /// Writes one byte.
    ///
    /// # Errors
    ///
    /// Returns [`BusError`] when the address is unmapped or the region fails.
    pub fn write_u8(&self, address: u64, value: u8) -> Result<(), BusError> {
        self.with_region(address, |region, offset| region.write_u8(offset, value))
    }

    /// Writes a 16-bit value.
    ///
    /// # Errors
    ///
    /// Returns [`BusError`] when the address is unmapped or the region fails.
    pub fn write_u16(&self, address: u64, value: u16) -> Result<(), BusError> {
        self.with_region(address, |region, offset| region.write_u16(offset, value))
    }

    /// Writes a 32-bit value.
    ///
    /// # Errors
    ///
    /// Returns [`BusError`] when the address is unmapped or the region fails.
    pub fn write_u32(&self, address: u64, value: u32) -> Result<(), BusError> {
        self.with_region(address, |region, offset| region.write_u32(offset, value))
    }

    /// Writes a 64-bit value.
    ///
    /// # Errors
    ///
    /// Returns [`BusError`] when the address is unmapped or the region fails.
    pub fn write_u64(&self, address: u64, value: u64) -> Result<(), BusError> {
        self.with_region(address, |region, offset| region.write_u64(offset, value))
    }
}

#[cfg(test)]
mod tests {
    use super::{BusError, MemoryBus};
    use crate::memory::{AccessWidth, MemoryRegion, Ram, RegionError};

    #[test]
    fn empty_bus_rejects_every_access() {
        let bus = MemoryBus::new();
        assert_eq!(bus.read_u32(0), Err(BusError::NoSuchAddress { address: 0 }));
        assert_eq!(
            bus.write_u8(0x1234, 1),
            Err(BusError::NoSuchAddress { address: 0x1234 })
        );
    }

    #[test]
    fn access_is_forwarded_with_region_local_offset() {
        let mut bus = MemoryBus::new();
        let low = bus.register(0x0000_0000, 0x0000_0fff, Ram::new(0x1000));
        let high = bus.register(0x1000_0000, 0x0000_0fff, Ram::new(0x1000));

        bus.write_u32(0x1000_0010, 0xdead_beef).expect("mapped");
        assert_eq!(high.borrow_mut().read_u32(0x10), Ok(0xdead_beef));
        assert!(low.borrow().as_bytes().iter().all(|byte| *byte == 0));
        assert_eq!(bus.read(AccessWidth::Word, 0x1000_0010), Ok(0xdead_beef));
    }

    #[test]
    fn first_registered_segment_wins_on_overlap() {
        let mut bus = MemoryBus::new();
        let first = bus.register(0x0000, 0x00ff, Ram::new(0x100));
        let second = bus.register(0x0000, 0xffff, Ram::new(0x1_0000));

        bus.write_u8(0x0010, 0xaa).expect("mapped");
        bus.write_u8(0x0110, 0xbb).expect("mapped");

        assert_eq!(first.borrow().as_bytes()[0x10], 0xaa);
        assert_eq!(second.borrow().as_bytes()[0x10], 0x00);
        assert_eq!(second.borrow().as_bytes()[0x110], 0xbb);
    }

    #[test]
    fn region_failures_are_propagated_verbatim() {
        let mut bus = MemoryBus::new();
        bus.register(0x8000, 0x0fff, Ram::read_only(&[0; 4]));

        assert_eq!(
            bus.write_u8(0x8000, 1),
            Err(BusError::Region {
                address: 0x8000,
                source: RegionError::ReadOnly { offset: 0 },
            })
        );
        assert_eq!(
            bus.read_u16(0x8010),
            Err(BusError::Region {
                address: 0x8010,
                source: RegionError::OutOfRange {
                    offset: 0x10,
                    width: AccessWidth::Half,
                },
            })
        );
    }

    #[test]
    fn width_generic_write_truncates_to_width() {
        let mut bus = MemoryBus::new();
        let ram = bus.register(0, 0xff, Ram::new(0x100));

        bus.write(AccessWidth::Half, 0x20, 0x1234_5678).expect("mapped");
        assert_eq!(&ram.borrow().as_bytes()[0x20..0x24], &[0x78, 0x56, 0, 0]);
        assert_eq!(bus.read(AccessWidth::Byte, 0x21), Ok(0x56));
        bus.write(AccessWidth::Double, 0x40, u64::MAX).expect("mapped");
        assert_eq!(bus.read(AccessWidth::Double, 0x40), Ok(u64::MAX));
    }

    #[test]
    fn locate_reports_matching_segment_and_offset() {
        let mut bus = MemoryBus::new();
        bus.register(0x2000, 0x00ff, Ram::new(0x100));
        let (segment, offset) = bus.locate(0x20ab).expect("mapped");
        assert_eq!(segment.base_offset(), 0x2000);
        assert_eq!(segment.address_mask(), 0x00ff);
        assert_eq!(offset, 0xab);
        assert_eq!(bus.segments().len(), 1);
    }
}
