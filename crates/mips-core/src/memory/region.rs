//! Region contract consumed by the bus, plus a byte-array backing store.

use thiserror::Error;

use super::AccessWidth;

/// Failure reported by a region for an access at a local offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum RegionError {
    /// The access does not fit inside the region.
    #[error("{width} access at offset 0x{offset:x} is out of range")]
    OutOfRange {
        /// Region-relative offset of the access.
        offset: u64,
        /// Width of the access.
        width: AccessWidth,
    },
    /// The region does not accept writes.
    #[error("write to read-only offset 0x{offset:x}")]
    ReadOnly {
        /// Region-relative offset of the rejected write.
        offset: u64,
    },
}

/// Anything the bus can route accesses to: RAM, ROM, or a memory-mapped device.
///
/// Offsets are local to the region. The region performs its own bounds
/// checking; the bus forwards whatever the region returns.
pub trait MemoryRegion {
    /// Reads one byte.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError`] when the region cannot service the read.
    fn read_u8(&mut self, offset: u64) -> Result<u8, RegionError>;

    /// Reads a 16-bit value.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError`] when the region cannot service the read.
    fn read_u16(&mut self, offset: u64) -> Result<u16, RegionError>;

    /// Reads a 32-bit value.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError`] when the region cannot service the read.
    fn read_u32(&mut self, offset: u64) -> Result<u32, RegionError>;

    /// Reads a 64-bit value.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError`] when the region cannot service the read.
    fn read_u64(&mut self, offset: u64) -> Result<u64, RegionError>;

    /// Writes one byte.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError`] when the region rejects the write.
    fn write_u8(&mut self, offset: u64, value: u8) -> Result<(), RegionError>;

    /// Writes a 16-bit value.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError`] when the region rejects the write.
    fn write_u16(&mut self, offset: u64, value: u16) -> Result<(), RegionError>;

    /// Writes a 32-bit value.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError`] when the region rejects the write.
    fn write_u32(&mut self, offset: u64, value: u32) -> Result<(), RegionError>;

    /// Writes a 64-bit value.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError`] when the region rejects the write.
    fn write_u64(&mut self, offset: u64, value: u64) -> Result<(), RegionError>;

    /// Size of the region in bytes, when it has a meaningful one.
    fn len(&self) -> u64;

    /// Returns true if the region has no addressable bytes.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Zero-initialised little-endian byte store, optionally read-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ram {
    bytes: Box<[u8]>,
    read_only: bool,
}

impl Ram {
    /// Allocates `len` zeroed, writable bytes.
    #[must_use]
    pub fn new(len: usize) -> Self {
        Self {
            bytes: vec![0; len].into_boxed_slice(),
            read_only: false,
        }
    }

    /// Wraps an existing image as writable memory.
    #[must_use]
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            bytes: bytes.into(),
            read_only: false,
        }
    }

    /// Wraps an existing image as ROM: bus writes are rejected.
    #[must_use]
    pub fn read_only(bytes: &[u8]) -> Self {
        Self {
            bytes: bytes.into(),
            read_only: true,
        }
    }

    /// Returns true if bus writes are rejected.
    #[must_use]
    pub const fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Copies `data` into the store at `offset`, bypassing the read-only flag.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::OutOfRange`] if `data` does not fit.
    pub fn load(&mut self, offset: usize, data: &[u8]) -> Result<(), RegionError> {
        let end = offset
            .checked_add(data.len())
            .filter(|end| *end <= self.bytes.len())
            .ok_or(RegionError::OutOfRange {
                offset: offset as u64,
                width: AccessWidth::Byte,
            })?;
        self.bytes[offset..end].copy_from_slice(data);
        Ok(())
    }

    /// Little-endian 32-bit words loaded back to back from `offset`.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::OutOfRange`] if the words do not fit.
    pub fn load_words(&mut self, offset: usize, words: &[u32]) -> Result<(), RegionError> {
        let bytes: Vec<u8> = words.iter().flat_map(|word| word.to_le_bytes()).collect();
        self.load(offset, &bytes)
    }

    /// Raw contents.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    fn span(&self, offset: u64, width: AccessWidth) -> Result<std::ops::Range<usize>, RegionError> {
        let out_of_range = RegionError::OutOfRange { offset, width };
        let start = usize::try_from(offset).map_err(|_| out_of_range)?;
        let end = start
            .checked_add(width.bytes())
            .filter(|end| *end <= self.bytes.len())
            .ok_or(out_of_range)?;
        Ok(start..end)
    }

    fn read_array<const N: usize>(
        &self,
        offset: u64,
        width: AccessWidth,
    ) -> Result<[u8; N], RegionError> {
        let span = self.span(offset, width)?;
        let mut buf = [0; N];
        buf.copy_from_slice(&self.bytes[span]);
        Ok(buf)
    }

    fn write_slice(
        &mut self,
        offset: u64,
        width: AccessWidth,
        data: &[u8],
    ) -> Result<(), RegionError> {
        if self.read_only {
            return Err(RegionError::ReadOnly { offset });
        }
        let span = self.span(offset, width)?;
        self.bytes[span].copy_from_slice(data);
        Ok(())
    }
}

impl MemoryRegion for Ram {
    fn read_u8(&mut self, offset: u64) -> Result<u8, RegionError> {
        self.read_array::<1>(offset, AccessWidth::Byte).map(u8::from_le_bytes)
    }

    fn read_u16(&mut self, offset: u64) -> Result<u16, RegionError> {
        self.read_array(offset, AccessWidth::Half).map(u16::from_le_bytes)
    }

    fn read_u32(&mut self, offset: u64) -> Result<u32, RegionError> {
        self.read_array(offset, AccessWidth::Word).map(u32::from_le_bytes)
    }

    fn read_u64(&mut self, offset: u64) -> Result<u64, RegionError> {
        self.read_array(offset, AccessWidth::Double).map(u64::from_le_bytes)
    }

    fn write_u8(&mut self, offset: u64, value: u8) -> Result<(), RegionError> {
        self.write_slice(offset, AccessWidth::Byte, &[value])
    }

    fn write_u16(&mut self, offset: u64, value: u16) -> Result<(), RegionError> {
        self.write_slice(offset, AccessWidth::Half, &value.to_le_bytes())
    }

    fn write_u32(&mut self, offset: u64, value: u32) -> Result<(), RegionError> {
        self.write_slice(offset, AccessWidth::Word, &value.to_le_bytes())
    }

    fn write_u64(&mut self, offset: u64, value: u64) -> Result<(), RegionError> {
        self.write_slice(offset, AccessWidth::Double, &value.to_le_bytes())
    }

    fn len(&self) -> u64 {
        self.bytes.len() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::{MemoryRegion, Ram, RegionError};
    use crate::memory::AccessWidth;

    #[test]
    fn fresh_ram_is_zeroed() {
        let ram = Ram::new(64);
        assert_eq!(ram.as_bytes().len(), 64);
        assert!(ram.as_bytes().iter().all(|byte| *byte == 0));
    }

    #[test]
    fn multi_byte_values_are_little_endian() {
        let mut ram = Ram::new(16);
        ram.write_u32(4, 0x1122_3344).expect("in range");
        assert_eq!(&ram.as_bytes()[4..8], &[0x44, 0x33, 0x22, 0x11]);
        assert_eq!(ram.read_u16(4), Ok(0x3344));
        assert_eq!(ram.read_u8(7), Ok(0x11));

        ram.write_u64(8, 0x0102_0304_0506_0708).expect("in range");
        assert_eq!(ram.read_u64(8), Ok(0x0102_0304_0506_0708));
    }

    #[test]
    fn access_straddling_the_end_is_rejected() {
        let mut ram = Ram::new(8);
        assert_eq!(
            ram.read_u32(6),
            Err(RegionError::OutOfRange {
                offset: 6,
                width: AccessWidth::Word,
            })
        );
        assert_eq!(
            ram.write_u16(7, 0xffff),
            Err(RegionError::OutOfRange {
                offset: 7,
                width: AccessWidth::Half,
            })
        );
        assert_eq!(ram.read_u8(u64::MAX).map_err(|_| ()), Err(()));
        assert!(ram.as_bytes().iter().all(|byte| *byte == 0));
    }

    #[test]
    fn read_only_store_rejects_bus_writes_but_accepts_loads() {
        let mut rom = Ram::read_only(&[1, 2, 3, 4]);
        assert!(rom.is_read_only());
        assert_eq!(rom.write_u8(0, 9), Err(RegionError::ReadOnly { offset: 0 }));
        rom.load(0, &[9]).expect("image load");
        assert_eq!(rom.read_u8(0), Ok(9));
    }

    #[test]
    fn load_words_lays_out_consecutive_instructions() {
        let mut ram = Ram::new(8);
        ram.load_words(0, &[0x2408_0005, 0x2409_0007]).expect("fits");
        assert_eq!(ram.read_u32(0), Ok(0x2408_0005));
        assert_eq!(ram.read_u32(4), Ok(0x2409_0007));
        assert!(ram.load_words(4, &[0, 0]).is_err());
    }
}
