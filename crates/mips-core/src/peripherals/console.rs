//! Console character output device.
//!
//! A 16-byte MMIO window: a store to `DATA` appends its low byte to an output
//! buffer, and `STATUS` always reads as ready.

use log::trace;

use crate::memory::{AccessWidth, MemoryRegion, RegionError};

/// Offset of the data register.
pub const CONSOLE_DATA: u64 = 0x0;

/// Offset of the status register.
pub const CONSOLE_STATUS: u64 = 0x4;

/// Size of the device window in bytes.
pub const CONSOLE_SIZE: u64 = 0x10;

const STATUS_READY: u32 = 0x1;

/// Console device. Register it on the bus with an address mask of `0xf`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsoleDevice {
    output: Vec<u8>,
}

impl ConsoleDevice {
    /// Creates a console with an empty output buffer.
    #[must_use]
    pub const fn new() -> Self {
        Self { output: Vec::new() }
    }

    /// Bytes written so far.
    #[must_use]
    pub const fn output(&self) -> &[u8] {
        self.output.as_slice()
    }

    /// Output decoded as UTF-8, lossily.
    #[must_use]
    pub fn output_lossy(&self) -> String {
        String::from_utf8_lossy(&self.output).into_owned()
    }

    /// Drains the output buffer.
    pub fn take_output(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.output)
    }

    fn read_register(offset: u64, width: AccessWidth) -> Result<u32, RegionError> {
        match (offset, width) {
            (_, AccessWidth::Double) => Err(RegionError::OutOfRange { offset, width }),
            (CONSOLE_DATA, _) => Ok(0),
            (CONSOLE_STATUS, _) => Ok(STATUS_READY),
            _ => Err(RegionError::OutOfRange { offset, width }),
        }
    }

    fn write_register(
        &mut self,
        offset: u64,
        width: AccessWidth,
        value: u32,
    ) -> Result<(), RegionError> {
        match (offset, width) {
            (_, AccessWidth::Double) => Err(RegionError::OutOfRange { offset, width }),
            (CONSOLE_DATA, _) => {
                let byte = value.to_le_bytes()[0];
                trace!(target: "mips_core::console", "putc 0x{byte:02x}");
                self.output.push(byte);
                Ok(())
            }
            (CONSOLE_STATUS, _) => Ok(()),
            _ => Err(RegionError::OutOfRange { offset, width }),
        }
    }
}

#[allow(clippy::cast_possible_truncation)]
impl MemoryRegion for ConsoleDevice {
    fn read_u8(&mut self, offset: u64) -> Result<u8, RegionError> {
        Self::read_register(offset, AccessWidth::Byte).map(|value| value as u8)
    }

    fn read_u16(&mut self, offset: u64) -> Result<u16, RegionError> {
        Self::read_register(offset, AccessWidth::Half).map(|value| value as u16)
    }

    fn read_u32(&mut self, offset: u64) -> Result<u32, RegionError> {
        Self::read_register(offset, AccessWidth::Word)
    }

    fn read_u64(&mut self, offset: u64) -> Result<u64, RegionError> {
        Self::read_register(offset, AccessWidth::Double).map(u64::from)
    }

    fn write_u8(&mut self, offset: u64, value: u8) -> Result<(), RegionError> {
        self.write_register(offset, AccessWidth::Byte, u32::from(value))
    }

    fn write_u16(&mut self, offset: u64, value: u16) -> Result<(), RegionError> {
        self.write_register(offset, AccessWidth::Half, u32::from(value))
    }

    fn write_u32(&mut self, offset: u64, value: u32) -> Result<(), RegionError> {
        self.write_register(offset, AccessWidth::Word, value)
    }

    fn write_u64(&mut self, offset: u64, value: u64) -> Result<(), RegionError> {
        self.write_register(offset, AccessWidth::Double, value as u32)
    }

    fn len(&self) -> u64 {
        CONSOLE_SIZE
    }
}

#[cfg(test)]
mod tests {
    use super::{ConsoleDevice, CONSOLE_DATA, CONSOLE_SIZE, CONSOLE_STATUS};
    use crate::memory::{AccessWidth, MemoryBus, MemoryRegion, RegionError};

    #[test]
    fn console_constants() {
        assert_eq!(CONSOLE_DATA, 0);
        assert_eq!(CONSOLE_STATUS, 4);
        assert_eq!(ConsoleDevice::new().len(), CONSOLE_SIZE);
    }

    #[test]
    fn data_writes_append_low_byte() {
        let mut console = ConsoleDevice::new();
        console.write_u8(CONSOLE_DATA, b'h').expect("byte store");
        console
            .write_u32(CONSOLE_DATA, 0x1234_5669)
            .expect("word store");
        assert_eq!(console.output(), b"hi");
        assert_eq!(console.output_lossy(), "hi");
        assert_eq!(console.take_output(), b"hi".to_vec());
        assert!(console.output().is_empty());
    }

    #[test]
    fn status_reads_ready_and_data_reads_zero() {
        let mut console = ConsoleDevice::new();
        assert_eq!(console.read_u32(CONSOLE_STATUS), Ok(1));
        assert_eq!(console.read_u8(CONSOLE_STATUS), Ok(1));
        assert_eq!(console.read_u32(CONSOLE_DATA), Ok(0));
        assert_eq!(console.write_u32(CONSOLE_STATUS, 7), Ok(()));
        assert!(console.output().is_empty());
    }

    #[test]
    fn unknown_offsets_and_double_width_fail() {
        let mut console = ConsoleDevice::new();
        assert_eq!(
            console.read_u32(0x8),
            Err(RegionError::OutOfRange {
                offset: 0x8,
                width: AccessWidth::Word,
            })
        );
        assert_eq!(
            console.write_u64(CONSOLE_DATA, 0x41),
            Err(RegionError::OutOfRange {
                offset: 0,
                width: AccessWidth::Double,
            })
        );
        assert!(console.output().is_empty());
    }

    #[test]
    fn console_behind_bus() {
        let mut bus = MemoryBus::new();
        let console = bus.register(0x1000_0000, 0xf, ConsoleDevice::new());
        for byte in b"ok\n" {
            bus.write_u8(0x1000_0000, *byte).expect("console mapped");
        }
        assert_eq!(bus.read_u32(0x1000_0004), Ok(1));
        assert_eq!(console.borrow().output_lossy(), "ok\n");
    }
}
