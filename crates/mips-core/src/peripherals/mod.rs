//! Memory-mapped devices that plug into the bus as regions.

/// Character output device.
pub mod console;
pub use console::{ConsoleDevice, CONSOLE_DATA, CONSOLE_SIZE, CONSOLE_STATUS};
