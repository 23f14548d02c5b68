use crate::Fault;

/// Number of general-purpose registers (`$zero..$ra`).
pub const GENERAL_REGISTER_COUNT: usize = 32;
/// Index of the hard-wired zero register.
pub const ZERO_REGISTER: usize = 0;
/// Index of the return-address register written by linking jumps.
pub const RETURN_ADDRESS_REGISTER: usize = 31;

/// Conventional assembler names, indexed by register number.
pub const REGISTER_NAMES: [&str; GENERAL_REGISTER_COUNT] = [
    "$zero", "$at", "$v0", "$v1", "$a0", "$a1", "$a2", "$a3", "$t0", "$t1", "$t2", "$t3", "$t4",
    "$t5", "$t6", "$t7", "$s0", "$s1", "$s2", "$s3", "$s4", "$s5", "$s6", "$s7", "$s8", "$s9",
    "$k0", "$k1", "$gp", "$sp", "$fp", "$ra",
];

/// Returns the assembler name of register `index`.
///
/// # Panics
///
/// Panics if `index` is not in `0..32`.
#[must_use]
pub const fn register_name(index: usize) -> &'static str {
    REGISTER_NAMES[index]
}

/// General-purpose registers plus `HI`, `LO`, and `PC`.
///
/// Register 0 always reads as zero. Writes to it are discarded and reported
/// to the caller as [`Fault::ZeroRegisterWrite`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct RegisterFile {
    general: [i32; GENERAL_REGISTER_COUNT],
    hi: i32,
    lo: i32,
    pc: u32,
}

impl RegisterFile {
    /// Creates a register file with every register and `PC` zeroed.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Zeroes all general registers, `HI`, `LO`, and `PC`.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Reads general register `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is not in `0..32`; decoded register fields are
    /// always five bits wide, so this is a caller bug.
    #[must_use]
    pub fn get(&self, index: usize) -> i32 {
        assert!(
            index < GENERAL_REGISTER_COUNT,
            "register index {index} out of range"
        );
        if index == ZERO_REGISTER {
            0
        } else {
            self.general[index]
        }
    }

    /// Reads general register `index` as an unsigned bit pattern.
    ///
    /// # Panics
    ///
    /// Panics if `index` is not in `0..32`.
    #[must_use]
    #[allow(clippy::cast_sign_loss)]
    pub fn get_u32(&self, index: usize) -> u32 {
        self.get(index) as u32
    }

    /// Writes general register `index`.
    ///
    /// # Errors
    ///
    /// Returns [`Fault::ZeroRegisterWrite`] and leaves the file unchanged when
    /// `index` is 0.
    ///
    /// # Panics
    ///
    /// Panics if `index` is not in `0..32`.
    pub fn set(&mut self, index: usize, value: i32) -> Result<(), Fault> {
        assert!(
            index < GENERAL_REGISTER_COUNT,
            "register index {index} out of range"
        );
        if index == ZERO_REGISTER {
            return Err(Fault::ZeroRegisterWrite { value });
        }
        self.general[index] = value;
        Ok(())
    }

    /// Writes an unsigned bit pattern into general register `index`.
    ///
    /// # Errors
    ///
    /// Returns [`Fault::ZeroRegisterWrite`] when `index` is 0.
    ///
    /// # Panics
    ///
    /// Panics if `index` is not in `0..32`.
    #[allow(clippy::cast_possible_wrap)]
    pub fn set_u32(&mut self, index: usize, value: u32) -> Result<(), Fault> {
        self.set(index, value as i32)
    }

    /// All general registers in index order. Element 0 is always zero.
    #[must_use]
    pub const fn general(&self) -> &[i32; GENERAL_REGISTER_COUNT] {
        &self.general
    }

    /// Returns `HI`.
    #[must_use]
    pub const fn hi(&self) -> i32 {
        self.hi
    }

    /// Sets `HI`.
    pub const fn set_hi(&mut self, value: i32) {
        self.hi = value;
    }

    /// Returns `LO`.
    #[must_use]
    pub const fn lo(&self) -> i32 {
        self.lo
    }

    /// Sets `LO`.
    pub const fn set_lo(&mut self, value: i32) {
        self.lo = value;
    }

    /// Returns the program counter.
    #[must_use]
    pub const fn pc(&self) -> u32 {
        self.pc
    }

    /// Sets the program counter.
    pub const fn set_pc(&mut self, value: u32) {
        self.pc = value;
    }
}
