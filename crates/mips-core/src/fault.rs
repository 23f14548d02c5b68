use thiserror::Error;

use crate::encoding::OpcodeFamily;
use crate::memory::{AccessWidth, BusError};

/// Fault classes used for diagnostics aggregation and policy decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum FaultClass {
    /// Decoder rejected an instruction encoding.
    Decode,
    /// Bus mapping, region failure, or alignment violation.
    Memory,
    /// Invalid register-write target.
    Register,
    /// Signed overflow in a trapping arithmetic instruction.
    Arithmetic,
    /// Control transfer where one is not permitted.
    Control,
}

/// Non-fatal faults detected while executing an instruction.
///
/// None of these abort a step: the offending sub-operation is skipped, the
/// fault is reported through the machine's diagnostic sink, and execution
/// continues at the already-advanced program counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Fault {
    /// Primary opcode is not implemented.
    #[error("unsupported opcode 0x{opcode:02x}")]
    UnsupportedOpcode {
        /// Bits 31:26 of the instruction word.
        opcode: u8,
    },
    /// Function (or sub-function) code within a known family is not implemented.
    #[error("{family} unsupported function 0x{function:02x}")]
    UnsupportedFunction {
        /// Family whose function table was consulted.
        family: OpcodeFamily,
        /// The unrecognized function selector.
        function: u8,
    },
    /// Bus rejected a fetch, load, or store.
    #[error(transparent)]
    Bus(#[from] BusError),
    /// Halfword or word access not naturally aligned.
    #[error("misaligned {width} access at 0x{address:08x}")]
    MisalignedAccess {
        /// Effective address of the access.
        address: u32,
        /// Width of the attempted access.
        width: AccessWidth,
    },
    /// Write targeted register 0 and was discarded.
    #[error("write of {value} to $zero discarded")]
    ZeroRegisterWrite {
        /// The value that would have been written.
        value: i32,
    },
    /// `ADD`, `ADDI`, or `SUB` overflowed; the destination is left unchanged.
    #[error("signed overflow ({lhs}, {rhs}); result discarded")]
    ArithmeticOverflow {
        /// First operand.
        lhs: i32,
        /// Second operand.
        rhs: i32,
    },
    /// A jump or branch occupied a delay slot and was not executed.
    #[error("control transfer 0x{word:08x} in delay slot ignored")]
    ControlTransferInDelaySlot {
        /// The skipped instruction word.
        word: u32,
    },
}

impl Fault {
    /// Returns the diagnostics fault class for this fault.
    #[must_use]
    pub const fn class(&self) -> FaultClass {
        match self {
            Self::UnsupportedOpcode { .. } | Self::UnsupportedFunction { .. } => FaultClass::Decode,
            Self::Bus(_) | Self::MisalignedAccess { .. } => FaultClass::Memory,
            Self::ZeroRegisterWrite { .. } => FaultClass::Register,
            Self::ArithmeticOverflow { .. } => FaultClass::Arithmetic,
            Self::ControlTransferInDelaySlot { .. } => FaultClass::Control,
        }
    }
}
