//! Core emulator crate for a MIPS32 integer subset.
//!
//! The caller builds a [`MemoryBus`] out of regions, hands it to a
//! [`Machine`], and drives it one [`Machine::step`] at a time. Faults never
//! abort a step; they are reported to a [`DiagnosticSink`] and execution
//! carries on.

/// Memory bus, region contract, and alignment policy.
pub mod memory;
pub use memory::{
    validate_alignment, validate_half_alignment, validate_word_alignment, AccessWidth, BusError,
    MemoryBus, MemoryRegion, Ram, RegionError, RegionHandle, Segment,
};

/// Fault reporting, diagnostic sinks, and counters.
pub mod diag;
pub use diag::{Diagnostic, DiagnosticCounters, DiagnosticSink, LogSink, RecordingSink};

/// Host-facing machine control surface.
pub mod api;
pub use api::{Machine, MachineConfig, RunBoundary, RunOutcome, StepOutcome};

/// Architectural register state.
pub mod state;
pub use state::{
    register_name, RegisterFile, GENERAL_REGISTER_COUNT, REGISTER_NAMES, RETURN_ADDRESS_REGISTER,
    ZERO_REGISTER,
};

/// Instruction field extraction and opcode tables.
pub mod encoding;
pub use encoding::{
    classify_opcode, ImmediateOpcode, OpcodeFamily, RegimmFunction, Special2Function,
    Special3Function, SpecialFunction,
};

/// Instruction decoder.
pub mod decoder;
pub use decoder::{
    DecodedInstruction, DecodedOrFault, Decoder, ImmediateFields, RegisterFields, NOP_WORD,
};

/// Fault taxonomy.
pub mod fault;
pub use fault::{Fault, FaultClass};

/// Instruction execution engine.
pub mod execute;
pub use execute::{
    branch_displacement, branch_target, count_leading_ones, count_leading_zeros, effective_address,
    jump_target, rotate_right, sign_extend, sign_extend_immediate, step_one, untwos_complement,
    PendingBranch,
};

/// Instruction disassembly.
pub mod disasm;
pub use disasm::{disassemble, disassemble_range, disassemble_row, DisassemblyRow};

/// Memory-mapped devices.
pub mod peripherals;
pub use peripherals::ConsoleDevice;

#[cfg(test)]
use env_logger as _;
#[cfg(test)]
use proptest as _;
