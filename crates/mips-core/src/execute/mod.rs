//! Instruction execution engine.
//!
//! One step is: fetch the word at `PC`, advance `PC` by four, decode, and
//! dispatch to the family handler. Handlers never abort a step. Faults are
//! reported to the injected sink and the offending sub-operation is skipped.
//!
//! `JR`, `JALR`, and a taken `BNEL` return a [`PendingBranch`] instead of
//! writing `PC`. The step then runs exactly one more cycle for the delay
//! slot and commits the target afterwards. Inside a delay slot every
//! control-transfer instruction is reported and skipped, so the extra depth
//! is bounded to one.

#![allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]

mod alu;
mod control;
mod helpers;
mod immediate;

pub use helpers::{
    branch_displacement, branch_target, count_leading_ones, count_leading_zeros, effective_address,
    jump_target, rotate_right, sign_extend, sign_extend_immediate, untwos_complement,
};

use log::trace;

use crate::decoder::{DecodedInstruction, DecodedOrFault, Decoder, NOP_WORD};
use crate::diag::{Diagnostic, DiagnosticSink};
use crate::disasm::disassemble_row;
use crate::memory::MemoryBus;
use crate::state::RegisterFile;
use crate::{Fault, MachineConfig, StepOutcome};

/// Jump target captured before a delay slot executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingBranch {
    /// Address committed to `PC` once the delay slot has run.
    pub target: u32,
}

/// Whether a cycle runs as a normal instruction or inside a delay slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Normal,
    Delay,
}

/// Result of a handler: an optional deferred jump, or the fault that stopped
/// the handler's remaining effects.
type Flow = Result<Option<PendingBranch>, Fault>;

/// Per-step execution context borrowing the machine's state.
struct Engine<'a, S: DiagnosticSink + ?Sized> {
    registers: &'a mut RegisterFile,
    bus: &'a MemoryBus,
    sink: &'a mut S,
    trace: bool,
    /// Address of the instruction currently executing.
    pc: u32,
    first_fault: Option<Fault>,
}

impl<S: DiagnosticSink + ?Sized> Engine<'_, S> {
    fn report(&mut self, fault: Fault) {
        self.first_fault.get_or_insert(fault);
        self.sink.report(Diagnostic::Fault { pc: self.pc, fault });
    }

    fn observe(&mut self, diagnostic: Diagnostic) {
        self.sink.report(diagnostic);
    }

    fn reg(&self, index: u8) -> i32 {
        self.registers.get(usize::from(index))
    }

    fn reg_u32(&self, index: u8) -> u32 {
        self.registers.get_u32(usize::from(index))
    }

    /// Writes a register. A zero-register target is reported and the rest
    /// of the instruction carries on.
    fn write(&mut self, index: u8, value: i32) {
        if let Err(fault) = self.registers.set(usize::from(index), value) {
            self.report(fault);
        }
    }

    fn write_u32(&mut self, index: u8, value: u32) {
        self.write(index, value as i32);
    }

    /// The already-advanced program counter.
    const fn next_pc(&self) -> u32 {
        self.registers.pc()
    }

    fn fetch(&mut self) -> u32 {
        match self.bus.read_u32(u64::from(self.pc)) {
            Ok(word) => word,
            Err(error) => {
                self.report(error.into());
                NOP_WORD
            }
        }
    }

    /// One fetch/decode/execute cycle.
    fn cycle(&mut self, slot: Slot) -> Option<PendingBranch> {
        self.pc = self.registers.pc();
        let word = self.fetch();
        self.registers.set_pc(self.pc.wrapping_add(4));

        if self.trace {
            trace!(target: "mips_core::trace", "{}", disassemble_row(self.pc, word));
        }

        let instruction = match Decoder::decode(word) {
            DecodedOrFault::Instruction(instruction) => instruction,
            DecodedOrFault::Fault(fault) => {
                self.report(fault);
                return None;
            }
        };

        if slot == Slot::Delay && instruction.is_control_transfer() {
            self.report(Fault::ControlTransferInDelaySlot { word });
            return None;
        }

        match self.dispatch(instruction) {
            Ok(pending) => pending,
            Err(fault) => {
                self.report(fault);
                None
            }
        }
    }

    fn dispatch(&mut self, instruction: DecodedInstruction) -> Flow {
        match instruction {
            DecodedInstruction::Register { function, fields } => {
                self.execute_register(function, fields)
            }
            DecodedInstruction::Jump { link, index } => {
                self.execute_jump(link, index);
                Ok(None)
            }
            DecodedInstruction::RegisterImmediate { function, fields } => {
                self.execute_regimm(function, fields);
                Ok(None)
            }
            DecodedInstruction::Immediate { op, fields } => self.execute_immediate(op, fields),
            DecodedInstruction::SetLessThanImmediate(fields) => {
                self.execute_slti(fields);
                Ok(None)
            }
            DecodedInstruction::Coprocessor {
                unit,
                format,
                function,
            } => {
                self.observe(Diagnostic::Coprocessor {
                    pc: self.pc,
                    unit,
                    format,
                    function,
                });
                Ok(None)
            }
            DecodedInstruction::BranchNotEqualLikely(fields) => Ok(self.execute_bnel(fields)),
            DecodedInstruction::Special2 { function, fields } => {
                self.execute_special2(function, fields);
                Ok(None)
            }
            DecodedInstruction::Special3 { function, fields } => {
                self.execute_special3(function, fields);
                Ok(None)
            }
        }
    }
}

/// Executes one step: a fetch/decode/execute cycle, plus the delay slot
/// when the instruction defers a jump.
///
/// Faults never escape: each is reported to `sink` and the first one is
/// also returned in the outcome for drivers that want it.
pub fn step_one<S: DiagnosticSink + ?Sized>(
    registers: &mut RegisterFile,
    bus: &MemoryBus,
    sink: &mut S,
    config: &MachineConfig,
) -> StepOutcome {
    let mut engine = Engine {
        registers,
        bus,
        sink,
        trace: config.trace_instructions,
        pc: 0,
        first_fault: None,
    };

    let mut cycles = 1;
    if let Some(branch) = engine.cycle(Slot::Normal) {
        let pending = engine.cycle(Slot::Delay);
        debug_assert!(pending.is_none(), "delay slot cannot defer a jump");
        cycles += 1;
        engine.registers.set_pc(branch.target);
    }

    let retired = StepOutcome::Retired { cycles };
    engine
        .first_fault
        .map_or(retired, |fault| StepOutcome::Faulted { cycles, fault })
}
