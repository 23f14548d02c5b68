//! Jumps and branches.
//!
//! `J`, `JAL`, and the conditional branches write `PC` directly, with no
//! delay slot. `JR`, `JALR`, and a taken `BNEL` defer the jump until the
//! delay slot has executed.

use super::helpers::{branch_target, jump_target};
use super::{Engine, PendingBranch};
use crate::decoder::{ImmediateFields, RegisterFields};
use crate::diag::DiagnosticSink;
use crate::encoding::RegimmFunction;
use crate::state::RETURN_ADDRESS_REGISTER;

#[allow(clippy::cast_possible_truncation)]
const RA: u8 = RETURN_ADDRESS_REGISTER as u8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum BranchOp {
    Eq,
    Ne,
    LeZero,
    GtZero,
    LtZero,
    GeZero,
}

impl BranchOp {
    const fn taken(self, rs: i32, rt: i32) -> bool {
        match self {
            Self::Eq => rs == rt,
            Self::Ne => rs != rt,
            Self::LeZero => rs <= 0,
            Self::GtZero => rs > 0,
            Self::LtZero => rs < 0,
            Self::GeZero => rs >= 0,
        }
    }
}

impl<S: DiagnosticSink + ?Sized> Engine<'_, S> {
    pub(super) fn execute_jr(&self, f: RegisterFields) -> PendingBranch {
        PendingBranch {
            target: self.reg_u32(f.rs),
        }
    }

    /// Links the address after the delay slot. The target is read before the
    /// link is written, so `jalr $t0, $t0` jumps to the old `$t0`.
    pub(super) fn execute_jalr(&mut self, f: RegisterFields) -> PendingBranch {
        let target = self.reg_u32(f.rs);
        self.write_u32(f.rd, self.pc.wrapping_add(8));
        PendingBranch { target }
    }

    pub(super) fn execute_jump(&mut self, link: bool, index: u32) {
        let next_pc = self.next_pc();
        if link {
            self.write_u32(RA, next_pc);
        }
        self.registers.set_pc(jump_target(next_pc, index));
    }

    pub(super) fn execute_branch(&mut self, op: BranchOp, f: ImmediateFields) {
        if op.taken(self.reg(f.rs), self.reg(f.rt)) {
            let target = branch_target(self.next_pc(), f.immediate);
            self.registers.set_pc(target);
        }
    }

    /// Linking forms write `$ra` whether or not the branch is taken.
    pub(super) fn execute_regimm(&mut self, function: RegimmFunction, f: ImmediateFields) {
        let op = match function {
            RegimmFunction::Bltz | RegimmFunction::Bltzal => BranchOp::LtZero,
            RegimmFunction::Bgez | RegimmFunction::Bgezal => BranchOp::GeZero,
        };
        let taken = op.taken(self.reg(f.rs), 0);
        let next_pc = self.next_pc();
        if function.links() {
            self.write_u32(RA, next_pc);
        }
        if taken {
            self.registers.set_pc(branch_target(next_pc, f.immediate));
        }
    }

    /// Taken: defer the jump past the delay slot. Not taken: nullify the
    /// delay slot by skipping it.
    pub(super) fn execute_bnel(&mut self, f: ImmediateFields) -> Option<PendingBranch> {
        let next_pc = self.next_pc();
        if BranchOp::Ne.taken(self.reg(f.rs), self.reg(f.rt)) {
            Some(PendingBranch {
                target: branch_target(next_pc, f.immediate),
            })
        } else {
            self.registers.set_pc(next_pc.wrapping_add(4));
            None
        }
    }
}
