//! I-type handlers: immediate arithmetic, loads, and stores.

use super::control::BranchOp;
use super::helpers::{effective_address, sign_extend_immediate};
use super::{Engine, Flow};
use crate::decoder::ImmediateFields;
use crate::diag::{Diagnostic, DiagnosticSink};
use crate::encoding::ImmediateOpcode;
use crate::memory::{validate_half_alignment, validate_word_alignment};
use crate::Fault;

impl<S: DiagnosticSink + ?Sized> Engine<'_, S> {
    pub(super) fn execute_immediate(&mut self, op: ImmediateOpcode, f: ImmediateFields) -> Flow {
        let rs = self.reg(f.rs);
        let simm = sign_extend_immediate(f.immediate);
        let zimm = u32::from(f.immediate);

        match op {
            ImmediateOpcode::Beq => self.execute_branch(BranchOp::Eq, f),
            ImmediateOpcode::Bne => self.execute_branch(BranchOp::Ne, f),
            ImmediateOpcode::Blez => self.execute_branch(BranchOp::LeZero, f),
            ImmediateOpcode::Bgtz => self.execute_branch(BranchOp::GtZero, f),
            ImmediateOpcode::Addi => match rs.checked_add(simm) {
                Some(sum) => self.write(f.rt, sum),
                None => return Err(Fault::ArithmeticOverflow { lhs: rs, rhs: simm }),
            },
            ImmediateOpcode::Addiu => self.write(f.rt, rs.wrapping_add(simm)),
            ImmediateOpcode::Sltiu => self.execute_sltiu(f),
            ImmediateOpcode::Andi => self.write_u32(f.rt, self.reg_u32(f.rs) & zimm),
            ImmediateOpcode::Ori => self.write_u32(f.rt, self.reg_u32(f.rs) | zimm),
            ImmediateOpcode::Xori => self.write_u32(f.rt, self.reg_u32(f.rs) ^ zimm),
            ImmediateOpcode::Lui => self.write_u32(f.rt, zimm << 16),
            ImmediateOpcode::Lb
            | ImmediateOpcode::Lh
            | ImmediateOpcode::Lw
            | ImmediateOpcode::Lbu
            | ImmediateOpcode::Lhu => self.execute_load(op, f)?,
            ImmediateOpcode::Sb | ImmediateOpcode::Sh | ImmediateOpcode::Sw => {
                self.execute_store(op, f)?;
            }
            ImmediateOpcode::Lwc1 | ImmediateOpcode::Swc1 => {
                self.observe(Diagnostic::CoprocessorTransfer {
                    pc: self.pc,
                    unit: 1,
                    store: op == ImmediateOpcode::Swc1,
                    address: effective_address(rs, f.immediate),
                });
            }
        }
        Ok(None)
    }

    /// Misaligned or failed loads leave `rt` unmodified.
    fn execute_load(&mut self, op: ImmediateOpcode, f: ImmediateFields) -> Result<(), Fault> {
        let address = effective_address(self.reg(f.rs), f.immediate);
        let bus_address = u64::from(address);

        let value = match op {
            ImmediateOpcode::Lb => i32::from(self.bus.read_u8(bus_address)? as i8),
            ImmediateOpcode::Lbu => i32::from(self.bus.read_u8(bus_address)?),
            ImmediateOpcode::Lh => {
                validate_half_alignment(address)?;
                i32::from(self.bus.read_u16(bus_address)? as i16)
            }
            ImmediateOpcode::Lhu => {
                validate_half_alignment(address)?;
                i32::from(self.bus.read_u16(bus_address)?)
            }
            _ => {
                validate_word_alignment(address)?;
                self.bus.read_u32(bus_address)? as i32
            }
        };
        self.write(f.rt, value);
        Ok(())
    }

    /// Misaligned or failed stores leave memory unmodified.
    #[allow(clippy::cast_possible_truncation)]
    fn execute_store(&self, op: ImmediateOpcode, f: ImmediateFields) -> Result<(), Fault> {
        let address = effective_address(self.reg(f.rs), f.immediate);
        let bus_address = u64::from(address);
        let value = self.reg_u32(f.rt);

        match op {
            ImmediateOpcode::Sb => self.bus.write_u8(bus_address, value as u8)?,
            ImmediateOpcode::Sh => {
                validate_half_alignment(address)?;
                self.bus.write_u16(bus_address, value as u16)?;
            }
            _ => {
                validate_word_alignment(address)?;
                self.bus.write_u32(bus_address, value)?;
            }
        }
        Ok(())
    }
}
