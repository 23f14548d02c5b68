//! Register-register, multiply/divide, and bit-count handlers.

use super::helpers::{
    count_leading_ones, count_leading_zeros, rotate_right, sign_extend, sign_extend_immediate,
    untwos_complement,
};
use super::{Engine, Flow};
use crate::decoder::{ImmediateFields, RegisterFields};
use crate::diag::{Diagnostic, DiagnosticSink};
use crate::encoding::{Special2Function, Special3Function, SpecialFunction};
use crate::Fault;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ShiftOp {
    Left,
    RightLogical,
    RightArithmetic,
    RotateRight,
}

impl ShiftOp {
    const fn apply(self, value: u32, amount: u32) -> u32 {
        let amount = amount & 0x1f;
        match self {
            Self::Left => value << amount,
            Self::RightLogical => value >> amount,
            Self::RightArithmetic => sign_extend(value >> amount, 32 - amount),
            Self::RotateRight => rotate_right(value, amount),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AluOp {
    Add,
    Addu,
    Sub,
    Subu,
    And,
    Or,
    Xor,
    Nor,
    Slt,
    Sltu,
}

/// 20-bit code field of `SYSCALL`/`BREAK` (bits 25:6).
fn exception_code(fields: RegisterFields) -> u32 {
    (u32::from(fields.rs) << 15)
        | (u32::from(fields.rt) << 10)
        | (u32::from(fields.rd) << 5)
        | u32::from(fields.shift_amount)
}

impl<S: DiagnosticSink + ?Sized> Engine<'_, S> {
    pub(super) fn execute_register(
        &mut self,
        function: SpecialFunction,
        f: RegisterFields,
    ) -> Flow {
        let sa = u32::from(f.shift_amount);
        let variable = self.reg_u32(f.rs) & 0x1f;
        let right = if f.rotate {
            ShiftOp::RotateRight
        } else {
            ShiftOp::RightLogical
        };

        match function {
            // sll with a zero shift is the canonical nop
            SpecialFunction::Sll if sa == 0 => {}
            SpecialFunction::Sll => self.execute_shift(f, ShiftOp::Left, sa),
            SpecialFunction::Srl => self.execute_shift(f, right, sa),
            SpecialFunction::Sra => self.execute_shift(f, ShiftOp::RightArithmetic, sa),
            SpecialFunction::Sllv => self.execute_shift(f, ShiftOp::Left, variable),
            SpecialFunction::Srlv => self.execute_shift(f, right, variable),
            SpecialFunction::Srav => self.execute_shift(f, ShiftOp::RightArithmetic, variable),
            SpecialFunction::Jr => return Ok(Some(self.execute_jr(f))),
            SpecialFunction::Jalr => return Ok(Some(self.execute_jalr(f))),
            SpecialFunction::Movz => {
                if self.reg(f.rt) == 0 {
                    self.write(f.rd, self.reg(f.rs));
                }
            }
            SpecialFunction::Movn => {
                if self.reg(f.rt) != 0 {
                    self.write(f.rd, self.reg(f.rs));
                }
            }
            SpecialFunction::Syscall => self.observe(Diagnostic::Syscall {
                pc: self.pc,
                code: exception_code(f),
            }),
            SpecialFunction::Break => self.observe(Diagnostic::Break {
                pc: self.pc,
                code: exception_code(f),
            }),
            SpecialFunction::Mfhi => self.write(f.rd, self.registers.hi()),
            SpecialFunction::Mthi => {
                let value = self.reg(f.rs);
                self.registers.set_hi(value);
            }
            SpecialFunction::Mflo => self.write(f.rd, self.registers.lo()),
            SpecialFunction::Mtlo => {
                let value = self.reg(f.rs);
                self.registers.set_lo(value);
            }
            SpecialFunction::Mult | SpecialFunction::Multu => self.execute_multiply(function, f),
            SpecialFunction::Div | SpecialFunction::Divu => self.execute_divide(function, f),
            SpecialFunction::Add => self.execute_alu(f, AluOp::Add)?,
            SpecialFunction::Addu => self.execute_alu(f, AluOp::Addu)?,
            SpecialFunction::Sub => self.execute_alu(f, AluOp::Sub)?,
            SpecialFunction::Subu => self.execute_alu(f, AluOp::Subu)?,
            SpecialFunction::And => self.execute_alu(f, AluOp::And)?,
            SpecialFunction::Or => self.execute_alu(f, AluOp::Or)?,
            SpecialFunction::Xor => self.execute_alu(f, AluOp::Xor)?,
            SpecialFunction::Nor => self.execute_alu(f, AluOp::Nor)?,
            SpecialFunction::Slt => self.execute_alu(f, AluOp::Slt)?,
            SpecialFunction::Sltu => self.execute_alu(f, AluOp::Sltu)?,
        }
        Ok(None)
    }

    fn execute_shift(&mut self, f: RegisterFields, op: ShiftOp, amount: u32) {
        let result = op.apply(self.reg_u32(f.rt), amount);
        self.write_u32(f.rd, result);
    }

    fn execute_alu(&mut self, f: RegisterFields, op: AluOp) -> Result<(), Fault> {
        let (a, b) = (self.reg(f.rs), self.reg(f.rt));
        let (ua, ub) = (a as u32, b as u32);
        let overflow = Fault::ArithmeticOverflow { lhs: a, rhs: b };

        let result = match op {
            AluOp::Add => a.checked_add(b).ok_or(overflow)?,
            AluOp::Addu => a.wrapping_add(b),
            AluOp::Sub => a.checked_sub(b).ok_or(overflow)?,
            AluOp::Subu => a.wrapping_sub(b),
            AluOp::And => a & b,
            AluOp::Or => a | b,
            AluOp::Xor => a ^ b,
            AluOp::Nor => !(a | b),
            AluOp::Slt => i32::from(untwos_complement(ua, 32) < untwos_complement(ub, 32)),
            AluOp::Sltu => i32::from(ua < ub),
        };
        self.write(f.rd, result);
        Ok(())
    }

    #[allow(clippy::cast_possible_truncation)]
    fn execute_multiply(&mut self, function: SpecialFunction, f: RegisterFields) {
        let product = if function == SpecialFunction::Multu {
            u64::from(self.reg_u32(f.rs)) * u64::from(self.reg_u32(f.rt))
        } else {
            (i64::from(self.reg(f.rs)) * i64::from(self.reg(f.rt))) as u64
        };
        self.registers.set_hi((product >> 32) as i32);
        self.registers.set_lo(product as i32);
    }

    /// Division by zero leaves `HI`/`LO` untouched.
    fn execute_divide(&mut self, function: SpecialFunction, f: RegisterFields) {
        let (quotient, remainder) = if function == SpecialFunction::Divu {
            let (n, d) = (self.reg_u32(f.rs), self.reg_u32(f.rt));
            if d == 0 {
                return;
            }
            ((n / d) as i32, (n % d) as i32)
        } else {
            let (n, d) = (self.reg(f.rs), self.reg(f.rt));
            if d == 0 {
                return;
            }
            (n.wrapping_div(d), n.wrapping_rem(d))
        };
        self.registers.set_lo(quotient);
        self.registers.set_hi(remainder);
    }

    /// Register value un-two's-complemented at 32 bits, immediate at 16 bits.
    pub(super) fn execute_slti(&mut self, f: ImmediateFields) {
        let less = untwos_complement(self.reg_u32(f.rs), 32)
            < untwos_complement(u32::from(f.immediate), 16);
        self.write(f.rt, i32::from(less));
    }

    pub(super) fn execute_sltiu(&mut self, f: ImmediateFields) {
        let less = self.reg_u32(f.rs) < sign_extend_immediate(f.immediate) as u32;
        self.write(f.rt, i32::from(less));
    }

    /// `MUL` keeps only the low 32 bits. `HI`/`LO` are architecturally
    /// unpredictable afterwards; they are left as they were.
    pub(super) fn execute_special2(&mut self, function: Special2Function, f: RegisterFields) {
        let rs = self.reg(f.rs);
        match function {
            Special2Function::Mul => self.write(f.rd, rs.wrapping_mul(self.reg(f.rt))),
            Special2Function::Clz => self.write_u32(f.rd, count_leading_zeros(rs as u32)),
            Special2Function::Clo => self.write_u32(f.rd, count_leading_ones(rs as u32)),
        }
    }

    pub(super) fn execute_special3(&mut self, function: Special3Function, f: RegisterFields) {
        let rt = self.reg_u32(f.rt);
        let result = match function {
            Special3Function::Seb => sign_extend(rt & 0xff, 8),
            Special3Function::Seh => sign_extend(rt & 0xffff, 16),
        };
        self.write_u32(f.rd, result);
    }
}
