//! Instruction disassembly for the MIPS32 integer subset.
//!
//! Disassembly is independent of machine state. It shares the decoder with the
//! engine, so anything the engine executes renders as assembler text and
//! anything it rejects renders as the unknown marker of its family.

use std::fmt;

use crate::decoder::{DecodedInstruction, DecodedOrFault, Decoder, ImmediateFields, RegisterFields};
use crate::encoding::{ImmediateOpcode, OpcodeFamily, Special2Function, SpecialFunction};
use crate::execute::{branch_displacement, jump_target, sign_extend_immediate};
use crate::memory::MemoryBus;
use crate::state::register_name;
use crate::Fault;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A single disassembled instruction row.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DisassemblyRow {
    /// Address the word was read from.
    pub address: u32,
    /// Raw instruction word.
    pub raw_word: u32,
    /// Lower-case mnemonic (e.g. `addiu`), or an unknown marker such as `R/???`.
    pub mnemonic: String,
    /// Formatted operands (e.g. `$t0, $zero, 5`); empty when there are none.
    pub operands: String,
    /// Whether the decoder rejected the word.
    pub is_unknown: bool,
}

impl DisassemblyRow {
    /// Mnemonic and operands as one line of assembler text.
    #[must_use]
    pub fn text(&self) -> String {
        if self.operands.is_empty() {
            self.mnemonic.clone()
        } else {
            format!("{} {}", self.mnemonic, self.operands)
        }
    }
}

impl fmt::Display for DisassemblyRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:08x}: {:08x}  {}",
            self.address,
            self.raw_word,
            self.text()
        )
    }
}

/// Disassembles one word as if it were located at address zero.
///
/// `J`/`JAL` targets take their top four bits from the following address,
/// so use [`disassemble_row`] when the real location matters.
#[must_use]
pub fn disassemble(word: u32) -> String {
    disassemble_row(0, word).text()
}

/// Disassembles the word located at `address`.
#[must_use]
pub fn disassemble_row(address: u32, word: u32) -> DisassemblyRow {
    let (mnemonic, operands, is_unknown) = match Decoder::decode(word) {
        DecodedOrFault::Instruction(instruction) => {
            let (mnemonic, operands) = format_instruction(address, instruction);
            (mnemonic, operands, false)
        }
        DecodedOrFault::Fault(fault) => (unknown_marker(fault).to_string(), String::new(), true),
    };
    DisassemblyRow {
        address,
        raw_word: word,
        mnemonic,
        operands,
        is_unknown,
    }
}

/// Disassembles `count` consecutive words starting at `start`.
///
/// Stops at the first word the bus cannot read, so the result may be shorter
/// than `count`. Device regions observe the reads.
#[must_use]
pub fn disassemble_range(bus: &MemoryBus, start: u32, count: usize) -> Vec<DisassemblyRow> {
    let mut rows = Vec::with_capacity(count);
    let mut address = start;
    for _ in 0..count {
        let Ok(word) = bus.read_u32(u64::from(address)) else {
            break;
        };
        rows.push(disassemble_row(address, word));
        address = address.wrapping_add(4);
    }
    rows
}

const fn unknown_marker(fault: Fault) -> &'static str {
    match fault {
        Fault::UnsupportedFunction { family, .. } => match family {
            OpcodeFamily::Register => "R/???",
            OpcodeFamily::Immediate => "I/???",
            OpcodeFamily::Special2 => "SPECIAL2/???",
            OpcodeFamily::Special3 => "SPECIAL3/???",
            _ => "???",
        },
        _ => "???",
    }
}

fn reg(index: u8) -> &'static str {
    register_name(usize::from(index))
}

fn format_instruction(address: u32, instruction: DecodedInstruction) -> (String, String) {
    match instruction {
        DecodedInstruction::Register { function, fields } => format_register(function, fields),
        DecodedInstruction::Jump { link, index } => {
            let target = jump_target(address.wrapping_add(4), index);
            let mnemonic = if link { "jal" } else { "j" };
            (mnemonic.to_string(), format!("0x{target:08x}"))
        }
        DecodedInstruction::RegisterImmediate { function, fields } => (
            function.mnemonic().to_string(),
            format!(
                "{}, {}",
                reg(fields.rs),
                branch_displacement(fields.immediate)
            ),
        ),
        DecodedInstruction::Immediate { op, fields } => format_immediate(op, fields),
        DecodedInstruction::SetLessThanImmediate(fields) => (
            "slti".to_string(),
            format!(
                "{}, {}, {}",
                reg(fields.rt),
                reg(fields.rs),
                sign_extend_immediate(fields.immediate)
            ),
        ),
        DecodedInstruction::Coprocessor {
            unit,
            format,
            function,
        } => (
            format!("cop{unit}"),
            format!("0x{format:02x}, 0x{function:02x}"),
        ),
        DecodedInstruction::BranchNotEqualLikely(fields) => (
            "bnel".to_string(),
            format!(
                "{}, {}, {}",
                reg(fields.rs),
                reg(fields.rt),
                branch_displacement(fields.immediate)
            ),
        ),
        DecodedInstruction::Special2 { function, fields } => {
            let operands = if function == Special2Function::Mul {
                format!("{}, {}, {}", reg(fields.rd), reg(fields.rs), reg(fields.rt))
            } else {
                format!("{}, {}", reg(fields.rd), reg(fields.rs))
            };
            (function.mnemonic().to_string(), operands)
        }
        DecodedInstruction::Special3 { function, fields } => (
            function.mnemonic().to_string(),
            format!("{}, {}", reg(fields.rd), reg(fields.rt)),
        ),
    }
}

fn format_register(function: SpecialFunction, f: RegisterFields) -> (String, String) {
    let (rs, rt, rd) = (reg(f.rs), reg(f.rt), reg(f.rd));
    let mnemonic = match function {
        SpecialFunction::Srl if f.rotate => "rotr",
        SpecialFunction::Srlv if f.rotate => "rotrv",
        other => other.mnemonic(),
    };
    let operands = match function {
        SpecialFunction::Sll if f.shift_amount == 0 => return ("nop".to_string(), String::new()),
        SpecialFunction::Sll | SpecialFunction::Srl | SpecialFunction::Sra => {
            format!("{rd}, {rt}, {}", f.shift_amount)
        }
        SpecialFunction::Sllv | SpecialFunction::Srlv | SpecialFunction::Srav => {
            format!("{rd}, {rt}, {rs}")
        }
        SpecialFunction::Jr | SpecialFunction::Mthi | SpecialFunction::Mtlo => rs.to_string(),
        SpecialFunction::Jalr => format!("{rd}, {rs}"),
        SpecialFunction::Mfhi | SpecialFunction::Mflo => rd.to_string(),
        SpecialFunction::Mult
        | SpecialFunction::Multu
        | SpecialFunction::Div
        | SpecialFunction::Divu => format!("{rs}, {rt}"),
        SpecialFunction::Syscall | SpecialFunction::Break => String::new(),
        _ => format!("{rd}, {rs}, {rt}"),
    };
    (mnemonic.to_string(), operands)
}

fn format_immediate(op: ImmediateOpcode, f: ImmediateFields) -> (String, String) {
    let (rs, rt) = (reg(f.rs), reg(f.rt));
    let signed = sign_extend_immediate(f.immediate);
    let operands = if op.is_memory() {
        match op {
            ImmediateOpcode::Lwc1 | ImmediateOpcode::Swc1 => {
                format!("$f{}, {signed}({rs})", f.rt)
            }
            _ => format!("{rt}, {signed}({rs})"),
        }
    } else {
        match op {
            ImmediateOpcode::Beq | ImmediateOpcode::Bne => {
                format!("{rs}, {rt}, {}", branch_displacement(f.immediate))
            }
            ImmediateOpcode::Blez | ImmediateOpcode::Bgtz => {
                format!("{rs}, {}", branch_displacement(f.immediate))
            }
            ImmediateOpcode::Andi | ImmediateOpcode::Ori | ImmediateOpcode::Xori => {
                format!("{rt}, {rs}, 0x{:04x}", f.immediate)
            }
            ImmediateOpcode::Lui => format!("{rt}, 0x{:04x}", f.immediate),
            _ => format!("{rt}, {rs}, {signed}"),
        }
    };
    (op.mnemonic().to_string(), operands)
}
