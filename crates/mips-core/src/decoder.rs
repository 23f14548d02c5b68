//! Instruction decoder for the MIPS32 integer subset.
//!
//! Decoding is separate from execution: [`Decoder::decode`] turns a raw word
//! into one tagged variant per instruction family, or the decode fault that
//! the engine reports before skipping the instruction.

use crate::encoding::{
    self, classify_opcode, ImmediateOpcode, OpcodeFamily, RegimmFunction, Special2Function,
    Special3Function, SpecialFunction, OPCODE_REGIMM, SPECIAL3_BSHFL,
};
use crate::Fault;

/// Word substituted when a fetch fails: `sll $zero, $zero, 0`.
pub const NOP_WORD: u32 = 0;

/// Register fields of R-type style encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegisterFields {
    /// First source register.
    pub rs: u8,
    /// Second source register; the source of `SEB`/`SEH`.
    pub rt: u8,
    /// Destination register.
    pub rd: u8,
    /// Shift amount, bits 10:6.
    pub shift_amount: u8,
    /// Bit 21, the rotate selector of `SRL`/`SRLV`.
    pub rotate: bool,
}

impl RegisterFields {
    /// Extracts the R-type fields of `word`.
    #[must_use]
    pub const fn from_word(word: u32) -> Self {
        Self {
            rs: encoding::rs(word),
            rt: encoding::rt(word),
            rd: encoding::rd(word),
            shift_amount: encoding::shift_amount(word),
            rotate: encoding::rotate_selected(word),
        }
    }
}

/// Register and immediate fields of I-type encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImmediateFields {
    /// Source or base register.
    pub rs: u8,
    /// Destination (loads, arithmetic) or source (stores, branches) register.
    pub rt: u8,
    /// Raw 16-bit immediate.
    pub immediate: u16,
}

impl ImmediateFields {
    /// Extracts the I-type fields of `word`.
    #[must_use]
    pub const fn from_word(word: u32) -> Self {
        Self {
            rs: encoding::rs(word),
            rt: encoding::rt(word),
            immediate: encoding::immediate(word),
        }
    }
}

/// A decoded instruction, one variant per dispatch family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecodedInstruction {
    /// Opcode `0x00`.
    Register {
        /// Operation selected by bits 5:0.
        function: SpecialFunction,
        /// Operand fields.
        fields: RegisterFields,
    },
    /// Opcodes `0x02` (`J`) and `0x03` (`JAL`).
    Jump {
        /// True for `JAL`.
        link: bool,
        /// 26-bit word index.
        index: u32,
    },
    /// Opcode `0x01`, operation selected by `rt`.
    RegisterImmediate {
        /// Branch-on-sign operation.
        function: RegimmFunction,
        /// Operand fields (`rt` is the selector, not a register).
        fields: ImmediateFields,
    },
    /// Remaining I-type opcodes.
    Immediate {
        /// Operation selected by the primary opcode.
        op: ImmediateOpcode,
        /// Operand fields.
        fields: ImmediateFields,
    },
    /// Opcode `0x0a`.
    SetLessThanImmediate(ImmediateFields),
    /// Opcodes `0x10..=0x13`: reported, never executed.
    Coprocessor {
        /// Coprocessor number, 0–3.
        unit: u8,
        /// Format field, bits 25:21.
        format: u8,
        /// Function field, bits 5:0.
        function: u8,
    },
    /// Opcode `0x15`.
    BranchNotEqualLikely(ImmediateFields),
    /// Opcode `0x1c`.
    Special2 {
        /// Operation selected by bits 5:0.
        function: Special2Function,
        /// Operand fields.
        fields: RegisterFields,
    },
    /// Opcode `0x1f`, `BSHFL` sub-group.
    Special3 {
        /// Operation selected by bits 10:6.
        function: Special3Function,
        /// Operand fields.
        fields: RegisterFields,
    },
}

impl DecodedInstruction {
    /// Dispatch family of this instruction.
    #[must_use]
    pub const fn family(&self) -> OpcodeFamily {
        match self {
            Self::Register { .. } => OpcodeFamily::Register,
            Self::Jump { .. } => OpcodeFamily::Jump,
            Self::RegisterImmediate { .. } | Self::Immediate { .. } => OpcodeFamily::Immediate,
            Self::SetLessThanImmediate(_) => OpcodeFamily::SetLessThanImmediate,
            Self::Coprocessor { .. } => OpcodeFamily::Coprocessor,
            Self::BranchNotEqualLikely(_) => OpcodeFamily::BranchLikely,
            Self::Special2 { .. } => OpcodeFamily::Special2,
            Self::Special3 { .. } => OpcodeFamily::Special3,
        }
    }

    /// Returns true for every instruction that may redirect the program counter.
    #[must_use]
    pub const fn is_control_transfer(&self) -> bool {
        match self {
            Self::Register { function, .. } => {
                matches!(function, SpecialFunction::Jr | SpecialFunction::Jalr)
            }
            Self::Jump { .. } | Self::RegisterImmediate { .. } | Self::BranchNotEqualLikely(_) => {
                true
            }
            Self::Immediate { op, .. } => op.is_branch(),
            Self::SetLessThanImmediate(_)
            | Self::Coprocessor { .. }
            | Self::Special2 { .. }
            | Self::Special3 { .. } => false,
        }
    }
}

/// Result of decoding an instruction word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodedOrFault {
    /// Successfully decoded instruction.
    Instruction(DecodedInstruction),
    /// Opcode or function code is not implemented.
    Fault(Fault),
}

impl DecodedOrFault {
    /// Returns the decoded instruction if present.
    #[must_use]
    pub const fn instruction(self) -> Option<DecodedInstruction> {
        match self {
            Self::Instruction(instruction) => Some(instruction),
            Self::Fault(_) => None,
        }
    }

    /// Returns the fault if decoding failed.
    #[must_use]
    pub const fn fault(self) -> Option<Fault> {
        match self {
            Self::Instruction(_) => None,
            Self::Fault(fault) => Some(fault),
        }
    }
}

impl From<DecodedOrFault> for Result<DecodedInstruction, Fault> {
    fn from(value: DecodedOrFault) -> Self {
        match value {
            DecodedOrFault::Instruction(instruction) => Ok(instruction),
            DecodedOrFault::Fault(fault) => Err(fault),
        }
    }
}

const fn unsupported(family: OpcodeFamily, function: u8) -> DecodedOrFault {
    DecodedOrFault::Fault(Fault::UnsupportedFunction { family, function })
}

/// Stateless instruction decoder.
pub struct Decoder;

impl Decoder {
    /// Decodes one instruction word.
    #[must_use]
    pub const fn decode(word: u32) -> DecodedOrFault {
        let opcode = encoding::opcode(word);
        let function = encoding::function(word);
        match classify_opcode(opcode) {
            OpcodeFamily::Register => match SpecialFunction::from_function(function) {
                Some(function) => DecodedOrFault::Instruction(DecodedInstruction::Register {
                    function,
                    fields: RegisterFields::from_word(word),
                }),
                None => unsupported(OpcodeFamily::Register, function),
            },
            OpcodeFamily::Jump => DecodedOrFault::Instruction(DecodedInstruction::Jump {
                link: opcode == encoding::OPCODE_JAL,
                index: encoding::jump_index(word),
            }),
            OpcodeFamily::Immediate => Self::decode_immediate(opcode, word),
            OpcodeFamily::SetLessThanImmediate => DecodedOrFault::Instruction(
                DecodedInstruction::SetLessThanImmediate(ImmediateFields::from_word(word)),
            ),
            OpcodeFamily::Coprocessor => {
                DecodedOrFault::Instruction(DecodedInstruction::Coprocessor {
                    unit: opcode & 0x3,
                    format: encoding::rs(word),
                    function,
                })
            }
            OpcodeFamily::BranchLikely => DecodedOrFault::Instruction(
                DecodedInstruction::BranchNotEqualLikely(ImmediateFields::from_word(word)),
            ),
            OpcodeFamily::Special2 => match Special2Function::from_function(function) {
                Some(function) => DecodedOrFault::Instruction(DecodedInstruction::Special2 {
                    function,
                    fields: RegisterFields::from_word(word),
                }),
                None => unsupported(OpcodeFamily::Special2, function),
            },
            OpcodeFamily::Special3 => {
                if function != SPECIAL3_BSHFL {
                    return unsupported(OpcodeFamily::Special3, function);
                }
                let sub_function = encoding::shift_amount(word);
                match Special3Function::from_sub_function(sub_function) {
                    Some(function) => DecodedOrFault::Instruction(DecodedInstruction::Special3 {
                        function,
                        fields: RegisterFields::from_word(word),
                    }),
                    None => unsupported(OpcodeFamily::Special3, sub_function),
                }
            }
            OpcodeFamily::Unsupported => DecodedOrFault::Fault(Fault::UnsupportedOpcode { opcode }),
        }
    }

    const fn decode_immediate(opcode: u8, word: u32) -> DecodedOrFault {
        let fields = ImmediateFields::from_word(word);
        if opcode == OPCODE_REGIMM {
            return match RegimmFunction::from_rt(fields.rt) {
                Some(function) => {
                    DecodedOrFault::Instruction(DecodedInstruction::RegisterImmediate {
                        function,
                        fields,
                    })
                }
                None => unsupported(OpcodeFamily::Immediate, fields.rt),
            };
        }
        match ImmediateOpcode::from_opcode(opcode) {
            Some(op) => DecodedOrFault::Instruction(DecodedInstruction::Immediate { op, fields }),
            None => DecodedOrFault::Fault(Fault::UnsupportedOpcode { opcode }),
        }
    }
}
