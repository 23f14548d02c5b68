//! Instruction field layout, opcode families, and function-code tables.

use std::fmt;

/// Primary opcode of R-type instructions.
pub const OPCODE_SPECIAL: u8 = 0x00;
/// Primary opcode of the branch-on-sign group selected by `rt`.
pub const OPCODE_REGIMM: u8 = 0x01;
/// Primary opcode of `J`.
pub const OPCODE_J: u8 = 0x02;
/// Primary opcode of `JAL`.
pub const OPCODE_JAL: u8 = 0x03;
/// Primary opcode of `SLTI`.
pub const OPCODE_SLTI: u8 = 0x0a;
/// Primary opcode of `BNEL`.
pub const OPCODE_BNEL: u8 = 0x15;
/// Primary opcode of the SPECIAL2 group.
pub const OPCODE_SPECIAL2: u8 = 0x1c;
/// Primary opcode of the SPECIAL3 group.
pub const OPCODE_SPECIAL3: u8 = 0x1f;
/// SPECIAL3 function selecting the byte-shuffle (`BSHFL`) sub-group.
pub const SPECIAL3_BSHFL: u8 = 0x20;
/// Bit that turns `SRL`/`SRLV` into `ROTR`/`ROTRV`.
pub const ROTATE_BIT: u32 = 21;

/// Extracts bits 31:26.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub const fn opcode(word: u32) -> u8 {
    (word >> 26) as u8
}

/// Extracts bits 25:21.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub const fn rs(word: u32) -> u8 {
    ((word >> 21) & 0x1f) as u8
}

/// Extracts bits 20:16.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub const fn rt(word: u32) -> u8 {
    ((word >> 16) & 0x1f) as u8
}

/// Extracts bits 15:11.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub const fn rd(word: u32) -> u8 {
    ((word >> 11) & 0x1f) as u8
}

/// Extracts the shift amount, bits 10:6.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub const fn shift_amount(word: u32) -> u8 {
    ((word >> 6) & 0x1f) as u8
}

/// Extracts the function code, bits 5:0.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub const fn function(word: u32) -> u8 {
    (word & 0x3f) as u8
}

/// Extracts the 16-bit immediate, bits 15:0.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub const fn immediate(word: u32) -> u16 {
    word as u16
}

/// Extracts the 26-bit jump index, bits 25:0.
#[must_use]
pub const fn jump_index(word: u32) -> u32 {
    word & 0x03ff_ffff
}

/// Returns true if bit 21 (the rotate selector) is set.
#[must_use]
pub const fn rotate_selected(word: u32) -> bool {
    (word >> ROTATE_BIT) & 1 != 0
}

/// Instruction families selected by the primary opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum OpcodeFamily {
    /// Register-register operations (`0x00`).
    Register,
    /// Absolute jumps (`0x02`, `0x03`).
    Jump,
    /// Immediate arithmetic, branches, loads, and stores.
    Immediate,
    /// Dedicated `SLTI` handler (`0x0a`).
    SetLessThanImmediate,
    /// Coprocessor 0–3 (`0x10..=0x13`).
    Coprocessor,
    /// `BNEL` (`0x15`).
    BranchLikely,
    /// Multiply and bit-count group (`0x1c`).
    Special2,
    /// Sign-extension group (`0x1f`).
    Special3,
    /// Opcode with no implementation.
    Unsupported,
}

impl fmt::Display for OpcodeFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Register => "r-type",
            Self::Jump => "j-type",
            Self::Immediate => "i-type",
            Self::SetLessThanImmediate => "slti",
            Self::Coprocessor => "coprocessor",
            Self::BranchLikely => "branch-likely",
            Self::Special2 => "special2",
            Self::Special3 => "special3",
            Self::Unsupported => "unsupported",
        })
    }
}

/// Classifies a primary opcode into its instruction family.
#[must_use]
pub const fn classify_opcode(opcode: u8) -> OpcodeFamily {
    match opcode {
        OPCODE_SPECIAL => OpcodeFamily::Register,
        OPCODE_REGIMM => OpcodeFamily::Immediate,
        OPCODE_J | OPCODE_JAL => OpcodeFamily::Jump,
        OPCODE_SLTI => OpcodeFamily::SetLessThanImmediate,
        0x10..=0x13 => OpcodeFamily::Coprocessor,
        OPCODE_BNEL => OpcodeFamily::BranchLikely,
        OPCODE_SPECIAL2 => OpcodeFamily::Special2,
        OPCODE_SPECIAL3 => OpcodeFamily::Special3,
        _ if ImmediateOpcode::from_opcode(opcode).is_some() => OpcodeFamily::Immediate,
        _ => OpcodeFamily::Unsupported,
    }
}

/// R-type operations keyed by function code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum SpecialFunction {
    Sll,
    /// `SRL`, or `ROTR` when bit 21 is set.
    Srl,
    Sra,
    Sllv,
    /// `SRLV`, or `ROTRV` when bit 21 is set.
    Srlv,
    Srav,
    Jr,
    Jalr,
    Movz,
    Movn,
    Syscall,
    Break,
    Mfhi,
    Mthi,
    Mflo,
    Mtlo,
    Mult,
    Multu,
    Div,
    Divu,
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

/// Implemented R-type function codes. Anything absent is unsupported.
pub const SPECIAL_FUNCTION_TABLE: &[(u8, SpecialFunction)] = &[
    (0x00, SpecialFunction::Sll),
    (0x02, SpecialFunction::Srl),
    (0x03, SpecialFunction::Sra),
    (0x04, SpecialFunction::Sllv),
    (0x06, SpecialFunction::Srlv),
    (0x07, SpecialFunction::Srav),
    (0x08, SpecialFunction::Jr),
    (0x09, SpecialFunction::Jalr),
    (0x0a, SpecialFunction::Movz),
    (0x0b, SpecialFunction::Movn),
    (0x0c, SpecialFunction::Syscall),
    (0x0d, SpecialFunction::Break),
    (0x10, SpecialFunction::Mfhi),
    (0x11, SpecialFunction::Mthi),
    (0x12, SpecialFunction::Mflo),
    (0x13, SpecialFunction::Mtlo),
    (0x18, SpecialFunction::Mult),
    (0x19, SpecialFunction::Multu),
    (0x1a, SpecialFunction::Div),
    (0x1b, SpecialFunction::Divu),
    (0x20, SpecialFunction::Add),
    (0x21, SpecialFunction::Addu),
    (0x22, SpecialFunction::Sub),
    (0x23, SpecialFunction::Subu),
    (0x24, SpecialFunction::And),
    (0x25, SpecialFunction::Or),
    (0x26, SpecialFunction::Xor),
    (0x27, SpecialFunction::Nor),
    (0x2a, SpecialFunction::Slt),
    (0x2b, SpecialFunction::Sltu),
];

impl SpecialFunction {
    /// Looks up an R-type function code.
    #[must_use]
    pub const fn from_function(code: u8) -> Option<Self> {
        let mut index = 0;
        while index < SPECIAL_FUNCTION_TABLE.len() {
            let (candidate, function) = SPECIAL_FUNCTION_TABLE[index];
            if candidate == code {
                return Some(function);
            }
            index += 1;
        }
        None
    }

    /// Lower-case assembler mnemonic. Rotate forms are resolved by the caller.
    #[must_use]
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Self::Sll => "sll",
            Self::Srl => "srl",
            Self::Sra => "sra",
            Self::Sllv => "sllv",
            Self::Srlv => "srlv",
            Self::Srav => "srav",
            Self::Jr => "jr",
            Self::Jalr => "jalr",
            Self::Movz => "movz",
            Self::Movn => "movn",
            Self::Syscall => "syscall",
            Self::Break => "break",
            Self::Mfhi => "mfhi",
            Self::Mthi => "mthi",
            Self::Mflo => "mflo",
            Self::Mtlo => "mtlo",
            Self::Mult => "mult",
            Self::Multu => "multu",
            Self::Div => "div",
            Self::Divu => "divu",
            Self::Add => "add",
            Self::Addu => "addu",
            Self::Sub => "sub",
            Self::Subu => "subu",
            Self::And => "and",
            Self::Or => "or",
            Self::Xor => "xor",
            Self::Nor => "nor",
            Self::Slt => "slt",
            Self::Sltu => "sltu",
        }
    }
}

/// I-type operations keyed by primary opcode.
///
/// `REGIMM`, `SLTI`, and `BNEL` share the I-type layout but decode to their
/// own instruction variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum ImmediateOpcode {
    Beq,
    Bne,
    Blez,
    Bgtz,
    Addi,
    Addiu,
    Sltiu,
    Andi,
    Ori,
    Xori,
    Lui,
    Lb,
    Lh,
    Lw,
    Lbu,
    Lhu,
    Sb,
    Sh,
    Sw,
    Lwc1,
    Swc1,
}

/// Implemented I-type opcodes.
pub const IMMEDIATE_OPCODE_TABLE: &[(u8, ImmediateOpcode)] = &[
    (0x04, ImmediateOpcode::Beq),
    (0x05, ImmediateOpcode::Bne),
    (0x06, ImmediateOpcode::Blez),
    (0x07, ImmediateOpcode::Bgtz),
    (0x08, ImmediateOpcode::Addi),
    (0x09, ImmediateOpcode::Addiu),
    (0x0b, ImmediateOpcode::Sltiu),
    (0x0c, ImmediateOpcode::Andi),
    (0x0d, ImmediateOpcode::Ori),
    (0x0e, ImmediateOpcode::Xori),
    (0x0f, ImmediateOpcode::Lui),
    (0x20, ImmediateOpcode::Lb),
    (0x21, ImmediateOpcode::Lh),
    (0x23, ImmediateOpcode::Lw),
    (0x24, ImmediateOpcode::Lbu),
    (0x25, ImmediateOpcode::Lhu),
    (0x28, ImmediateOpcode::Sb),
    (0x29, ImmediateOpcode::Sh),
    (0x2b, ImmediateOpcode::Sw),
    (0x31, ImmediateOpcode::Lwc1),
    (0x39, ImmediateOpcode::Swc1),
];

impl ImmediateOpcode {
    /// Looks up an I-type primary opcode.
    #[must_use]
    pub const fn from_opcode(code: u8) -> Option<Self> {
        let mut index = 0;
        while index < IMMEDIATE_OPCODE_TABLE.len() {
            let (candidate, op) = IMMEDIATE_OPCODE_TABLE[index];
            if candidate == code {
                return Some(op);
            }
            index += 1;
        }
        None
    }

    /// Lower-case assembler mnemonic.
    #[must_use]
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Self::Beq => "beq",
            Self::Bne => "bne",
            Self::Blez => "blez",
            Self::Bgtz => "bgtz",
            Self::Addi => "addi",
            Self::Addiu => "addiu",
            Self::Sltiu => "sltiu",
            Self::Andi => "andi",
            Self::Ori => "ori",
            Self::Xori => "xori",
            Self::Lui => "lui",
            Self::Lb => "lb",
            Self::Lh => "lh",
            Self::Lw => "lw",
            Self::Lbu => "lbu",
            Self::Lhu => "lhu",
            Self::Sb => "sb",
            Self::Sh => "sh",
            Self::Sw => "sw",
            Self::Lwc1 => "lwc1",
            Self::Swc1 => "swc1",
        }
    }

    /// Returns true for PC-relative branches.
    #[must_use]
    pub const fn is_branch(self) -> bool {
        matches!(self, Self::Beq | Self::Bne | Self::Blez | Self::Bgtz)
    }

    /// Returns true for loads and stores addressed as `offset(base)`.
    #[must_use]
    pub const fn is_memory(self) -> bool {
        matches!(
            self,
            Self::Lb
                | Self::Lh
                | Self::Lw
                | Self::Lbu
                | Self::Lhu
                | Self::Sb
                | Self::Sh
                | Self::Sw
                | Self::Lwc1
                | Self::Swc1
        )
    }
}

/// Branch-on-sign operations keyed by the `rt` field of opcode `0x01`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum RegimmFunction {
    Bltz,
    Bgez,
    Bltzal,
    Bgezal,
}

impl RegimmFunction {
    /// Looks up a REGIMM `rt` selector.
    #[must_use]
    pub const fn from_rt(code: u8) -> Option<Self> {
        match code {
            0x00 => Some(Self::Bltz),
            0x01 => Some(Self::Bgez),
            0x10 => Some(Self::Bltzal),
            0x11 => Some(Self::Bgezal),
            _ => None,
        }
    }

    /// Lower-case assembler mnemonic.
    #[must_use]
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Self::Bltz => "bltz",
            Self::Bgez => "bgez",
            Self::Bltzal => "bltzal",
            Self::Bgezal => "bgezal",
        }
    }

    /// Returns true if the operation writes `$ra`.
    #[must_use]
    pub const fn links(self) -> bool {
        matches!(self, Self::Bltzal | Self::Bgezal)
    }
}

/// SPECIAL2 operations keyed by function code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum Special2Function {
    Mul,
    Clz,
    Clo,
}

impl Special2Function {
    /// Looks up a SPECIAL2 function code.
    #[must_use]
    pub const fn from_function(code: u8) -> Option<Self> {
        match code {
            0x02 => Some(Self::Mul),
            0x20 => Some(Self::Clz),
            0x21 => Some(Self::Clo),
            _ => None,
        }
    }

    /// Lower-case assembler mnemonic.
    #[must_use]
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Self::Mul => "mul",
            Self::Clz => "clz",
            Self::Clo => "clo",
        }
    }
}

/// SPECIAL3 `BSHFL` operations keyed by bits 10:6.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum Special3Function {
    Seb,
    Seh,
}

impl Special3Function {
    /// Looks up a `BSHFL` sub-function.
    #[must_use]
    pub const fn from_sub_function(code: u8) -> Option<Self> {
        match code {
            0x10 => Some(Self::Seb),
            0x18 => Some(Self::Seh),
            _ => None,
        }
    }

    /// Lower-case assembler mnemonic.
    #[must_use]
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Self::Seb => "seb",
            Self::Seh => "seh",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{
        classify_opcode, function, immediate, jump_index, opcode, rd, rotate_selected, rs, rt,
        shift_amount, ImmediateOpcode, OpcodeFamily, RegimmFunction, SpecialFunction,
        IMMEDIATE_OPCODE_TABLE, SPECIAL_FUNCTION_TABLE,
    };

    #[test]
    fn field_extraction_follows_mips_layout() {
        // and $t2, $t0, $t1 with a stray shift amount of 3
        let word = (8 << 21) | (9 << 16) | (10 << 11) | (3 << 6) | 0x24;
        assert_eq!(opcode(word), 0);
        assert_eq!(rs(word), 8);
        assert_eq!(rt(word), 9);
        assert_eq!(rd(word), 10);
        assert_eq!(shift_amount(word), 3);
        assert_eq!(function(word), 0x24);

        let word = 0x2408_fffb;
        assert_eq!(opcode(word), 0x09);
        assert_eq!(immediate(word), 0xfffb);
        assert_eq!(jump_index(0x0fff_ffff), 0x03ff_ffff);
        assert!(rotate_selected(1 << 21));
        assert!(!rotate_selected(1 << 22));
    }

    #[test]
    fn opcode_families_cover_dispatch_table() {
        assert_eq!(classify_opcode(0x00), OpcodeFamily::Register);
        assert_eq!(classify_opcode(0x02), OpcodeFamily::Jump);
        assert_eq!(classify_opcode(0x03), OpcodeFamily::Jump);
        assert_eq!(classify_opcode(0x0a), OpcodeFamily::SetLessThanImmediate);
        for op in 0x10..=0x13 {
            assert_eq!(classify_opcode(op), OpcodeFamily::Coprocessor);
        }
        assert_eq!(classify_opcode(0x15), OpcodeFamily::BranchLikely);
        assert_eq!(classify_opcode(0x1c), OpcodeFamily::Special2);
        assert_eq!(classify_opcode(0x1f), OpcodeFamily::Special3);
        assert_eq!(classify_opcode(0x01), OpcodeFamily::Immediate);
        for (op, _) in IMMEDIATE_OPCODE_TABLE {
            assert_eq!(classify_opcode(*op), OpcodeFamily::Immediate);
        }
        for op in [0x14, 0x16, 0x22, 0x26, 0x2a, 0x3f] {
            assert_eq!(classify_opcode(op), OpcodeFamily::Unsupported);
        }
    }

    #[test]
    fn function_tables_have_unique_codes() {
        for (index, (code, function)) in SPECIAL_FUNCTION_TABLE.iter().enumerate() {
            assert_eq!(SpecialFunction::from_function(*code), Some(*function));
            assert!(SPECIAL_FUNCTION_TABLE[index + 1..]
                .iter()
                .all(|(other, _)| other != code));
        }
        for (code, op) in IMMEDIATE_OPCODE_TABLE {
            assert_eq!(ImmediateOpcode::from_opcode(*code), Some(*op));
        }
        assert_eq!(SpecialFunction::from_function(0x01), None);
        assert_eq!(SpecialFunction::from_function(0x3f), None);
    }

    #[test]
    fn regimm_selectors_and_link_forms() {
        assert_eq!(RegimmFunction::from_rt(0x00), Some(RegimmFunction::Bltz));
        assert_eq!(RegimmFunction::from_rt(0x11), Some(RegimmFunction::Bgezal));
        assert_eq!(RegimmFunction::from_rt(0x02), None);
        assert!(RegimmFunction::Bltzal.links());
        assert!(!RegimmFunction::Bgez.links());
    }

    #[test]
    fn immediate_opcodes_split_into_branches_and_memory_accesses() {
        assert_eq!(ImmediateOpcode::from_opcode(0x01), None);
        let branches: Vec<_> = IMMEDIATE_OPCODE_TABLE
            .iter()
            .filter(|(_, op)| op.is_branch())
            .map(|(code, _)| *code)
            .collect();
        assert_eq!(branches, [0x04, 0x05, 0x06, 0x07]);
        let memory = IMMEDIATE_OPCODE_TABLE
            .iter()
            .filter(|(_, op)| op.is_memory())
            .count();
        assert_eq!(memory, 10);
        assert!(ImmediateOpcode::Lhu.is_memory());
        assert!(ImmediateOpcode::Swc1.is_memory());
        assert!(!ImmediateOpcode::Lui.is_memory());
        assert!(!ImmediateOpcode::Addi.is_memory());
    }

    #[test]
    fn family_names_appear_in_reports() {
        assert_eq!(OpcodeFamily::Register.to_string(), "r-type");
        assert_eq!(OpcodeFamily::Special2.to_string(), "special2");
    }
}
