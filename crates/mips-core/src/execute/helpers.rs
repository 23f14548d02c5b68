//! Bit-level helpers shared by the engine and the disassembler.

/// Replicates bit `bits - 1` of `value` into all higher bits.
///
/// `bits` of 32 or more returns `value` unchanged, so an arithmetic shift by
/// zero (`sign_extend(v >> 0, 32)`) is the identity.
#[must_use]
#[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
pub const fn sign_extend(value: u32, bits: u32) -> u32 {
    if bits == 0 {
        return 0;
    }
    if bits >= 32 {
        return value;
    }
    let shift = 32 - bits;
    (((value << shift) as i32) >> shift) as u32
}

/// Interprets the low `bits` of `value` as a two's-complement number.
#[must_use]
#[allow(clippy::cast_lossless)]
pub const fn untwos_complement(value: u32, bits: u32) -> i64 {
    if bits == 0 {
        return 0;
    }
    let bits = if bits > 32 { 32 } else { bits };
    let mask = if bits == 32 { u32::MAX } else { (1 << bits) - 1 };
    let masked = (value & mask) as i64;
    if masked & (1 << (bits - 1)) != 0 {
        masked - (1_i64 << bits)
    } else {
        masked
    }
}

/// Byte displacement of a branch: the immediate is shifted left by two and
/// then sign-extended from 18 bits.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_lossless)]
pub const fn branch_displacement(immediate: u16) -> i32 {
    untwos_complement((immediate as u32) << 2, 18) as i32
}

/// Rotates `value` right by `amount & 31` bits.
#[must_use]
pub const fn rotate_right(value: u32, amount: u32) -> u32 {
    value.rotate_right(amount & 31)
}

/// Number of leading zero bits; 32 for zero.
#[must_use]
pub const fn count_leading_zeros(value: u32) -> u32 {
    value.leading_zeros()
}

/// Number of leading one bits; 32 for `0xffff_ffff`.
#[must_use]
pub const fn count_leading_ones(value: u32) -> u32 {
    (!value).leading_zeros()
}

/// Sign-extends a 16-bit immediate to 32 bits.
#[must_use]
#[allow(clippy::cast_possible_wrap, clippy::cast_lossless)]
pub const fn sign_extend_immediate(immediate: u16) -> i32 {
    immediate as i16 as i32
}

/// Effective address of `offset(base)` memory operands.
#[must_use]
#[allow(clippy::cast_sign_loss)]
pub const fn effective_address(base: i32, immediate: u16) -> u32 {
    (base as u32).wrapping_add(sign_extend_immediate(immediate) as u32)
}

/// Target of a PC-relative branch; `next_pc` is the already-advanced PC.
#[must_use]
#[allow(clippy::cast_sign_loss)]
pub const fn branch_target(next_pc: u32, immediate: u16) -> u32 {
    next_pc.wrapping_add(branch_displacement(immediate) as u32)
}

/// Target of `J`/`JAL`: the 256 MiB region of `next_pc` with the index in words.
#[must_use]
pub const fn jump_target(next_pc: u32, index: u32) -> u32 {
    (next_pc & 0xf000_0000) | ((index & 0x03ff_ffff) << 2)
}
