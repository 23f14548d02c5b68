//! Instruction-level conformance: one instruction per case, checked against
//! hand-computed register results.

#![allow(clippy::cast_lossless, clippy::cast_possible_wrap)]

use env_logger as _;
use log as _;
use mips_core::{Machine, MachineConfig, MemoryBus, Ram, RecordingSink, RunBoundary, StepOutcome};
use proptest as _;
use rstest::rstest;
#[cfg(feature = "serde")]
use serde as _;
use thiserror as _;

const T0: u8 = 8;
const T1: u8 = 9;
const T2: u8 = 10;

const fn encode_r(rs: u8, rt: u8, rd: u8, sa: u8, function: u8) -> u32 {
    ((rs as u32) << 21)
        | ((rt as u32) << 16)
        | ((rd as u32) << 11)
        | ((sa as u32) << 6)
        | function as u32
}

const fn encode_i(opcode: u8, rs: u8, rt: u8, immediate: u16) -> u32 {
    ((opcode as u32) << 26) | ((rs as u32) << 21) | ((rt as u32) << 16) | immediate as u32
}

const fn special2(rs: u8, rt: u8, rd: u8, function: u8) -> u32 {
    (0x1c << 26) | encode_r(rs, rt, rd, 0, function)
}

const fn bshfl(rt: u8, rd: u8, sub_function: u8) -> u32 {
    (0x1f << 26) | encode_r(0, rt, rd, sub_function, 0x20)
}

fn machine(word: u32, t0: i32, t1: i32) -> Machine<RecordingSink> {
    let mut ram = Ram::new(0x1000);
    ram.load_words(0, &[word]).expect("program fits");
    let mut bus = MemoryBus::new();
    bus.register(0, 0xfff, ram);
    let mut machine = Machine::with_sink(bus, MachineConfig::default(), RecordingSink::new());
    set(&mut machine, T0, t0);
    set(&mut machine, T1, t1);
    machine
}

fn set(machine: &mut Machine<RecordingSink>, index: u8, value: i32) {
    machine
        .registers_mut()
        .set(usize::from(index), value)
        .expect("register is writable");
}

fn run_one(word: u32, t0: i32, t1: i32) -> Machine<RecordingSink> {
    let mut machine = machine(word, t0, t1);
    let outcome = machine.step();
    assert_eq!(outcome, StepOutcome::Retired { cycles: 1 }, "0x{word:08x}");
    assert!(
        machine.sink().is_empty(),
        "0x{word:08x}: {:?}",
        machine.sink()
    );
    assert_eq!(machine.registers().pc(), 4);
    machine
}

#[rstest]
#[case::addu(encode_r(T0, T1, T2, 0, 0x21), 5, 7, 12)]
#[case::addu_wraps(encode_r(T0, T1, T2, 0, 0x21), i32::MAX, 1, i32::MIN)]
#[case::add(encode_r(T0, T1, T2, 0, 0x20), 3, 4, 7)]
#[case::sub(encode_r(T0, T1, T2, 0, 0x22), 3, 10, -7)]
#[case::subu(encode_r(T0, T1, T2, 0, 0x23), 5, 7, -2)]
#[case::and(encode_r(T0, T1, T2, 0, 0x24), 0b1100, 0b1010, 0b1000)]
#[case::or(encode_r(T0, T1, T2, 0, 0x25), 0b1100, 0b1010, 0b1110)]
#[case::xor(encode_r(T0, T1, T2, 0, 0x26), 0b1100, 0b1010, 0b0110)]
#[case::nor(encode_r(T0, T1, T2, 0, 0x27), 0, 0, -1)]
#[case::slt(encode_r(T0, T1, T2, 0, 0x2a), -1, 1, 1)]
#[case::slt_false(encode_r(T0, T1, T2, 0, 0x2a), 1, -1, 0)]
#[case::sltu(encode_r(T0, T1, T2, 0, 0x2b), -1, 1, 0)]
#[case::sltu_true(encode_r(T0, T1, T2, 0, 0x2b), 1, -1, 1)]
#[case::movz_moves(encode_r(T0, T1, T2, 0, 0x0a), 42, 0, 42)]
#[case::movz_keeps(encode_r(T0, T1, T2, 0, 0x0a), 42, 1, 0)]
#[case::movn_moves(encode_r(T0, T1, T2, 0, 0x0b), 42, 1, 42)]
#[case::movn_keeps(encode_r(T0, T1, T2, 0, 0x0b), 42, 0, 0)]
fn register_arithmetic(#[case] word: u32, #[case] t0: i32, #[case] t1: i32, #[case] rd: i32) {
    let machine = run_one(word, t0, t1);
    assert_eq!(machine.read_register(usize::from(T2)), rd);
}

#[rstest]
#[case::sll(encode_r(0, T1, T2, 4, 0x00), 0, 1, 16)]
#[case::srl(encode_r(0, T1, T2, 31, 0x02), 0, i32::MIN, 1)]
#[case::sra(encode_r(0, T1, T2, 4, 0x03), 0, i32::MIN, 0xf800_0000_u32 as i32)]
#[case::rotr(encode_r(1, T1, T2, 1, 0x02), 0, 1, i32::MIN)]
#[case::rotr_by_sixteen(encode_r(1, T1, T2, 16, 0x02), 0, 0x1234_5678, 0x5678_1234)]
#[case::sllv_masks_amount(encode_r(T0, T1, T2, 0, 0x04), 36, 1, 16)]
#[case::srlv(encode_r(T0, T1, T2, 0, 0x06), 4, i32::MIN, 0x0800_0000)]
#[case::srav(encode_r(T0, T1, T2, 0, 0x07), 4, i32::MIN, 0xf800_0000_u32 as i32)]
#[case::rotrv_when_rs_is_odd(encode_r(T1, T0, T2, 0, 0x06), 1, 1, i32::MIN)]
fn shifts_and_rotates(#[case] word: u32, #[case] t0: i32, #[case] t1: i32, #[case] rd: i32) {
    let machine = run_one(word, t0, t1);
    assert_eq!(machine.read_register(usize::from(T2)), rd);
}

#[test]
fn sll_by_zero_writes_nothing() {
    let mut machine = machine(encode_r(0, T1, T2, 0, 0x00), 0, 9);
    set(&mut machine, T2, 77);
    machine.step();
    assert_eq!(machine.read_register(usize::from(T2)), 77);
}

#[rstest]
#[case::mult(0x18, -2, 3, -1, -6)]
#[case::multu(0x19, -1, 2, 1, -2)]
#[case::div(0x1a, 7, -2, 1, -3)]
#[case::div_negative_dividend(0x1a, -7, 2, -1, -3)]
#[case::divu(0x1b, 7, 2, 1, 3)]
#[case::divu_large(0x1b, -1, 16, 15, 0x0fff_ffff)]
fn multiply_and_divide(
    #[case] function: u8,
    #[case] t0: i32,
    #[case] t1: i32,
    #[case] hi: i32,
    #[case] lo: i32,
) {
    let machine = run_one(encode_r(T0, T1, 0, 0, function), t0, t1);
    assert_eq!(machine.registers().hi(), hi);
    assert_eq!(machine.registers().lo(), lo);
}

#[rstest]
#[case::div(0x1a)]
#[case::divu(0x1b)]
fn divide_by_zero_leaves_hi_lo(#[case] function: u8) {
    let mut machine = machine(encode_r(T0, T1, 0, 0, function), 10, 0);
    machine.registers_mut().set_hi(0x11);
    machine.registers_mut().set_lo(0x22);
    assert_eq!(machine.step(), StepOutcome::Retired { cycles: 1 });
    assert_eq!(machine.registers().hi(), 0x11);
    assert_eq!(machine.registers().lo(), 0x22);
}

#[test]
fn hi_lo_moves() {
    let mut ram = Ram::new(0x100);
    ram.load_words(
        0,
        &[
            encode_r(T0, 0, 0, 0, 0x11), // mthi $t0
            encode_r(T1, 0, 0, 0, 0x13), // mtlo $t1
            encode_r(0, 0, T2, 0, 0x10), // mfhi $t2
            encode_r(0, 0, 11, 0, 0x12), // mflo $t3
        ],
    )
    .expect("program fits");
    let mut bus = MemoryBus::new();
    bus.register(0, 0xff, ram);
    let mut machine = Machine::with_sink(bus, MachineConfig::default(), RecordingSink::new());
    set(&mut machine, T0, -5);
    set(&mut machine, T1, 9);

    assert_eq!(machine.run(4, RunBoundary::Fault).steps, 4);
    assert_eq!(machine.read_register(usize::from(T2)), -5);
    assert_eq!(machine.read_register(11), 9);
    assert!(machine.sink().is_empty());
}

#[rstest]
#[case::addi(encode_i(0x08, T0, T2, 3), 5, 8)]
#[case::addiu_negative(encode_i(0x09, T0, T2, 0xffff), 5, 4)]
#[case::addiu_wraps(encode_i(0x09, T0, T2, 1), i32::MAX, i32::MIN)]
#[case::slti_negative_immediate(encode_i(0x0a, T0, T2, 0xffff), -5, 1)]
#[case::slti_against_sign_extended(encode_i(0x0a, T0, T2, 0xffff), 5, 0)]
#[case::slti_positive(encode_i(0x0a, T0, T2, 0x0010), 15, 1)]
#[case::sltiu_against_sign_extended(encode_i(0x0b, T0, T2, 0xffff), 5, 1)]
#[case::sltiu_unsigned_register(encode_i(0x0b, T0, T2, 1), -1, 0)]
#[case::andi_zero_extends(encode_i(0x0c, T0, T2, 0xffff), -1, 0xffff)]
#[case::andi(encode_i(0x0c, T0, T2, 0x00ff), 0xff0f, 0x0f)]
#[case::ori(encode_i(0x0d, T0, T2, 0x8000), 1, 0x8001)]
#[case::xori(encode_i(0x0e, T0, T2, 0x00ff), 0x0f0f, 0x0ff0)]
#[case::lui(encode_i(0x0f, 0, T2, 0x1234), 0, 0x1234_0000)]
fn immediate_arithmetic(#[case] word: u32, #[case] t0: i32, #[case] rt: i32) {
    let machine = run_one(word, t0, 0);
    assert_eq!(machine.read_register(usize::from(T2)), rt);
}

#[rstest]
#[case::mul(special2(T0, T1, T2, 0x02), 6, -7, -42)]
#[case::mul_keeps_low_word(special2(T0, T1, T2, 0x02), 0x1_0000, 0x1_0001, 0x1_0000)]
#[case::clz(special2(T0, 0, T2, 0x20), 0x00ff_0000, 0, 8)]
#[case::clz_zero(special2(T0, 0, T2, 0x20), 0, 0, 32)]
#[case::clo(special2(T0, 0, T2, 0x21), 0xff00_0000_u32 as i32, 0, 8)]
#[case::clo_all_ones(special2(T0, 0, T2, 0x21), -1, 0, 32)]
#[case::seb(bshfl(T1, T2, 0x10), 0, 0x1280, -128)]
#[case::seb_positive(bshfl(T1, T2, 0x10), 0, 0x127f, 0x7f)]
#[case::seh(bshfl(T1, T2, 0x18), 0, 0x1_8000, -32768)]
fn special2_and_special3(#[case] word: u32, #[case] t0: i32, #[case] t1: i32, #[case] rd: i32) {
    let machine = run_one(word, t0, t1);
    assert_eq!(machine.read_register(usize::from(T2)), rd);
}
