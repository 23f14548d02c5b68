//! Property coverage for the engine, bus, decoder, and disassembler.

#![allow(
    clippy::cast_lossless,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss
)]

use env_logger as _;
use log as _;
use mips_core::{
    branch_displacement, disassemble, disassemble_row, sign_extend, BusError, Decoder, Fault,
    Machine, MachineConfig, MemoryBus, Ram, RecordingSink, StepOutcome,
};
use proptest::prelude::*;
use rstest as _;
#[cfg(feature = "serde")]
use serde as _;
use thiserror as _;

const fn encode_r(rs: u8, rt: u8, rd: u8, sa: u8, function: u8) -> u32 {
    ((rs as u32) << 21)
        | ((rt as u32) << 16)
        | ((rd as u32) << 11)
        | ((sa as u32) << 6)
        | function as u32
}

fn machine_with(word: u32, registers: &[i32]) -> Machine<RecordingSink> {
    let mut ram = Ram::new(0x1000);
    ram.load_words(0, &[word]).expect("program fits");
    let mut bus = MemoryBus::new();
    bus.register(0, 0xfff, ram);
    let mut machine = Machine::with_sink(bus, MachineConfig::default(), RecordingSink::new());
    for (index, value) in registers.iter().enumerate().skip(1) {
        machine
            .registers_mut()
            .set(index, *value)
            .expect("non-zero register is writable");
    }
    machine
}

proptest! {
    #[test]
    fn zero_register_reads_zero_after_any_instruction(
        word in any::<u32>(),
        registers in prop::collection::vec(any::<i32>(), 32),
    ) {
        let mut machine = machine_with(word, &registers);

        let outcome = machine.step();

        prop_assert_eq!(machine.read_register(0), 0);
        prop_assert!(outcome.cycles() == 1 || outcome.cycles() == 2);
        prop_assert_eq!(outcome.fault().is_some(), machine.counters().fault_count() > 0);
        prop_assert_eq!(machine.counters().step_count, 1);
    }

    #[test]
    fn decode_failure_matches_disassembly_marker(word in any::<u32>()) {
        let decoded = Decoder::decode(word);
        let row = disassemble_row(0x0040_0000, word);

        prop_assert_eq!(decoded.fault().is_some(), row.is_unknown);
        if let Some(fault) = decoded.fault() {
            let is_decode_fault = matches!(
                fault,
                Fault::UnsupportedOpcode { .. } | Fault::UnsupportedFunction { .. }
            );
            prop_assert!(is_decode_fault);
            prop_assert!(row.mnemonic.ends_with("???"));
        } else {
            prop_assert!(!disassemble(word).is_empty());
        }
    }

    #[test]
    fn bus_routes_offsets_inside_region_and_rejects_outside(
        offset in 0_u64..0x100,
        value in any::<u8>(),
        outside in 0x200_u64..0x1_0000_0000,
    ) {
        let mut bus = MemoryBus::new();
        let ram = bus.register(0x100, 0xff, Ram::new(0x100));

        prop_assert_eq!(bus.write_u8(0x100 + offset, value), Ok(()));
        prop_assert_eq!(bus.read_u8(0x100 + offset), Ok(value));
        prop_assert_eq!(ram.borrow().as_bytes()[offset as usize], value);
        prop_assert_eq!(
            bus.read_u8(outside),
            Err(BusError::NoSuchAddress { address: outside })
        );
    }

    #[test]
    fn immediate_shifts_match_native_operators(
        value in any::<u32>(),
        sa in prop::sample::select(vec![0_u8, 1, 16, 31]),
    ) {
        let amount = u32::from(sa);
        let untouched = 0x5a5a_5a5a_u32;
        let cases = [
            // sll by zero is the nop encoding and never writes its destination
            (encode_r(0, 9, 10, sa, 0x00), if sa == 0 { untouched } else { value << amount }),
            (encode_r(0, 9, 10, sa, 0x02), value >> amount),
            (encode_r(0, 9, 10, sa, 0x03), ((value as i32) >> amount) as u32),
            (encode_r(1, 9, 10, sa, 0x02), value.rotate_right(amount)),
        ];
        for (word, expected) in cases {
            let mut registers = vec![0; 32];
            registers[9] = value as i32;
            registers[10] = untouched as i32;
            let mut machine = machine_with(word, &registers);

            prop_assert_eq!(machine.step(), StepOutcome::Retired { cycles: 1 });
            prop_assert_eq!(machine.read_register(10) as u32, expected, "word 0x{:08x}", word);
        }
    }

    #[test]
    fn variable_shifts_use_low_five_bits(value in any::<u32>(), amount in any::<u32>()) {
        let mut registers = vec![0; 32];
        registers[8] = amount as i32;
        registers[9] = value as i32;
        let mut machine = machine_with(encode_r(8, 9, 10, 0, 0x04), &registers);

        machine.step();

        prop_assert_eq!(machine.read_register(10) as u32, value << (amount & 31));
    }

    #[test]
    fn arithmetic_right_shift_is_sign_extended_logical_shift(
        value in any::<u32>(),
        amount in 0_u32..32,
    ) {
        prop_assert_eq!(
            sign_extend(value >> amount, 32 - amount),
            ((value as i32) >> amount) as u32
        );
    }

    #[test]
    fn branch_displacement_is_sign_extended_word_offset(immediate in any::<u16>()) {
        prop_assert_eq!(branch_displacement(immediate), i32::from(immediate as i16) * 4);
    }

    #[test]
    fn reset_always_returns_to_zero_state(
        word in any::<u32>(),
        registers in prop::collection::vec(any::<i32>(), 32),
    ) {
        let mut machine = machine_with(word, &registers);
        machine.step();
        machine.registers_mut().set_hi(1);

        machine.reset();

        prop_assert!(machine.registers().general().iter().all(|value| *value == 0));
        prop_assert_eq!(machine.registers().hi(), 0);
        prop_assert_eq!(machine.registers().lo(), 0);
        prop_assert_eq!(machine.registers().pc(), 0);
        prop_assert_eq!(machine.counters().step_count, 0);
    }
}
