//! Runs a small program that prints through the console device, then dumps
//! its disassembly and the machine counters.
//!
//! `RUST_LOG=mips_core=trace cargo run --example run_program` shows every
//! retired instruction.

use log as _;
use mips_core::{disassemble_range, ConsoleDevice, Machine, MachineConfig, MemoryBus, Ram};
use proptest as _;
use rstest as _;
#[cfg(feature = "serde")]
use serde as _;
use thiserror as _;

const CONSOLE_BASE: u64 = 0x1000_0000;
const MESSAGE_ADDRESS: usize = 0x100;
const HALT_PC: u32 = 0x1c;
const STEP_LIMIT: usize = 10_000;

const PROGRAM: [u32; 8] = [
    0x3c08_1000, // lui   $t0, 0x1000
    0x2409_0100, // addiu $t1, $zero, 0x100
    0x912a_0000, // lbu   $t2, 0($t1)
    0x1140_0003, // beq   $t2, $zero, 12
    0xa10a_0000, // sb    $t2, 0($t0)
    0x2529_0001, // addiu $t1, $t1, 1
    0x0800_0002, // j     0x00000008
    0x0000_000d, // break
];

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut ram = Ram::new(0x1000);
    ram.load_words(0, &PROGRAM)?;
    ram.load(MESSAGE_ADDRESS, b"hello from mips-core\n\0")?;

    let mut bus = MemoryBus::new();
    bus.register(0, 0xfff, ram);
    let console = bus.register(CONSOLE_BASE, 0xf, ConsoleDevice::new());

    let config = MachineConfig {
        trace_instructions: true,
        ..MachineConfig::default()
    };
    let mut machine = Machine::with_config(bus, config);

    let mut steps = 0;
    while machine.registers().pc() != HALT_PC && steps < STEP_LIMIT {
        machine.step();
        steps += 1;
    }

    print!("{}", console.borrow().output_lossy());
    println!();
    for row in disassemble_range(machine.bus(), 0, PROGRAM.len()) {
        println!("{row}");
    }
    println!();
    let counters = machine.counters();
    println!("steps:        {}", counters.step_count);
    println!("instructions: {}", counters.instruction_count);
    println!("faults:       {}", counters.fault_count());
    Ok(())
}
