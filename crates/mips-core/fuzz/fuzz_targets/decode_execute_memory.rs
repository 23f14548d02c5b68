#![no_main]

use libfuzzer_sys::fuzz_target;
use mips_core::{
    disassemble, validate_alignment, AccessWidth, Decoder, Machine, MachineConfig, MemoryBus, Ram,
    RecordingSink,
};

fuzz_target!(|data: &[u8]| {
    let words: Vec<u32> = data
        .chunks_exact(4)
        .map(|chunk| u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .take(64)
        .collect();
    if words.is_empty() {
        return;
    }

    for word in &words {
        let _ = Decoder::decode(*word);
        let _ = disassemble(*word);
        let _ = validate_alignment(*word, AccessWidth::Word);
    }

    let mut ram = Ram::new(0x1000);
    if ram.load_words(0, &words).is_err() {
        return;
    }
    let mut bus = MemoryBus::new();
    bus.register(0, 0xfff, ram);
    let mut machine = Machine::with_sink(bus, MachineConfig::default(), RecordingSink::new());
    for (index, word) in words.iter().enumerate().skip(1).take(31) {
        let _ = machine.registers_mut().set(index, *word as i32);
    }

    for _ in 0..words.len() * 2 {
        machine.step();
        assert_eq!(machine.read_register(0), 0);
    }
});
