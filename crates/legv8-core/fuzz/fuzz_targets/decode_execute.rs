#![no_main]

use legv8_core::{
    CacheConfig, Cpu, Instruction, Mnemonic, NullTraceSink, SegmentedMemory, SimulatorConfig,
};
use libfuzzer_sys::fuzz_target;

const MAX_STEPS: u64 = 4096;

fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }

    let mnemonics: Vec<Mnemonic> = Mnemonic::all().collect();
    let blocksize = 1_usize << (data[0] % 6);
    let entries = 1_usize << (data[1] % 6);
    let config = SimulatorConfig {
        icache: Some(CacheConfig::new(blocksize * entries, blocksize)),
        dcache: Some(CacheConfig::new(blocksize * entries, blocksize)),
        ..SimulatorConfig::default()
    };
    let Ok(mut cpu) = Cpu::new(&config) else {
        return;
    };

    // Each chunk is one mnemonic selector followed by four small operands.
    let program: Vec<Instruction> = data[2..]
        .chunks_exact(5)
        .enumerate()
        .filter_map(|(line, chunk)| {
            let mnemonic = mnemonics[usize::from(chunk[0]) % mnemonics.len()];
            let args: Vec<i64> = chunk[1..=mnemonic.arity()]
                .iter()
                .map(|&byte| i64::from(byte as i8))
                .collect();
            Instruction::decode(mnemonic, &args, line + 1).ok()
        })
        .collect();

    let mut memory = SegmentedMemory::default();
    let _ = cpu.run_bounded(&program, &mut memory, MAX_STEPS, &mut NullTraceSink);
    let _ = cpu.memory_window(&memory);
    let _ = cpu.snapshot();
});
