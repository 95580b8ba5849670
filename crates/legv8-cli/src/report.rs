//! Text rendering of engine state and trace events.

use std::fmt::Write as _;
use std::io;

use legv8_core::{
    AccessOutcome, CacheKind, Cpu, Memory, Register, TraceEvent, TraceSink, REGISTER_COUNT,
};

const REGISTERS_PER_ROW: usize = 4;

/// One line per trace event.
#[must_use]
pub fn format_event(event: &TraceEvent) -> String {
    match *event {
        TraceEvent::InstructionStart {
            index,
            pc,
            mnemonic,
        } => format!("[{index:>4}] 0x{pc:08X} {mnemonic}"),
        TraceEvent::CacheAccess {
            kind,
            address,
            outcome,
        } => {
            let status = match outcome {
                AccessOutcome::Hit => "hit",
                AccessOutcome::Miss => "miss",
                AccessOutcome::Uncached => "--",
            };
            format!("       {kind} 0x{address:X} {status}")
        }
        TraceEvent::ZeroRegisterWriteIgnored { mnemonic } => {
            format!("       {mnemonic}: ignored attempted assignment to XZR")
        }
        TraceEvent::FlagsUpdated { flags } => format!("       flags {flags}"),
        TraceEvent::ExclusiveTagSet { address } => {
            format!("       exclusive access tag set to 0x{address:X}")
        }
        TraceEvent::ExclusiveTagCleared { address } => {
            format!("       exclusive access tag 0x{address:X} cleared")
        }
        TraceEvent::StoreExclusive { address, succeeded } => format!(
            "       store-exclusive to 0x{address:X} {}",
            if succeeded { "succeeded" } else { "failed" }
        ),
        TraceEvent::BranchTaken { target } => format!("       branch to [{target}]"),
        TraceEvent::FaultRaised { fault, line } => format!("       line {line}: {fault}"),
    }
}

/// Trace sink writing each event as a line as soon as it is emitted.
#[derive(Debug)]
pub struct EventPrinter<W> {
    out: W,
}

impl<W: io::Write> EventPrinter<W> {
    /// Prints to `out`.
    #[must_use]
    pub const fn new(out: W) -> Self {
        Self { out }
    }

    /// Returns the underlying writer.
    #[must_use]
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: io::Write> TraceSink for EventPrinter<W> {
    fn on_event(&mut self, event: TraceEvent) {
        // A closed pipe only loses trace output.
        let _ = writeln!(self.out, "{}", format_event(&event));
    }
}

/// Registers, flags, PC, cache counters and the memory window.
#[must_use]
pub fn format_state(cpu: &Cpu, memory: &dyn Memory, show_caches: bool) -> String {
    let mut out = String::new();
    for row in (0..REGISTER_COUNT).step_by(REGISTERS_PER_ROW) {
        let cells: Vec<String> = (row..row + REGISTERS_PER_ROW)
            .filter_map(|index| {
                let reg = Register::new(u8::try_from(index).ok()?)?;
                let value = cpu.register(index)?;
                Some(format!("{:>4}: 0x{value:016X}", reg.to_string()))
            })
            .collect();
        let _ = writeln!(out, "{}", cells.join("  "));
    }
    let _ = writeln!(out, "Flags: {}", cpu.flags());
    let _ = writeln!(out, "PC: 0x{:08X}", cpu.pc());

    for kind in [CacheKind::Instruction, CacheKind::Data] {
        let line = cpu.cache_stats_line(kind);
        if !line.is_empty() {
            let _ = writeln!(out, "{line}");
        }
    }

    if show_caches {
        for (kind, cache) in [
            (CacheKind::Instruction, cpu.icache()),
            (CacheKind::Data, cpu.dcache()),
        ] {
            if let Some(cache) = cache {
                let _ = write!(out, "\n{kind}\n{cache}");
            }
        }
    }

    let _ = write!(out, "\n{}", cpu.memory_window(memory));
    out
}
