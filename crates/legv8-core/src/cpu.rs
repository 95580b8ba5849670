//! Fetch-execute engine owning the architectural state and both caches.

use crate::cache::{Cache, CacheConfigError, CacheKind, CacheStats};
use crate::decoder::Instruction;
use crate::execute::{commit_execution, execute_instruction, ExecuteContext};
use crate::fault::{ExecutionError, Fault};
use crate::memory::{AccessWidth, Memory, MemoryLayout};
use crate::state::{ArchitecturalState, Flags, REGISTER_COUNT};
use crate::window::{MemoryWindow, RecentAccess};
use crate::{
    AccessOutcome, CpuSnapshot, NullTraceSink, RunOutcome, SimulatorConfig, StepOutcome,
    TraceEvent, TraceSink,
};

/// One simulated processor.
///
/// Programs and memory are supplied per call; the engine keeps only the
/// state an instruction can change plus cache contents and counters.
///
/// Segment boundaries belong to the memory. Each step adopts
/// [`Memory::layout`], so the PC, the fetch probe and branch targets always
/// agree. The configured layout seeds the stack pointer and is used until
/// the first step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cpu {
    config: SimulatorConfig,
    layout: MemoryLayout,
    arch: ArchitecturalState,
    icache: Option<Cache>,
    dcache: Option<Cache>,
    recent: RecentAccess,
}

impl Cpu {
    /// Builds an engine in reset state.
    ///
    /// # Errors
    ///
    /// Returns [`CacheConfigError`] when either configured cache geometry is
    /// invalid. Zero-sized caches are treated as absent.
    pub fn new(config: &SimulatorConfig) -> Result<Self, CacheConfigError> {
        let icache = config.effective_icache().map(Cache::new).transpose()?;
        let dcache = config.effective_dcache().map(Cache::new).transpose()?;
        Ok(Self {
            config: *config,
            layout: config.layout,
            arch: initial_state(&config.layout),
            icache,
            dcache,
            recent: RecentAccess::default(),
        })
    }

    /// Restores reset state and empties both caches, keeping their geometry.
    pub fn reset(&mut self) {
        self.layout = self.config.layout;
        self.arch = initial_state(&self.config.layout);
        self.recent = RecentAccess::default();
        for cache in [self.icache.as_mut(), self.dcache.as_mut()].into_iter().flatten() {
            cache.clear();
        }
    }

    /// Executes the instruction at the current index.
    ///
    /// # Errors
    ///
    /// Returns an [`ExecutionError`] located at the faulting instruction.
    pub fn step(
        &mut self,
        program: &[Instruction],
        memory: &mut dyn Memory,
    ) -> Result<StepOutcome, ExecutionError> {
        self.step_traced(program, memory, &mut NullTraceSink)
    }

    /// [`Self::step`] reporting every event to `trace`.
    ///
    /// # Errors
    ///
    /// Returns an [`ExecutionError`] located at the faulting instruction. The
    /// index has already moved past it; nothing else the instruction would
    /// have changed is committed.
    pub fn step_traced(
        &mut self,
        program: &[Instruction],
        memory: &mut dyn Memory,
        trace: &mut dyn TraceSink,
    ) -> Result<StepOutcome, ExecutionError> {
        let index = self.arch.instruction_index();
        let Some(instruction) = program.get(index) else {
            return Ok(StepOutcome::Completed);
        };
        self.layout = *memory.layout();
        let pc = self.layout.instruction_address(index);
        trace.on_event(TraceEvent::InstructionStart {
            index,
            pc,
            mnemonic: instruction.mnemonic(),
        });

        self.arch.set_instruction_index(index + 1);
        self.arch.set_branch_taken(false);
        self.recent.begin_step(pc);

        let outcome = self.fetch_and_execute(instruction, pc, memory, trace);
        match outcome {
            Ok(()) => Ok(StepOutcome::Continuing),
            Err(fault) => {
                trace.on_event(TraceEvent::FaultRaised {
                    fault,
                    line: instruction.line,
                });
                Err(ExecutionError {
                    fault,
                    line: instruction.line,
                    index,
                })
            }
        }
    }

    fn fetch_and_execute(
        &mut self,
        instruction: &Instruction,
        pc: u64,
        memory: &mut dyn Memory,
        trace: &mut dyn TraceSink,
    ) -> Result<(), Fault> {
        // Instructions come pre-decoded; the probe only feeds statistics.
        let hit = match self.icache.as_mut() {
            Some(cache) => Some(cache.check(pc, AccessWidth::Word.bytes(), &*memory)?),
            None => None,
        };
        trace.on_event(TraceEvent::CacheAccess {
            kind: CacheKind::Instruction,
            address: pc,
            outcome: AccessOutcome::from(hit),
        });

        let mut ctx = ExecuteContext {
            arch: &self.arch,
            dcache: self.dcache.as_mut(),
            memory: &mut *memory,
            trace: &mut *trace,
        };
        let exec = execute_instruction(&instruction.op, &mut ctx)?;

        if let Some(address) = exec.data_address {
            self.recent.record_data(address);
        }
        commit_execution(&mut self.arch, &instruction.op, &exec, trace);
        Ok(())
    }

    /// Runs until the index passes the end of `program`.
    ///
    /// # Errors
    ///
    /// Stops at the first fault and returns it.
    pub fn run(
        &mut self,
        program: &[Instruction],
        memory: &mut dyn Memory,
    ) -> Result<RunOutcome, ExecutionError> {
        self.run_with(program, memory, &mut NullTraceSink, None)
    }

    /// [`Self::run`] reporting every event to `trace`.
    ///
    /// # Errors
    ///
    /// Stops at the first fault and returns it.
    pub fn run_traced(
        &mut self,
        program: &[Instruction],
        memory: &mut dyn Memory,
        trace: &mut dyn TraceSink,
    ) -> Result<RunOutcome, ExecutionError> {
        self.run_with(program, memory, trace, None)
    }

    /// Runs at most `max_steps` instructions.
    ///
    /// Programs that loop forever never complete under [`Self::run`]; this is
    /// the entry point for untrusted input.
    ///
    /// # Errors
    ///
    /// Stops at the first fault and returns it.
    pub fn run_bounded(
        &mut self,
        program: &[Instruction],
        memory: &mut dyn Memory,
        max_steps: u64,
        trace: &mut dyn TraceSink,
    ) -> Result<RunOutcome, ExecutionError> {
        self.run_with(program, memory, trace, Some(max_steps))
    }

    fn run_with(
        &mut self,
        program: &[Instruction],
        memory: &mut dyn Memory,
        trace: &mut dyn TraceSink,
        max_steps: Option<u64>,
    ) -> Result<RunOutcome, ExecutionError> {
        let mut steps = 0_u64;
        loop {
            if max_steps.is_some_and(|limit| steps >= limit) {
                return Ok(RunOutcome {
                    steps,
                    completed: self.arch.instruction_index() >= program.len(),
                });
            }
            match self.step_traced(program, memory, trace)? {
                StepOutcome::Continuing => steps += 1,
                StepOutcome::Completed => {
                    return Ok(RunOutcome {
                        steps,
                        completed: true,
                    })
                }
            }
        }
    }

    /// Configuration the engine was built with.
    #[must_use]
    pub const fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    /// Segment boundaries of the memory last stepped against, or the
    /// configured layout before the first step.
    #[must_use]
    pub const fn layout(&self) -> &MemoryLayout {
        &self.layout
    }

    /// Full architectural state.
    #[must_use]
    pub const fn state(&self) -> &ArchitecturalState {
        &self.arch
    }

    /// Value of register `index`, `None` above 31.
    #[must_use]
    pub fn register(&self, index: usize) -> Option<i64> {
        self.arch.registers().get(index)
    }

    /// All register values in index order.
    #[must_use]
    pub const fn registers(&self) -> &[i64; REGISTER_COUNT] {
        self.arch.registers().values()
    }

    /// Condition flags.
    #[must_use]
    pub const fn flags(&self) -> Flags {
        self.arch.flags()
    }

    /// Byte address of the next instruction.
    #[must_use]
    pub const fn pc(&self) -> u64 {
        self.layout.instruction_address(self.arch.instruction_index())
    }

    /// Position of the next instruction in the program list.
    #[must_use]
    pub const fn instruction_index(&self) -> usize {
        self.arch.instruction_index()
    }

    /// Moves execution to `index`, as a debugger would.
    pub const fn set_instruction_index(&mut self, index: usize) {
        self.arch.set_instruction_index(index);
    }

    /// Whether the last instruction transferred control.
    #[must_use]
    pub const fn branch_taken(&self) -> bool {
        self.arch.branch_taken()
    }

    /// Whether the last store-exclusive wrote memory.
    #[must_use]
    pub const fn store_exclusive_succeeded(&self) -> bool {
        self.arch.store_exclusive_succeeded()
    }

    /// Address armed by the last exclusive load, if still armed.
    #[must_use]
    pub const fn exclusive_tag(&self) -> Option<u64> {
        self.arch.exclusive_tag()
    }

    /// Instruction cache, if configured.
    #[must_use]
    pub const fn icache(&self) -> Option<&Cache> {
        self.icache.as_ref()
    }

    /// Data cache, if configured.
    #[must_use]
    pub const fn dcache(&self) -> Option<&Cache> {
        self.dcache.as_ref()
    }

    /// Counters of the cache of `kind`, if configured.
    #[must_use]
    pub fn cache_stats(&self, kind: CacheKind) -> Option<CacheStats> {
        let cache = match kind {
            CacheKind::Instruction => self.icache(),
            CacheKind::Data => self.dcache(),
        };
        cache.map(Cache::stats)
    }

    /// `"I-cache: H hits, M misses"`, or an empty string without that cache.
    #[must_use]
    pub fn cache_stats_line(&self, kind: CacheKind) -> String {
        self.cache_stats(kind)
            .map_or_else(String::new, |stats| format!("{kind}: {stats}"))
    }

    /// Addresses touched by the last step.
    #[must_use]
    pub const fn recent_access(&self) -> &RecentAccess {
        &self.recent
    }

    /// Memory contents around the last instruction fetch and data access.
    #[must_use]
    pub fn memory_window(&self, memory: &dyn Memory) -> MemoryWindow {
        MemoryWindow::capture(&self.recent, memory)
    }

    /// Copies out the host-visible state.
    #[must_use]
    pub fn snapshot(&self) -> CpuSnapshot {
        CpuSnapshot {
            registers: self.registers().to_vec(),
            flags: self.flags(),
            pc: self.pc(),
            instruction_index: self.instruction_index(),
            branch_taken: self.branch_taken(),
            store_exclusive_succeeded: self.store_exclusive_succeeded(),
            exclusive_tag: self.exclusive_tag(),
            icache: self.cache_stats(CacheKind::Instruction),
            dcache: self.cache_stats(CacheKind::Data),
        }
    }
}

#[allow(clippy::cast_possible_wrap)]
const fn initial_state(layout: &MemoryLayout) -> ArchitecturalState {
    ArchitecturalState::new(layout.stack_base as i64)
}

#[cfg(test)]
mod tests {
    use super::Cpu;
    use crate::cache::{CacheConfig, CacheConfigError, CacheKind};
    use crate::decoder::Instruction;
    use crate::memory::{Memory, MemoryLayout, SegmentedMemory, STACK_BASE, TEXT_SEGMENT_BASE};
    use crate::state::Register;
    use crate::{
        AccessOutcome, Mnemonic, NullTraceSink, SimulatorConfig, StepOutcome, TraceEvent,
    };

    fn program(lines: &[(Mnemonic, &[i64])]) -> Vec<Instruction> {
        lines
            .iter()
            .enumerate()
            .map(|(i, (mnemonic, args))| {
                Instruction::decode(*mnemonic, args, i + 1).expect("valid instruction")
            })
            .collect()
    }

    #[test]
    fn reset_state_has_only_stack_pointer_set() {
        let cpu = Cpu::new(&SimulatorConfig::default()).expect("default config");
        assert_eq!(cpu.register(28), Some(STACK_BASE as i64));
        assert!(cpu.registers().iter().enumerate().all(|(i, v)| i == 28 || *v == 0));
        assert_eq!(cpu.pc(), TEXT_SEGMENT_BASE);
        assert_eq!(cpu.register(32), None);
    }

    #[test]
    fn invalid_cache_geometry_prevents_construction() {
        let config = SimulatorConfig {
            dcache: Some(CacheConfig::new(96, 8)),
            ..SimulatorConfig::default()
        };
        assert_eq!(
            Cpu::new(&config),
            Err(CacheConfigError::EntriesNotPowerOfTwo { entries: 12 })
        );
    }

    #[test]
    fn stepping_past_the_end_completes_without_work() {
        let mut cpu = Cpu::new(&SimulatorConfig::default()).expect("default config");
        let mut memory = SegmentedMemory::default();
        assert_eq!(cpu.step(&[], &mut memory), Ok(StepOutcome::Completed));
        assert_eq!(cpu.cache_stats(CacheKind::Instruction).map(|s| s.accesses()), Some(0));
    }

    #[test]
    fn every_fetch_probes_the_instruction_cache() {
        let mut cpu = Cpu::new(&SimulatorConfig::default()).expect("default config");
        let mut memory = SegmentedMemory::default();
        let code = program(&[
            (Mnemonic::Addi, &[1, 1, 1]),
            (Mnemonic::Addi, &[1, 1, 1]),
            (Mnemonic::Addi, &[1, 1, 1]),
        ]);
        let outcome = cpu.run(&code, &mut memory).expect("runs");
        assert_eq!(outcome.steps, 3);
        assert!(outcome.completed);
        assert_eq!(cpu.register(1), Some(3));
        // Two instructions share the first 8-byte block.
        assert_eq!(
            cpu.cache_stats_line(CacheKind::Instruction),
            "I-cache: 1 hits, 2 misses"
        );
        assert_eq!(cpu.cache_stats_line(CacheKind::Data), "D-cache: 0 hits, 0 misses");
    }

    #[test]
    fn stats_line_is_empty_without_cache() {
        let cpu = Cpu::new(&SimulatorConfig::without_caches()).expect("no caches");
        assert_eq!(cpu.cache_stats_line(CacheKind::Data), "");
        assert!(cpu.icache().is_none());
    }

    #[test]
    fn bounded_run_stops_an_infinite_loop() {
        let mut cpu = Cpu::new(&SimulatorConfig::default()).expect("default config");
        let mut memory = SegmentedMemory::default();
        let code = program(&[(Mnemonic::B, &[0])]);
        let outcome = cpu
            .run_bounded(&code, &mut memory, 10, &mut NullTraceSink)
            .expect("runs");
        assert_eq!(outcome.steps, 10);
        assert!(!outcome.completed);
        assert!(cpu.branch_taken());
    }

    #[test]
    fn trace_starts_each_instruction_with_its_address() {
        let mut cpu = Cpu::new(&SimulatorConfig::without_caches()).expect("no caches");
        let mut memory = SegmentedMemory::default();
        let code = program(&[(Mnemonic::Movz, &[2, 7, 0])]);
        let mut events = Vec::new();
        cpu.step_traced(&code, &mut memory, &mut events).expect("steps");
        assert_eq!(
            events.first(),
            Some(&TraceEvent::InstructionStart {
                index: 0,
                pc: TEXT_SEGMENT_BASE,
                mnemonic: Mnemonic::Movz,
            })
        );
    }

    #[test]
    fn reset_clears_caches_and_registers() {
        let mut cpu = Cpu::new(&SimulatorConfig::default()).expect("default config");
        let mut memory = SegmentedMemory::default();
        let code = program(&[(Mnemonic::Movz, &[2, 7, 0])]);
        cpu.run(&code, &mut memory).expect("runs");
        cpu.reset();
        assert_eq!(cpu.register(2), Some(0));
        assert_eq!(cpu.instruction_index(), 0);
        assert_eq!(cpu.cache_stats(CacheKind::Instruction).map(|s| s.accesses()), Some(0));
        assert!(cpu.icache().is_some_and(|c| c.entries().all(|e| !e.valid)));
    }

    #[test]
    fn memory_layout_governs_pc_and_link_address() {
        let config = SimulatorConfig {
            layout: MemoryLayout {
                text_base: 0x0080_0000,
                ..MemoryLayout::default()
            },
            ..SimulatorConfig::default()
        };
        let mut cpu = Cpu::new(&config).expect("default caches");
        assert_eq!(cpu.pc(), 0x0080_0000);

        let mut memory = SegmentedMemory::default();
        let code = program(&[
            (Mnemonic::Addi, &[1, 1, 1]),
            (Mnemonic::Addi, &[1, 1, 1]),
            (Mnemonic::Addi, &[1, 1, 1]),
            (Mnemonic::Bl, &[3]),
        ]);
        let mut events = Vec::new();
        cpu.step_traced(&code, &mut memory, &mut events).expect("steps");
        assert!(events.contains(&TraceEvent::CacheAccess {
            kind: CacheKind::Instruction,
            address: TEXT_SEGMENT_BASE,
            outcome: AccessOutcome::Miss,
        }));

        cpu.set_instruction_index(3);
        cpu.step(&code, &mut memory).expect("steps");
        let link = cpu.state().reg(Register::LR);
        assert_eq!(cpu.pc(), TEXT_SEGMENT_BASE + 12);
        assert_eq!(u64::try_from(link), Ok(cpu.pc()));
        assert_eq!(cpu.layout(), memory.layout());
    }

    #[test]
    fn reset_restores_configured_layout() {
        let config = SimulatorConfig {
            layout: MemoryLayout {
                text_base: 0x0080_0000,
                ..MemoryLayout::default()
            },
            ..SimulatorConfig::default()
        };
        let mut cpu = Cpu::new(&config).expect("default caches");
        let mut memory = SegmentedMemory::default();
        let code = program(&[(Mnemonic::Movz, &[2, 7, 0])]);
        cpu.step(&code, &mut memory).expect("steps");
        assert_eq!(cpu.layout().text_base, TEXT_SEGMENT_BASE);
        cpu.reset();
        assert_eq!(cpu.layout().text_base, 0x0080_0000);
    }
}
