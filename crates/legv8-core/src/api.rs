//! Host-facing configuration, outcome and trace types.

use thiserror::Error;

use crate::{
    cache::{CacheConfig, CacheConfigError, CacheKind, CacheStats},
    decoder::DecodeError,
    fault::{ExecutionError, Fault},
    memory::MemoryLayout,
    mnemonic::Mnemonic,
    state::{Flags, Register, REGISTER_COUNT},
};

/// Top-level configuration for one engine instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SimulatorConfig {
    /// Instruction cache geometry, `None` for no instruction cache.
    pub icache: Option<CacheConfig>,
    /// Data cache geometry, `None` for no data cache.
    pub dcache: Option<CacheConfig>,
    /// Segment boundaries; the stack pointer starts at `layout.stack_base`.
    pub layout: MemoryLayout,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            icache: Some(CacheConfig::DEFAULT),
            dcache: Some(CacheConfig::DEFAULT),
            layout: MemoryLayout::default(),
        }
    }
}

impl SimulatorConfig {
    /// Configuration with neither cache.
    #[must_use]
    pub fn without_caches() -> Self {
        Self {
            icache: None,
            dcache: None,
            layout: MemoryLayout::default(),
        }
    }

    /// Instruction cache geometry, treating a zero size as absent.
    #[must_use]
    pub fn effective_icache(&self) -> Option<CacheConfig> {
        self.icache.filter(|config| !config.is_disabled())
    }

    /// Data cache geometry, treating a zero size as absent.
    #[must_use]
    pub fn effective_dcache(&self) -> Option<CacheConfig> {
        self.dcache.filter(|config| !config.is_disabled())
    }
}

/// How a memory access fared in its cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum AccessOutcome {
    /// Every spanned entry matched.
    Hit,
    /// At least one spanned entry was refilled.
    Miss,
    /// No cache of that kind is configured.
    Uncached,
}

impl From<Option<bool>> for AccessOutcome {
    fn from(hit: Option<bool>) -> Self {
        match hit {
            Some(true) => Self::Hit,
            Some(false) => Self::Miss,
            None => Self::Uncached,
        }
    }
}

/// Result of a single-step call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum StepOutcome {
    /// One instruction executed; more may follow.
    Continuing,
    /// The instruction index is past the end of the program; nothing ran.
    Completed,
}

/// Result of a run call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct RunOutcome {
    /// Instructions executed during this call.
    pub steps: u64,
    /// Whether the program ran to its end (as opposed to hitting a step limit).
    pub completed: bool,
}

/// Structured execution history, emitted in order while stepping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum TraceEvent {
    /// An instruction is about to execute.
    InstructionStart {
        /// Position in the program list.
        index: usize,
        /// Byte address of the instruction.
        pc: u64,
        /// Instruction mnemonic.
        mnemonic: Mnemonic,
    },
    /// An instruction fetch probe or data access went through a cache.
    CacheAccess {
        /// Which cache was consulted.
        kind: CacheKind,
        /// Starting address of the access.
        address: u64,
        /// Hit, miss, or no cache configured.
        outcome: AccessOutcome,
    },
    /// A register write targeting register 31 was dropped.
    ZeroRegisterWriteIgnored {
        /// Instruction that attempted the write.
        mnemonic: Mnemonic,
    },
    /// Condition flags were replaced.
    FlagsUpdated {
        /// New flag values.
        flags: Flags,
    },
    /// An exclusive load armed the monitor.
    ExclusiveTagSet {
        /// Tagged address.
        address: u64,
    },
    /// The exclusive monitor was disarmed.
    ExclusiveTagCleared {
        /// Address that had been tagged.
        address: u64,
    },
    /// A store-exclusive resolved.
    StoreExclusive {
        /// Target address.
        address: u64,
        /// Whether memory was written.
        succeeded: bool,
    },
    /// Control transferred to another instruction.
    BranchTaken {
        /// Target instruction index.
        target: usize,
    },
    /// The current instruction faulted.
    FaultRaised {
        /// Raised fault.
        fault: Fault,
        /// Source line of the faulting instruction.
        line: usize,
    },
}

/// Sink trait for execution trace hooks.
pub trait TraceSink {
    /// Records an event in execution order.
    fn on_event(&mut self, event: TraceEvent);
}

/// Sink that discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullTraceSink;

impl TraceSink for NullTraceSink {
    fn on_event(&mut self, _event: TraceEvent) {}
}

impl TraceSink for Vec<TraceEvent> {
    fn on_event(&mut self, event: TraceEvent) {
        self.push(event);
    }
}

/// Errors from building an engine or loading a program.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SimulatorError {
    /// Invalid cache geometry.
    #[error("cache configuration error: {0}")]
    Config(#[from] CacheConfigError),
    /// Invalid instruction in the program list.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),
    /// Fault raised while executing.
    #[error(transparent)]
    Execution(#[from] ExecutionError),
}

/// Host-visible architectural state at a step boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct CpuSnapshot {
    /// `X0..=X31` in index order.
    pub registers: Vec<i64>,
    /// Condition flags.
    pub flags: Flags,
    /// Byte address of the next instruction.
    pub pc: u64,
    /// Index of the next instruction.
    pub instruction_index: usize,
    /// Whether the last instruction branched.
    pub branch_taken: bool,
    /// Whether the last store-exclusive succeeded.
    pub store_exclusive_succeeded: bool,
    /// Armed exclusive address.
    pub exclusive_tag: Option<u64>,
    /// Instruction cache counters, if configured.
    pub icache: Option<CacheStats>,
    /// Data cache counters, if configured.
    pub dcache: Option<CacheStats>,
}

impl CpuSnapshot {
    /// Value of `reg`, or `0` if the snapshot is truncated.
    #[must_use]
    pub fn register(&self, reg: Register) -> i64 {
        self.registers.get(reg.index()).copied().unwrap_or(0)
    }

    /// Returns `true` when the snapshot carries the full register file.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.registers.len() == REGISTER_COUNT
    }
}
