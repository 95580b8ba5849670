//! Execution engine and cache model for the LEGv8 instruction-set simulator.

/// Address-space layout, memory collaborator contract and a reference memory.
pub mod memory;
pub use memory::{
    AccessWidth, Memory, MemoryLayout, SegmentedMemory, DYNAMIC_DATA_SEGMENT_BASE,
    INSTRUCTION_SIZE, STACK_ALIGNMENT, STACK_BASE, STATIC_DATA_SEGMENT_BASE, TEXT_SEGMENT_BASE,
};

/// Direct-mapped write-through cache model.
pub mod cache;
pub use cache::{
    Cache, CacheConfig, CacheConfigError, CacheEntryView, CacheGeometry, CacheKind, CacheStats,
    SpanSegment, DEFAULT_BLOCK_SIZE, DEFAULT_CACHE_SIZE,
};

/// Public host-facing API contract and integration types.
pub mod api;
pub use api::{
    AccessOutcome, CpuSnapshot, NullTraceSink, RunOutcome, SimulatorConfig, SimulatorError,
    StepOutcome, TraceEvent, TraceSink,
};

/// Architectural CPU state model primitives.
pub mod state;
pub use state::{ArchitecturalState, Flags, Register, RegisterFile, REGISTER_COUNT};

/// Mnemonic table, instruction forms and branch conditions.
pub mod mnemonic;
pub use mnemonic::{Condition, InstructionForm, Mnemonic, MNEMONIC_TABLE};

/// Operand decoding from mnemonic plus integer arguments.
pub mod decoder;
pub use decoder::{
    AluOp, DecodeError, Instruction, LoadKind, MoveWideKind, Operation, ShiftOp,
    MAX_SHIFT_AMOUNT, MOVE_WIDE_SHIFTS,
};

/// Fault taxonomy raised while executing.
pub mod fault;
pub use fault::{ExecutionError, Fault, FaultClass, SegmentName};

/// Instruction execution pipeline.
pub mod execute;
pub use execute::{
    commit_execution, execute_instruction, ExclusiveUpdate, ExecuteContext, ExecuteState,
    FlagsUpdate,
};

/// Fetch-execute engine.
pub mod cpu;
pub use cpu::Cpu;

/// Memory-contents display model.
pub mod window;
pub use window::{MemoryWindow, RecentAccess, WindowRow, WINDOW_RADIUS};

#[cfg(test)]
use proptest as _;
#[cfg(test)]
use rstest as _;
