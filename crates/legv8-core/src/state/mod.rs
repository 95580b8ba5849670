//! Architectural CPU state model primitives.

/// Register file, register identifiers and condition flags.
pub mod registers;

pub use registers::{Flags, Register, RegisterFile, REGISTER_COUNT};

/// Architectural state owned by one engine instance.
///
/// Holds everything an instruction can observe or change apart from memory
/// and the caches: registers, flags, the instruction index that stands in
/// for the PC, the exclusive-access tag, and the per-step outcome bits.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct ArchitecturalState {
    registers: RegisterFile,
    flags: Flags,
    instruction_index: usize,
    exclusive_tag: Option<u64>,
    branch_taken: bool,
    store_exclusive_succeeded: bool,
}

impl ArchitecturalState {
    /// Creates reset state: all registers zero except `SP`, flags clear.
    #[must_use]
    pub const fn new(stack_pointer: i64) -> Self {
        Self {
            registers: RegisterFile::with_stack_pointer(stack_pointer),
            flags: Flags {
                negative: false,
                zero: false,
                carry: false,
                overflow: false,
            },
            instruction_index: 0,
            exclusive_tag: None,
            branch_taken: false,
            store_exclusive_succeeded: false,
        }
    }

    /// Returns the register file.
    #[must_use]
    pub const fn registers(&self) -> &RegisterFile {
        &self.registers
    }

    /// Returns the register file for mutation.
    pub const fn registers_mut(&mut self) -> &mut RegisterFile {
        &mut self.registers
    }

    /// Reads a register.
    #[must_use]
    pub const fn reg(&self, reg: Register) -> i64 {
        self.registers.read(reg)
    }

    /// Returns the condition flags.
    #[must_use]
    pub const fn flags(&self) -> Flags {
        self.flags
    }

    /// Replaces the condition flags.
    pub const fn set_flags(&mut self, flags: Flags) {
        self.flags = flags;
    }

    /// Index of the next instruction to execute.
    #[must_use]
    pub const fn instruction_index(&self) -> usize {
        self.instruction_index
    }

    /// Redirects execution to `index`.
    pub const fn set_instruction_index(&mut self, index: usize) {
        self.instruction_index = index;
    }

    /// Address recorded by the last exclusive load, if still armed.
    #[must_use]
    pub const fn exclusive_tag(&self) -> Option<u64> {
        self.exclusive_tag
    }

    /// Arms or disarms the exclusive-access tag.
    pub const fn set_exclusive_tag(&mut self, tag: Option<u64>) {
        self.exclusive_tag = tag;
    }

    /// Whether the last executed instruction was a taken branch.
    #[must_use]
    pub const fn branch_taken(&self) -> bool {
        self.branch_taken
    }

    /// Records whether the current instruction branched.
    pub const fn set_branch_taken(&mut self, taken: bool) {
        self.branch_taken = taken;
    }

    /// Whether the most recent `STXR` performed its store.
    #[must_use]
    pub const fn store_exclusive_succeeded(&self) -> bool {
        self.store_exclusive_succeeded
    }

    /// Records the outcome of an `STXR`.
    pub const fn set_store_exclusive_succeeded(&mut self, succeeded: bool) {
        self.store_exclusive_succeeded = succeeded;
    }
}
