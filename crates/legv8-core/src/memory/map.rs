//! Segment map of the simulated virtual address space.

use crate::SegmentName;

/// Size in bytes of one encoded instruction.
pub const INSTRUCTION_SIZE: u64 = 4;
/// Default start of the text segment.
pub const TEXT_SEGMENT_BASE: u64 = 0x0040_0000;
/// Default start of the static data segment.
pub const STATIC_DATA_SEGMENT_BASE: u64 = 0x1000_0000;
/// Default start of the dynamic data (heap) segment.
pub const DYNAMIC_DATA_SEGMENT_BASE: u64 = 0x1000_8000;
/// Default initial stack pointer; the stack grows down from here.
pub const STACK_BASE: u64 = 0x7F_FFFF_FFF0;
/// Required stack pointer alignment for stack-relative accesses.
pub const STACK_ALIGNMENT: u64 = 16;

/// Segment boundaries of the address space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct MemoryLayout {
    /// First address of the text segment.
    pub text_base: u64,
    /// First address past the text segment, start of static data.
    pub static_data_base: u64,
    /// Start of the dynamic data segment.
    pub dynamic_data_base: u64,
    /// Initial stack pointer and exclusive upper bound of data accesses.
    pub stack_base: u64,
}

impl Default for MemoryLayout {
    fn default() -> Self {
        Self {
            text_base: TEXT_SEGMENT_BASE,
            static_data_base: STATIC_DATA_SEGMENT_BASE,
            dynamic_data_base: DYNAMIC_DATA_SEGMENT_BASE,
            stack_base: STACK_BASE,
        }
    }
}

impl MemoryLayout {
    /// Byte address of the instruction at `index`.
    #[must_use]
    pub const fn instruction_address(&self, index: usize) -> u64 {
        self.text_base
            .wrapping_add((index as u64).wrapping_mul(INSTRUCTION_SIZE))
    }

    /// Returns `true` when `address` can hold an instruction word.
    #[must_use]
    pub const fn text_contains(&self, address: u64) -> bool {
        address >= self.text_base
            && address <= self.static_data_base.saturating_sub(INSTRUCTION_SIZE)
    }

    /// Instruction index for a text address, assuming it is in range and aligned.
    #[must_use]
    pub const fn instruction_index(&self, address: u64) -> usize {
        ((address - self.text_base) / INSTRUCTION_SIZE) as usize
    }

    /// Returns `true` when `len` bytes at `address` all fall in the data range
    /// (`static_data_base..stack_base`).
    #[must_use]
    pub const fn data_contains(&self, address: u64, len: u64) -> bool {
        match address.checked_add(len) {
            Some(end) => address >= self.static_data_base && end <= self.stack_base,
            None => false,
        }
    }

    /// Segment an address is attributed to in fault messages.
    #[must_use]
    pub const fn segment_of(&self, address: u64) -> SegmentName {
        if address < self.static_data_base {
            SegmentName::Text
        } else if address < self.stack_base {
            SegmentName::Data
        } else {
            SegmentName::Stack
        }
    }
}
