//! Memory collaborator contract and a reference segmented implementation.

/// Segment map and address-space constants.
pub mod map;
/// Sparse byte store enforcing the segment map.
pub mod segmented;

pub use map::{
    MemoryLayout, DYNAMIC_DATA_SEGMENT_BASE, INSTRUCTION_SIZE, STACK_ALIGNMENT, STACK_BASE,
    STATIC_DATA_SEGMENT_BASE, TEXT_SEGMENT_BASE,
};
pub use segmented::SegmentedMemory;

use crate::Fault;

/// Width of a data transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum AccessWidth {
    /// One byte.
    Byte,
    /// Two bytes.
    Halfword,
    /// Four bytes.
    Word,
    /// Eight bytes.
    Doubleword,
}

impl AccessWidth {
    /// Number of bytes moved by an access of this width.
    #[must_use]
    pub const fn bytes(self) -> usize {
        match self {
            Self::Byte => 1,
            Self::Halfword => 2,
            Self::Word => 4,
            Self::Doubleword => 8,
        }
    }
}

/// Byte-addressable main memory consumed by the engine and the caches.
///
/// Loads return raw zero-extended values; sign extension is the
/// instruction's business. Every access may raise [`Fault::Segment`].
pub trait Memory {
    /// Segment boundaries of this memory.
    fn layout(&self) -> &MemoryLayout;

    /// Loads eight bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Fault::Segment`] when the range is not mapped for data.
    fn load_doubleword(&self, address: u64) -> Result<u64, Fault>;

    /// Loads four bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Fault::Segment`] when the range is not mapped for data.
    fn load_word(&self, address: u64) -> Result<u32, Fault>;

    /// Loads two bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Fault::Segment`] when the range is not mapped for data.
    fn load_halfword(&self, address: u64) -> Result<u16, Fault>;

    /// Loads one byte.
    ///
    /// # Errors
    ///
    /// Returns [`Fault::Segment`] when the address is not mapped for data.
    fn load_byte(&self, address: u64) -> Result<u8, Fault>;

    /// Stores eight bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Fault::Segment`] when the range is not mapped for data.
    fn store_doubleword(&mut self, address: u64, value: u64) -> Result<(), Fault>;

    /// Stores four bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Fault::Segment`] when the range is not mapped for data.
    fn store_word(&mut self, address: u64, value: u32) -> Result<(), Fault>;

    /// Stores two bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Fault::Segment`] when the range is not mapped for data.
    fn store_halfword(&mut self, address: u64, value: u16) -> Result<(), Fault>;

    /// Stores one byte.
    ///
    /// # Errors
    ///
    /// Returns [`Fault::Segment`] when the address is not mapped for data.
    fn store_byte(&mut self, address: u64, value: u8) -> Result<(), Fault>;

    /// Reads an encoded instruction word from the text segment.
    ///
    /// # Errors
    ///
    /// Returns [`Fault::Segment`] when `address` is outside the text segment.
    fn load_instruction_word(&self, address: u64) -> Result<u32, Fault>;

    /// Copies `length` raw bytes starting at `address`, used to refill cache blocks.
    ///
    /// # Errors
    ///
    /// Returns [`Fault::Segment`] when the implementation cannot serve the range.
    fn retrieve_block(&self, address: u64, length: usize) -> Result<Vec<u8>, Fault>;

    /// Loads `width` bytes, zero-extended to 64 bits.
    ///
    /// # Errors
    ///
    /// Propagates the fault of the width-specific load.
    fn load(&self, address: u64, width: AccessWidth) -> Result<u64, Fault> {
        match width {
            AccessWidth::Byte => self.load_byte(address).map(u64::from),
            AccessWidth::Halfword => self.load_halfword(address).map(u64::from),
            AccessWidth::Word => self.load_word(address).map(u64::from),
            AccessWidth::Doubleword => self.load_doubleword(address),
        }
    }

    /// Stores the low `width` bytes of `value`.
    ///
    /// # Errors
    ///
    /// Propagates the fault of the width-specific store.
    #[allow(clippy::cast_possible_truncation)]
    fn store(&mut self, address: u64, width: AccessWidth, value: u64) -> Result<(), Fault> {
        match width {
            AccessWidth::Byte => self.store_byte(address, value as u8),
            AccessWidth::Halfword => self.store_halfword(address, value as u16),
            AccessWidth::Word => self.store_word(address, value as u32),
            AccessWidth::Doubleword => self.store_doubleword(address, value),
        }
    }
}
