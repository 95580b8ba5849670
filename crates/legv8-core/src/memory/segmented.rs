use std::collections::BTreeMap;

use super::{Memory, MemoryLayout};
use crate::Fault;

/// Sparse little-endian byte store that enforces the segment map.
///
/// Data accesses must fall entirely within `static_data_base..stack_base`.
/// Instruction words live in the text segment and are only reachable through
/// [`SegmentedMemory::store_instruction_word`] and
/// [`Memory::load_instruction_word`]. Unwritten bytes read as zero.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SegmentedMemory {
    layout: MemoryLayout,
    bytes: BTreeMap<u64, u8>,
}

impl SegmentedMemory {
    /// Creates an empty memory with the given segment map.
    #[must_use]
    pub const fn new(layout: MemoryLayout) -> Self {
        Self {
            layout,
            bytes: BTreeMap::new(),
        }
    }

    /// Writes `words` into the text segment starting at `text_base`.
    ///
    /// # Errors
    ///
    /// Returns [`Fault::Segment`] when the program does not fit in the text segment.
    pub fn load_program_words(&mut self, words: &[u32]) -> Result<(), Fault> {
        for (index, word) in words.iter().enumerate() {
            let address = self.layout.instruction_address(index);
            self.store_instruction_word(address, *word)?;
        }
        Ok(())
    }

    /// Writes one encoded instruction word into the text segment.
    ///
    /// # Errors
    ///
    /// Returns [`Fault::Segment`] when `address` is outside the text segment.
    pub fn store_instruction_word(&mut self, address: u64, word: u32) -> Result<(), Fault> {
        self.check_text(address)?;
        self.write_bytes(address, &word.to_le_bytes());
        Ok(())
    }

    /// Number of bytes that have ever been written.
    #[must_use]
    pub fn populated_bytes(&self) -> usize {
        self.bytes.len()
    }

    const fn check_text(&self, address: u64) -> Result<(), Fault> {
        if self.layout.text_contains(address) {
            Ok(())
        } else {
            Err(Fault::Segment {
                address,
                segment: crate::SegmentName::Text,
            })
        }
    }

    const fn check_data(&self, address: u64, len: u64) -> Result<(), Fault> {
        if self.layout.data_contains(address, len) {
            Ok(())
        } else {
            Err(Fault::Segment {
                address,
                segment: self.layout.segment_of(address),
            })
        }
    }

    fn read_bytes<const N: usize>(&self, address: u64) -> [u8; N] {
        let mut out = [0_u8; N];
        for (offset, byte) in (0_u64..).zip(out.iter_mut()) {
            *byte = self
                .bytes
                .get(&address.wrapping_add(offset))
                .copied()
                .unwrap_or(0);
        }
        out
    }

    fn write_bytes(&mut self, address: u64, data: &[u8]) {
        for (offset, byte) in (0_u64..).zip(data) {
            self.bytes.insert(address.wrapping_add(offset), *byte);
        }
    }

    fn load_data<const N: usize>(&self, address: u64) -> Result<[u8; N], Fault> {
        self.check_data(address, N as u64)?;
        Ok(self.read_bytes(address))
    }

    fn store_data(&mut self, address: u64, data: &[u8]) -> Result<(), Fault> {
        self.check_data(address, data.len() as u64)?;
        self.write_bytes(address, data);
        Ok(())
    }
}

impl Memory for SegmentedMemory {
    fn layout(&self) -> &MemoryLayout {
        &self.layout
    }

    fn load_doubleword(&self, address: u64) -> Result<u64, Fault> {
        self.load_data(address).map(u64::from_le_bytes)
    }

    fn load_word(&self, address: u64) -> Result<u32, Fault> {
        self.load_data(address).map(u32::from_le_bytes)
    }

    fn load_halfword(&self, address: u64) -> Result<u16, Fault> {
        self.load_data(address).map(u16::from_le_bytes)
    }

    fn load_byte(&self, address: u64) -> Result<u8, Fault> {
        self.load_data::<1>(address).map(|[byte]| byte)
    }

    fn store_doubleword(&mut self, address: u64, value: u64) -> Result<(), Fault> {
        self.store_data(address, &value.to_le_bytes())
    }

    fn store_word(&mut self, address: u64, value: u32) -> Result<(), Fault> {
        self.store_data(address, &value.to_le_bytes())
    }

    fn store_halfword(&mut self, address: u64, value: u16) -> Result<(), Fault> {
        self.store_data(address, &value.to_le_bytes())
    }

    fn store_byte(&mut self, address: u64, value: u8) -> Result<(), Fault> {
        self.store_data(address, &[value])
    }

    fn load_instruction_word(&self, address: u64) -> Result<u32, Fault> {
        self.check_text(address)?;
        Ok(u32::from_le_bytes(self.read_bytes(address)))
    }

    // Refills cover whole aligned blocks that may straddle a segment edge,
    // so unmapped bytes read as zero here instead of faulting.
    fn retrieve_block(&self, address: u64, length: usize) -> Result<Vec<u8>, Fault> {
        Ok((0_u64..)
            .take(length)
            .map(|offset| {
                self.bytes
                    .get(&address.wrapping_add(offset))
                    .copied()
                    .unwrap_or(0)
            })
            .collect())
    }
}
