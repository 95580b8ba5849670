//! Direct-mapped, write-through cache model.
//!
//! The cache shadows memory for hit/miss accounting only. Loaded values
//! always come from memory; stores reach memory before the cache is touched.

/// Tag/index/offset arithmetic.
pub mod address;
/// Geometry configuration and validation.
pub mod config;

use std::fmt;

pub use address::{CacheGeometry, SpanSegment};
pub use config::{CacheConfig, CacheConfigError, DEFAULT_BLOCK_SIZE, DEFAULT_CACHE_SIZE};

use crate::{
    memory::{AccessWidth, Memory},
    Fault,
};

/// Which of the two caches an access went through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum CacheKind {
    /// Instruction cache, probed once per step.
    Instruction,
    /// Data cache, probed by loads and stores.
    Data,
}

impl fmt::Display for CacheKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Instruction => "I-cache",
            Self::Data => "D-cache",
        })
    }
}

/// Hit and miss counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct CacheStats {
    /// Accesses whose whole span hit.
    pub hits: u64,
    /// Accesses that serviced a miss.
    pub misses: u64,
}

impl CacheStats {
    /// Total accesses.
    #[must_use]
    pub const fn accesses(&self) -> u64 {
        self.hits + self.misses
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} hits, {} misses", self.hits, self.misses)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CacheEntry {
    tag: u64,
    valid: bool,
    block: Box<[u8]>,
}

impl CacheEntry {
    fn empty(blocksize: usize) -> Self {
        Self {
            tag: 0,
            valid: false,
            block: vec![0; blocksize].into_boxed_slice(),
        }
    }
}

/// Read-only view of one cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheEntryView<'a> {
    /// Entry position.
    pub index: usize,
    /// Stored tag.
    pub tag: u64,
    /// Whether the entry holds a block.
    pub valid: bool,
    /// Block bytes as last retrieved from memory.
    pub block: &'a [u8],
}

/// Direct-mapped cache of `size / blocksize` entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cache {
    geometry: CacheGeometry,
    entries: Vec<CacheEntry>,
    stats: CacheStats,
}

impl Cache {
    /// Builds an all-invalid cache.
    ///
    /// # Errors
    ///
    /// Returns [`CacheConfigError`] when the geometry is invalid.
    pub fn new(config: CacheConfig) -> Result<Self, CacheConfigError> {
        let geometry = config.validate()?;
        let entries = (0..geometry.entries())
            .map(|_| CacheEntry::empty(geometry.blocksize()))
            .collect();
        Ok(Self {
            geometry,
            entries,
            stats: CacheStats::default(),
        })
    }

    /// Geometry this cache was built with.
    #[must_use]
    pub const fn geometry(&self) -> &CacheGeometry {
        &self.geometry
    }

    /// Hit/miss counters.
    #[must_use]
    pub const fn stats(&self) -> CacheStats {
        self.stats
    }

    /// Looks up a read of `numbytes` at `address`, refilling on a miss.
    ///
    /// Returns `true` on a hit.
    ///
    /// # Errors
    ///
    /// Propagates a fault raised while retrieving a block.
    pub fn check(
        &mut self,
        address: u64,
        numbytes: usize,
        memory: &dyn Memory,
    ) -> Result<bool, Fault> {
        let span = self.geometry.span(address, numbytes);
        let tag = self.geometry.tag(address);
        let hit = span.iter().all(|&index| {
            let entry = &self.entries[index];
            entry.valid && entry.tag == tag
        });

        if hit {
            self.stats.hits += 1;
        } else {
            self.stats.misses += 1;
            self.service_miss(address, &span, memory)?;
        }
        Ok(hit)
    }

    /// Write-through store: writes `value` to memory, then performs the same
    /// lookup as [`Cache::check`] so refilled blocks carry the new bytes.
    ///
    /// # Errors
    ///
    /// Returns the store's fault before the cache is touched, or a refill fault.
    pub fn check_write(
        &mut self,
        address: u64,
        width: AccessWidth,
        value: u64,
        memory: &mut dyn Memory,
    ) -> Result<bool, Fault> {
        memory.store(address, width, value)?;
        self.check(address, width.bytes(), memory)
    }

    // Every spanned entry is replaced, including ones that matched.
    fn service_miss(&mut self, address: u64, span: &[usize], memory: &dyn Memory) -> Result<(), Fault> {
        let tag = self.geometry.tag(address);
        let blocksize = self.geometry.blocksize();
        for &index in span {
            let base = self.geometry.block_address(address, index);
            let mut block = memory.retrieve_block(base, blocksize)?;
            block.resize(blocksize, 0);
            self.entries[index] = CacheEntry {
                tag,
                valid: true,
                block: block.into_boxed_slice(),
            };
        }
        Ok(())
    }

    /// Bytes the cache currently holds for `len` bytes at `address`, or
    /// `None` if any of them is not resident.
    ///
    /// Bytes are read from the entries a `len`-byte access would span, so
    /// overlapping blocks of non-power-of-two geometries resolve the same way
    /// a refill fills them.
    #[must_use]
    pub fn resident_bytes(&self, address: u64, len: usize) -> Option<Vec<u8>> {
        if len == 0 {
            return Some(Vec::new());
        }
        let tag = self.geometry.tag(address);
        let mut bytes = Vec::with_capacity(len);
        for segment in self.geometry.span_segments(address, len) {
            let entry = self.entries.get(segment.index)?;
            if !entry.valid || entry.tag != tag {
                return None;
            }
            let start = usize::try_from(segment.offset).ok()?;
            let end = start.checked_add(usize::try_from(segment.len).ok()?)?;
            bytes.extend_from_slice(entry.block.get(start..end)?);
        }
        Some(bytes)
    }

    /// Number of entries.
    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// View of the entry at `index`.
    #[must_use]
    pub fn entry(&self, index: usize) -> Option<CacheEntryView<'_>> {
        self.entries.get(index).map(|entry| CacheEntryView {
            index,
            tag: entry.tag,
            valid: entry.valid,
            block: &entry.block,
        })
    }

    /// Views of every entry in index order.
    pub fn entries(&self) -> impl Iterator<Item = CacheEntryView<'_>> {
        self.entries
            .iter()
            .enumerate()
            .map(|(index, entry)| CacheEntryView {
                index,
                tag: entry.tag,
                valid: entry.valid,
                block: &entry.block,
            })
    }

    /// Invalidates every entry and zeroes the counters.
    pub fn clear(&mut self) {
        let blocksize = self.geometry.blocksize();
        for entry in &mut self.entries {
            *entry = CacheEntry::empty(blocksize);
        }
        self.stats = CacheStats::default();
    }
}

impl fmt::Display for Cache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} bytes total with {} bytes per block",
            self.geometry.size(),
            self.geometry.blocksize()
        )?;
        writeln!(f, "tag\t\t\t\t\tV\tblock data")?;
        let width = self.geometry.tag_bits().div_ceil(4) as usize;
        for entry in self.entries() {
            write!(
                f,
                "0x{:0width$X}\t{}\t",
                entry.tag,
                if entry.valid { 'Y' } else { 'N' }
            )?;
            for (position, byte) in entry.block.iter().enumerate() {
                if position > 0 {
                    f.write_str(".")?;
                }
                write!(f, "{byte:02X}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::{Cache, CacheConfig, CacheKind, CacheStats};
    use crate::{
        memory::{AccessWidth, Memory, SegmentedMemory},
        Fault,
    };

    const DATA: u64 = 0x1000_0000;

    fn cache(size: usize, blocksize: usize) -> Cache {
        Cache::new(CacheConfig::new(size, blocksize)).expect("valid geometry")
    }

    #[test]
    fn new_cache_is_all_invalid() {
        let cache = cache(128, 8);
        assert_eq!(cache.entry_count(), 16);
        assert!(cache.entries().all(|entry| !entry.valid));
        assert_eq!(cache.stats(), CacheStats::default());
    }

    #[test]
    fn cold_miss_then_warm_hit() {
        let mut cache = cache(128, 8);
        let memory = SegmentedMemory::default();

        assert_eq!(cache.check(DATA + 8, 8, &memory), Ok(false));
        assert_eq!(cache.check(DATA + 8, 8, &memory), Ok(true));
        assert_eq!(cache.check(DATA + 12, 4, &memory), Ok(true));
        assert_eq!(cache.stats(), CacheStats { hits: 2, misses: 1 });
        assert_eq!(cache.stats().to_string(), "2 hits, 1 misses");
    }

    #[test]
    fn conflicting_tags_evict_each_other() {
        let mut cache = cache(128, 8);
        let memory = SegmentedMemory::default();

        assert_eq!(cache.check(DATA, 8, &memory), Ok(false));
        assert_eq!(cache.check(DATA + 128, 8, &memory), Ok(false));
        assert_eq!(cache.check(DATA, 8, &memory), Ok(false));
        assert_eq!(cache.stats().misses, 3);
    }

    #[test]
    fn spanning_access_fills_both_entries_with_starting_tag() {
        let mut cache = cache(128, 8);
        let memory = SegmentedMemory::default();
        let address = DATA + 0x10 - 3;

        assert_eq!(cache.check(address, 8, &memory), Ok(false));
        let tag = cache.geometry().tag(address);
        let touched: Vec<_> = cache.entries().filter(|entry| entry.valid).collect();
        assert_eq!(touched.len(), 2);
        assert_eq!(touched[0].index, 1);
        assert_eq!(touched[1].index, 2);
        assert!(touched.iter().all(|entry| entry.tag == tag));
        assert_eq!(cache.check(address, 8, &memory), Ok(true));
    }

    #[test]
    fn partial_span_hit_still_counts_one_miss_and_refills_all() {
        let mut cache = cache(128, 8);
        let mut memory = SegmentedMemory::default();

        assert_eq!(cache.check(DATA + 8, 8, &memory), Ok(false));
        memory.store_byte(DATA + 8, 0xAA).expect("data store");
        assert_eq!(cache.check(DATA + 5, 8, &memory), Ok(false));
        assert_eq!(cache.stats(), CacheStats { hits: 0, misses: 2 });
        assert_eq!(cache.entry(1).map(|entry| entry.block[0]), Some(0xAA));
    }

    #[test]
    fn write_through_updates_memory_and_refilled_block() {
        let mut cache = cache(128, 8);
        let mut memory = SegmentedMemory::default();

        let hit = cache
            .check_write(DATA + 16, AccessWidth::Doubleword, 0x1122_3344_5566_7788, &mut memory)
            .expect("store succeeds");
        assert!(!hit);
        assert_eq!(memory.load_doubleword(DATA + 16), Ok(0x1122_3344_5566_7788));
        assert_eq!(
            cache.resident_bytes(DATA + 16, 8),
            Some(0x1122_3344_5566_7788_u64.to_le_bytes().to_vec())
        );

        let hit = cache
            .check_write(DATA + 16, AccessWidth::Byte, 0xFF, &mut memory)
            .expect("store succeeds");
        assert!(hit);
        assert_eq!(memory.load_byte(DATA + 16), Ok(0xFF));
        // A hit does not refill, so the stale byte stays in the block.
        assert_eq!(cache.resident_bytes(DATA + 16, 1), Some(vec![0x88]));
    }

    #[test]
    fn faulting_store_leaves_cache_untouched() {
        let mut cache = cache(128, 8);
        let mut memory = SegmentedMemory::default();
        let stack = memory.layout().stack_base;

        let result = cache.check_write(stack, AccessWidth::Word, 1, &mut memory);
        assert!(matches!(result, Err(Fault::Segment { .. })));
        assert_eq!(cache.stats(), CacheStats::default());
    }

    #[test]
    fn clear_resets_entries_and_counters() {
        let mut cache = cache(64, 16);
        let memory = SegmentedMemory::default();
        cache.check(DATA, 8, &memory).expect("refill");
        cache.clear();
        assert!(cache.entries().all(|entry| !entry.valid));
        assert_eq!(cache.stats().accesses(), 0);
    }

    #[test]
    fn display_dumps_header_and_entries() {
        let mut cache = cache(16, 8);
        let mut memory = SegmentedMemory::default();
        memory.store_halfword(DATA, 0xBEEF).expect("data store");
        cache.check(DATA, 2, &memory).expect("refill");

        let dump = cache.to_string();
        let lines: Vec<_> = dump.lines().collect();
        assert_eq!(lines[0], "16 bytes total with 8 bytes per block");
        assert_eq!(lines[1], "tag\t\t\t\t\tV\tblock data");
        assert_eq!(lines[2], "0x000000001000000\tY\tEF.BE.00.00.00.00.00.00");
        assert_eq!(lines[3], "0x000000000000000\tN\t00.00.00.00.00.00.00.00");
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn kinds_render_short_names() {
        assert_eq!(CacheKind::Instruction.to_string(), "I-cache");
        assert_eq!(CacheKind::Data.to_string(), "D-cache");
    }

    proptest! {
        #[test]
        fn writes_then_reads_observe_the_written_value(
            offset in 0_u64..512,
            value in any::<u64>(),
            block_pow in 0_u32..5,
        ) {
            let blocksize = 1_usize << block_pow;
            let mut cache = Cache::new(CacheConfig::new(blocksize * 8, blocksize)).expect("valid geometry");
            let mut memory = SegmentedMemory::default();
            let address = DATA + offset;

            cache.check_write(address, AccessWidth::Doubleword, value, &mut memory).expect("store succeeds");
            cache.check(address, 8, &memory).expect("load succeeds");
            prop_assert_eq!(memory.load_doubleword(address), Ok(value));
            prop_assert_eq!(cache.resident_bytes(address, 8), Some(value.to_le_bytes().to_vec()));
        }
    }
}
