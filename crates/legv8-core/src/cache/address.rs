//! Address decomposition into tag, index and offset fields.
//!
//! ```text
//!  63                                                   0
//! +-----------------+---------------+--------------------+
//! |   tag_bits      |  index_bits   |  blocksize_bits    |
//! +-----------------+---------------+--------------------+
//! ```

/// Returns a mask of the low `bits` bits.
const fn low_mask(bits: u32) -> u64 {
    if bits >= u64::BITS {
        u64::MAX
    } else {
        (1_u64 << bits) - 1
    }
}

/// Validated cache geometry and its derived field widths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct CacheGeometry {
    size: usize,
    blocksize: usize,
    entries: usize,
    blocksize_bits: u32,
    index_bits: u32,
    tag_bits: u32,
}

impl CacheGeometry {
    /// Derives field widths. `entries` must be a power of two and `blocksize`
    /// non-zero; [`crate::CacheConfig::validate`] guarantees both.
    ///
    /// `blocksize_bits` is `floor(log2(blocksize))`, so block sizes that are
    /// not powers of two still decompose.
    pub(crate) const fn new(size: usize, blocksize: usize, entries: usize) -> Self {
        let blocksize_bits = blocksize.ilog2();
        let index_bits = entries.trailing_zeros();
        let tag_bits = u64::BITS.saturating_sub(index_bits + blocksize_bits);
        Self {
            size,
            blocksize,
            entries,
            blocksize_bits,
            index_bits,
            tag_bits,
        }
    }

    /// Total capacity in bytes.
    #[must_use]
    pub const fn size(&self) -> usize {
        self.size
    }

    /// Bytes per block.
    #[must_use]
    pub const fn blocksize(&self) -> usize {
        self.blocksize
    }

    /// Number of entries.
    #[must_use]
    pub const fn entries(&self) -> usize {
        self.entries
    }

    /// Width of the offset field.
    #[must_use]
    pub const fn blocksize_bits(&self) -> u32 {
        self.blocksize_bits
    }

    /// Width of the index field.
    #[must_use]
    pub const fn index_bits(&self) -> u32 {
        self.index_bits
    }

    /// Width of the tag field.
    #[must_use]
    pub const fn tag_bits(&self) -> u32 {
        self.tag_bits
    }

    const fn tag_shift(&self) -> u32 {
        self.index_bits + self.blocksize_bits
    }

    /// Low `blocksize_bits` bits of `address`.
    #[must_use]
    pub const fn offset(&self, address: u64) -> u64 {
        address & low_mask(self.blocksize_bits)
    }

    /// Entry index selected by `address`, always below [`Self::entries`].
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn index(&self, address: u64) -> usize {
        ((address >> self.blocksize_bits) & low_mask(self.index_bits)) as usize
    }

    /// Top `tag_bits` bits of `address`.
    #[must_use]
    pub const fn tag(&self, address: u64) -> u64 {
        match address.checked_shr(self.tag_shift()) {
            Some(tag) => tag,
            None => 0,
        }
    }

    /// Reassembles an address from its three fields.
    #[must_use]
    pub const fn compose(&self, tag: u64, index: usize, offset: u64) -> u64 {
        let tag_part = match tag.checked_shl(self.tag_shift()) {
            Some(bits) => bits,
            None => 0,
        };
        tag_part | ((index as u64) << self.blocksize_bits) | (offset & low_mask(self.blocksize_bits))
    }

    /// Base address of the block at `index` within the tag region of `address`.
    #[must_use]
    pub const fn block_address(&self, address: u64, index: usize) -> u64 {
        self.compose(self.tag(address), index, 0)
    }

    /// Entry indices touched by a `numbytes` access at `address`, in order.
    ///
    /// Walks block boundaries: each step records the current index, moves to
    /// the end of that block and subtracts the bytes consumed. A span always
    /// has at least one entry. The tag of every spanned entry is the tag of
    /// the starting address; accesses straddling a tag region are not modeled.
    #[must_use]
    pub fn span(&self, address: u64, numbytes: usize) -> Vec<usize> {
        self.span_segments(address, numbytes)
            .into_iter()
            .map(|segment| segment.index)
            .collect()
    }

    /// The walk behind [`Self::span`], with the bytes each entry supplies.
    ///
    /// When the block size is not a power of two, blocks are
    /// `blocksize` bytes long but start every `2^blocksize_bits` bytes, so
    /// they overlap and an access byte belongs to the entry the walk assigns
    /// it to, not necessarily to `index(byte)`.
    #[must_use]
    pub fn span_segments(&self, address: u64, numbytes: usize) -> Vec<SpanSegment> {
        let mut segments = Vec::new();
        let mut current = address;
        let mut remaining = numbytes as u64;
        loop {
            let block_start = (current >> self.blocksize_bits) << self.blocksize_bits;
            let block_end = block_start.wrapping_add(self.blocksize as u64);
            let consumed = block_end.wrapping_sub(current);
            segments.push(SpanSegment {
                index: self.index(current),
                offset: current - block_start,
                len: consumed.min(remaining),
            });
            if consumed >= remaining {
                break;
            }
            remaining -= consumed;
            current = block_end;
        }
        segments
    }
}

/// One entry's share of an access, produced by [`CacheGeometry::span_segments`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpanSegment {
    /// Entry index.
    pub index: usize,
    /// First byte of the access within the entry's block.
    pub offset: u64,
    /// Bytes of the access held by this entry.
    pub len: u64,
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use crate::CacheConfig;

    use super::{CacheGeometry, SpanSegment};

    fn geometry(size: usize, blocksize: usize) -> CacheGeometry {
        CacheConfig::new(size, blocksize)
            .validate()
            .expect("valid geometry")
    }

    #[test]
    fn default_geometry_field_widths() {
        let g = geometry(128, 8);
        assert_eq!(g.blocksize_bits(), 3);
        assert_eq!(g.index_bits(), 4);
        assert_eq!(g.tag_bits(), 57);
    }

    #[test]
    fn fields_are_extracted_from_known_address() {
        let g = geometry(128, 8);
        let address = 0x1000_0000_u64 + 0x5B;
        assert_eq!(g.offset(address), 0x3);
        assert_eq!(g.index(address), 0xB);
        assert_eq!(g.tag(address), 0x1000_0000 >> 7);
    }

    #[test]
    fn single_entry_cache_always_indexes_zero() {
        let g = geometry(16, 16);
        assert_eq!(g.index_bits(), 0);
        assert_eq!(g.index(0xFFFF_FFFF_FFFF_FFFF), 0);
        assert_eq!(g.span(0x1000_000C, 8), vec![0, 0]);
    }

    #[test]
    fn tag_uses_logical_shift_for_high_addresses() {
        let g = geometry(128, 8);
        assert_eq!(g.tag(u64::MAX), (1_u64 << 57) - 1);
    }

    #[test]
    fn aligned_access_touches_one_entry() {
        let g = geometry(128, 8);
        assert_eq!(g.span(0x1000_0010, 8), vec![2]);
        assert_eq!(g.span(0x1000_0013, 1), vec![2]);
    }

    #[test]
    fn access_crossing_a_boundary_touches_two_entries() {
        let g = geometry(128, 8);
        assert_eq!(g.span(0x1000_0010 - 3, 8), vec![1, 2]);
    }

    #[test]
    fn small_blocks_split_a_doubleword_across_many_entries() {
        let g = geometry(32, 2);
        assert_eq!(g.span(0x1000_0001, 8), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn span_wraps_around_the_index_space() {
        let g = geometry(128, 8);
        assert_eq!(g.span(0x1000_007C, 8), vec![15, 0]);
    }

    #[test]
    fn block_address_keeps_tag_of_starting_address() {
        let g = geometry(128, 8);
        let address = 0x1000_0035;
        assert_eq!(g.block_address(address, 6), 0x1000_0030);
        assert_eq!(g.block_address(address, 7), 0x1000_0038);
    }

    #[test]
    fn overlapping_blocks_hand_bytes_to_the_walked_entry() {
        // Three-byte blocks start every two bytes.
        let g = geometry(24, 3);
        let segment = |index, len| SpanSegment { index, offset: 1, len };
        assert_eq!(
            g.span_segments(0x1000_0001, 6),
            vec![segment(0, 2), segment(1, 2), segment(2, 2)]
        );
        // The last byte sits in entry 2 even though index() names entry 3.
        assert_eq!(g.index(0x1000_0006), 3);
    }

    proptest! {
        #[test]
        fn decomposition_round_trips(address in any::<u64>(), block_pow in 0_u32..7, entry_pow in 0_u32..9) {
            let blocksize = 1_usize << block_pow;
            let g = geometry(blocksize << entry_pow, blocksize);
            let index = g.index(address);
            prop_assert!(index < g.entries());
            prop_assert_eq!(g.compose(g.tag(address), index, g.offset(address)), address);
        }

        #[test]
        fn span_covers_every_accessed_byte(
            address in 0x1000_0000_u64..0x1000_1000,
            numbytes in 1_usize..=8,
            block_pow in 0_u32..5,
        ) {
            let blocksize = 1_usize << block_pow;
            let g = geometry(blocksize * 16, blocksize);
            let span = g.span(address, numbytes);

            let mut expected: Vec<usize> = Vec::new();
            for byte in address..address + numbytes as u64 {
                let index = g.index(byte);
                if expected.last() != Some(&index) {
                    expected.push(index);
                }
            }
            prop_assert_eq!(span, expected);
        }

        #[test]
        fn segments_partition_the_access(
            address in 0x1000_0000_u64..0x1000_1000,
            numbytes in 1_usize..=8,
            blocksize in 1_usize..=12,
        ) {
            let g = geometry(blocksize * 8, blocksize);
            let segments = g.span_segments(address, numbytes);
            prop_assert_eq!(segments.iter().map(|s| s.len).sum::<u64>(), numbytes as u64);
            for segment in &segments {
                prop_assert!(segment.len > 0);
                prop_assert!(segment.offset + segment.len <= blocksize as u64);
            }
        }
    }
}
