//! Helper functions for instruction execution.

#![allow(clippy::pedantic, clippy::nursery, unknown_lints, missing_docs)]

use crate::memory::{MemoryLayout, INSTRUCTION_SIZE, STACK_ALIGNMENT};
use crate::{Fault, SegmentName};

/// Span of memory guarded by the exclusive monitor.
pub const EXCLUSIVE_GRANULE: u64 = 8;

/// `base + offset` with 64-bit wraparound.
#[must_use]
pub const fn effective_address(base: i64, offset: i64) -> u64 {
    (base as u64).wrapping_add(offset as u64)
}

/// Faults unless the stack pointer is a multiple of 16.
pub const fn check_sp_alignment(sp: i64) -> Result<(), Fault> {
    if (sp as u64) % STACK_ALIGNMENT != 0 {
        return Err(Fault::SpAlignment { sp: sp as u64 });
    }
    Ok(())
}

/// Whether a store of `size` bytes at `address` touches the tagged doubleword.
#[must_use]
pub const fn overlaps_exclusive(tag: u64, address: u64, size: usize) -> bool {
    let end = address.wrapping_add(size as u64);
    let tag_end = tag.wrapping_add(EXCLUSIVE_GRANULE);
    address < tag_end && tag < end
}

/// Resolves a `BR` target to an instruction index.
///
/// Alignment is checked before the text-segment bounds.
pub const fn branch_register_target(value: i64, layout: &MemoryLayout) -> Result<usize, Fault> {
    let address = value as u64;
    if address % INSTRUCTION_SIZE != 0 {
        return Err(Fault::PcAlignment { address });
    }
    if !layout.text_contains(address) {
        return Err(Fault::Segment {
            address,
            segment: SegmentName::Text,
        });
    }
    Ok(layout.instruction_index(address))
}

#[cfg(test)]
mod tests {
    use super::{branch_register_target, check_sp_alignment, effective_address, overlaps_exclusive};
    use crate::{Fault, MemoryLayout, SegmentName};

    #[test]
    fn effective_address_wraps() {
        assert_eq!(effective_address(0x1000_0010, -16), 0x1000_0000);
        assert_eq!(effective_address(-1, 1), 0);
    }

    #[test]
    fn sp_alignment_requires_multiple_of_sixteen() {
        assert_eq!(check_sp_alignment(0x7F_FFFF_FFF0), Ok(()));
        assert_eq!(check_sp_alignment(0x7F_FFFF_FFE8), Err(Fault::SpAlignment { sp: 0x7F_FFFF_FFE8 }));
        assert!(check_sp_alignment(-8).is_err());
    }

    #[test]
    fn overlap_covers_partial_and_enclosed_ranges() {
        let tag = 0x1000_0008;
        assert!(overlaps_exclusive(tag, tag, 8));
        assert!(overlaps_exclusive(tag, tag - 4, 8));
        assert!(overlaps_exclusive(tag, tag + 7, 1));
        assert!(overlaps_exclusive(tag, tag + 2, 2));
        assert!(!overlaps_exclusive(tag, tag + 8, 8));
        assert!(!overlaps_exclusive(tag, tag - 8, 8));
    }

    #[test]
    fn branch_register_checks_alignment_then_segment() {
        let layout = MemoryLayout::default();
        assert_eq!(branch_register_target(0x0040_0008, &layout), Ok(2));
        assert_eq!(
            branch_register_target(0x0040_0006, &layout),
            Err(Fault::PcAlignment { address: 0x0040_0006 })
        );
        assert_eq!(
            branch_register_target(0x1000_0000, &layout),
            Err(Fault::Segment {
                address: 0x1000_0000,
                segment: SegmentName::Text,
            })
        );
        assert!(matches!(
            branch_register_target(-4, &layout),
            Err(Fault::Segment { .. })
        ));
    }
}
