use std::fmt;

use thiserror::Error;

/// Memory segment named in a segment fault message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum SegmentName {
    /// Program text (instruction words).
    Text,
    /// Static and dynamic data.
    Data,
    /// Stack region at and above the stack base.
    Stack,
}

impl fmt::Display for SegmentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Text => "text",
            Self::Data => "data",
            Self::Stack => "stack",
        })
    }
}

/// Fault classes used when reporting and aggregating faults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum FaultClass {
    /// Address outside the valid range of its segment.
    Segment,
    /// PC or SP misalignment.
    Alignment,
}

/// Execution-time fault raised by a single instruction.
///
/// Faults abort the current step or run call. The engine never panics on
/// them; they are returned to the caller wrapped in an [`ExecutionError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Fault {
    /// Address lies outside the valid range for its segment.
    #[error("segmentation fault: address 0x{address:X} is outside the {segment} segment")]
    Segment {
        /// Offending address.
        address: u64,
        /// Segment the access was checked against.
        segment: SegmentName,
    },
    /// Branch-register target is not a multiple of the instruction size.
    #[error("PC alignment fault: branch target 0x{address:X} is not a multiple of 4")]
    PcAlignment {
        /// Misaligned branch target.
        address: u64,
    },
    /// Stack pointer is not a multiple of 16 at a stack-relative access.
    #[error("SP alignment fault: stack pointer 0x{sp:X} is not a multiple of 16")]
    SpAlignment {
        /// Stack pointer value at the time of the access.
        sp: u64,
    },
}

impl Fault {
    /// Returns the reporting class for this fault.
    #[must_use]
    pub const fn class(self) -> FaultClass {
        match self {
            Self::Segment { .. } => FaultClass::Segment,
            Self::PcAlignment { .. } | Self::SpAlignment { .. } => FaultClass::Alignment,
        }
    }

    /// Returns the address carried by the fault.
    #[must_use]
    pub const fn address(self) -> u64 {
        match self {
            Self::Segment { address, .. } | Self::PcAlignment { address } => address,
            Self::SpAlignment { sp } => sp,
        }
    }
}

/// A fault located at the instruction that raised it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[error("line {line}: {fault}")]
pub struct ExecutionError {
    /// The raised fault.
    #[source]
    pub fault: Fault,
    /// Source line of the faulting instruction.
    pub line: usize,
    /// Position of the faulting instruction in the program list.
    pub index: usize,
}

#[cfg(test)]
mod tests {
    use super::{ExecutionError, Fault, FaultClass, SegmentName};

    #[test]
    fn class_mapping_matches_fault_taxonomy() {
        let segment = Fault::Segment {
            address: 0x10,
            segment: SegmentName::Data,
        };
        assert_eq!(segment.class(), FaultClass::Segment);
        assert_eq!(Fault::PcAlignment { address: 2 }.class(), FaultClass::Alignment);
        assert_eq!(Fault::SpAlignment { sp: 8 }.class(), FaultClass::Alignment);
    }

    #[test]
    fn fault_carries_offending_address() {
        assert_eq!(Fault::PcAlignment { address: 0x40_0002 }.address(), 0x40_0002);
        assert_eq!(Fault::SpAlignment { sp: 0x7C }.address(), 0x7C);
    }

    #[test]
    fn messages_name_address_and_segment() {
        let fault = Fault::Segment {
            address: 0x1234,
            segment: SegmentName::Text,
        };
        assert_eq!(
            fault.to_string(),
            "segmentation fault: address 0x1234 is outside the text segment"
        );

        let located = ExecutionError {
            fault: Fault::SpAlignment { sp: 0x7FF8 },
            line: 12,
            index: 3,
        };
        assert_eq!(
            located.to_string(),
            "line 12: SP alignment fault: stack pointer 0x7FF8 is not a multiple of 16"
        );
    }
}
