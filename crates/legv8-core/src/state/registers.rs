use std::fmt;

use crate::decoder::DecodeError;

/// Number of architecturally visible general-purpose registers (`X0..X31`).
pub const REGISTER_COUNT: usize = 32;

/// Architectural general-purpose register identifier (`X0..=X31`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Deserialize, serde::Serialize),
    serde(try_from = "u8", into = "u8")
)]
pub struct Register(u8);

impl Register {
    /// First intra-procedure-call scratch register.
    pub const IP0: Self = Self(16);
    /// Second intra-procedure-call scratch register.
    pub const IP1: Self = Self(17);
    /// Stack pointer.
    pub const SP: Self = Self(28);
    /// Frame pointer.
    pub const FP: Self = Self(29);
    /// Link register written by `BL`.
    pub const LR: Self = Self(30);
    /// Zero register. Writes are dropped; reads return the stored value.
    pub const XZR: Self = Self(31);

    /// Creates a register from its index, rejecting values above 31.
    #[must_use]
    pub const fn new(index: u8) -> Option<Self> {
        if (index as usize) < REGISTER_COUNT {
            Some(Self(index))
        } else {
            None
        }
    }

    /// Returns the array index for this register (`0..=31`).
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Returns `true` for register 31.
    #[must_use]
    pub const fn is_zero_register(self) -> bool {
        self.0 == Self::XZR.0
    }
}

impl TryFrom<u8> for Register {
    type Error = DecodeError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value).ok_or(DecodeError::RegisterOutOfRange {
            value: i64::from(value),
        })
    }
}

impl From<Register> for u8 {
    fn from(reg: Register) -> Self {
        reg.0
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::SP => f.write_str("SP"),
            Self::FP => f.write_str("FP"),
            Self::LR => f.write_str("LR"),
            Self::XZR => f.write_str("XZR"),
            Self(n) => write!(f, "X{n}"),
        }
    }
}

/// The 32-entry register file.
///
/// Register 31 is a write sink: [`RegisterFile::write`] silently drops values
/// targeted at it, but [`RegisterFile::read`] returns whatever it holds and
/// does not force zero.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct RegisterFile {
    values: [i64; REGISTER_COUNT],
}

impl RegisterFile {
    /// Creates a zeroed register file with `SP` set to `stack_pointer`.
    #[must_use]
    pub const fn with_stack_pointer(stack_pointer: i64) -> Self {
        let mut values = [0; REGISTER_COUNT];
        values[Register::SP.index()] = stack_pointer;
        Self { values }
    }

    /// Reads a register.
    #[must_use]
    pub const fn read(&self, reg: Register) -> i64 {
        self.values[reg.index()]
    }

    /// Writes a register. Returns `false` when the write was dropped because
    /// it targeted register 31.
    pub const fn write(&mut self, reg: Register, value: i64) -> bool {
        if reg.is_zero_register() {
            return false;
        }
        self.values[reg.index()] = value;
        true
    }

    /// Reads a register by raw index, returning `None` above 31.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<i64> {
        self.values.get(index).copied()
    }

    /// Returns all register values in index order.
    #[must_use]
    pub const fn values(&self) -> &[i64; REGISTER_COUNT] {
        &self.values
    }
}

/// Condition flags `N`, `Z`, `C`, `V`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[allow(clippy::struct_excessive_bools)]
pub struct Flags {
    /// Negative result.
    pub negative: bool,
    /// Zero result.
    pub zero: bool,
    /// Carry out of bit 63.
    pub carry: bool,
    /// Signed overflow.
    pub overflow: bool,
}

impl fmt::Display for Flags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "N={} Z={} C={} V={}",
            u8::from(self.negative),
            u8::from(self.zero),
            u8::from(self.carry),
            u8::from(self.overflow)
        )
    }
}
