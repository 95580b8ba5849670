//! NZCV computation for flag-setting instructions.

use crate::state::Flags;

/// Describes how flags change after an instruction executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlagsUpdate {
    /// Flags unchanged.
    #[default]
    None,
    /// Flags replaced wholesale.
    Set(Flags),
}

const fn msb(value: i64) -> i64 {
    ((value as u64) >> 63) as i64
}

/// Flags for `ADDS`/`ADDIS`, also used by `SUBS`/`SUBIS`.
///
/// Carry is bit 1 of `msb(!result) + msb(op1) + msb(op2)`. Overflow is the
/// sign bit of `(op1 ^ !op2) & (op1 ^ result)`. The subtract forms pass the
/// minuend and subtrahend unchanged with `result = op1 - op2`.
#[must_use]
pub const fn add_flags(result: i64, op1: i64, op2: i64) -> Flags {
    Flags {
        negative: result < 0,
        zero: result == 0,
        carry: ((msb(!result) + msb(op1) + msb(op2)) & 2) != 0,
        overflow: ((op1 ^ !op2) & (op1 ^ result)) < 0,
    }
}

/// Flags for `ANDS`/`ANDIS`: `N` and `Z` from the result, `C` and `V` cleared.
#[must_use]
pub const fn logical_flags(result: i64) -> Flags {
    Flags {
        negative: result < 0,
        zero: result == 0,
        carry: false,
        overflow: false,
    }
}
