//! Typed instruction model built from a mnemonic and its integer arguments.
//!
//! The front end hands the engine an already-assembled list: each entry is a
//! mnemonic, a flat list of integers, and the source line it came from.
//! [`Instruction::decode`] validates that list once so the execute stage can
//! match on fully typed operands.

use std::fmt;

use thiserror::Error;

use crate::{
    memory::AccessWidth,
    mnemonic::{Condition, InstructionForm, Mnemonic},
    state::Register,
};

/// Valid `LSL` amounts for `MOVZ`/`MOVK`.
pub const MOVE_WIDE_SHIFTS: [u32; 4] = [0, 16, 32, 48];

/// Largest shift amount accepted by `LSL`/`LSR`.
pub const MAX_SHIFT_AMOUNT: i64 = 63;

/// Reasons an argument list cannot form an instruction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Error)]
pub enum DecodeError {
    /// Wrong number of arguments for the mnemonic.
    #[error("{mnemonic} expects {expected} arguments, got {actual}")]
    ArityMismatch {
        /// Mnemonic being decoded.
        mnemonic: Mnemonic,
        /// Arguments the form requires.
        expected: usize,
        /// Arguments supplied.
        actual: usize,
    },
    /// Register operand outside `0..=31`.
    #[error("register operand {value} is outside 0..=31")]
    RegisterOutOfRange {
        /// Supplied value.
        value: i64,
    },
    /// `LSL`/`LSR` amount outside `0..=63`.
    #[error("shift amount {value} is outside 0..=63")]
    ShiftAmountOutOfRange {
        /// Supplied value.
        value: i64,
    },
    /// `MOVZ`/`MOVK` shift not one of 0, 16, 32 or 48.
    #[error("move-wide shift {value} must be 0, 16, 32 or 48")]
    MoveShiftInvalid {
        /// Supplied value.
        value: i64,
    },
    /// `MOVZ`/`MOVK` immediate does not fit in 16 bits.
    #[error("move-wide immediate {value} does not fit in 16 bits")]
    MoveImmediateOutOfRange {
        /// Supplied value.
        value: i64,
    },
    /// Branch target is not a valid instruction index.
    #[error("branch target {value} is not a valid instruction index")]
    InvalidBranchTarget {
        /// Supplied value.
        value: i64,
    },
    /// Text that names no supported mnemonic.
    #[error("unknown mnemonic `{text}`")]
    UnknownMnemonic {
        /// Text as supplied.
        text: String,
    },
}

/// Arithmetic and logical operations shared by register and immediate forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[allow(missing_docs)]
pub enum AluOp {
    Add,
    Adds,
    Sub,
    Subs,
    And,
    Ands,
    Orr,
    Eor,
}

impl AluOp {
    /// Whether the operation updates `NZCV`.
    #[must_use]
    pub const fn sets_flags(self) -> bool {
        matches!(self, Self::Adds | Self::Subs | Self::Ands)
    }

    const fn register_mnemonic(self) -> Mnemonic {
        match self {
            Self::Add => Mnemonic::Add,
            Self::Adds => Mnemonic::Adds,
            Self::Sub => Mnemonic::Sub,
            Self::Subs => Mnemonic::Subs,
            Self::And => Mnemonic::And,
            Self::Ands => Mnemonic::Ands,
            Self::Orr => Mnemonic::Orr,
            Self::Eor => Mnemonic::Eor,
        }
    }

    const fn immediate_mnemonic(self) -> Mnemonic {
        match self {
            Self::Add => Mnemonic::Addi,
            Self::Adds => Mnemonic::Addis,
            Self::Sub => Mnemonic::Subi,
            Self::Subs => Mnemonic::Subis,
            Self::And => Mnemonic::Andi,
            Self::Ands => Mnemonic::Andis,
            Self::Orr => Mnemonic::Orri,
            Self::Eor => Mnemonic::Eori,
        }
    }

    const fn from_mnemonic(mnemonic: Mnemonic) -> Option<Self> {
        match mnemonic {
            Mnemonic::Add | Mnemonic::Addi => Some(Self::Add),
            Mnemonic::Adds | Mnemonic::Addis => Some(Self::Adds),
            Mnemonic::Sub | Mnemonic::Subi => Some(Self::Sub),
            Mnemonic::Subs | Mnemonic::Subis => Some(Self::Subs),
            Mnemonic::And | Mnemonic::Andi => Some(Self::And),
            Mnemonic::Ands | Mnemonic::Andis => Some(Self::Ands),
            Mnemonic::Orr | Mnemonic::Orri => Some(Self::Orr),
            Mnemonic::Eor | Mnemonic::Eori => Some(Self::Eor),
            _ => None,
        }
    }
}

/// Logical shift direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[allow(missing_docs)]
pub enum ShiftOp {
    Lsl,
    Lsr,
}

/// Width and extension of a load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum LoadKind {
    /// `LDUR`: eight bytes.
    Doubleword,
    /// `LDURSW`: four bytes, sign-extended.
    SignedWord,
    /// `LDURH`: two bytes, zero-extended.
    Halfword,
    /// `LDURB`: one byte, zero-extended.
    Byte,
}

impl LoadKind {
    /// Bytes read from memory.
    #[must_use]
    pub const fn width(self) -> AccessWidth {
        match self {
            Self::Doubleword => AccessWidth::Doubleword,
            Self::SignedWord => AccessWidth::Word,
            Self::Halfword => AccessWidth::Halfword,
            Self::Byte => AccessWidth::Byte,
        }
    }

    /// Widens the raw zero-extended memory value to a register value.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    pub const fn extend(self, raw: u64) -> i64 {
        match self {
            Self::SignedWord => raw as u32 as i32 as i64,
            Self::Doubleword | Self::Halfword | Self::Byte => raw as i64,
        }
    }
}

/// `MOVZ` clears the register, `MOVK` keeps the other fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[allow(missing_docs)]
pub enum MoveWideKind {
    Zero,
    Keep,
}

/// Fully typed operation, one variant per instruction form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[allow(missing_docs)]
pub enum Operation {
    Alu {
        op: AluOp,
        rd: Register,
        rn: Register,
        rm: Register,
    },
    AluImmediate {
        op: AluOp,
        rd: Register,
        rn: Register,
        imm: i64,
    },
    Shift {
        op: ShiftOp,
        rd: Register,
        rn: Register,
        amount: u32,
    },
    Load {
        kind: LoadKind,
        rt: Register,
        rn: Register,
        offset: i64,
    },
    Store {
        width: AccessWidth,
        rt: Register,
        rn: Register,
        offset: i64,
    },
    LoadExclusive {
        rt: Register,
        rn: Register,
        offset: i64,
    },
    StoreExclusive {
        rt: Register,
        rs: Register,
        rn: Register,
        offset: i64,
    },
    MoveWide {
        kind: MoveWideKind,
        rd: Register,
        imm: u16,
        shift: u32,
    },
    CompareBranch {
        nonzero: bool,
        rt: Register,
        target: usize,
    },
    CondBranch {
        cond: Condition,
        target: usize,
    },
    Branch {
        target: usize,
    },
    BranchLink {
        target: usize,
    },
    BranchRegister {
        rn: Register,
    },
}

impl Operation {
    /// Mnemonic this operation was decoded from.
    #[must_use]
    pub const fn mnemonic(&self) -> Mnemonic {
        match *self {
            Self::Alu { op, .. } => op.register_mnemonic(),
            Self::AluImmediate { op, .. } => op.immediate_mnemonic(),
            Self::Shift { op: ShiftOp::Lsl, .. } => Mnemonic::Lsl,
            Self::Shift { op: ShiftOp::Lsr, .. } => Mnemonic::Lsr,
            Self::Load { kind, .. } => match kind {
                LoadKind::Doubleword => Mnemonic::Ldur,
                LoadKind::SignedWord => Mnemonic::Ldursw,
                LoadKind::Halfword => Mnemonic::Ldurh,
                LoadKind::Byte => Mnemonic::Ldurb,
            },
            Self::Store { width, .. } => match width {
                AccessWidth::Doubleword => Mnemonic::Stur,
                AccessWidth::Word => Mnemonic::Sturw,
                AccessWidth::Halfword => Mnemonic::Sturh,
                AccessWidth::Byte => Mnemonic::Sturb,
            },
            Self::LoadExclusive { .. } => Mnemonic::Ldxr,
            Self::StoreExclusive { .. } => Mnemonic::Stxr,
            Self::MoveWide {
                kind: MoveWideKind::Zero,
                ..
            } => Mnemonic::Movz,
            Self::MoveWide {
                kind: MoveWideKind::Keep,
                ..
            } => Mnemonic::Movk,
            Self::CompareBranch { nonzero: false, .. } => Mnemonic::Cbz,
            Self::CompareBranch { nonzero: true, .. } => Mnemonic::Cbnz,
            Self::CondBranch { cond, .. } => cond.branch_mnemonic(),
            Self::Branch { .. } => Mnemonic::B,
            Self::BranchLink { .. } => Mnemonic::Bl,
            Self::BranchRegister { .. } => Mnemonic::Br,
        }
    }

    /// Register the operation writes, if any.
    #[must_use]
    pub const fn destination(&self) -> Option<Register> {
        match *self {
            Self::Alu { rd, .. }
            | Self::AluImmediate { rd, .. }
            | Self::Shift { rd, .. }
            | Self::MoveWide { rd, .. } => Some(rd),
            Self::Load { rt, .. } | Self::LoadExclusive { rt, .. } => Some(rt),
            Self::StoreExclusive { rs, .. } => Some(rs),
            Self::BranchLink { .. } => Some(Register::LR),
            Self::Store { .. }
            | Self::CompareBranch { .. }
            | Self::CondBranch { .. }
            | Self::Branch { .. }
            | Self::BranchRegister { .. } => None,
        }
    }

    /// Integer argument list in assembler order.
    #[must_use]
    pub fn args(&self) -> Vec<i64> {
        let reg = |r: Register| i64::from(u8::from(r));
        let index = |t: usize| i64::try_from(t).unwrap_or(i64::MAX);
        match *self {
            Self::Alu { rd, rn, rm, .. } => vec![reg(rd), reg(rn), reg(rm)],
            Self::AluImmediate { rd, rn, imm, .. } => vec![reg(rd), reg(rn), imm],
            Self::Shift { rd, rn, amount, .. } => vec![reg(rd), reg(rn), i64::from(amount)],
            Self::Load { rt, rn, offset, .. }
            | Self::Store { rt, rn, offset, .. }
            | Self::LoadExclusive { rt, rn, offset } => vec![reg(rt), reg(rn), offset],
            Self::StoreExclusive { rt, rs, rn, offset } => {
                vec![reg(rt), reg(rs), reg(rn), offset]
            }
            Self::MoveWide { rd, imm, shift, .. } => {
                vec![reg(rd), i64::from(imm), i64::from(shift)]
            }
            Self::CompareBranch { rt, target, .. } => vec![reg(rt), index(target)],
            Self::CondBranch { target, .. }
            | Self::Branch { target }
            | Self::BranchLink { target } => vec![index(target)],
            Self::BranchRegister { rn } => vec![reg(rn)],
        }
    }
}

/// One program entry: a typed operation plus the source line it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Instruction {
    /// Decoded operation.
    pub op: Operation,
    /// Source line reported with faults.
    pub line: usize,
}

impl Instruction {
    /// Wraps an already typed operation.
    #[must_use]
    pub const fn new(op: Operation, line: usize) -> Self {
        Self { op, line }
    }

    /// Builds an instruction from its mnemonic and integer arguments.
    ///
    /// # Errors
    ///
    /// Returns a [`DecodeError`] when the argument count or any operand is invalid.
    pub fn decode(mnemonic: Mnemonic, args: &[i64], line: usize) -> Result<Self, DecodeError> {
        let expected = mnemonic.arity();
        if args.len() != expected {
            return Err(DecodeError::ArityMismatch {
                mnemonic,
                expected,
                actual: args.len(),
            });
        }

        let op = match mnemonic.form() {
            InstructionForm::RegisterAlu => Operation::Alu {
                op: alu_op(mnemonic)?,
                rd: register(args[0])?,
                rn: register(args[1])?,
                rm: register(args[2])?,
            },
            InstructionForm::ImmediateAlu => Operation::AluImmediate {
                op: alu_op(mnemonic)?,
                rd: register(args[0])?,
                rn: register(args[1])?,
                imm: args[2],
            },
            InstructionForm::Shift => Operation::Shift {
                op: if mnemonic == Mnemonic::Lsl {
                    ShiftOp::Lsl
                } else {
                    ShiftOp::Lsr
                },
                rd: register(args[0])?,
                rn: register(args[1])?,
                amount: shift_amount(args[2])?,
            },
            InstructionForm::Load => Operation::Load {
                kind: match mnemonic {
                    Mnemonic::Ldursw => LoadKind::SignedWord,
                    Mnemonic::Ldurh => LoadKind::Halfword,
                    Mnemonic::Ldurb => LoadKind::Byte,
                    _ => LoadKind::Doubleword,
                },
                rt: register(args[0])?,
                rn: register(args[1])?,
                offset: args[2],
            },
            InstructionForm::Store => Operation::Store {
                width: match mnemonic {
                    Mnemonic::Sturw => AccessWidth::Word,
                    Mnemonic::Sturh => AccessWidth::Halfword,
                    Mnemonic::Sturb => AccessWidth::Byte,
                    _ => AccessWidth::Doubleword,
                },
                rt: register(args[0])?,
                rn: register(args[1])?,
                offset: args[2],
            },
            InstructionForm::LoadExclusive => Operation::LoadExclusive {
                rt: register(args[0])?,
                rn: register(args[1])?,
                offset: args[2],
            },
            InstructionForm::StoreExclusive => Operation::StoreExclusive {
                rt: register(args[0])?,
                rs: register(args[1])?,
                rn: register(args[2])?,
                offset: args[3],
            },
            InstructionForm::MoveWide => Operation::MoveWide {
                kind: if mnemonic == Mnemonic::Movz {
                    MoveWideKind::Zero
                } else {
                    MoveWideKind::Keep
                },
                rd: register(args[0])?,
                imm: u16::try_from(args[1])
                    .map_err(|_| DecodeError::MoveImmediateOutOfRange { value: args[1] })?,
                shift: move_shift(args[2])?,
            },
            InstructionForm::CompareBranch => Operation::CompareBranch {
                nonzero: mnemonic == Mnemonic::Cbnz,
                rt: register(args[0])?,
                target: branch_target(args[1])?,
            },
            InstructionForm::CondBranch => Operation::CondBranch {
                cond: mnemonic.condition().unwrap_or(Condition::Eq),
                target: branch_target(args[0])?,
            },
            InstructionForm::Branch => Operation::Branch {
                target: branch_target(args[0])?,
            },
            InstructionForm::BranchLink => Operation::BranchLink {
                target: branch_target(args[0])?,
            },
            InstructionForm::BranchRegister => Operation::BranchRegister {
                rn: register(args[0])?,
            },
        };

        Ok(Self { op, line })
    }

    /// Mnemonic of the operation.
    #[must_use]
    pub const fn mnemonic(&self) -> Mnemonic {
        self.op.mnemonic()
    }

    /// Integer argument list in assembler order.
    #[must_use]
    pub fn args(&self) -> Vec<i64> {
        self.op.args()
    }

    /// Source line.
    #[must_use]
    pub const fn line(&self) -> usize {
        self.line
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.mnemonic();
        match self.op {
            Operation::Alu { rd, rn, rm, .. } => write!(f, "{name} {rd}, {rn}, {rm}"),
            Operation::AluImmediate { rd, rn, imm, .. } => write!(f, "{name} {rd}, {rn}, #{imm}"),
            Operation::Shift { rd, rn, amount, .. } => write!(f, "{name} {rd}, {rn}, #{amount}"),
            Operation::Load { rt, rn, offset, .. }
            | Operation::Store { rt, rn, offset, .. }
            | Operation::LoadExclusive { rt, rn, offset } => {
                write!(f, "{name} {rt}, [{rn}, #{offset}]")
            }
            Operation::StoreExclusive { rt, rs, rn, offset } => {
                write!(f, "{name} {rt}, {rs}, [{rn}, #{offset}]")
            }
            Operation::MoveWide { rd, imm, shift, .. } => {
                write!(f, "{name} {rd}, #{imm}, LSL #{shift}")
            }
            Operation::CompareBranch { rt, target, .. } => write!(f, "{name} {rt}, @{target}"),
            Operation::CondBranch { target, .. }
            | Operation::Branch { target }
            | Operation::BranchLink { target } => write!(f, "{name} @{target}"),
            Operation::BranchRegister { rn } => write!(f, "{name} {rn}"),
        }
    }
}

fn register(value: i64) -> Result<Register, DecodeError> {
    u8::try_from(value)
        .ok()
        .and_then(Register::new)
        .ok_or(DecodeError::RegisterOutOfRange { value })
}

fn alu_op(mnemonic: Mnemonic) -> Result<AluOp, DecodeError> {
    AluOp::from_mnemonic(mnemonic).ok_or(DecodeError::UnknownMnemonic {
        text: mnemonic.name().to_string(),
    })
}

fn shift_amount(value: i64) -> Result<u32, DecodeError> {
    if (0..=MAX_SHIFT_AMOUNT).contains(&value) {
        u32::try_from(value).map_err(|_| DecodeError::ShiftAmountOutOfRange { value })
    } else {
        Err(DecodeError::ShiftAmountOutOfRange { value })
    }
}

fn move_shift(value: i64) -> Result<u32, DecodeError> {
    u32::try_from(value)
        .ok()
        .filter(|shift| MOVE_WIDE_SHIFTS.contains(shift))
        .ok_or(DecodeError::MoveShiftInvalid { value })
}

fn branch_target(value: i64) -> Result<usize, DecodeError> {
    usize::try_from(value).map_err(|_| DecodeError::InvalidBranchTarget { value })
}

#[cfg(test)]
mod tests {
    use super::{AluOp, DecodeError, Instruction, LoadKind, MoveWideKind, Operation};
    use crate::{memory::AccessWidth, mnemonic::Condition, Mnemonic, Register};

    fn reg(index: u8) -> Register {
        Register::new(index).expect("valid register")
    }

    #[test]
    fn register_alu_decodes_operands_in_order() {
        let instruction = Instruction::decode(Mnemonic::Subs, &[1, 2, 31], 7).expect("decodes");
        assert_eq!(
            instruction.op,
            Operation::Alu {
                op: AluOp::Subs,
                rd: reg(1),
                rn: reg(2),
                rm: Register::XZR,
            }
        );
        assert_eq!(instruction.line(), 7);
        assert_eq!(instruction.mnemonic(), Mnemonic::Subs);
    }

    #[test]
    fn memory_forms_select_width_and_extension() {
        let load = Instruction::decode(Mnemonic::Ldursw, &[3, 28, -8], 1).expect("decodes");
        assert_eq!(
            load.op,
            Operation::Load {
                kind: LoadKind::SignedWord,
                rt: reg(3),
                rn: Register::SP,
                offset: -8,
            }
        );

        let store = Instruction::decode(Mnemonic::Sturh, &[4, 5, 2], 2).expect("decodes");
        assert_eq!(
            store.op,
            Operation::Store {
                width: AccessWidth::Halfword,
                rt: reg(4),
                rn: reg(5),
                offset: 2,
            }
        );

        let stxr = Instruction::decode(Mnemonic::Stxr, &[1, 2, 3, 0], 3).expect("decodes");
        assert_eq!(
            stxr.op,
            Operation::StoreExclusive {
                rt: reg(1),
                rs: reg(2),
                rn: reg(3),
                offset: 0,
            }
        );
        assert_eq!(stxr.op.destination(), Some(reg(2)));
    }

    #[test]
    fn load_extension_matches_kind() {
        assert_eq!(LoadKind::SignedWord.extend(0xFFFF_FFFE), -2);
        assert_eq!(LoadKind::SignedWord.extend(0x7FFF_FFFF), 0x7FFF_FFFF);
        assert_eq!(LoadKind::Halfword.extend(0xFFFF), 0xFFFF);
        assert_eq!(LoadKind::Byte.extend(0x80), 0x80);
        assert_eq!(LoadKind::Doubleword.extend(u64::MAX), -1);
    }

    #[test]
    fn move_wide_validates_shift_and_immediate() {
        let movk = Instruction::decode(Mnemonic::Movk, &[9, 0xBEEF, 48], 1).expect("decodes");
        assert_eq!(
            movk.op,
            Operation::MoveWide {
                kind: MoveWideKind::Keep,
                rd: reg(9),
                imm: 0xBEEF,
                shift: 48,
            }
        );
        assert_eq!(
            Instruction::decode(Mnemonic::Movz, &[9, 1, 8], 1),
            Err(DecodeError::MoveShiftInvalid { value: 8 })
        );
        assert_eq!(
            Instruction::decode(Mnemonic::Movz, &[9, 0x1_0000, 0], 1),
            Err(DecodeError::MoveImmediateOutOfRange { value: 0x1_0000 })
        );
    }

    #[test]
    fn operand_errors_are_reported() {
        assert_eq!(
            Instruction::decode(Mnemonic::Add, &[1, 2], 1),
            Err(DecodeError::ArityMismatch {
                mnemonic: Mnemonic::Add,
                expected: 3,
                actual: 2,
            })
        );
        assert_eq!(
            Instruction::decode(Mnemonic::Add, &[32, 0, 0], 1),
            Err(DecodeError::RegisterOutOfRange { value: 32 })
        );
        assert_eq!(
            Instruction::decode(Mnemonic::Lsl, &[1, 1, 64], 1),
            Err(DecodeError::ShiftAmountOutOfRange { value: 64 })
        );
        assert_eq!(
            Instruction::decode(Mnemonic::B, &[-1], 1),
            Err(DecodeError::InvalidBranchTarget { value: -1 })
        );
    }

    #[test]
    fn branches_carry_targets_and_conditions() {
        let blt = Instruction::decode(Mnemonic::BLt, &[12], 4).expect("decodes");
        assert_eq!(
            blt.op,
            Operation::CondBranch {
                cond: Condition::Lt,
                target: 12,
            }
        );
        let bl = Instruction::decode(Mnemonic::Bl, &[3], 4).expect("decodes");
        assert_eq!(bl.op.destination(), Some(Register::LR));
        let cbnz = Instruction::decode(Mnemonic::Cbnz, &[5, 0], 4).expect("decodes");
        assert_eq!(cbnz.mnemonic(), Mnemonic::Cbnz);
    }

    #[test]
    fn args_reproduce_the_source_list() {
        let program: &[(Mnemonic, &[i64])] = &[
            (Mnemonic::Addi, &[1, 2, -40]),
            (Mnemonic::Lsr, &[1, 2, 63]),
            (Mnemonic::Ldxr, &[1, 2, 16]),
            (Mnemonic::Stxr, &[1, 2, 3, 8]),
            (Mnemonic::Movz, &[1, 65535, 32]),
            (Mnemonic::Cbz, &[7, 10]),
            (Mnemonic::BVc, &[0]),
            (Mnemonic::Br, &[30]),
        ];
        for (mnemonic, args) in program {
            let instruction = Instruction::decode(*mnemonic, args, 0).expect("decodes");
            assert_eq!(instruction.mnemonic(), *mnemonic);
            assert_eq!(instruction.args(), args.to_vec());
        }
    }

    #[test]
    fn display_renders_assembly_syntax() {
        let render = |mnemonic, args: &[i64]| {
            Instruction::decode(mnemonic, args, 0)
                .expect("decodes")
                .to_string()
        };
        assert_eq!(render(Mnemonic::Add, &[1, 0, 31]), "ADD X1, X0, XZR");
        assert_eq!(render(Mnemonic::Stur, &[2, 28, 8]), "STUR X2, [SP, #8]");
        assert_eq!(render(Mnemonic::Movz, &[3, 5, 16]), "MOVZ X3, #5, LSL #16");
        assert_eq!(render(Mnemonic::BEq, &[4]), "B.EQ @4");
        assert_eq!(render(Mnemonic::Br, &[30]), "BR LR");
    }
}
