use std::{fmt, str::FromStr};

use crate::{decoder::DecodeError, state::Flags};

/// Operand layout shared by a group of mnemonics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum InstructionForm {
    /// `Rd, Rn, Rm`.
    RegisterAlu,
    /// `Rd, Rn, #imm`.
    ImmediateAlu,
    /// `Rd, Rn, #shamt`.
    Shift,
    /// `Rt, [Rn, #offset]` load.
    Load,
    /// `Rt, [Rn, #offset]` store.
    Store,
    /// `Rt, [Rn, #offset]` exclusive load.
    LoadExclusive,
    /// `Rt, Rs, [Rn, #offset]` exclusive store.
    StoreExclusive,
    /// `Rd, #imm16, LSL #shift`.
    MoveWide,
    /// `Rt, target`.
    CompareBranch,
    /// `target` guarded by a condition code.
    CondBranch,
    /// `target`.
    Branch,
    /// `target`, writing the link register.
    BranchLink,
    /// `Rn`.
    BranchRegister,
}

impl InstructionForm {
    /// Number of integer arguments this form takes.
    #[must_use]
    pub const fn arity(self) -> usize {
        match self {
            Self::StoreExclusive => 4,
            Self::RegisterAlu
            | Self::ImmediateAlu
            | Self::Shift
            | Self::Load
            | Self::Store
            | Self::LoadExclusive
            | Self::MoveWide => 3,
            Self::CompareBranch => 2,
            Self::CondBranch | Self::Branch | Self::BranchLink | Self::BranchRegister => 1,
        }
    }
}

/// Condition codes tested by `B.cond`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[allow(missing_docs)]
pub enum Condition {
    Eq,
    Ne,
    Hs,
    Lo,
    Hi,
    Ls,
    Ge,
    Lt,
    Gt,
    Le,
    Mi,
    Pl,
    Vs,
    Vc,
}

impl Condition {
    /// The `B.cond` mnemonic that tests this condition.
    #[must_use]
    pub const fn branch_mnemonic(self) -> Mnemonic {
        match self {
            Self::Eq => Mnemonic::BEq,
            Self::Ne => Mnemonic::BNe,
            Self::Hs => Mnemonic::BHs,
            Self::Lo => Mnemonic::BLo,
            Self::Hi => Mnemonic::BHi,
            Self::Ls => Mnemonic::BLs,
            Self::Ge => Mnemonic::BGe,
            Self::Lt => Mnemonic::BLt,
            Self::Gt => Mnemonic::BGt,
            Self::Le => Mnemonic::BLe,
            Self::Mi => Mnemonic::BMi,
            Self::Pl => Mnemonic::BPl,
            Self::Vs => Mnemonic::BVs,
            Self::Vc => Mnemonic::BVc,
        }
    }

    /// Evaluates the condition against `flags`.
    #[must_use]
    pub const fn holds(self, flags: Flags) -> bool {
        let Flags {
            negative: n,
            zero: z,
            carry: c,
            overflow: v,
        } = flags;
        match self {
            Self::Eq => z,
            Self::Ne => !z,
            Self::Hs => c,
            Self::Lo => !c,
            Self::Hi => !z && c,
            Self::Ls => !(!z && c),
            Self::Ge => n == v,
            Self::Lt => n != v,
            Self::Gt => !z && n == v,
            Self::Le => !(!z && n == v),
            Self::Mi => n,
            Self::Pl => !n,
            Self::Vs => v,
            Self::Vc => !v,
        }
    }
}

/// Every instruction the engine executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[repr(u8)]
#[allow(missing_docs)]
pub enum Mnemonic {
    Add,
    Adds,
    Addi,
    Addis,
    Sub,
    Subs,
    Subi,
    Subis,
    And,
    Ands,
    Andi,
    Andis,
    Orr,
    Orri,
    Eor,
    Eori,
    Lsl,
    Lsr,
    Ldur,
    Stur,
    Ldursw,
    Sturw,
    Ldurh,
    Sturh,
    Ldurb,
    Sturb,
    Ldxr,
    Stxr,
    Movz,
    Movk,
    Cbz,
    Cbnz,
    BEq,
    BNe,
    BHs,
    BLo,
    BHi,
    BLs,
    BGe,
    BLt,
    BGt,
    BLe,
    BMi,
    BPl,
    BVs,
    BVc,
    B,
    Bl,
    Br,
}

/// Assembly spelling and operand form of every mnemonic.
///
/// Single source of truth for [`Mnemonic::name`], [`Mnemonic::form`] and parsing.
pub const MNEMONIC_TABLE: &[(Mnemonic, &str, InstructionForm)] = &[
    (Mnemonic::Add, "ADD", InstructionForm::RegisterAlu),
    (Mnemonic::Adds, "ADDS", InstructionForm::RegisterAlu),
    (Mnemonic::Addi, "ADDI", InstructionForm::ImmediateAlu),
    (Mnemonic::Addis, "ADDIS", InstructionForm::ImmediateAlu),
    (Mnemonic::Sub, "SUB", InstructionForm::RegisterAlu),
    (Mnemonic::Subs, "SUBS", InstructionForm::RegisterAlu),
    (Mnemonic::Subi, "SUBI", InstructionForm::ImmediateAlu),
    (Mnemonic::Subis, "SUBIS", InstructionForm::ImmediateAlu),
    (Mnemonic::And, "AND", InstructionForm::RegisterAlu),
    (Mnemonic::Ands, "ANDS", InstructionForm::RegisterAlu),
    (Mnemonic::Andi, "ANDI", InstructionForm::ImmediateAlu),
    (Mnemonic::Andis, "ANDIS", InstructionForm::ImmediateAlu),
    (Mnemonic::Orr, "ORR", InstructionForm::RegisterAlu),
    (Mnemonic::Orri, "ORRI", InstructionForm::ImmediateAlu),
    (Mnemonic::Eor, "EOR", InstructionForm::RegisterAlu),
    (Mnemonic::Eori, "EORI", InstructionForm::ImmediateAlu),
    (Mnemonic::Lsl, "LSL", InstructionForm::Shift),
    (Mnemonic::Lsr, "LSR", InstructionForm::Shift),
    (Mnemonic::Ldur, "LDUR", InstructionForm::Load),
    (Mnemonic::Stur, "STUR", InstructionForm::Store),
    (Mnemonic::Ldursw, "LDURSW", InstructionForm::Load),
    (Mnemonic::Sturw, "STURW", InstructionForm::Store),
    (Mnemonic::Ldurh, "LDURH", InstructionForm::Load),
    (Mnemonic::Sturh, "STURH", InstructionForm::Store),
    (Mnemonic::Ldurb, "LDURB", InstructionForm::Load),
    (Mnemonic::Sturb, "STURB", InstructionForm::Store),
    (Mnemonic::Ldxr, "LDXR", InstructionForm::LoadExclusive),
    (Mnemonic::Stxr, "STXR", InstructionForm::StoreExclusive),
    (Mnemonic::Movz, "MOVZ", InstructionForm::MoveWide),
    (Mnemonic::Movk, "MOVK", InstructionForm::MoveWide),
    (Mnemonic::Cbz, "CBZ", InstructionForm::CompareBranch),
    (Mnemonic::Cbnz, "CBNZ", InstructionForm::CompareBranch),
    (Mnemonic::BEq, "B.EQ", InstructionForm::CondBranch),
    (Mnemonic::BNe, "B.NE", InstructionForm::CondBranch),
    (Mnemonic::BHs, "B.HS", InstructionForm::CondBranch),
    (Mnemonic::BLo, "B.LO", InstructionForm::CondBranch),
    (Mnemonic::BHi, "B.HI", InstructionForm::CondBranch),
    (Mnemonic::BLs, "B.LS", InstructionForm::CondBranch),
    (Mnemonic::BGe, "B.GE", InstructionForm::CondBranch),
    (Mnemonic::BLt, "B.LT", InstructionForm::CondBranch),
    (Mnemonic::BGt, "B.GT", InstructionForm::CondBranch),
    (Mnemonic::BLe, "B.LE", InstructionForm::CondBranch),
    (Mnemonic::BMi, "B.MI", InstructionForm::CondBranch),
    (Mnemonic::BPl, "B.PL", InstructionForm::CondBranch),
    (Mnemonic::BVs, "B.VS", InstructionForm::CondBranch),
    (Mnemonic::BVc, "B.VC", InstructionForm::CondBranch),
    (Mnemonic::B, "B", InstructionForm::Branch),
    (Mnemonic::Bl, "BL", InstructionForm::BranchLink),
    (Mnemonic::Br, "BR", InstructionForm::BranchRegister),
];

impl Mnemonic {
    /// Assembly spelling, e.g. `"LDURSW"` or `"B.EQ"`.
    #[must_use]
    pub const fn name(self) -> &'static str {
        Self::entry(self).1
    }

    /// Operand form.
    #[must_use]
    pub const fn form(self) -> InstructionForm {
        Self::entry(self).2
    }

    /// Number of integer arguments.
    #[must_use]
    pub const fn arity(self) -> usize {
        self.form().arity()
    }

    /// Condition tested by a `B.cond` mnemonic, `None` for everything else.
    #[must_use]
    pub const fn condition(self) -> Option<Condition> {
        match self {
            Self::BEq => Some(Condition::Eq),
            Self::BNe => Some(Condition::Ne),
            Self::BHs => Some(Condition::Hs),
            Self::BLo => Some(Condition::Lo),
            Self::BHi => Some(Condition::Hi),
            Self::BLs => Some(Condition::Ls),
            Self::BGe => Some(Condition::Ge),
            Self::BLt => Some(Condition::Lt),
            Self::BGt => Some(Condition::Gt),
            Self::BLe => Some(Condition::Le),
            Self::BMi => Some(Condition::Mi),
            Self::BPl => Some(Condition::Pl),
            Self::BVs => Some(Condition::Vs),
            Self::BVc => Some(Condition::Vc),
            _ => None,
        }
    }

    /// Iterates over every mnemonic in table order.
    pub fn all() -> impl Iterator<Item = Self> {
        MNEMONIC_TABLE.iter().map(|(mnemonic, _, _)| *mnemonic)
    }

    // Table rows follow declaration order.
    const fn entry(self) -> &'static (Self, &'static str, InstructionForm) {
        &MNEMONIC_TABLE[self as usize]
    }
}

impl fmt::Display for Mnemonic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Mnemonic {
    type Err = DecodeError;

    /// Parses assembly spelling, ignoring case. Conditional branches are
    /// accepted with or without the dot (`B.EQ`, `BEQ`).
    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let trimmed = text.trim();
        let upper = trimmed.to_ascii_uppercase();
        let dotless = upper.replace('.', "");
        MNEMONIC_TABLE
            .iter()
            .find(|(_, name, _)| *name == upper || name.replace('.', "") == dotless)
            .map(|(mnemonic, _, _)| *mnemonic)
            .ok_or_else(|| DecodeError::UnknownMnemonic {
                text: trimmed.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rstest::rstest;

    use super::{Condition, InstructionForm, Mnemonic, MNEMONIC_TABLE};
    use crate::{decoder::DecodeError, state::Flags};

    const fn flags(n: bool, z: bool, c: bool, v: bool) -> Flags {
        Flags {
            negative: n,
            zero: z,
            carry: c,
            overflow: v,
        }
    }

    #[test]
    fn table_lists_each_mnemonic_once() {
        assert_eq!(MNEMONIC_TABLE.len(), 49);
        let mnemonics: HashSet<_> = Mnemonic::all().collect();
        let names: HashSet<_> = MNEMONIC_TABLE.iter().map(|(_, name, _)| *name).collect();
        assert_eq!(mnemonics.len(), MNEMONIC_TABLE.len());
        assert_eq!(names.len(), MNEMONIC_TABLE.len());
    }

    #[test]
    fn table_rows_follow_declaration_order() {
        for (position, (mnemonic, _, _)) in MNEMONIC_TABLE.iter().enumerate() {
            assert_eq!(*mnemonic as usize, position);
        }
    }

    #[test]
    fn every_name_parses_back_to_its_mnemonic() {
        for mnemonic in Mnemonic::all() {
            assert_eq!(mnemonic.name().parse::<Mnemonic>(), Ok(mnemonic));
            assert_eq!(
                mnemonic.name().to_lowercase().parse::<Mnemonic>(),
                Ok(mnemonic)
            );
        }
    }

    #[rstest]
    #[case("beq", Mnemonic::BEq)]
    #[case("B.eq", Mnemonic::BEq)]
    #[case(" bvc ", Mnemonic::BVc)]
    #[case("b", Mnemonic::B)]
    #[case("BL", Mnemonic::Bl)]
    #[case("blo", Mnemonic::BLo)]
    #[case("BLS", Mnemonic::BLs)]
    fn parsing_accepts_dotless_and_mixed_case(#[case] text: &str, #[case] expected: Mnemonic) {
        assert_eq!(text.parse::<Mnemonic>(), Ok(expected));
    }

    #[test]
    fn unknown_spelling_is_rejected() {
        assert_eq!(
            "MUL".parse::<Mnemonic>(),
            Err(DecodeError::UnknownMnemonic {
                text: "MUL".to_string()
            })
        );
    }

    #[test]
    fn forms_carry_expected_arity() {
        assert_eq!(Mnemonic::Add.arity(), 3);
        assert_eq!(Mnemonic::Stxr.arity(), 4);
        assert_eq!(Mnemonic::Cbnz.arity(), 2);
        assert_eq!(Mnemonic::BGe.arity(), 1);
        assert_eq!(Mnemonic::Br.form(), InstructionForm::BranchRegister);
        assert_eq!(Mnemonic::Ldursw.form(), InstructionForm::Load);
    }

    #[test]
    fn only_conditional_branches_have_conditions() {
        let conditional = Mnemonic::all()
            .filter(|mnemonic| mnemonic.condition().is_some())
            .count();
        assert_eq!(conditional, 14);
        for mnemonic in Mnemonic::all() {
            assert_eq!(
                mnemonic.condition().is_some(),
                mnemonic.form() == InstructionForm::CondBranch
            );
            if let Some(cond) = mnemonic.condition() {
                assert_eq!(cond.branch_mnemonic(), mnemonic);
            }
        }
    }

    #[rstest]
    #[case(Condition::Eq, flags(false, true, false, false), true)]
    #[case(Condition::Eq, flags(false, false, false, false), false)]
    #[case(Condition::Ne, flags(false, false, false, false), true)]
    #[case(Condition::Hs, flags(false, false, true, false), true)]
    #[case(Condition::Lo, flags(false, false, true, false), false)]
    #[case(Condition::Hi, flags(false, false, true, false), true)]
    #[case(Condition::Hi, flags(false, true, true, false), false)]
    #[case(Condition::Ls, flags(false, true, true, false), true)]
    #[case(Condition::Ls, flags(false, false, true, false), false)]
    #[case(Condition::Ge, flags(true, false, false, true), true)]
    #[case(Condition::Ge, flags(true, false, false, false), false)]
    #[case(Condition::Lt, flags(true, false, false, false), true)]
    #[case(Condition::Lt, flags(true, false, false, true), false)]
    #[case(Condition::Gt, flags(false, false, false, false), true)]
    #[case(Condition::Gt, flags(false, true, false, false), false)]
    #[case(Condition::Le, flags(false, true, false, false), true)]
    #[case(Condition::Le, flags(true, false, false, false), true)]
    #[case(Condition::Le, flags(false, false, false, false), false)]
    #[case(Condition::Mi, flags(true, false, false, false), true)]
    #[case(Condition::Pl, flags(true, false, false, false), false)]
    #[case(Condition::Vs, flags(false, false, false, true), true)]
    #[case(Condition::Vc, flags(false, false, false, true), false)]
    fn condition_table(#[case] cond: Condition, #[case] state: Flags, #[case] expected: bool) {
        assert_eq!(cond.holds(state), expected);
    }
}
