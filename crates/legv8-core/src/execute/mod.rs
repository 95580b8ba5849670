//! Instruction execution pipeline.
//!
//! Each instruction runs in two phases:
//! 1. [`execute_instruction`] reads operands from the current state, performs
//!    memory traffic through the data cache, and records every architectural
//!    change in an [`ExecuteState`].
//! 2. [`commit_execution`] applies the recorded changes.
//!
//! Faults are raised before any register, flag or index change is committed,
//! and every store faults before memory is written. Flag-setting
//! instructions therefore see operand values from before their own write.

#![allow(
    clippy::pedantic,
    clippy::nursery,
    clippy::similar_names,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    clippy::too_many_arguments,
    unknown_lints,
    missing_docs
)]

mod flags;
mod helpers;

pub use flags::{add_flags, logical_flags, FlagsUpdate};
pub use helpers::{
    branch_register_target, check_sp_alignment, effective_address, overlaps_exclusive,
    EXCLUSIVE_GRANULE,
};

use crate::cache::{Cache, CacheKind};
use crate::decoder::{AluOp, LoadKind, MoveWideKind, Operation, ShiftOp};
use crate::memory::{AccessWidth, Memory};
use crate::state::{ArchitecturalState, Register};
use crate::{AccessOutcome, Fault, TraceEvent, TraceSink};

/// Everything an instruction may read or touch while executing.
pub struct ExecuteContext<'a> {
    /// State before the instruction.
    pub arch: &'a ArchitecturalState,
    /// Data cache, if configured.
    pub dcache: Option<&'a mut Cache>,
    /// Main memory.
    pub memory: &'a mut dyn Memory,
    /// Receives cache-access and store-exclusive events.
    pub trace: &'a mut dyn TraceSink,
}

/// Pending change to the exclusive monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExclusiveUpdate {
    /// Leave the tag as is.
    #[default]
    Keep,
    /// Arm the monitor on an address.
    Set(u64),
    /// Disarm the monitor.
    Clear,
}

/// Side effects accumulated while executing one instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExecuteState {
    /// Register write. Writes to register 31 are dropped at commit.
    pub dest: Option<(Register, i64)>,
    /// Flags change.
    pub flags_update: FlagsUpdate,
    /// Branch target overriding the already advanced index.
    pub next_index: Option<usize>,
    /// Whether control left the sequential path.
    pub branch_taken: bool,
    /// Exclusive monitor change.
    pub exclusive: ExclusiveUpdate,
    /// Outcome of a store-exclusive.
    pub store_exclusive: Option<bool>,
    /// Address of the data access this instruction made, if any.
    pub data_address: Option<u64>,
}

impl ExecuteState {
    fn branch_to(&mut self, target: usize) {
        self.next_index = Some(target);
        self.branch_taken = true;
    }
}

/// Executes one operation against `ctx`, returning the changes to commit.
///
/// # Errors
///
/// Returns the first [`Fault`] raised. Registers, flags and the index are
/// untouched in that case; cache statistics may already reflect the access.
pub fn execute_instruction(
    op: &Operation,
    ctx: &mut ExecuteContext<'_>,
) -> Result<ExecuteState, Fault> {
    let mut exec = ExecuteState::default();
    let arch = ctx.arch;

    match *op {
        Operation::Alu { op, rd, rn, rm } => {
            execute_alu(op, rd, arch.reg(rn), arch.reg(rm), &mut exec);
        }
        Operation::AluImmediate { op, rd, rn, imm } => {
            execute_alu(op, rd, arch.reg(rn), imm, &mut exec);
        }
        Operation::Shift { op, rd, rn, amount } => {
            let value = arch.reg(rn) as u64;
            let shifted = match op {
                ShiftOp::Lsl => value.wrapping_shl(amount),
                ShiftOp::Lsr => value.wrapping_shr(amount),
            };
            exec.dest = Some((rd, shifted as i64));
        }
        Operation::Load {
            kind,
            rt,
            rn,
            offset,
        } => execute_load(kind, rt, rn, offset, false, ctx, &mut exec)?,
        Operation::LoadExclusive { rt, rn, offset } => {
            execute_load(LoadKind::Doubleword, rt, rn, offset, true, ctx, &mut exec)?;
        }
        Operation::Store {
            width,
            rt,
            rn,
            offset,
        } => execute_store(width, rt, rn, offset, ctx, &mut exec)?,
        Operation::StoreExclusive { rt, rs, rn, offset } => {
            execute_store_exclusive(rt, rs, rn, offset, ctx, &mut exec)?;
        }
        Operation::MoveWide {
            kind,
            rd,
            imm,
            shift,
        } => {
            let field = (imm as u64).wrapping_shl(shift);
            let value = match kind {
                MoveWideKind::Zero => field,
                MoveWideKind::Keep => {
                    let mask = 0xFFFF_u64.wrapping_shl(shift);
                    (arch.reg(rd) as u64 & !mask) | field
                }
            };
            exec.dest = Some((rd, value as i64));
        }
        Operation::CompareBranch {
            nonzero,
            rt,
            target,
        } => {
            if (arch.reg(rt) != 0) == nonzero {
                exec.branch_to(target);
            }
        }
        Operation::CondBranch { cond, target } => {
            if cond.holds(arch.flags()) {
                exec.branch_to(target);
            }
        }
        Operation::Branch { target } => exec.branch_to(target),
        Operation::BranchLink { target } => {
            let link = ctx.memory.layout().instruction_address(target);
            exec.dest = Some((Register::LR, link as i64));
            exec.branch_to(target);
        }
        Operation::BranchRegister { rn } => {
            let target = branch_register_target(arch.reg(rn), ctx.memory.layout())?;
            exec.branch_to(target);
        }
    }

    Ok(exec)
}

/// Applies the changes recorded by [`execute_instruction`].
///
/// The instruction index must already point past the executed instruction;
/// only a branch overrides it here.
pub fn commit_execution(
    arch: &mut ArchitecturalState,
    op: &Operation,
    exec: &ExecuteState,
    trace: &mut dyn TraceSink,
) {
    if let Some(target) = exec.next_index {
        arch.set_instruction_index(target);
        trace.on_event(TraceEvent::BranchTaken { target });
    }
    arch.set_branch_taken(exec.branch_taken);

    if let Some((reg, value)) = exec.dest {
        if !arch.registers_mut().write(reg, value) {
            trace.on_event(TraceEvent::ZeroRegisterWriteIgnored {
                mnemonic: op.mnemonic(),
            });
        }
    }

    if let FlagsUpdate::Set(flags) = exec.flags_update {
        arch.set_flags(flags);
        trace.on_event(TraceEvent::FlagsUpdated { flags });
    }

    match exec.exclusive {
        ExclusiveUpdate::Keep => {}
        ExclusiveUpdate::Set(address) => {
            arch.set_exclusive_tag(Some(address));
            trace.on_event(TraceEvent::ExclusiveTagSet { address });
        }
        ExclusiveUpdate::Clear => {
            if let Some(address) = arch.exclusive_tag() {
                arch.set_exclusive_tag(None);
                trace.on_event(TraceEvent::ExclusiveTagCleared { address });
            }
        }
    }

    if let Some(succeeded) = exec.store_exclusive {
        arch.set_store_exclusive_succeeded(succeeded);
    }
}

fn execute_alu(op: AluOp, rd: Register, op1: i64, op2: i64, exec: &mut ExecuteState) {
    let result = match op {
        AluOp::Add | AluOp::Adds => op1.wrapping_add(op2),
        AluOp::Sub | AluOp::Subs => op1.wrapping_sub(op2),
        AluOp::And | AluOp::Ands => op1 & op2,
        AluOp::Orr => op1 | op2,
        AluOp::Eor => op1 ^ op2,
    };
    exec.dest = Some((rd, result));
    exec.flags_update = match op {
        AluOp::Adds | AluOp::Subs => FlagsUpdate::Set(add_flags(result, op1, op2)),
        AluOp::Ands => FlagsUpdate::Set(logical_flags(result)),
        _ => FlagsUpdate::None,
    };
}

fn data_access_address(
    rn: Register,
    offset: i64,
    arch: &ArchitecturalState,
) -> Result<u64, Fault> {
    if rn == Register::SP {
        check_sp_alignment(arch.reg(Register::SP))?;
    }
    Ok(effective_address(arch.reg(rn), offset))
}

fn record_data_access(ctx: &mut ExecuteContext<'_>, address: u64, hit: Option<bool>) {
    ctx.trace.on_event(TraceEvent::CacheAccess {
        kind: CacheKind::Data,
        address,
        outcome: AccessOutcome::from(hit),
    });
}

fn execute_load(
    kind: LoadKind,
    rt: Register,
    rn: Register,
    offset: i64,
    exclusive: bool,
    ctx: &mut ExecuteContext<'_>,
    exec: &mut ExecuteState,
) -> Result<(), Fault> {
    if rt.is_zero_register() {
        // No access at all; only the dropped write is observable.
        exec.dest = Some((rt, 0));
        return Ok(());
    }

    let address = data_access_address(rn, offset, ctx.arch)?;
    let width = kind.width();
    let hit = match ctx.dcache.as_deref_mut() {
        Some(cache) => Some(cache.check(address, width.bytes(), &*ctx.memory)?),
        None => None,
    };
    record_data_access(ctx, address, hit);
    exec.data_address = Some(address);

    let raw = ctx.memory.load(address, width)?;
    exec.dest = Some((rt, kind.extend(raw)));
    if exclusive {
        exec.exclusive = ExclusiveUpdate::Set(address);
    }
    Ok(())
}

fn write_through(
    ctx: &mut ExecuteContext<'_>,
    address: u64,
    width: AccessWidth,
    value: u64,
) -> Result<Option<bool>, Fault> {
    match ctx.dcache.as_deref_mut() {
        Some(cache) => cache
            .check_write(address, width, value, &mut *ctx.memory)
            .map(Some),
        None => ctx.memory.store(address, width, value).map(|()| None),
    }
}

fn execute_store(
    width: AccessWidth,
    rt: Register,
    rn: Register,
    offset: i64,
    ctx: &mut ExecuteContext<'_>,
    exec: &mut ExecuteState,
) -> Result<(), Fault> {
    let address = data_access_address(rn, offset, ctx.arch)?;
    let value = ctx.arch.reg(rt) as u64;
    let hit = write_through(ctx, address, width, value)?;
    record_data_access(ctx, address, hit);
    exec.data_address = Some(address);

    if let Some(tag) = ctx.arch.exclusive_tag() {
        if overlaps_exclusive(tag, address, width.bytes()) {
            exec.exclusive = ExclusiveUpdate::Clear;
        }
    }
    Ok(())
}

fn execute_store_exclusive(
    rt: Register,
    rs: Register,
    rn: Register,
    offset: i64,
    ctx: &mut ExecuteContext<'_>,
    exec: &mut ExecuteState,
) -> Result<(), Fault> {
    let address = data_access_address(rn, offset, ctx.arch)?;
    let succeeded = ctx.arch.exclusive_tag() == Some(address);

    if succeeded {
        let value = ctx.arch.reg(rt) as u64;
        let hit = write_through(ctx, address, AccessWidth::Doubleword, value)?;
        record_data_access(ctx, address, hit);
        exec.data_address = Some(address);
        exec.exclusive = ExclusiveUpdate::Clear;
    }

    exec.dest = Some((rs, i64::from(!succeeded)));
    exec.store_exclusive = Some(succeeded);
    ctx.trace.on_event(TraceEvent::StoreExclusive { address, succeeded });
    Ok(())
}
