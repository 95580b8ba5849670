//! Memory-contents display model refreshed after every step.

use std::fmt;

use crate::memory::{Memory, MemoryLayout, INSTRUCTION_SIZE};

/// Rows shown on each side of the current address.
pub const WINDOW_RADIUS: u64 = 4;

const DOUBLEWORD: u64 = 8;

/// Addresses touched by the most recent step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct RecentAccess {
    /// Address of the most recently fetched instruction.
    pub instruction: Option<u64>,
    /// Address of the most recent data access.
    pub data: Option<u64>,
    /// Whether the last step fetched `instruction`.
    pub instruction_current: bool,
    /// Whether the last step accessed `data`.
    pub data_current: bool,
}

impl RecentAccess {
    pub(crate) const fn begin_step(&mut self, pc: u64) {
        self.instruction = Some(pc);
        self.instruction_current = true;
        self.data_current = false;
    }

    pub(crate) const fn record_data(&mut self, address: u64) {
        self.data = Some(address);
        self.data_current = true;
    }
}

/// One displayed memory word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct WindowRow {
    /// Row address.
    pub address: u64,
    /// Loaded value, `None` when the load faults.
    pub value: Option<u64>,
    /// Whether the last instruction accessed this row.
    pub current: bool,
}

/// Instruction words around the last fetch and doublewords around the last
/// data access.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct MemoryWindow {
    /// Instruction-word rows in ascending address order.
    pub instructions: Vec<WindowRow>,
    /// Doubleword rows in ascending address order.
    pub data: Vec<WindowRow>,
}

impl MemoryWindow {
    /// Reads the window around `recent` from `memory`.
    ///
    /// Before any fetch the instruction rows center on the text base; before
    /// any data access the data rows center on the dynamic data base.
    #[must_use]
    pub fn capture(recent: &RecentAccess, memory: &dyn Memory) -> Self {
        let layout = memory.layout();
        Self {
            instructions: instruction_rows(recent, layout, memory),
            data: data_rows(recent, layout, memory),
        }
    }

    /// The current instruction row, if any.
    #[must_use]
    pub fn current_instruction(&self) -> Option<&WindowRow> {
        self.instructions.iter().find(|row| row.current)
    }

    /// The current data row, if any.
    #[must_use]
    pub fn current_data(&self) -> Option<&WindowRow> {
        self.data.iter().find(|row| row.current)
    }
}

fn instruction_rows(
    recent: &RecentAccess,
    layout: &MemoryLayout,
    memory: &dyn Memory,
) -> Vec<WindowRow> {
    let center = recent.instruction.unwrap_or(layout.text_base);
    let read = |address: u64| memory.load_instruction_word(address).ok().map(u64::from);

    let before = (1..=WINDOW_RADIUS)
        .rev()
        .filter_map(|k| center.checked_sub(k * INSTRUCTION_SIZE))
        .filter(|&address| address >= layout.text_base);
    let after = (1..=WINDOW_RADIUS).filter_map(|k| center.checked_add(k * INSTRUCTION_SIZE));

    before
        .map(|address| row(address, read(address), false))
        .chain(std::iter::once(row(
            center,
            read(center),
            recent.instruction_current,
        )))
        .chain(after.map(|address| row(address, read(address), false)))
        .collect()
}

fn data_rows(recent: &RecentAccess, layout: &MemoryLayout, memory: &dyn Memory) -> Vec<WindowRow> {
    let center = recent.data.unwrap_or(layout.dynamic_data_base) / DOUBLEWORD * DOUBLEWORD;
    let read = |address: u64| memory.load_doubleword(address).ok();

    let before = (1..=WINDOW_RADIUS)
        .rev()
        .filter_map(|k| center.checked_sub(k * DOUBLEWORD))
        .filter(|&address| address >= layout.dynamic_data_base);
    let after = (1..=WINDOW_RADIUS)
        .filter_map(|k| center.checked_add(k * DOUBLEWORD))
        .filter(|&address| address <= layout.stack_base);

    before
        .map(|address| row(address, read(address), false))
        .chain(std::iter::once(row(center, read(center), recent.data_current)))
        .chain(after.map(|address| row(address, read(address), false)))
        .collect()
}

const fn row(address: u64, value: Option<u64>, current: bool) -> WindowRow {
    WindowRow {
        address,
        value,
        current,
    }
}

fn write_rows(f: &mut fmt::Formatter<'_>, rows: &[WindowRow], digits: usize) -> fmt::Result {
    for row in rows {
        let marker = if row.current { '>' } else { ' ' };
        match row.value {
            Some(value) => writeln!(f, "{marker} 0x{:016X}  {value:0digits$X}", row.address)?,
            None => writeln!(f, "{marker} 0x{:016X}  {}", row.address, "-".repeat(digits))?,
        }
    }
    Ok(())
}

impl fmt::Display for MemoryWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Instructions:")?;
        write_rows(f, &self.instructions, 8)?;
        writeln!(f, "Data:")?;
        write_rows(f, &self.data, 16)
    }
}
