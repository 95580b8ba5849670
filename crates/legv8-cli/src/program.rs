//! Program files: pre-decoded instructions plus optional cache geometry and
//! initial data, stored as JSON.

use std::fs;
use std::path::Path;

use legv8_core::{
    CacheConfig, DecodeError, Fault, Instruction, Memory, Mnemonic, SegmentedMemory,
    SimulatorConfig, SimulatorError,
};
use serde::Deserialize;
use thiserror::Error;

/// Errors raised while loading or running a program file.
#[derive(Debug, Error)]
pub enum ProgramError {
    /// The file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// Path as given on the command line.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The file is not a valid program document.
    #[error("invalid program file: {0}")]
    Json(#[from] serde_json::Error),
    /// An instruction entry failed to decode.
    #[error("line {line}: {source}")]
    Decode {
        /// Source line of the entry.
        line: usize,
        /// Decode failure.
        #[source]
        source: DecodeError,
    },
    /// An initial data word lies outside the data segment.
    #[error("initial data at 0x{address:X}: {source}")]
    Data {
        /// Requested address.
        address: u64,
        /// Raised fault.
        #[source]
        source: Fault,
    },
    /// Engine construction or execution failed.
    #[error(transparent)]
    Simulator(#[from] SimulatorError),
}

const fn default_cache() -> Option<CacheConfig> {
    Some(CacheConfig::DEFAULT)
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ProgramFile {
    #[serde(default = "default_cache")]
    icache: Option<CacheConfig>,
    #[serde(default = "default_cache")]
    dcache: Option<CacheConfig>,
    #[serde(default)]
    data: Vec<DataWord>,
    instructions: Vec<InstructionEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DataWord {
    address: u64,
    value: i64,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct InstructionEntry {
    mnemonic: String,
    #[serde(default)]
    args: Vec<i64>,
    line: Option<usize>,
}

/// A decoded program ready to run.
#[derive(Debug)]
pub struct LoadedProgram {
    /// Engine configuration.
    pub config: SimulatorConfig,
    /// Memory with the initial data applied.
    pub memory: SegmentedMemory,
    /// Instruction list.
    pub instructions: Vec<Instruction>,
}

/// Reads and decodes the program at `path`.
///
/// # Errors
///
/// Returns [`ProgramError::Io`] when the file cannot be read, otherwise
/// whatever [`parse`] reports.
pub fn load(path: &Path) -> Result<LoadedProgram, ProgramError> {
    let text = fs::read_to_string(path).map_err(|source| ProgramError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse(&text)
}

/// Decodes a program document.
///
/// Entries without a `line` are numbered by position, starting at 1.
///
/// # Errors
///
/// Returns the first JSON, decode or initial-data error.
#[allow(clippy::cast_sign_loss)]
pub fn parse(text: &str) -> Result<LoadedProgram, ProgramError> {
    let file: ProgramFile = serde_json::from_str(text)?;
    let config = SimulatorConfig {
        icache: file.icache,
        dcache: file.dcache,
        ..SimulatorConfig::default()
    };

    let mut memory = SegmentedMemory::new(config.layout);
    for word in &file.data {
        memory
            .store_doubleword(word.address, word.value as u64)
            .map_err(|source| ProgramError::Data {
                address: word.address,
                source,
            })?;
    }

    let instructions = file
        .instructions
        .iter()
        .enumerate()
        .map(|(position, entry)| {
            let line = entry.line.unwrap_or(position + 1);
            let decode_error = |source| ProgramError::Decode { line, source };
            let mnemonic: Mnemonic = entry.mnemonic.parse().map_err(decode_error)?;
            Instruction::decode(mnemonic, &entry.args, line).map_err(decode_error)
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(LoadedProgram {
        config,
        memory,
        instructions,
    })
}
