//! CLI entry point for the LEGv8 simulator binary.

mod program;
mod report;

use std::env;
use std::ffi::OsString;
use std::io;
use std::path::PathBuf;

use legv8_core::{Cpu, NullTraceSink, SimulatorError, TraceSink};
#[cfg(test)]
use tempfile as _;

use crate::program::ProgramError;
use crate::report::EventPrinter;

const USAGE_TEXT: &str = "\
Usage: legv8-sim <command> [options]

Commands:
  run <program.json> [options]  Execute a pre-decoded program

Options:
  -n, --max-steps <count>  Stop after this many instructions
  -t, --trace              Print every execution event
      --caches             Dump cache contents after the run
      --json               Print the final state as JSON
  -h, --help               Show this help message

Examples:
  legv8-sim run program.json
  legv8-sim run program.json --max-steps 100 --trace
";

#[derive(Debug, PartialEq, Eq)]
struct RunArgs {
    input: PathBuf,
    max_steps: Option<u64>,
    trace: bool,
    caches: bool,
    json: bool,
}

#[derive(Debug)]
enum ParseResult {
    Run(RunArgs),
    Help,
}

fn parse_args(mut args: impl Iterator<Item = OsString>) -> Result<ParseResult, String> {
    let first = args.next().ok_or_else(|| "missing command".to_string())?;

    if first == "--help" || first == "-h" {
        return Ok(ParseResult::Help);
    }

    match first.to_string_lossy().as_ref() {
        "run" => parse_run_args(args).map(ParseResult::Run),
        other => Err(format!("unknown command: {other}")),
    }
}

#[allow(clippy::while_let_on_iterator)]
fn parse_run_args(mut args: impl Iterator<Item = OsString>) -> Result<RunArgs, String> {
    let mut input: Option<PathBuf> = None;
    let mut max_steps = None;
    let mut trace = false;
    let mut caches = false;
    let mut json = false;

    while let Some(arg) = args.next() {
        if arg == "--help" || arg == "-h" {
            return Err(USAGE_TEXT.to_string());
        }

        if arg == "--trace" || arg == "-t" {
            trace = true;
            continue;
        }

        if arg == "--caches" {
            caches = true;
            continue;
        }

        if arg == "--json" {
            json = true;
            continue;
        }

        if arg == "--max-steps" || arg == "-n" {
            let value = args
                .next()
                .ok_or_else(|| "missing value for --max-steps".to_string())?;
            let text = value.to_string_lossy();
            max_steps = Some(
                text.parse::<u64>()
                    .map_err(|_| format!("invalid step count: {text}"))?,
            );
            continue;
        }

        if arg.to_string_lossy().starts_with('-') {
            return Err(format!("unknown option: {}", arg.to_string_lossy()));
        }

        if input.is_some() {
            return Err("multiple input paths provided".to_string());
        }
        input = Some(PathBuf::from(arg));
    }

    let input = input.ok_or_else(|| "missing input path".to_string())?;
    Ok(RunArgs {
        input,
        max_steps,
        trace,
        caches,
        json,
    })
}

fn run(args: &RunArgs) -> Result<(), i32> {
    let loaded = program::load(&args.input).map_err(|e| report_error(&e))?;
    let mut memory = loaded.memory;
    let mut cpu = Cpu::new(&loaded.config)
        .map_err(|e| report_error(&ProgramError::from(SimulatorError::from(e))))?;

    let mut printer = EventPrinter::new(io::stdout());
    let mut silent = NullTraceSink;
    let sink: &mut dyn TraceSink = if args.trace {
        &mut printer
    } else {
        &mut silent
    };
    let result = match args.max_steps {
        Some(limit) => cpu.run_bounded(&loaded.instructions, &mut memory, limit, sink),
        None => cpu.run_traced(&loaded.instructions, &mut memory, sink),
    };

    match &result {
        Ok(outcome) if outcome.completed => {
            println!("Executed {} instructions", outcome.steps);
        }
        Ok(outcome) => println!(
            "Stopped after {} instructions at index {}",
            outcome.steps,
            cpu.instruction_index()
        ),
        Err(error) => eprintln!("error: {error}"),
    }

    if args.json {
        match serde_json::to_string_pretty(&cpu.snapshot()) {
            Ok(text) => println!("{text}"),
            Err(e) => {
                eprintln!("error: failed to serialize state: {e}");
                return Err(1);
            }
        }
    } else {
        print!("{}", report::format_state(&cpu, &memory, args.caches));
    }

    result.map(|_| ()).map_err(|_| 1)
}

fn report_error(error: &ProgramError) -> i32 {
    eprintln!("error: {error}");
    1
}

fn main() {
    let exit_code = match parse_args(env::args_os().skip(1)) {
        Ok(ParseResult::Help) => {
            println!("{USAGE_TEXT}");
            0
        }
        Ok(ParseResult::Run(args)) => match run(&args) {
            Ok(()) => 0,
            Err(code) => code,
        },
        Err(error) => {
            if error.starts_with("Usage:") {
                println!("{error}");
            } else {
                eprintln!("error: {error}");
                eprintln!("{USAGE_TEXT}");
            }
            1
        }
    };

    std::process::exit(exit_code);
}
