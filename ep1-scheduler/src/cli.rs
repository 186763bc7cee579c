use std::path::PathBuf;

use clap::Parser;

/// Runs one scheduling policy over a trace file and writes per-job results.
///
/// Mirrors the original coursework invocation: `ep1 <policy> <trace-in>
/// <results-out> [d]`, where `d` turns on debug-level logging.
#[derive(Debug, Parser)]
#[command(name = "ep1", about = "CPU scheduler simulator")]
pub struct Cli {
    /// Scheduling policy: 1 = FCFS, 2 = SRTN, 3 = round-robin.
    pub policy: String,

    /// Path to the input trace file.
    pub trace_in: PathBuf,

    /// Path the results will be written to.
    pub results_out: PathBuf,

    /// Legacy debug flag: pass the literal token `d` to enable debug logging.
    pub debug_flag: Option<String>,
}

impl Cli {
    pub fn debug_requested(&self) -> bool {
        matches!(self.debug_flag.as_deref(), Some("d"))
    }
}
