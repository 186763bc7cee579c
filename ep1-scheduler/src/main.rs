#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

mod cli;

use std::fs::File;
use std::io::{BufReader, Write};
use std::process::ExitCode;

use clap::error::ErrorKind;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::Cli;
use ep1_scheduler::{run, Error, Policy, TraceReader};

fn init_logging(debug_requested: bool) {
    let filter = if debug_requested {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env("SCHEDSIM_LOG").unwrap_or_else(|_| EnvFilter::new("info"))
    };
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::from(0),
                // Every other parse failure is argument misuse.
                _ => ExitCode::from(1),
            };
        }
    };
    init_logging(cli.debug_requested());

    let config = match simcore_config::load_config("schedsim") {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!("failed to load configuration: {e}. Using defaults.");
            simcore_config::Config::default()
        }
    };

    match run_app(&cli, &config.scheduler) {
        Ok(()) => ExitCode::from(0),
        Err(Error::Io(e)) => {
            tracing::error!("I/O error: {e}");
            ExitCode::from(2)
        }
        Err(Error::Internal(msg)) => {
            tracing::error!("internal error: {msg}");
            ExitCode::from(3)
        }
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::from(1)
        }
    }
}

fn run_app(cli: &Cli, cfg: &simcore_config::SchedulerSection) -> ep1_scheduler::Result<()> {
    let policy = Policy::parse(&cli.policy)?;

    let file = File::open(&cli.trace_in)?;
    let trace = TraceReader::new(BufReader::new(file));

    tracing::info!(trace_in = %cli.trace_in.display(), "starting simulation");
    let report = run(policy, trace, cfg)?;
    tracing::info!(jobs = report.completed.len(), preemptions = report.preemptions, "simulation complete");

    let mut out = File::create(&cli.results_out)?;
    for job in &report.completed {
        writeln!(out, "{} {} {}", job.name, job.tf, job.turnaround())?;
    }
    writeln!(out, "{}", report.preemptions)?;

    Ok(())
}
