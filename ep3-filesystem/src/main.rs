#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

mod cli;

use std::io::{self, BufRead, Write};
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::Cli;
use ep3_filesystem::{dispatch, parse, Error, Filesystem};

fn init_logging() {
    let filter = EnvFilter::try_from_env("FATFS_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();

    let config = match simcore_config::load_config("fatfs") {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!("failed to load configuration: {e}. Using defaults.");
            simcore_config::Config::default()
        }
    };

    let mut mounted: Option<Filesystem> = None;
    if let Some(image) = &cli.image {
        match Filesystem::mount(image, &config.filesystem) {
            Ok(fs) => mounted = Some(fs),
            Err(e) => {
                tracing::error!("failed to mount {}: {e}", image.display());
                return exit_code_for(&e);
            }
        }
    }

    if let Some(command) = &cli.command {
        return match run_line(command, &mut mounted, &config, &mut io::stdout()) {
            Ok(_) => ExitCode::from(0),
            Err(e) => {
                tracing::error!("{e}");
                exit_code_for(&e)
            }
        };
    }

    let stdin = io::stdin();
    loop {
        print!("fat3> ");
        if io::stdout().flush().is_err() {
            break;
        }
        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => break, // EOF
            Ok(_) => {}
            Err(e) => {
                tracing::error!("failed to read command: {e}");
                break;
            }
        }
        if line.trim().is_empty() {
            continue;
        }
        match run_line(&line, &mut mounted, &config, &mut io::stdout()) {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => tracing::error!("{e}"),
        }
    }

    ExitCode::from(0)
}

fn run_line(
    line: &str,
    mounted: &mut Option<Filesystem>,
    config: &simcore_config::Config,
    out: &mut impl Write,
) -> ep3_filesystem::Result<bool> {
    let command = parse(line)?;
    dispatch(mounted, command, &config.filesystem, out)
}

fn exit_code_for(err: &Error) -> ExitCode {
    match err {
        Error::Io(_) | Error::ImageOpenError(_) | Error::HostOpenError(_) => ExitCode::from(2),
        Error::Internal(_) | Error::CorruptImage(_) => ExitCode::from(3),
        _ => ExitCode::from(1),
    }
}
