use clap::error::ErrorKind;
use clap::Parser;
use std::process::ExitCode;

/// Exit status for programs that are not dgsh-compatible.
const NOT_COMPATIBLE: u8 = 2;
/// Exit status for a malformed command line.
const USAGE: u8 = 1;

/// Check whether a program can take part in a dgsh pipeline
#[derive(Parser)]
#[command(
    name = "is-dgsh",
    about = "Exit 0 if PROGRAM is a dgsh-compatible ELF binary or script",
    version,
    author
)]
struct Cli {
    /// Path to the program to inspect
    #[arg(required = true)]
    program: std::path::PathBuf,
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            err.exit()
        }
        Err(err) => {
            eprint!("{err}");
            return ExitCode::from(USAGE);
        }
    };

    match dgsh_detect_core::check(&cli.program) {
        Ok(verdict) if verdict.compatible => {
            log::info!("{verdict}");
            ExitCode::SUCCESS
        }
        Ok(verdict) => {
            log::info!("{verdict}");
            ExitCode::from(NOT_COMPATIBLE)
        }
        Err(err) => {
            log::info!("{err:#}");
            ExitCode::from(NOT_COMPATIBLE)
        }
    }
}
