//! # tablelens
//!
//! Command-line entry point. Without a subcommand an interactive session is
//! started; `analyze` prints one report and exits.
//!
//! ```bash
//! tablelens analyze compras --subset proveedor,fecha
//! tablelens analyze compras --json > report.json
//! tablelens
//! ```
//!
//! Connection details come from `SUPABASE_URL` and `SUPABASE_KEY`, read
//! from the environment or a `.env` file. Missing credentials or an
//! unusable URL end the program with a non-zero exit code; problems with a
//! single table are reported and do not.

#![expect(clippy::print_stderr)]

mod cli;

use clap::Parser as _;
use std::process::ExitCode;
use tablelens::error::LensError;

fn main() -> ExitCode {
    let cli = cli::Cli::parse();

    if let Err(err) = tablelens::logging::init(cli.verbose) {
        eprintln!("Warning: logging unavailable: {err:#}");
    }

    match cli::run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let fatal = err
                .downcast_ref::<LensError>()
                .is_none_or(LensError::is_fatal);
            tracing::error!("{err:#}");
            eprintln!("Error: {err:#}");
            if fatal {
                ExitCode::FAILURE
            } else {
                ExitCode::from(2)
            }
        }
    }
}
