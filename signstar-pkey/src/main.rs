//! Application for the creation, inspection and use of RSA, DSA and Diffie-Hellman keys.

use std::process::ExitCode;

use clap::Parser;
use log::error;
use signstar_pkey::{cli::Cli, logging::setup_logging};

/// Runs a `signstar-pkey` command and writes its results to standard output.
fn main() -> ExitCode {
    let args = Cli::parse();

    if let Err(error) = setup_logging(args.verbosity) {
        eprintln!("{error}");
        return ExitCode::FAILURE;
    }

    let result = args.run(&mut std::io::stdout());

    if let Err(error) = result {
        error!(error:err; "Running command failed: {error}");
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
