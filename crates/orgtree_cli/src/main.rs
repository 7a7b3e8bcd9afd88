//! `orgtree` command-line entry point.
//!
//! # Responsibility
//! - Parse arguments and run one core operation per invocation.
//! - Print results as pretty JSON on stdout.
//! - Print `error[<kind>]: <message>` on stderr and exit 2, 3 or 1 for
//!   not-found, validation and internal failures.

mod cli;
mod commands;

use clap::Parser;
use cli::Cli;

fn main() {
    let cli = Cli::parse();
    match commands::run(&cli) {
        Ok(output) => println!("{output}"),
        Err(err) => {
            eprintln!("error[{}]: {err}", err.kind().as_str());
            std::process::exit(err.exit_code());
        }
    }
}
