//! methodmeta CLI: the `methodmeta` command.

mod cli;
mod commands;
mod document;
mod support;

use clap::Parser;
use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();
    support::init_logging(cli.verbose);

    match cli.command {
        Commands::Aggregate {
            hierarchy,
            config,
            strictness,
            jobs,
            json,
        } => commands::aggregate::run(commands::aggregate::Args {
            hierarchy,
            config,
            strictness,
            jobs,
            json,
        }),

        Commands::ErrorKinds { json } => commands::error_kinds::run(json),
    }
}
