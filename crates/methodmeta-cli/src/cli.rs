use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "methodmeta",
    about = "methodmeta: hierarchy-aware aggregation of method contract metadata",
    version
)]
pub struct Cli {
    /// Log merge and validation steps to stderr
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Merge and validate every method of a hierarchy document
    Aggregate {
        /// Path to the hierarchy document (JSON)
        hierarchy: String,

        /// Path to a TOML settings file
        #[arg(long)]
        config: Option<String>,

        /// Strictness level: standard or strict (overrides the settings file)
        #[arg(long)]
        strictness: Option<String>,

        /// Worker threads used to aggregate independent methods
        #[arg(long)]
        jobs: Option<usize>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the configuration error kinds the engine can report
    ErrorKinds {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}
