use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "featcheck",
    about = "featcheck: static wiring analysis for composed deployables",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyse one scanned descriptor set
    Analyse {
        /// Descriptor set JSON path
        descriptors: String,

        /// Analyser config path (defaults to ./featcheck.toml when present)
        #[arg(long)]
        config: Option<String>,

        /// Origin store directory, overriding the config
        #[arg(long)]
        file_storage: Option<String>,

        /// Task id to run (repeatable), overriding the config
        #[arg(long = "task")]
        tasks: Vec<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Parse a region declaration and print the normalized regions
    Regions {
        /// Region declaration JSON path
        declaration: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the analyser tasks
    Tasks {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}
