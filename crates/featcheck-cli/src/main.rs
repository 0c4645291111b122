//! featcheck CLI: the `featcheck` command.

mod cli;
mod commands;
mod support;

use clap::Parser;
use cli::{Cli, Commands};

fn main() {
    support::init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Analyse {
            descriptors,
            config,
            file_storage,
            tasks,
            json,
        } => commands::analyse::run(commands::analyse::Args {
            descriptors,
            config,
            file_storage,
            tasks,
            json,
        }),

        Commands::Regions { declaration, json } => commands::regions::run(declaration, json),

        Commands::Tasks { json } => commands::tasks::run(json),
    }
}
