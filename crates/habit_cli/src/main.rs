//! Command-line front end for habit core.
//!
//! # Responsibility
//! - Load config, start logging and open the database once per invocation.
//! - Print every result as JSON on stdout; errors go to stderr.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(name = "habit", version, about = "Habit tracking CLI")]
struct Cli {
    /// TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Database file, overrides `database.path`
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Habit configuration
    Habit {
        #[command(subcommand)]
        action: commands::habit::HabitAction,
    },
    /// Daily check-ins
    Entry {
        #[command(subcommand)]
        action: commands::entry::EntryAction,
    },
    /// Print the core library version
    Version,
}

fn main() {
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Habit { action } => commands::Context::open(cli.config, cli.db)
            .and_then(|ctx| commands::habit::run(&ctx, action)),
        Commands::Entry { action } => commands::Context::open(cli.config, cli.db)
            .and_then(|ctx| commands::entry::run(&ctx, action)),
        Commands::Version => {
            println!("habit_core version={}", habit_core::core_version());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
