//! LiftSync CLI
//!
//! Command-line tools for inspecting a device's local LiftSync state.
//!
//! # Commands
//!
//! - `outbox list` - List pending jobs or dead letters
//! - `outbox show` - Print the save record a job would send
//! - `outbox clear` - Drop pending jobs or dead letters
//! - `outbox requeue` - Move dead letters back into the queue
//! - `draft show` / `draft clear` - Inspect or drop the paused session

mod commands;

use clap::{Parser, Subcommand};
use commands::Format;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// LiftSync local state tools.
#[derive(Parser)]
#[command(name = "liftsync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the store directory
    #[arg(global = true, short, long)]
    path: Option<PathBuf>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect or modify the outbox
    Outbox {
        #[command(subcommand)]
        action: OutboxAction,
    },

    /// Inspect or drop the paused-session draft
    Draft {
        #[command(subcommand)]
        action: DraftAction,
    },

    /// Show version information
    Version,
}

#[derive(Subcommand)]
enum OutboxAction {
    /// List queued jobs
    List {
        /// List dead letters instead
        #[arg(short, long)]
        dead_letter: bool,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: Format,
    },

    /// Print the normalized save record for a job
    Show {
        /// Idempotency key of the job
        key: String,
    },

    /// Remove every queued job
    Clear {
        /// Clear dead letters instead
        #[arg(short, long)]
        dead_letter: bool,
    },

    /// Move dead letters back into the queue
    Requeue,
}

#[derive(Subcommand)]
enum DraftAction {
    /// Summarize the draft
    Show {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: Format,
    },

    /// Delete the draft
    Clear,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Outbox { action } => {
            let path = cli.path.ok_or("Store path required for outbox")?;
            let outbox = commands::open_outbox(&path)?;
            match action {
                OutboxAction::List {
                    dead_letter,
                    format,
                } => commands::outbox::list(&outbox, dead_letter, format)?,
                OutboxAction::Show { key } => commands::outbox::show(&outbox, &key)?,
                OutboxAction::Clear { dead_letter } => commands::outbox::clear(&outbox, dead_letter)?,
                OutboxAction::Requeue => commands::outbox::requeue(&outbox)?,
            }
        }
        Commands::Draft { action } => {
            let path = cli.path.ok_or("Store path required for draft")?;
            let drafts = commands::open_drafts(&path)?;
            match action {
                DraftAction::Show { format } => commands::draft::show(&drafts, format)?,
                DraftAction::Clear => commands::draft::clear(&drafts)?,
            }
        }
        Commands::Version => {
            println!("LiftSync CLI v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
