use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "queuectl", version)]
pub struct Args {
    #[command(subcommand)]
    pub cmd: Command,

    /// Optional config file (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Snapshot database path (overrides config)
    #[arg(long)]
    pub db: Option<PathBuf>,

    /// Keep the queue in memory only; nothing is read or written on disk
    #[arg(long)]
    pub in_memory: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the queue with the selection marked
    List,

    /// Append a local file
    AddLocal {
        /// Path to the audio file
        path: PathBuf,

        /// Artist name
        #[arg(long, default_value = "Unknown Artist")]
        artist: String,

        /// Track title (defaults to the file stem)
        #[arg(long)]
        title: Option<String>,

        /// Duration in seconds
        #[arg(long)]
        duration: Option<u64>,
    },

    /// Remove an item by id
    Remove { id: String },

    /// Move an item from one position to another
    Move { from: usize, to: usize },

    /// Select a position and resolve it
    Select { index: usize },

    /// Remove every item
    Clear,

    /// Advance the selection
    Next,

    /// Step the selection back
    Previous,

    /// List registered stream providers with the selected one marked
    Providers,
}
