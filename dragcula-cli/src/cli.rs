//! CLI argument parsing types using `clap`.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use dragcula_core::DropPosition;

/// `Dragcula` command-line interface for ordering tabs, notebooks and notes
#[derive(Parser)]
#[command(name = "dragcula-cli")]
#[command(author, version, about = "Dragcula command-line interface")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the configuration directory
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Workspace file (defaults to workspace.json in the configuration
    /// directory)
    #[arg(short, long, global = true, env = "DRAGCULA_WORKSPACE")]
    pub workspace: Option<PathBuf>,

    /// Increase output verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Tab strip commands
    #[command(subcommand)]
    Tabs(TabCommands),

    /// Notebook list commands
    #[command(subcommand)]
    Notebooks(NotebookCommands),

    /// Note commands
    #[command(subcommand)]
    Notes(NoteCommands),

    /// Rebuild persisted order lists against the existing notebooks and notes
    #[command(about = "Drop deleted ids from order lists and append new ones")]
    Reconcile {
        /// Show the result without writing the workspace
        #[arg(long)]
        dry_run: bool,
    },

    /// Generate shell completions
    #[command(about = "Generate shell completions for bash, zsh, fish, etc.")]
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Tab subcommands
#[derive(Subcommand)]
pub enum TabCommands {
    /// List tabs in strip order (pinned first)
    List {
        /// Output format
        #[arg(short, long, default_value = "table", value_enum)]
        format: OutputFormat,
    },

    /// Drag a tab onto a row of the strip
    Move {
        /// Tab id
        id: String,

        /// Row the tab is dropped on
        #[arg(short, long)]
        to: usize,

        /// Which side of the row (before, after)
        #[arg(short, long, default_value = "before", value_parser = parse_edge)]
        position: DropPosition,
    },
}

/// Notebook subcommands
#[derive(Subcommand)]
pub enum NotebookCommands {
    /// List notebooks and their notes in display order
    List {
        /// Output format
        #[arg(short, long, default_value = "table", value_enum)]
        format: OutputFormat,
    },

    /// Drag a notebook onto a row of the notebook list
    Move {
        /// Notebook id
        id: String,

        /// Row the notebook is dropped on
        #[arg(short, long)]
        to: usize,

        /// Which side of the row (before, after)
        #[arg(short, long, default_value = "before", value_parser = parse_edge)]
        position: DropPosition,
    },
}

/// Note subcommands
#[derive(Subcommand)]
pub enum NoteCommands {
    /// Drag a note into a notebook's note list
    Move {
        /// Note id
        id: String,

        /// Notebook receiving the note
        #[arg(short, long)]
        notebook: String,

        /// Row the note is dropped on; omit to append
        #[arg(short, long)]
        to: Option<usize>,

        /// Which side of the row (before, after)
        #[arg(short, long, default_value = "before", value_parser = parse_edge)]
        position: DropPosition,
    },
}

/// Output format for list commands
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum OutputFormat {
    /// Display as formatted table
    Table,
    /// Output as JSON
    Json,
}

/// Parses `before`/`after`; list drops never land on a row
fn parse_edge(s: &str) -> Result<DropPosition, String> {
    match s.parse::<DropPosition>()? {
        DropPosition::On => Err("position must be 'before' or 'after'".to_string()),
        edge => Ok(edge),
    }
}
