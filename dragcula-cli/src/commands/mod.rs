//! Command handler modules for the CLI.

mod completions;
mod notebooks;
mod notes;
mod reconcile;
mod tabs;

use crate::cli::Commands;
use crate::error::CliError;
use crate::util::Context;

/// Dispatch a CLI command to the appropriate handler.
pub fn dispatch(ctx: &Context, command: Commands) -> Result<(), CliError> {
    match command {
        Commands::Tabs(subcmd) => tabs::cmd_tabs(ctx, subcmd),
        Commands::Notebooks(subcmd) => notebooks::cmd_notebooks(ctx, subcmd),
        Commands::Notes(subcmd) => notes::cmd_notes(ctx, subcmd),
        Commands::Reconcile { dry_run } => reconcile::cmd_reconcile(ctx, dry_run),
        Commands::Completions { shell } => completions::cmd_completions(shell),
    }
}

/// Serializes `value` for `--format json`
fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<String, CliError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| CliError::Workspace(format!("Failed to serialize output: {e}")))
}
