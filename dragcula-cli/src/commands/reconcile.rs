//! Order list reconciliation.

use dragcula_core::CustomData;

use crate::commands::notebooks::{display_tree, format_table, tree_applier};
use crate::error::CliError;
use crate::util::{Context, runtime};
use crate::workspace::Workspace;

/// Rewrites `customData` so every list matches the existing entities
pub fn cmd_reconcile(ctx: &Context, dry_run: bool) -> Result<(), CliError> {
    let mut workspace = Workspace::load(&ctx.workspace_path)?;
    let services = workspace.services();
    let applier = tree_applier(&services);
    let tree = runtime()?.block_on(display_tree(&applier))?;

    let reconciled = CustomData {
        notebook_order: tree.iter().map(|nb| nb.id.clone()).collect(),
        note_orders: tree
            .iter()
            .map(|nb| (nb.id.clone(), nb.notes.clone()))
            .collect(),
    };

    println!("{}", format_table(&tree));
    if reconciled == workspace.custom_data {
        println!("Order lists are consistent.");
        return Ok(());
    }
    if dry_run {
        println!("Order lists would be rewritten (dry run).");
        return Ok(());
    }
    workspace.custom_data = reconciled;
    workspace.save(&ctx.workspace_path)?;
    tracing::info!(path = %ctx.workspace_path.display(), "Order lists reconciled");
    println!("Order lists rewritten.");
    Ok(())
}
