//! Notebook list commands.

use std::fmt::Write as _;
use std::sync::Arc;

use dragcula_core::{
    DragData, DragItem, DropPosition, NotebookEntry, NotebookTreeApplier, NotebookZone, RowKind,
    TreeNode, keys,
};

use crate::cli::{NotebookCommands, OutputFormat};
use crate::commands::to_json;
use crate::error::CliError;
use crate::gesture::{Board, ensure_accepted};
use crate::util::{Context, runtime};
use crate::workspace::{Services, Workspace};

/// Notebook command handler
pub fn cmd_notebooks(ctx: &Context, subcmd: NotebookCommands) -> Result<(), CliError> {
    match subcmd {
        NotebookCommands::List { format } => cmd_list(ctx, format),
        NotebookCommands::Move { id, to, position } => cmd_move(ctx, &id, to, position),
    }
}

/// Tree applier over the workspace services
pub fn tree_applier(services: &Services) -> NotebookTreeApplier {
    NotebookTreeApplier::new(services.notebooks.clone(), services.store.clone())
}

/// Notebooks and notes in display order
pub async fn display_tree(applier: &NotebookTreeApplier) -> Result<Vec<NotebookEntry>, CliError> {
    let mut tree = Vec::new();
    for id in applier.notebook_order().await? {
        let notes = applier.note_order(&id).await?;
        tree.push(NotebookEntry { id, notes });
    }
    Ok(tree)
}

fn cmd_list(ctx: &Context, format: OutputFormat) -> Result<(), CliError> {
    let workspace = Workspace::load(&ctx.workspace_path)?;
    let services = workspace.services();
    let applier = tree_applier(&services);
    let tree = runtime()?.block_on(display_tree(&applier))?;
    match format {
        OutputFormat::Table => println!("{}", format_table(&tree)),
        OutputFormat::Json => println!("{}", to_json(&tree)?),
    }
    Ok(())
}

/// Format the notebook tree as a table string
#[must_use]
pub fn format_table(tree: &[NotebookEntry]) -> String {
    if tree.is_empty() {
        return "No notebooks found.".to_string();
    }

    let id_width = tree.iter().map(|n| n.id.len()).max().unwrap_or(8).max(8);
    let mut output = String::new();
    let _ = writeln!(output, "{:<4} {:<id_width$} NOTES", "ROW", "NOTEBOOK");
    let _ = writeln!(output, "{}", "-".repeat(4 + 1 + id_width + 1 + 5));
    for (row, notebook) in tree.iter().enumerate() {
        let _ = writeln!(
            output,
            "{row:<4} {:<id_width$} {}",
            notebook.id,
            notebook.notes.join(", ")
        );
    }
    output.trim_end().to_string()
}

fn cmd_move(ctx: &Context, id: &str, to: usize, position: DropPosition) -> Result<(), CliError> {
    let workspace = Workspace::load(&ctx.workspace_path)?;
    let services = workspace.services();
    let applier = tree_applier(&services);
    let rt = runtime()?;

    let before = rt.block_on(applier.notebook_order())?;
    let from = before
        .iter()
        .position(|n| n == id)
        .ok_or_else(|| CliError::NotFound(format!("notebook '{id}'")))?;

    let outcome = rt.block_on(async {
        let mut board = Board::new(&ctx.settings.dnd);
        let list = board.add_list(
            before.len(),
            Some(RowKind::Container),
            keys::TREE_NODE,
            Arc::new(NotebookZone::root(applier.clone())),
        )?;
        let item = DragItem::new(DragData::new().with(keys::TREE_NODE, TreeNode::Notebook(id.to_string())));
        let target = board.row_point(list, to, position);
        board.drag(item, list, from, target).await
    })?;
    ensure_accepted(outcome)?;

    let after = rt.block_on(applier.notebook_order())?;
    if after == before {
        println!("Notebook '{id}' is already in place.");
        return Ok(());
    }
    Workspace::from_services(&services).save(&ctx.workspace_path)?;
    println!("Notebook order: {}", after.join(", "));
    Ok(())
}
