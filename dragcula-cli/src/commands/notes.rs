//! Note commands.

use std::sync::Arc;

use dragcula_core::{DragData, DragItem, DropPosition, NotebookZone, RowKind, TreeNode, keys};

use crate::cli::NoteCommands;
use crate::commands::notebooks::tree_applier;
use crate::error::CliError;
use crate::gesture::{Board, ensure_accepted};
use crate::util::{Context, runtime};
use crate::workspace::Workspace;

/// Note command handler
pub fn cmd_notes(ctx: &Context, subcmd: NoteCommands) -> Result<(), CliError> {
    match subcmd {
        NoteCommands::Move {
            id,
            notebook,
            to,
            position,
        } => cmd_move(ctx, &id, &notebook, to, position),
    }
}

fn cmd_move(
    ctx: &Context,
    id: &str,
    notebook: &str,
    to: Option<usize>,
    position: DropPosition,
) -> Result<(), CliError> {
    let workspace = Workspace::load(&ctx.workspace_path)?;
    if !workspace.notebooks.iter().any(|nb| nb.id == notebook) {
        return Err(CliError::NotFound(format!("notebook '{notebook}'")));
    }
    let services = workspace.services();
    let applier = tree_applier(&services);
    let rt = runtime()?;

    let owner = rt
        .block_on(applier.find_note_owner(id))?
        .ok_or_else(|| CliError::NotFound(format!("note '{id}'")))?;
    if owner == notebook && to.is_none() {
        println!("Note '{id}' is already in '{notebook}'.");
        return Ok(());
    }
    let source_order = rt.block_on(applier.note_order(&owner))?;
    let target_before = rt.block_on(applier.note_order(notebook))?;
    let from = source_order.iter().position(|n| n == id).unwrap_or_default();

    let outcome = rt.block_on(async {
        let mut board = Board::new(&ctx.settings.dnd);
        let source = board.add_list(
            source_order.len(),
            Some(RowKind::Leaf),
            keys::TREE_NODE,
            Arc::new(NotebookZone::notes(applier.clone(), owner.clone())),
        )?;
        let target = if owner == notebook {
            source
        } else {
            board.add_list(
                target_before.len(),
                to.map(|_| RowKind::Leaf),
                keys::TREE_NODE,
                Arc::new(NotebookZone::notes(applier.clone(), notebook)),
            )?
        };
        let point = match to {
            Some(row) => board.row_point(target, row, position),
            None => board.row_point(target, 0, DropPosition::On),
        };
        let item = DragItem::new(DragData::new().with(keys::TREE_NODE, TreeNode::Note(id.to_string())));
        board.drag(item, source, from, point).await
    })?;
    ensure_accepted(outcome)?;

    let target_after = rt.block_on(applier.note_order(notebook))?;
    let moved = rt.block_on(applier.find_note_owner(id))?.as_deref() == Some(notebook);
    if !moved || (owner == notebook && target_after == target_before) {
        println!("Note '{id}' was not moved.");
        return Ok(());
    }
    Workspace::from_services(&services).save(&ctx.workspace_path)?;
    println!("Notes in '{notebook}': {}", target_after.join(", "));
    Ok(())
}
