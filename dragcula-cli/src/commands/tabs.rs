//! Tab strip commands.

use std::fmt::Write as _;
use std::sync::Arc;

use dragcula_core::{
    DragData, DragItem, DropPosition, RowKind, TabEntry, TabOrderApplier, canonical_order, keys,
};

use crate::cli::{OutputFormat, TabCommands};
use crate::commands::to_json;
use crate::error::CliError;
use crate::gesture::{Board, ensure_accepted};
use crate::util::{Context, runtime};
use crate::workspace::Workspace;

/// Tab command handler
pub fn cmd_tabs(ctx: &Context, subcmd: TabCommands) -> Result<(), CliError> {
    match subcmd {
        TabCommands::List { format } => cmd_list(ctx, format),
        TabCommands::Move { id, to, position } => cmd_move(ctx, &id, to, position),
    }
}

fn cmd_list(ctx: &Context, format: OutputFormat) -> Result<(), CliError> {
    let workspace = Workspace::load(&ctx.workspace_path)?;
    let tabs = canonical_order(&workspace.tabs);
    match format {
        OutputFormat::Table => println!("{}", format_table(&tabs)),
        OutputFormat::Json => println!("{}", to_json(&tabs)?),
    }
    Ok(())
}

/// Format tabs as a table string
#[must_use]
pub fn format_table(tabs: &[TabEntry]) -> String {
    if tabs.is_empty() {
        return "No tabs found.".to_string();
    }

    let id_width = tabs.iter().map(|t| t.id.len()).max().unwrap_or(2).max(2);
    let mut output = String::new();
    let _ = writeln!(output, "{:<4} {:<id_width$} PINNED", "ROW", "ID");
    let _ = writeln!(output, "{}", "-".repeat(4 + 1 + id_width + 1 + 6));
    for (row, tab) in tabs.iter().enumerate() {
        let pinned = if tab.pinned { "yes" } else { "" };
        let _ = writeln!(output, "{row:<4} {:<id_width$} {pinned}", tab.id);
    }
    output.trim_end().to_string()
}

fn cmd_move(ctx: &Context, id: &str, to: usize, position: DropPosition) -> Result<(), CliError> {
    let workspace = Workspace::load(&ctx.workspace_path)?;
    let strip = canonical_order(&workspace.tabs);
    let from = strip
        .iter()
        .position(|t| t.id == id)
        .ok_or_else(|| CliError::NotFound(format!("tab '{id}'")))?;

    let services = workspace.services();
    let applier = TabOrderApplier::new(services.tabs.clone());

    let outcome = runtime()?.block_on(async {
        let mut board = Board::new(&ctx.settings.dnd);
        let list = board.add_list(strip.len(), Some(RowKind::Leaf), keys::TAB, Arc::new(applier))?;
        let item = DragItem::new(DragData::new().with(keys::TAB, id.to_string()));
        let target = board.row_point(list, to, position);
        board.drag(item, list, from, target).await
    })?;
    ensure_accepted(outcome)?;

    let mutations = services.tabs.mutations();
    if mutations.is_empty() {
        println!("Tab '{id}' is already in place.");
        return Ok(());
    }
    Workspace::from_services(&services).save(&ctx.workspace_path)?;
    println!("Moved tab '{id}' ({}).", mutations.join(", "));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_table_marks_pinned() {
        let table = format_table(&[TabEntry::new("A", true), TabEntry::new("B", false)]);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[2].starts_with('0') && lines[2].ends_with("yes"));
        assert!(lines[3].contains('B') && !lines[3].contains("yes"));
    }

    #[test]
    fn test_format_table_empty() {
        assert_eq!(format_table(&[]), "No tabs found.");
    }
}
