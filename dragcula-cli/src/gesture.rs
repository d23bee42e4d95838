//! Simulated drag gestures
//!
//! Each list a command touches is laid out as a column of rows on an
//! element tree and registered as a zone. A move is then a real custom drag:
//! `start_drag` on the source row, `release` over the target row.

use std::sync::Arc;

use dragcula_core::{
    DndSettings, DragItem, Dragcula, DropOutcome, DropPosition, ElementTree, Modifiers, Point,
    Rect, RowKind, ZoneKey, ZoneListener, ZoneOptions,
};

use crate::error::CliError;

const LIST_WIDTH: f64 = 240.0;

/// Handle of a list placed on a [`Board`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListId(usize);

struct PlacedList {
    zone: ZoneKey,
    top: f64,
    rows: usize,
}

/// Lists stacked vertically, one row of spacing between them
pub struct Board {
    dnd: Dragcula,
    lists: Vec<PlacedList>,
    next_top: f64,
}

impl Board {
    /// Creates an empty board
    pub fn new(settings: &DndSettings) -> Self {
        Self {
            dnd: Dragcula::new(ElementTree::new(), settings.clone()),
            lists: Vec::new(),
            next_top: 0.0,
        }
    }

    fn row_height(&self) -> f64 {
        self.dnd.settings().row_height
    }

    /// Places a list of `rows` rows accepting payloads that carry `key`
    ///
    /// With `kind: None` the zone has no row layout, so drops carry no
    /// index hint.
    pub fn add_list(
        &mut self,
        rows: usize,
        kind: Option<RowKind>,
        key: &'static str,
        listener: Arc<dyn ZoneListener>,
    ) -> Result<ListId, CliError> {
        let height = self.row_height();
        let top = self.next_top;
        #[allow(clippy::cast_precision_loss)]
        let bounds = Rect::new(0.0, top, LIST_WIDTH, rows.max(1) as f64 * height);
        let element = self.dnd.with_surface(|tree| tree.insert(None, bounds));

        let mut options = ZoneOptions::new().accepts_key(key);
        if let Some(kind) = kind {
            options = options.list(rows, kind);
        }
        let zone = self.dnd.register_zone(element, options, listener)?;

        self.next_top = top + bounds.height + height;
        self.lists.push(PlacedList { zone, top, rows });
        Ok(ListId(self.lists.len() - 1))
    }

    /// Point inside `row` of `list` that resolves to `position`
    ///
    /// Rows past the end are clamped to the last row.
    pub fn row_point(&self, list: ListId, row: usize, position: DropPosition) -> Point {
        let placed = &self.lists[list.0];
        let settings = self.dnd.settings();
        let height = settings.row_height;
        let edge = height * settings.drop_zone_ratio / 2.0;
        let offset = match position {
            DropPosition::Before => edge,
            DropPosition::On => height / 2.0,
            DropPosition::After => height - edge,
        };
        #[allow(clippy::cast_precision_loss)]
        let row_top = placed.top + row.min(placed.rows.saturating_sub(1)) as f64 * height;
        Point::new(LIST_WIDTH / 2.0, row_top + offset)
    }

    /// Drags `item` from `row` of `source` and releases it at `to`
    pub async fn drag(
        &self,
        item: DragItem,
        source: ListId,
        row: usize,
        to: Point,
    ) -> Result<DropOutcome, CliError> {
        let start = self.row_point(source, row, DropPosition::On);
        let zone = self.lists[source.0].zone;
        let id = self.dnd.start_drag(item, Some(zone), start, Modifiers::NONE)?;
        tracing::debug!(operation_id = %id, x = to.x, y = to.y, "Releasing simulated drag");
        Ok(self.dnd.release(to, Modifiers::NONE).await)
    }
}

/// Turns anything but an accepted drop into an error
pub fn ensure_accepted(outcome: DropOutcome) -> Result<(), CliError> {
    match outcome {
        DropOutcome::Accepted(_) => Ok(()),
        DropOutcome::Rejected(_, reason) => {
            Err(CliError::DropRejected(format!("target zone refused the drop ({reason:?})")))
        }
        DropOutcome::NoTarget => Err(CliError::DropRejected(
            "no accepting zone under the pointer".to_string(),
        )),
        DropOutcome::NoOperation | DropOutcome::Ignored => Err(CliError::DropRejected(
            "drag ended before the drop".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dragcula_core::InertZone;
    use dragcula_core::keys;

    #[test]
    fn test_lists_do_not_overlap() {
        let mut board = Board::new(&DndSettings::default());
        let a = board.add_list(3, Some(RowKind::Leaf), keys::TAB, Arc::new(InertZone)).unwrap();
        let b = board.add_list(2, None, keys::TAB, Arc::new(InertZone)).unwrap();
        let last_of_a = board.row_point(a, 2, DropPosition::After);
        let first_of_b = board.row_point(b, 0, DropPosition::Before);
        assert!(last_of_a.y < 96.0);
        assert!(first_of_b.y > 128.0);
    }

    #[test]
    fn test_row_point_clamps_to_last_row() {
        let mut board = Board::new(&DndSettings::default());
        let a = board.add_list(2, Some(RowKind::Leaf), keys::TAB, Arc::new(InertZone)).unwrap();
        assert_eq!(
            board.row_point(a, 10, DropPosition::Before),
            board.row_point(a, 1, DropPosition::Before)
        );
    }

    #[tokio::test]
    async fn test_inert_target_is_rejected() {
        let mut board = Board::new(&DndSettings::default());
        let a = board.add_list(2, Some(RowKind::Leaf), keys::TAB, Arc::new(InertZone)).unwrap();
        let item = DragItem::new(dragcula_core::DragData::new().with(keys::TAB, "A".to_string()));
        let to = board.row_point(a, 1, DropPosition::After);
        let outcome = board.drag(item, a, 0, to).await.unwrap();
        assert!(matches!(ensure_accepted(outcome), Err(CliError::DropRejected(_))));
    }
}
