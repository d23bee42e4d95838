//! Drop position model for index-aware zones
//!
//! Pure geometry: given a pointer offset within a list of rows, work out
//! which row is hovered and whether the drop lands before, after or on it.

use serde::{Deserialize, Serialize};

/// Drop position relative to the hovered element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DropPosition {
    /// Drop before the element (line indicator above)
    Before,
    /// Drop after the element (line indicator below)
    After,
    /// Drop onto the element (containers only)
    On,
}

impl std::fmt::Display for DropPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Before => write!(f, "before"),
            Self::After => write!(f, "after"),
            Self::On => write!(f, "on"),
        }
    }
}

impl std::str::FromStr for DropPosition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "before" => Ok(Self::Before),
            "after" => Ok(Self::After),
            "on" => Ok(Self::On),
            other => Err(format!("unknown drop position '{other}'")),
        }
    }
}

/// Kind of row an index-aware zone lays out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RowKind {
    /// Plain entries (tabs, notes): before/after only
    #[default]
    Leaf,
    /// Rows that can receive drops onto themselves (notebooks)
    Container,
}

impl RowKind {
    /// Returns true if a drop `position` makes sense on this kind of row
    #[must_use]
    pub const fn allows(self, position: DropPosition) -> bool {
        !matches!((self, position), (Self::Leaf, DropPosition::On))
    }
}

/// Drop effect negotiated between a drag source and a zone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DropEffect {
    /// Copy the payload
    Copy,
    /// Move the payload
    Move,
    /// Link to the payload
    Link,
}

/// Row geometry used for drop position calculation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DropConfig {
    /// Height of each row in pixels
    pub row_height: f64,
    /// Ratio of row height for before/after bands on container rows
    pub drop_zone_ratio: f64,
}

impl Default for DropConfig {
    fn default() -> Self {
        Self {
            row_height: 32.0,
            drop_zone_ratio: 0.25,
        }
    }
}

/// Calculates the drop position based on the offset within a row
///
/// Container rows are split into three bands (`Before` / `On` / `After`),
/// leaf rows into two halves (`Before` / `After`).
#[must_use]
pub fn calculate_drop_position(y_in_row: f64, kind: RowKind, config: &DropConfig) -> DropPosition {
    let band = config.row_height * config.drop_zone_ratio;

    match kind {
        RowKind::Container => {
            if y_in_row < band {
                DropPosition::Before
            } else if y_in_row > config.row_height - band {
                DropPosition::After
            } else {
                DropPosition::On
            }
        }
        RowKind::Leaf => {
            if y_in_row < config.row_height / 2.0 {
                DropPosition::Before
            } else {
                DropPosition::After
            }
        }
    }
}

/// Calculates which row index is at a given offset
#[must_use]
pub fn calculate_row_index(y: f64, config: &DropConfig) -> u32 {
    if y <= 0.0 {
        return 0;
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let index = (y / config.row_height) as u32;
    index
}

/// Offset of the insertion line for a hint, from the top of the list
///
/// The line sits on the boundary above `Before` rows and below `After`
/// rows. `On` highlights the row instead, so there is no line.
#[must_use]
pub fn indicator_offset(row: usize, position: DropPosition, config: &DropConfig) -> Option<f64> {
    #[allow(clippy::cast_precision_loss)]
    let top = row as f64 * config.row_height;
    match position {
        DropPosition::Before => Some(top),
        DropPosition::After => Some(top + config.row_height),
        DropPosition::On => None,
    }
}

/// Resolves an offset within a list into an `(index, position)` hint
///
/// The index is clamped to `row_count` so that dropping below the last row
/// lands after it. An empty list always yields `(0, Before)`.
#[must_use]
pub fn resolve_list_hint(
    y: f64,
    row_count: usize,
    kind: RowKind,
    config: &DropConfig,
) -> (usize, DropPosition) {
    if row_count == 0 {
        return (0, DropPosition::Before);
    }
    let row = calculate_row_index(y, config) as usize;
    if row >= row_count {
        return (row_count - 1, DropPosition::After);
    }
    #[allow(clippy::cast_precision_loss)]
    let y_in_row = config.row_height.mul_add(-(row as f64), y.max(0.0));
    (row, calculate_drop_position(y_in_row, kind, config))
}

/// Converts a hovered-row hint into the final index of a moved entry
///
/// `row` is the row under the pointer and `current` the entry's index before
/// the move. The entry is spliced out first, so rows below it shift up by one.
#[must_use]
pub const fn landing_index(row: usize, position: DropPosition, current: usize) -> usize {
    let after = matches!(position, DropPosition::After);
    if row < current {
        if after { row + 1 } else { row }
    } else if row > current {
        if after { row } else { row - 1 }
    } else {
        current
    }
}
