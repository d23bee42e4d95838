//! Property-based tests for index-aware zone geometry
//!
//! Leaf rows never produce `On`, container rows have three bands, and list
//! hints always point at an existing row.

use dragcula_core::dnd::position::{
    calculate_drop_position, calculate_row_index, indicator_offset, landing_index,
    resolve_list_hint,
};
use dragcula_core::{DropConfig, DropPosition, RowKind};
use proptest::prelude::*;

fn row_kind_strategy() -> impl Strategy<Value = RowKind> {
    prop_oneof![Just(RowKind::Leaf), Just(RowKind::Container)]
}

fn position_strategy() -> impl Strategy<Value = DropPosition> {
    prop_oneof![
        Just(DropPosition::Before),
        Just(DropPosition::After),
        Just(DropPosition::On),
    ]
}

fn drop_config_strategy() -> impl Strategy<Value = DropConfig> {
    (16.0..64.0f64, 0.1..0.4f64).prop_map(|(row_height, drop_zone_ratio)| DropConfig {
        row_height,
        drop_zone_ratio,
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Leaf rows (tabs, notes) only ever report before/after
    #[test]
    fn prop_leaf_drop_position_is_before_or_after(
        y_ratio in 0.0..1.0f64,
        config in drop_config_strategy(),
    ) {
        let position = calculate_drop_position(y_ratio * config.row_height, RowKind::Leaf, &config);
        prop_assert!(
            position == DropPosition::Before || position == DropPosition::After,
            "leaf row produced {:?}",
            position
        );
    }

    /// Calculated positions are always valid for the row kind
    #[test]
    fn prop_drop_position_validity_is_consistent(
        y_ratio in 0.0..1.0f64,
        kind in row_kind_strategy(),
        config in drop_config_strategy(),
    ) {
        let position = calculate_drop_position(y_ratio * config.row_height, kind, &config);
        prop_assert!(kind.allows(position));
    }

    /// Line indicators sit on row boundaries; `On` draws none
    #[test]
    fn prop_indicator_is_at_row_boundary(
        row in 0usize..100,
        config in drop_config_strategy(),
    ) {
        let before = indicator_offset(row, DropPosition::Before, &config).unwrap();
        let after = indicator_offset(row, DropPosition::After, &config).unwrap();
        prop_assert!((before - row as f64 * config.row_height).abs() < 0.001);
        prop_assert!((after - before - config.row_height).abs() < 0.001);
        prop_assert!(indicator_offset(row, DropPosition::On, &config).is_none());
    }

    /// The line for `After` on one row is the line for `Before` on the next
    #[test]
    fn prop_adjacent_gaps_share_a_line(
        row in 0usize..99,
        config in drop_config_strategy(),
    ) {
        let after = indicator_offset(row, DropPosition::After, &config).unwrap();
        let next = indicator_offset(row + 1, DropPosition::Before, &config).unwrap();
        prop_assert!((after - next).abs() < 0.001);
    }

    #[test]
    fn prop_row_index_is_floor(
        y in 0.0..3200.0f64,
        config in drop_config_strategy(),
    ) {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let expected = (y / config.row_height) as u32;
        prop_assert_eq!(calculate_row_index(y, &config), expected);
    }

    /// Container rows: edges are before/after, the middle is `On`
    #[test]
    fn prop_container_has_three_bands(config in drop_config_strategy()) {
        let band = config.row_height * config.drop_zone_ratio;
        prop_assert_eq!(
            calculate_drop_position(band * 0.5, RowKind::Container, &config),
            DropPosition::Before
        );
        prop_assert_eq!(
            calculate_drop_position(config.row_height / 2.0, RowKind::Container, &config),
            DropPosition::On
        );
        prop_assert_eq!(
            calculate_drop_position(config.row_height - band * 0.5, RowKind::Container, &config),
            DropPosition::After
        );
    }

    /// List hints always name an existing row, even far below the list
    #[test]
    fn prop_list_hint_stays_in_range(
        y in -100.0..5000.0f64,
        rows in 1usize..50,
        kind in row_kind_strategy(),
        config in drop_config_strategy(),
    ) {
        let (row, position) = resolve_list_hint(y, rows, kind, &config);
        prop_assert!(row < rows);
        prop_assert!(kind.allows(position));
    }

    /// Landing indexes stay within the list the entry was taken from
    #[test]
    fn prop_landing_index_in_range(
        len in 1usize..40,
        row_seed in any::<usize>(),
        current_seed in any::<usize>(),
        position in position_strategy(),
    ) {
        let row = row_seed % len;
        let current = current_seed % len;
        prop_assert!(landing_index(row, position, current) < len);
    }
}
