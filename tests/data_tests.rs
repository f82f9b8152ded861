//! Integration tests for data loading and the grid-to-render-item path.

use std::io::Write;

use mapbars::data::{loader, DataGrid, DataItem, DataProxy, GridEvent};
use mapbars::render::{picking, AreaSpecs, RenderItemCache};
use mapbars::util::Vec2;

use tempfile::NamedTempFile;

fn item(value: f32, x: f32, y: f32) -> DataItem {
    DataItem::new(value, Vec2::new(x, y))
}

fn synced(grid: &mut DataGrid, area: AreaSpecs) -> RenderItemCache {
    let mut cache = RenderItemCache::new(area);
    cache.sync(grid);
    cache.rebuild_if_dirty(&*grid).expect("rebuild failed");
    cache
}

#[test]
fn test_load_file_skips_comments_and_bad_lines() {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    writeln!(file, "# year, month, value").unwrap();
    writeln!(file, "2001, jan, 10").unwrap();
    writeln!(file, "2001, feb, 20.5").unwrap();
    writeln!(file).unwrap();
    writeln!(file, "2002, jan, oops").unwrap();
    writeln!(file, "2002, feb").unwrap();
    writeln!(file, "2002, jan, 5").unwrap();
    file.flush().unwrap();

    let data = loader::load(file.path()).expect("Failed to load");
    assert_eq!(data.skipped, 2);
    assert_eq!(data.area, Vec2::new(2.0, 2.0));
    assert_eq!(data.grid.row_count(), 2);
    assert_eq!(data.grid.row_label(1), "2002");
    assert_eq!(data.grid.column_label(1), "feb");

    let feb = data.grid.item_at(0, 1).expect("item");
    assert_eq!(feb.value, 20.5);
    assert_eq!(feb.position, Vec2::new(1.5, 0.5));
    assert_eq!(data.grid.item_at(1, 0).map(|i| i.value), Some(5.0));
}

#[test]
fn test_load_missing_file_fails() {
    assert!(loader::load("/nonexistent/data.txt".as_ref()).is_err());
}

#[test]
fn test_demo_set_fills_area() {
    let mut data = loader::demo_rainfall();
    assert_eq!(data.area, Vec2::new(12.0, 13.0));
    let cache = synced(&mut data.grid, AreaSpecs::new(data.area.x, data.area.y));
    assert_eq!(cache.items().len(), 13 * 12);
    assert!(cache.items().iter().all(|i| i.valid));
    assert!(cache.limits().min == 0.0 && cache.limits().max > 0.0);
}

#[test]
fn test_items_flatten_in_row_order_with_identity_colors() {
    let mut grid = DataGrid::new();
    grid.add_row(Some(vec![item(1.0, 0.5, 0.5), item(2.0, 1.5, 0.5)]), Some("a".into()));
    grid.add_row(None, None);
    grid.add_row(Some(vec![item(4.0, 0.5, 2.5)]), Some("c".into()));

    let cache = synced(&mut grid, AreaSpecs::new(2.0, 3.0));
    let sources: Vec<_> = cache.items().iter().map(|i| i.source).collect();
    assert_eq!(sources, vec![(0, 0), (0, 1), (2, 0)]);
    for (i, item) in cache.items().iter().enumerate() {
        assert_eq!(item.index, i);
        assert_eq!(item.selection_color, picking::encode(i));
        assert_eq!(picking::decode(item.selection_color), Some(i));
    }

    let heights: Vec<f32> = cache.items().iter().map(|i| i.height).collect();
    assert_eq!(heights, vec![0.25, 0.5, 1.0]);
}

#[test]
fn test_negative_and_outside_items_are_invalid() {
    let mut grid = DataGrid::new();
    grid.add_row(
        Some(vec![item(3.0, 0.5, 0.5), item(-2.0, 1.5, 0.5), item(1.0, 9.0, 0.5)]),
        None,
    );
    let cache = synced(&mut grid, AreaSpecs::new(2.0, 1.0));
    let valid: Vec<bool> = cache.items().iter().map(|i| i.valid).collect();
    assert_eq!(valid, vec![true, false, false]);
    assert_eq!(cache.drawable().count(), 1);
    // Limits still see the negative value
    assert_eq!(cache.limits().min, -2.0);
}

#[test]
fn test_label_changes_do_not_dirty_cache() {
    let mut grid = DataGrid::new();
    grid.add_row(Some(vec![item(1.0, 0.5, 0.5)]), None);
    let mut cache = synced(&mut grid, AreaSpecs::default());
    assert!(!cache.is_dirty());

    grid.set_row_labels(vec!["only".into()]);
    grid.set_column_labels(vec!["x".into()]);
    cache.sync(&mut grid);
    assert!(!cache.is_dirty());
    assert!(grid.pending_events().is_empty());

    grid.set_item(0, 0, item(8.0, 0.5, 0.5)).unwrap();
    cache.sync(&mut grid);
    assert!(cache.is_dirty());
    assert_eq!(cache.limits().max, 8.0);
    // Items are still the old ones until the rebuild
    assert_eq!(cache.items()[0].value, 1.0);
    assert!(cache.rebuild_if_dirty(&grid).unwrap());
    assert_eq!(cache.items()[0].value, 8.0);
}

#[test]
fn test_grid_operations_queue_one_event_each() {
    let mut grid = DataGrid::new();
    grid.add_rows(vec![None, None, None], Some(vec!["a".into(), "b".into(), "c".into()]));
    grid.insert_row(1, Some(vec![item(1.0, 0.5, 0.5)]), Some("new".into())).unwrap();
    assert_eq!(grid.remove_rows(2, 10, true), 2);
    assert_eq!(grid.remove_rows(5, 1, true), 0);

    let events = grid.take_events();
    assert_eq!(
        events,
        vec![
            GridEvent::RowLabelsChanged,
            GridEvent::RowsAdded { start: 0, count: 3 },
            GridEvent::RowLabelsChanged,
            GridEvent::RowsInserted { start: 1, count: 1 },
            GridEvent::RowLabelsChanged,
            GridEvent::RowsRemoved { start: 2, count: 2 },
        ]
    );
    assert_eq!(grid.row_count(), 2);
    assert_eq!(grid.row_label(0), "a");
    assert_eq!(grid.row_label(1), "new");
    assert!(grid.take_events().is_empty());
}

#[test]
fn test_reset_to_empty_twice_queues_once() {
    let mut grid = DataGrid::new();
    assert!(!grid.clear());
    grid.add_row(Some(vec![item(1.0, 0.5, 0.5)]), None);
    grid.take_events();

    assert!(grid.clear());
    assert!(!grid.clear());
    assert_eq!(grid.take_events(), vec![GridEvent::Reset]);

    let mut cache = RenderItemCache::new(AreaSpecs::default());
    cache.sync(&mut grid);
    cache.rebuild_if_dirty(&grid).unwrap();
    assert!(cache.items().is_empty());
}

#[test]
fn test_set_area_rescales_items() {
    let mut grid = DataGrid::new();
    grid.add_row(Some(vec![item(1.0, 3.0, 0.5)]), None);
    let mut cache = synced(&mut grid, AreaSpecs::new(6.0, 1.0));
    let wide = cache.items()[0].translation;

    cache.set_area(AreaSpecs::new(12.0, 1.0));
    assert!(cache.is_dirty());
    cache.rebuild_if_dirty(&grid).unwrap();
    assert_ne!(cache.items()[0].translation, wide);
    assert_eq!(cache.scale_factor(), 4.0);
}
