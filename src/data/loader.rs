//! Plain-text data loading.
//!
//! One item per line: `row_key, column_key, value`. Lines starting with `#`
//! are comments. Row and column keys become categories in first-seen order;
//! each item sits at the center of its cell.

use std::collections::HashMap;
use std::path::Path;

use super::grid::DataGrid;
use super::item::{DataArray, DataItem};
use crate::util::{Error, Result, Vec2};

/// Grid built from a data file plus the area it covers.
#[derive(Debug)]
pub struct LoadedData {
    pub grid: DataGrid,
    /// Area size in cells: (columns, rows)
    pub area: Vec2,
    /// Lines that were rejected
    pub skipped: usize,
}

/// Parse one line into `(row_key, column_key, value)`.
pub fn parse_line(line_no: usize, line: &str) -> Result<(String, String, f32)> {
    let fields: Vec<&str> = line.split(',').map(str::trim).filter(|f| !f.is_empty()).collect();
    let invalid = || Error::InvalidRow {
        line: line_no,
        text: line.to_string(),
    };
    if fields.len() < 3 {
        return Err(invalid());
    }
    let value = fields[2].parse::<f32>().map_err(|_| invalid())?;
    Ok((fields[0].to_string(), fields[1].to_string(), value))
}

/// Build a grid from text. Invalid lines are logged and skipped.
pub fn parse_str(text: &str) -> LoadedData {
    let mut row_keys: Vec<String> = Vec::new();
    let mut column_keys: Vec<String> = Vec::new();
    let mut row_index: HashMap<String, usize> = HashMap::new();
    let mut column_index: HashMap<String, usize> = HashMap::new();
    let mut cells: Vec<(usize, usize, f32)> = Vec::new();
    let mut skipped = 0;

    for (i, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let (row_key, column_key, value) = match parse_line(i + 1, trimmed) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("Invalid row read from data: {}", e);
                skipped += 1;
                continue;
            }
        };
        let row = *row_index.entry(row_key.clone()).or_insert_with(|| {
            row_keys.push(row_key);
            row_keys.len() - 1
        });
        let column = *column_index.entry(column_key.clone()).or_insert_with(|| {
            column_keys.push(column_key);
            column_keys.len() - 1
        });
        cells.push((row, column, value));
    }

    let mut rows: DataArray = vec![None; row_keys.len()];
    for (row, column, value) in cells {
        let items = rows[row].get_or_insert_with(Vec::new);
        if items.len() <= column {
            items.resize_with(column + 1, DataItem::default);
        }
        items[column] = DataItem::new(value, Vec2::new(column as f32 + 0.5, row as f32 + 0.5))
            .with_label(format!("{} {}: {}", row_keys[row], column_keys[column], value));
    }

    // Cells with no data still need a position inside the area
    for (r, row) in rows.iter_mut().enumerate() {
        if let Some(items) = row {
            for (c, item) in items.iter_mut().enumerate() {
                if item.label.is_empty() {
                    item.position = Vec2::new(c as f32 + 0.5, r as f32 + 0.5);
                }
            }
        }
    }

    let area = Vec2::new(column_keys.len() as f32, row_keys.len() as f32);
    let mut grid = DataGrid::new();
    grid.reset_array(Some(rows), Some(row_keys), Some(column_keys));
    tracing::debug!(rows = grid.row_count(), skipped, "parsed data");

    LoadedData { grid, area, skipped }
}

/// Load a data file from disk.
pub fn load(path: &Path) -> Result<LoadedData> {
    let text = std::fs::read_to_string(path)?;
    let data = parse_str(&text);
    tracing::info!(
        "Loaded {} ({} rows, {} skipped)",
        path.display(),
        data.grid.row_count(),
        data.skipped
    );
    Ok(data)
}

/// Monthly rainfall style demo set: 13 years by 12 months.
pub fn demo_rainfall() -> LoadedData {
    let mut text = String::from("# year, month, rainfall (mm)\n");
    for (y, year) in (2000..=2012).enumerate() {
        for month in 1..=12u32 {
            // Deterministic seasonal curve with a per-year wobble
            let season = ((month as f32 - 1.0) / 12.0 * std::f32::consts::TAU).cos();
            let wobble = ((y as f32 * 7.3 + month as f32 * 3.1).sin() + 1.0) * 12.0;
            let value = (45.0 - season * 25.0 + wobble).round();
            text.push_str(&format!("{year}, {month}, {value}\n"));
        }
    }
    parse_str(&text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::DataProxy;

    #[test]
    fn test_parse_line() {
        let (r, c, v) = parse_line(1, "2001, 3, 42.5").unwrap();
        assert_eq!((r.as_str(), c.as_str(), v), ("2001", "3", 42.5));
        assert!(matches!(parse_line(7, "2001, 3"), Err(Error::InvalidRow { line: 7, .. })));
        assert!(parse_line(2, "2001, 3, lots").is_err());
    }

    #[test]
    fn test_parse_str_skips_invalid() {
        let data = parse_str("# comment\n2000, 1, 10\nbroken\n2000, 2, 20\n2001, 1, 5\n");
        assert_eq!(data.skipped, 1);
        assert_eq!(data.grid.row_count(), 2);
        assert_eq!(data.area, Vec2::new(2.0, 2.0));
        assert_eq!(data.grid.row_labels(), ["2000".to_string(), "2001".to_string()]);

        let item = data.grid.item_at(0, 1).unwrap();
        assert_eq!(item.value, 20.0);
        assert_eq!(item.position, Vec2::new(1.5, 0.5));
        assert_eq!(data.grid.row_at(1).map(|r| r.len()), Some(1));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rain.txt");
        std::fs::write(&path, "2000, 1, 10\n2000, 2, 30\n").unwrap();
        let data = load(&path).unwrap();
        assert_eq!(data.grid.limits().max, 30.0);

        assert!(matches!(load(&dir.path().join("missing.txt")), Err(Error::Io(_))));
    }

    #[test]
    fn test_demo_rainfall_shape() {
        let data = demo_rainfall();
        assert_eq!(data.grid.row_count(), 13);
        assert_eq!(data.area, Vec2::new(12.0, 13.0));
        assert_eq!(data.skipped, 0);
        assert!(data.grid.limits().min >= 0.0);
    }
}
