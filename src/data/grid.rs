//! Sparse row-structured data grid with queued change notifications.

use super::events::GridEvent;
use super::item::{DataArray, DataItem, DataRow};
use super::labels::fix_row_labels;
use crate::util::{Error, Result};

/// Value range over a sub-range of the grid. Always contains zero.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Limits {
    pub min: f32,
    pub max: f32,
}

impl Limits {
    /// Divisor mapping values into [-1, 1].
    pub fn height_normalizer(&self) -> f32 {
        self.min.abs().max(self.max.abs())
    }

    /// Vertical offset that fits the rendered range into the scene band.
    pub fn y_adjustment(&self) -> f32 {
        let normalizer = self.height_normalizer();
        if normalizer == 0.0 {
            2.0
        } else {
            2.0 - (self.max - self.min) / normalizer
        }
    }

    pub fn contains(&self, value: f32) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Read access the render cache needs from a data source.
pub trait DataProxy {
    /// Current rows, absent rows included.
    fn array(&self) -> &DataArray;
    /// Drain queued change notifications in emission order.
    fn take_events(&mut self) -> Vec<GridEvent>;
    /// Value limits over the whole array.
    fn limits(&self) -> Limits;
    fn row_labels(&self) -> &[String];
    fn column_labels(&self) -> &[String];
}

/// Owned grid of optional rows plus row/column labels.
///
/// Label arrays may be shorter than the grid; missing entries read as empty.
/// They are only shifted alongside rows when an operation asks for it.
#[derive(Debug, Default)]
pub struct DataGrid {
    rows: DataArray,
    row_labels: Vec<String>,
    column_labels: Vec<String>,
    events: Vec<GridEvent>,
}

impl DataGrid {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a grid from rows without queuing any notification.
    pub fn from_rows(rows: DataArray) -> Self {
        Self {
            rows,
            ..Self::default()
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row_at(&self, index: usize) -> Option<&DataRow> {
        self.rows.get(index).and_then(|r| r.as_ref())
    }

    pub fn item_at(&self, row: usize, column: usize) -> Option<&DataItem> {
        self.row_at(row).and_then(|r| r.get(column))
    }

    pub fn rows(&self) -> &DataArray {
        &self.rows
    }

    pub fn row_label(&self, index: usize) -> &str {
        self.row_labels.get(index).map(String::as_str).unwrap_or("")
    }

    pub fn column_label(&self, index: usize) -> &str {
        self.column_labels.get(index).map(String::as_str).unwrap_or("")
    }

    /// Notifications queued since the last drain, oldest first.
    pub fn pending_events(&self) -> &[GridEvent] {
        &self.events
    }

    fn emit(&mut self, event: GridEvent) {
        tracing::trace!(event = event.name(), "grid change");
        self.events.push(event);
    }

    /// Replace the whole array. `None` clears it.
    ///
    /// Labels are applied first. Returns false, and queues no reset, when
    /// both the old and the new array are empty.
    pub fn reset_array(
        &mut self,
        rows: Option<DataArray>,
        row_labels: Option<Vec<String>>,
        column_labels: Option<Vec<String>>,
    ) -> bool {
        if let Some(labels) = row_labels {
            self.set_row_labels(labels);
        }
        if let Some(labels) = column_labels {
            self.set_column_labels(labels);
        }

        let new_empty = rows.as_ref().map_or(true, |r| r.is_empty());
        if self.rows.is_empty() && new_empty {
            return false;
        }

        // Old rows go away before the new ones are installed
        self.rows.clear();
        self.rows = rows.unwrap_or_default();
        self.emit(GridEvent::Reset);
        true
    }

    /// Remove every row. Same notification rule as [`reset_array`](Self::reset_array).
    pub fn clear(&mut self) -> bool {
        self.reset_array(None, None, None)
    }

    /// Replace the row at `index`. Indices past the end grow the grid with
    /// absent rows.
    pub fn set_row(&mut self, index: usize, row: Option<DataRow>, label: Option<String>) {
        if let Some(label) = label {
            self.fix_labels(index, 1, &[label], false);
        }
        if index >= self.rows.len() {
            self.rows.resize_with(index + 1, || None);
        }
        self.rows[index] = row;
        self.emit(GridEvent::RowsChanged { start: index, count: 1 });
    }

    /// Replace consecutive rows starting at `index`, growing the grid as needed.
    pub fn set_rows(&mut self, index: usize, rows: DataArray, labels: Option<Vec<String>>) {
        let count = rows.len();
        if let Some(labels) = labels {
            self.fix_labels(index, count, &labels, false);
        }
        if index + count > self.rows.len() {
            self.rows.resize_with(index + count, || None);
        }
        for (offset, row) in rows.into_iter().enumerate() {
            self.rows[index + offset] = row;
        }
        self.emit(GridEvent::RowsChanged { start: index, count });
    }

    /// Replace one item of an existing row.
    pub fn set_item(&mut self, row: usize, column: usize, item: DataItem) -> Result<()> {
        let count = self.rows.len();
        let slot = self
            .rows
            .get_mut(row)
            .ok_or(Error::RowOutOfBounds { index: row, count })?;
        let items = slot.as_mut().ok_or(Error::MissingRow(row))?;
        let columns = items.len();
        let target = items.get_mut(column).ok_or(Error::ColumnOutOfBounds {
            row,
            index: column,
            count: columns,
        })?;
        *target = item;
        self.emit(GridEvent::ItemChanged { row, column });
        Ok(())
    }

    /// Append a row, returning its index.
    pub fn add_row(&mut self, row: Option<DataRow>, label: Option<String>) -> usize {
        let start = self.rows.len();
        if let Some(label) = label {
            self.fix_labels(start, 1, &[label], false);
        }
        self.rows.push(row);
        self.emit(GridEvent::RowsAdded { start, count: 1 });
        start
    }

    /// Append rows, returning the index of the first one.
    pub fn add_rows(&mut self, rows: DataArray, labels: Option<Vec<String>>) -> usize {
        let start = self.rows.len();
        let count = rows.len();
        if let Some(labels) = labels {
            self.fix_labels(start, count, &labels, false);
        }
        self.rows.extend(rows);
        self.emit(GridEvent::RowsAdded { start, count });
        start
    }

    /// Insert a row before `index` (`index == row_count()` appends).
    pub fn insert_row(&mut self, index: usize, row: Option<DataRow>, label: Option<String>) -> Result<()> {
        self.check_insert_index(index)?;
        if let Some(label) = label {
            self.fix_labels(index, 1, &[label], true);
        }
        self.rows.insert(index, row);
        self.emit(GridEvent::RowsInserted { start: index, count: 1 });
        Ok(())
    }

    pub fn insert_rows(&mut self, index: usize, rows: DataArray, labels: Option<Vec<String>>) -> Result<()> {
        self.check_insert_index(index)?;
        let count = rows.len();
        if let Some(labels) = labels {
            self.fix_labels(index, count, &labels, true);
        }
        self.rows.splice(index..index, rows);
        self.emit(GridEvent::RowsInserted { start: index, count });
        Ok(())
    }

    /// Remove up to `count` rows starting at `index`.
    ///
    /// Does nothing for an index past the end or a zero count. The count is
    /// clamped to the rows that exist. Returns the number of rows removed.
    pub fn remove_rows(&mut self, index: usize, count: usize, remove_labels: bool) -> usize {
        if index >= self.rows.len() || count < 1 {
            return 0;
        }
        let count = count.min(self.rows.len() - index);
        self.rows.drain(index..index + count);

        if remove_labels && self.row_labels.len() > index {
            let end = (index + count).min(self.row_labels.len());
            self.row_labels.drain(index..end);
            self.emit(GridEvent::RowLabelsChanged);
        }

        self.emit(GridEvent::RowsRemoved { start: index, count });
        count
    }

    pub fn set_row_labels(&mut self, labels: Vec<String>) {
        if self.row_labels != labels {
            self.row_labels = labels;
            self.emit(GridEvent::RowLabelsChanged);
        }
    }

    pub fn set_column_labels(&mut self, labels: Vec<String>) {
        if self.column_labels != labels {
            self.column_labels = labels;
            self.emit(GridEvent::ColumnLabelsChanged);
        }
    }

    /// Min/max over rows `start_row..=end_row` and columns
    /// `start_column..=end_column`, clamped to existing data.
    ///
    /// Seeds (0, 0) and only widens, so the result always contains zero.
    pub fn limit_values(&self, start_row: usize, end_row: usize, start_column: usize, end_column: usize) -> Limits {
        let mut limits = Limits::default();
        if self.rows.is_empty() {
            return limits;
        }
        let end_row = end_row.min(self.rows.len() - 1);

        for row in self.rows.iter().take(end_row + 1).skip(start_row).flatten() {
            if row.is_empty() {
                continue;
            }
            let last_column = end_column.min(row.len() - 1);
            for item in row.iter().take(last_column + 1).skip(start_column) {
                limits.max = limits.max.max(item.value);
                limits.min = limits.min.min(item.value);
            }
        }
        limits
    }

    fn check_insert_index(&self, index: usize) -> Result<()> {
        if index > self.rows.len() {
            return Err(Error::RowOutOfBounds {
                index,
                count: self.rows.len(),
            });
        }
        Ok(())
    }

    fn fix_labels(&mut self, start: usize, count: usize, labels: &[String], is_insert: bool) {
        if fix_row_labels(&mut self.row_labels, start, count, labels, is_insert) {
            self.emit(GridEvent::RowLabelsChanged);
        }
    }
}

impl DataProxy for DataGrid {
    fn array(&self) -> &DataArray {
        &self.rows
    }

    fn take_events(&mut self) -> Vec<GridEvent> {
        std::mem::take(&mut self.events)
    }

    fn limits(&self) -> Limits {
        self.limit_values(0, usize::MAX, 0, usize::MAX)
    }

    fn row_labels(&self) -> &[String] {
        &self.row_labels
    }

    fn column_labels(&self) -> &[String] {
        &self.column_labels
    }
}
