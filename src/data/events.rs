//! Change notifications emitted by [`DataGrid`](super::DataGrid).

/// One queued change. Each mutating grid operation queues exactly one
/// structural event; label updates queue their own events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridEvent {
    /// The whole array was replaced or cleared
    Reset,
    RowsAdded { start: usize, count: usize },
    RowsChanged { start: usize, count: usize },
    RowsRemoved { start: usize, count: usize },
    RowsInserted { start: usize, count: usize },
    ItemChanged { row: usize, column: usize },
    RowLabelsChanged,
    ColumnLabelsChanged,
}

impl GridEvent {
    /// Events that change the values or layout of the rendered items.
    pub fn is_structural(&self) -> bool {
        !matches!(self, Self::RowLabelsChanged | Self::ColumnLabelsChanged)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Reset => "reset",
            Self::RowsAdded { .. } => "rowsAdded",
            Self::RowsChanged { .. } => "rowsChanged",
            Self::RowsRemoved { .. } => "rowsRemoved",
            Self::RowsInserted { .. } => "rowsInserted",
            Self::ItemChanged { .. } => "itemChanged",
            Self::RowLabelsChanged => "rowLabelsChanged",
            Self::ColumnLabelsChanged => "columnLabelsChanged",
        }
    }
}
