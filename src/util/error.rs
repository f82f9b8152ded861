//! Error types for the mapbars engine.

use thiserror::Error;

/// Main error type for mapbars operations.
#[derive(Error, Debug)]
pub enum Error {
    /// More render items than the 24-bit picking color space can address
    #[error("Too many render items for picking: {count} (max {max})")]
    TooManyItems { count: usize, max: usize },

    /// Row index out of bounds
    #[error("Row index {index} out of bounds (count: {count})")]
    RowOutOfBounds { index: usize, count: usize },

    /// Column index out of bounds
    #[error("Column index {index} out of bounds in row {row} (count: {count})")]
    ColumnOutOfBounds { row: usize, index: usize, count: usize },

    /// Row slot exists but holds no row
    #[error("Row {0} is absent")]
    MissingRow(usize),

    /// GPU resource could not be allocated
    #[error("Allocation failed: {0}")]
    AllocationFailed(String),

    /// Mesh identifier not known to the mesh provider
    #[error("Mesh not found: {0}")]
    MeshNotFound(String),

    /// Shader program could not be created
    #[error("Shader program failed: {0}")]
    Program(String),

    /// Malformed line in a data file
    #[error("Invalid data row {line}: {text:?}")]
    InvalidRow { line: usize, text: String },

    /// A frame was started while another one is still open
    #[error("Render pipeline re-entered while a frame is in progress")]
    Reentrant,

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Settings (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an "other" error from a string.
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// Create an allocation failure error.
    pub fn allocation(what: impl Into<String>) -> Self {
        Self::AllocationFailed(what.into())
    }

    /// Whether the error must stop rendering instead of degrading.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::TooManyItems { .. } | Self::Reentrant)
    }
}

/// Result type alias for mapbars operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let e = Error::RowOutOfBounds { index: 5, count: 3 };
        assert!(e.to_string().contains("5"));
        assert!(e.to_string().contains("3"));

        let e = Error::TooManyItems { count: 20_000_000, max: 16_777_215 };
        assert!(e.to_string().contains("20000000"));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "test");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_fatal_classification() {
        assert!(Error::TooManyItems { count: 1, max: 0 }.is_fatal());
        assert!(!Error::allocation("depth target").is_fatal());
        assert!(!Error::MissingRow(2).is_fatal());
    }
}
