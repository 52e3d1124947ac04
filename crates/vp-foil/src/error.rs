//! Geometry and curve errors.

use thiserror::Error;

/// Result type for foil operations.
pub type FoilResult<T> = Result<T, FoilError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FoilError {
    /// Coordinate file could not be parsed.
    #[error("Parse error on line {line}: {message}")]
    Parse { line: usize, message: String },

    /// Geometry is structurally unusable.
    #[error("Invalid geometry: {what}")]
    InvalidGeometry { what: &'static str },

    /// Polar curve arrays are inconsistent.
    #[error("Invalid polar curve: {what}")]
    InvalidCurve { what: &'static str },

    /// Node index outside the coordinate arrays.
    #[error("Node index {index} out of bounds (n_nodes={len})")]
    IndexOob { index: usize, len: usize },

    #[error("I/O error: {message}")]
    Io { message: String },
}

impl From<std::io::Error> for FoilError {
    fn from(e: std::io::Error) -> Self {
        FoilError::Io {
            message: e.to_string(),
        }
    }
}
