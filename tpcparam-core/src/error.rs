//! Error types for tpcparam-core.

use thiserror::Error;

/// Result type alias for tpcparam operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for tpcparam operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Slice index outside `[0, NSLICES)`.
    #[error("invalid slice index: {slice} (detector has {count} slices)")]
    InvalidSlice { slice: usize, count: usize },

    /// Pad row index outside `[0, NROWS)`.
    #[error("invalid row index: {row} (detector has {count} rows)")]
    InvalidRow { row: usize, count: usize },

    /// A cluster error query was issued before the coefficient tables were loaded.
    #[error("cluster error coefficients have not been loaded")]
    CoefficientsNotLoaded,

    /// A calibration coefficient is not a finite number.
    #[error("invalid {table} coefficient [{axis}][{region}][{term}]: {value}")]
    InvalidCoefficient {
        table: &'static str,
        axis: usize,
        region: usize,
        term: usize,
        value: f32,
    },

    /// Transverse momentum is zero, so curvature and dip are undefined.
    #[error("degenerate momentum: transverse momentum is zero (pz = {pz})")]
    DegenerateMomentum { pz: f32 },

    /// Calibration source failure.
    #[error("calibration error: {0}")]
    Calibration(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    ConfigError(String),
}
