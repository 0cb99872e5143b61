//! Calibration source trait.

use crate::cluster_error::ClusterErrorCoefficients;
use crate::error::Result;
use crate::field::PolynomialField;

/// Supplier of calibrated parameter tables.
///
/// The storage format (database, file, embedded table) is up to the
/// implementor; only the resulting fixed-shape tables are consumed.
pub trait CalibrationSource: Send + Sync {
    /// Human-readable name of the source, used in logs.
    fn name(&self) -> &str;

    /// Loads the cluster error coefficient tables.
    fn cluster_error_coefficients(&self) -> Result<ClusterErrorCoefficients>;

    /// Loads a fitted field map, if the source provides one.
    fn polynomial_field(&self) -> Result<Option<PolynomialField>> {
        Ok(None)
    }
}
