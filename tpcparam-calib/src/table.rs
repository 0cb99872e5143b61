//! In-memory calibration tables.

use tpcparam_core::{CalibrationSource, ClusterErrorCoefficients, PolynomialField};

/// Calibration tables handed over directly by the caller, for example from a
/// conditions database client.
#[derive(Debug, Clone)]
pub struct StaticCalibration {
    name: String,
    coefficients: ClusterErrorCoefficients,
    field: Option<PolynomialField>,
}

impl StaticCalibration {
    /// Creates a source serving the given cluster error coefficients.
    #[must_use]
    pub fn new(name: impl Into<String>, coefficients: ClusterErrorCoefficients) -> Self {
        Self {
            name: name.into(),
            coefficients,
            field: None,
        }
    }

    /// Adds a fitted field map.
    #[must_use]
    pub fn with_field(mut self, field: PolynomialField) -> Self {
        self.field = Some(field);
        self
    }
}

impl CalibrationSource for StaticCalibration {
    fn name(&self) -> &str {
        &self.name
    }

    fn cluster_error_coefficients(&self) -> tpcparam_core::Result<ClusterErrorCoefficients> {
        Ok(self.coefficients.clone())
    }

    fn polynomial_field(&self) -> tpcparam_core::Result<Option<PolynomialField>> {
        Ok(self.field.clone())
    }
}
