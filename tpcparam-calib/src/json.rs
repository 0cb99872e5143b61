//! JSON calibration documents.
//!
//! ```json
//! {
//!   "cluster_errors": {
//!     "rms":    { "y": [[c0, c1, c2, c3], ...], "z": [...] },
//!     "error2": { "y": [[c0, c1, c2, c3, c4, c5], ...], "z": [...] }
//!   },
//!   "field": { "bx": [10 values], "by": [...], "bz": [...] }
//! }
//! ```
//!
//! Each axis lists one row per readout region (inner, outer-medium,
//! outer-long). Field coefficients are given in kG for the monomials
//! `1, x, y, z, x², xy, xz, y², yz, z²` and are optional.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::Deserialize;
use tpcparam_core::{
    CalibrationSource, ClusterErrorCoefficients, PolynomialField, CLIGHT, N_ERROR2_TERMS,
    N_FIELD_TERMS, N_REGIONS, N_RMS_TERMS,
};

use crate::error::{Error, Result};

#[derive(Deserialize)]
struct JsonDocument {
    cluster_errors: JsonClusterErrors,
    #[serde(default)]
    field: Option<JsonField>,
}

#[derive(Deserialize)]
struct JsonClusterErrors {
    rms: JsonAxes,
    error2: JsonAxes,
}

#[derive(Deserialize)]
struct JsonAxes {
    y: Vec<Vec<f32>>,
    z: Vec<Vec<f32>>,
}

#[derive(Deserialize)]
struct JsonField {
    bx: Vec<f32>,
    by: Vec<f32>,
    bz: Vec<f32>,
}

/// Calibration read from a JSON document.
///
/// The document is parsed and validated on construction, so loading from
/// the source afterwards cannot fail.
#[derive(Debug, Clone)]
pub struct JsonCalibration {
    name: String,
    coefficients: ClusterErrorCoefficients,
    field: Option<PolynomialField>,
}

impl JsonCalibration {
    /// Load a calibration document from a file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let document: JsonDocument = serde_json::from_reader(reader)?;
        Self::from_document(path.display().to_string(), document)
    }

    /// Load a calibration document from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        let document: JsonDocument = serde_json::from_str(json)?;
        Self::from_document("<inline>".to_string(), document)
    }

    fn from_document(name: String, document: JsonDocument) -> Result<Self> {
        let errors = document.cluster_errors;
        let rms = [
            axis_table::<N_RMS_TERMS>("rms", "y", &errors.rms.y)?,
            axis_table::<N_RMS_TERMS>("rms", "z", &errors.rms.z)?,
        ];
        let error2 = [
            axis_table::<N_ERROR2_TERMS>("error2", "y", &errors.error2.y)?,
            axis_table::<N_ERROR2_TERMS>("error2", "z", &errors.error2.z)?,
        ];
        let coefficients = ClusterErrorCoefficients::new(rms, error2)?;

        let field = document
            .field
            .map(|f| -> Result<PolynomialField> {
                Ok(PolynomialField::from_coefficients(
                    field_terms("bx", &f.bx)?,
                    field_terms("by", &f.by)?,
                    field_terms("bz", &f.bz)?,
                ))
            })
            .transpose()?;

        tracing::debug!(
            source = %name,
            has_field = field.is_some(),
            "loaded calibration document"
        );

        Ok(Self {
            name,
            coefficients,
            field,
        })
    }

    /// Parsed cluster error coefficients.
    #[must_use]
    pub fn coefficients(&self) -> &ClusterErrorCoefficients {
        &self.coefficients
    }

    /// Parsed field map, in kG·c.
    #[must_use]
    pub fn field(&self) -> Option<&PolynomialField> {
        self.field.as_ref()
    }
}

impl CalibrationSource for JsonCalibration {
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

fn axis_table<const N: usize>(
    table: &'static str,
    axis: &'static str,
    rows: &[Vec<f32>],
) -> Result<[[f32; N]; N_REGIONS]> {
    if rows.len() != N_REGIONS {
        return Err(Error::ShapeError {
            table,
            axis,
            detail: format!("expected {N_REGIONS} regions, found {}", rows.len()),
        });
    }
    let mut out = [[0.0; N]; N_REGIONS];
    for (region, (dst, src)) in out.iter_mut().zip(rows).enumerate() {
        if src.len() != N {
            return Err(Error::ShapeError {
                table,
                axis,
                detail: format!("region {region}: expected {N} terms, found {}", src.len()),
            });
        }
        dst.copy_from_slice(src);
    }
    Ok(out)
}

fn field_terms(component: &'static str, values: &[f32]) -> Result<[f32; N_FIELD_TERMS]> {
    if values.len() != N_FIELD_TERMS {
        return Err(Error::ShapeError {
            table: "field",
            axis: component,
            detail: format!("expected {N_FIELD_TERMS} terms, found {}", values.len()),
        });
    }
    if let Some(bad) = values.iter().find(|v| !v.is_finite()) {
        return Err(Error::ShapeError {
            table: "field",
            axis: component,
            detail: format!("non-finite coefficient {bad}"),
        });
    }
    let mut out = [0.0; N_FIELD_TERMS];
    for (dst, src) in out.iter_mut().zip(values) {
        *dst = src * CLIGHT;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use tpcparam_core::{Axis, Point3, RowRegion};

    const DOCUMENT: &str = r#"{
        "cluster_errors": {
            "rms": {
                "y": [[0.041, 1.8e-4, 0.056, 0.5], [0.082, 2.0e-4, 0.068, 0.9], [0.086, 2.1e-4, 0.13, 0.25]],
                "z": [[0.059, 8.6e-5, 0.036, 0.4], [0.061, 7.2e-5, 0.039, 0.9], [0.065, 1.0e-4, 0.06, 0.9]]
            },
            "error2": {
                "y": [[6.4e-4, 2.5e-5, 0.015, 2e-8, -5.8e-3, 9.1e-5],
                      [9.7e-4, 1.7e-5, 0.021, 3e-8, -1.6e-3, 8.4e-5],
                      [7.2e-5, 2.6e-5, 0.032, -2e-8, 1.7e-3, 3.4e-5]],
                "z": [[1.4e-3, 6.3e-6, 0.012, 1e-7, 0.011, 1.3e-4],
                      [1.1e-3, 1.3e-5, 0.018, 5e-8, 0.016, 1.4e-4],
                      [6.2e-4, 1.7e-5, 0.028, 1e-8, 0.050, 1.8e-4]]
            }
        }
    }"#;

    #[test]
    fn test_json_loading() {
        let calib = JsonCalibration::from_json(DOCUMENT).expect("Failed to parse JSON");
        let c = calib.coefficients();
        assert_eq!(c.rms_terms(Axis::Y, RowRegion::Inner)[0], 0.041);
        assert_eq!(c.rms_terms(Axis::Z, RowRegion::OuterLong)[3], 0.9);
        assert_eq!(c.error2_terms(Axis::Y, RowRegion::OuterMedium)[4], -1.6e-3);
        assert_eq!(c.error2_terms(Axis::Z, RowRegion::OuterLong)[5], 1.8e-4);
        assert!(calib.field().is_none());
        assert_eq!(calib.name(), "<inline>");
    }

    #[test]
    fn test_source_returns_parsed_tables() {
        let calib = JsonCalibration::from_json(DOCUMENT).unwrap();
        let loaded = calib.cluster_error_coefficients().unwrap();
        assert_eq!(&loaded, calib.coefficients());
        assert!(calib.polynomial_field().unwrap().is_none());
    }

    #[test]
    fn test_field_is_scaled_to_kg_c() {
        let json = r#"{
            "cluster_errors": {
                "rms": { "y": [[1,0,0,0],[1,0,0,0],[1,0,0,0]], "z": [[1,0,0,0],[1,0,0,0],[1,0,0,0]] },
                "error2": { "y": [[1,0,0,0,0,0],[1,0,0,0,0,0],[1,0,0,0,0,0]],
                            "z": [[1,0,0,0,0,0],[1,0,0,0,0,0],[1,0,0,0,0,0]] }
            },
            "field": {
                "bx": [0,0,0,0,0,0,0,0,0,0],
                "by": [0,0,0,0,0,0,0,0,0,0],
                "bz": [5,0,0,0,0,0,0,0,0,0]
            }
        }"#;
        let calib = JsonCalibration::from_json(json).unwrap();
        let field = calib.field().expect("field present");
        assert_relative_eq!(field.bz(Point3::new(10.0, 20.0, 30.0)), 5.0 * CLIGHT);
    }

    #[test]
    fn test_wrong_region_count() {
        let json = DOCUMENT.replace(
            "[0.086, 2.1e-4, 0.13, 0.25]]",
            "[0.086, 2.1e-4, 0.13, 0.25], [1, 1, 1, 1]]",
        );
        let err = JsonCalibration::from_json(&json).unwrap_err().to_string();
        assert!(err.contains("rms.y"), "unexpected error: {err}");
        assert!(err.contains("expected 3 regions"), "unexpected error: {err}");
    }

    #[test]
    fn test_wrong_term_count() {
        let json = DOCUMENT.replace("[6.2e-4, 1.7e-5, 0.028, 1e-8, 0.050, 1.8e-4]", "[6.2e-4]");
        let err = JsonCalibration::from_json(&json).unwrap_err().to_string();
        assert!(err.contains("error2.z"), "unexpected error: {err}");
        assert!(err.contains("region 2"), "unexpected error: {err}");
    }

    #[test]
    fn test_missing_table_is_rejected() {
        let json = r#"{ "cluster_errors": { "rms": { "y": [], "z": [] } } }"#;
        assert!(matches!(
            JsonCalibration::from_json(json),
            Err(Error::JsonError(_))
        ));
    }

    #[test]
    fn test_core_error_conversion() {
        let err = JsonCalibration::from_json("not json").unwrap_err();
        let core: tpcparam_core::Error = err.into();
        assert!(matches!(core, tpcparam_core::Error::Calibration(_)));
    }
}
