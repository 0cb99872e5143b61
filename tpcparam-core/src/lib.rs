//! tpcparam-core: Core types for TPC reconstruction parameters.
//!
//! This crate provides the read-only tables consulted during track
//! reconstruction: slice geometry and coordinate transforms, the magnetic
//! field model, and the cluster error parameterization.
//!

pub mod calibration;
pub mod cluster_error;
pub mod error;
pub mod field;
pub mod geometry;
pub mod point;
pub mod slice;

pub use calibration::CalibrationSource;
pub use cluster_error::{
    Axis, ClusterErrorCoefficients, ClusterErrorModel, ClusterState, ClusterVariance,
    Error2Table, RmsTable, N_AXES, N_ERROR2_TERMS, N_REGIONS, N_RMS_TERMS,
};
pub use error::{Error, Result};
pub use field::{FieldMode, MagneticField, PolynomialField, CLIGHT, N_FIELD_TERMS};
pub use geometry::{RowRegion, TpcGeometry, NROWS, NSLICES};
pub use point::Point3;
pub use slice::{normalize_angle, SliceParam, SliceTable};
