//! tpcparam-calib: Calibration sources for TPC reconstruction parameters.
//!
//! # Key Components
//!
//! - [`JsonCalibration`] - Cluster error tables (and optionally a field map)
//!   read from a JSON document
//! - [`StaticCalibration`] - Tables supplied directly by the caller
//!
//! Both implement [`tpcparam_core::CalibrationSource`], which is what the
//! parameter aggregator consumes.

mod error;
mod json;
mod table;

pub use error::{Error, Result};
pub use json::JsonCalibration;
pub use table::StaticCalibration;

// Re-export the trait for convenience
pub use tpcparam_core::CalibrationSource;
