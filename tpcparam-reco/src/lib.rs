//! tpcparam-reco: run parameters for TPC track reconstruction.
//!
//! This crate ties the detector model from `tpcparam-core` to the run
//! settings:
//! - [`ParamConfig`] and the settings structs, loadable from JSON
//! - [`Param`], the parameter aggregator queried by the tracking code
//! - [`TrackReference`], simulated track references in slice frames
//! - [`ClusterQuery`] batches evaluated on the rayon pool
//!

mod batch;
mod param;
pub mod settings;
pub mod track_ref;

pub use batch::ClusterQuery;
pub use param::{Param, ParamFlags, CONTINUOUS_QUERY_Z, DEFAULT_ERR_Y, DEFAULT_ERR_Z};
pub use settings::{
    EventSettings, ParamConfig, ProcessingSettings, RecoSettings, WorkflowSteps,
    TPC_MAX_TF_TIME_BIN,
};
pub use track_ref::{TrackParam, TrackReference, TrackStatus};

// Re-export core types used in the public API
pub use tpcparam_core::{
    Axis, CalibrationSource, ClusterState, ClusterVariance, Error, Point3, Result, RowRegion,
};
