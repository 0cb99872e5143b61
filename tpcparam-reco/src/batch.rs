//! Batch cluster error queries on the rayon pool.

use rayon::prelude::*;
use tpcparam_core::{ClusterState, ClusterVariance, Result};

use crate::Param;

/// One cluster error lookup.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ClusterQuery {
    /// Pad row of the cluster.
    pub row: usize,
    /// Cluster z in cm.
    pub z: f32,
    /// Sine of the track azimuth relative to the slice.
    pub sin_phi: f32,
    /// Track dip, dz/ds.
    pub dz_ds: f32,
    /// Quality flags of the cluster.
    pub state: ClusterState,
}

impl ClusterQuery {
    #[must_use]
    pub fn new(row: usize, z: f32, sin_phi: f32, dz_ds: f32) -> Self {
        Self {
            row,
            z,
            sin_phi,
            dz_ds,
            state: ClusterState::default(),
        }
    }

    #[must_use]
    pub fn with_state(mut self, state: ClusterState) -> Self {
        self.state = state;
        self
    }
}

impl Param {
    /// Position variances of one cluster, raised by its quality flags.
    pub fn cluster_query(&self, query: &ClusterQuery) -> Result<ClusterVariance> {
        let variance = self.cluster_errors2(query.row, query.z, query.sin_phi, query.dz_ds)?;
        Ok(self.update_cluster_error2_by_state(query.state, variance))
    }

    /// Evaluates a batch of cluster queries in parallel.
    ///
    /// Results keep the order of `queries`. The first failing query aborts
    /// the batch.
    pub fn par_cluster_errors2(&self, queries: &[ClusterQuery]) -> Result<Vec<ClusterVariance>> {
        // Fail before spawning work when nothing is loaded.
        self.cluster_errors()?;
        let results = queries
            .par_iter()
            .map(|query| self.cluster_query(query))
            .collect::<Result<Vec<_>>>()?;
        tracing::debug!(queries = queries.len(), "Cluster error batch evaluated");
        Ok(results)
    }
}
