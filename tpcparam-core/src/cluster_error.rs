//! Cluster position error parameterization.
//!
//! Two calibrated tables describe the expected cluster size and position
//! uncertainty as a function of drift length and local track angle:
//!
//! - the RMS table, `|c0 + c1 z + c2 a|`, gives the cluster width;
//! - the variance table, `|c0 + c1 z + c2 a + c3 z² + c4 a² + c5 z a|`, gives
//!   the squared position error, floored at `1e-4` cm².
//!
//! Here `z` is the drift length and `a` the squared tangent of the crossing
//! angle in the pad plane (Y) or along the drift direction (Z). Each table
//! holds one coefficient set per axis and readout region.

use crate::error::{Error, Result};
use crate::geometry::{RowRegion, TpcGeometry};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Terms of the RMS polynomial.
pub const N_RMS_TERMS: usize = 4;

/// Terms of the variance polynomial.
pub const N_ERROR2_TERMS: usize = 6;

/// Number of axes in the coefficient tables.
pub const N_AXES: usize = 2;

/// Number of readout regions in the coefficient tables.
pub const N_REGIONS: usize = 3;

/// Largest |sin(phi)| used for the pad-plane crossing angle.
const MAX_SIN_PHI: f32 = 0.95;

/// Lower bound of a parameterized variance, in cm².
const MIN_ERROR2: f32 = 0.0001;

/// RMS coefficient table, `[axis][region][term]`.
pub type RmsTable = [[[f32; N_RMS_TERMS]; N_REGIONS]; N_AXES];

/// Variance coefficient table, `[axis][region][term]`.
pub type Error2Table = [[[f32; N_ERROR2_TERMS]; N_REGIONS]; N_AXES];

/// Error direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Axis {
    /// Along the pad row (transverse).
    Y,
    /// Along the drift direction (longitudinal).
    Z,
}

impl Axis {
    /// Both axes in table order.
    pub const ALL: [Axis; 2] = [Self::Y, Self::Z];

    /// Index of the axis in the coefficient tables.
    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        match self {
            Self::Y => 0,
            Self::Z => 1,
        }
    }
}

/// Calibrated coefficients of the cluster error model.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ClusterErrorCoefficients {
    rms: RmsTable,
    error2: Error2Table,
}

impl ClusterErrorCoefficients {
    /// Creates the coefficient set, rejecting non-finite values.
    pub fn new(rms: RmsTable, error2: Error2Table) -> Result<Self> {
        check_table("rms", &rms)?;
        check_table("error2", &error2)?;
        Ok(Self { rms, error2 })
    }

    /// RMS coefficients for one axis and region.
    #[inline]
    #[must_use]
    pub fn rms_terms(&self, axis: Axis, region: RowRegion) -> &[f32; N_RMS_TERMS] {
        &self.rms[axis.index()][region.index()]
    }

    /// Variance coefficients for one axis and region.
    #[inline]
    #[must_use]
    pub fn error2_terms(&self, axis: Axis, region: RowRegion) -> &[f32; N_ERROR2_TERMS] {
        &self.error2[axis.index()][region.index()]
    }

    /// Full RMS table.
    #[must_use]
    pub fn rms_table(&self) -> &RmsTable {
        &self.rms
    }

    /// Full variance table.
    #[must_use]
    pub fn error2_table(&self) -> &Error2Table {
        &self.error2
    }
}

fn check_table<const N: usize>(
    table: &'static str,
    values: &[[[f32; N]; N_REGIONS]; N_AXES],
) -> Result<()> {
    for (axis, regions) in values.iter().enumerate() {
        for (region, terms) in regions.iter().enumerate() {
            if let Some((term, &value)) = terms.iter().enumerate().find(|(_, v)| !v.is_finite()) {
                return Err(Error::InvalidCoefficient {
                    table,
                    axis,
                    region,
                    term,
                    value,
                });
            }
        }
    }
    Ok(())
}

/// Quality flags of a cluster attached to a track.
///
/// Every flag raises the error estimate independently. See
/// [`ClusterVariance::with_state`] for the combination rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ClusterState {
    /// Cluster was split along the pad direction.
    pub split_pad: bool,
    /// Cluster was split along the time direction.
    pub split_time: bool,
    /// Cluster touches the sector edge.
    pub edge: bool,
    /// Single-pad cluster.
    pub single: bool,
    /// Cluster is shared between tracks.
    pub shared: bool,
}

impl ClusterState {
    pub const SPLIT_PAD: u8 = 0x01;
    pub const SPLIT_TIME: u8 = 0x02;
    pub const EDGE: u8 = 0x04;
    pub const SINGLE: u8 = 0x08;
    pub const SHARED: u8 = 0x10;

    /// Decodes the packed flag byte. Unknown bits are ignored.
    #[must_use]
    pub fn from_bits(bits: u8) -> Self {
        Self {
            split_pad: bits & Self::SPLIT_PAD != 0,
            split_time: bits & Self::SPLIT_TIME != 0,
            edge: bits & Self::EDGE != 0,
            single: bits & Self::SINGLE != 0,
            shared: bits & Self::SHARED != 0,
        }
    }

    /// Packs the flags into a byte.
    #[must_use]
    pub fn bits(self) -> u8 {
        let mut bits = 0;
        if self.split_pad {
            bits |= Self::SPLIT_PAD;
        }
        if self.split_time {
            bits |= Self::SPLIT_TIME;
        }
        if self.edge {
            bits |= Self::EDGE;
        }
        if self.single {
            bits |= Self::SINGLE;
        }
        if self.shared {
            bits |= Self::SHARED;
        }
        bits
    }

    /// True if no flag is set.
    #[must_use]
    pub fn is_empty(self) -> bool {
        self.bits() == 0
    }

    #[must_use]
    pub fn with_split_pad(mut self) -> Self {
        self.split_pad = true;
        self
    }

    #[must_use]
    pub fn with_split_time(mut self) -> Self {
        self.split_time = true;
        self
    }

    #[must_use]
    pub fn with_edge(mut self) -> Self {
        self.edge = true;
        self
    }

    #[must_use]
    pub fn with_single(mut self) -> Self {
        self.single = true;
        self
    }

    #[must_use]
    pub fn with_shared(mut self) -> Self {
        self.shared = true;
        self
    }
}

/// Squared position errors of a cluster, in cm².
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ClusterVariance {
    /// Variance along the pad row.
    pub y2: f32,
    /// Variance along the drift direction.
    pub z2: f32,
}

impl ClusterVariance {
    #[inline]
    #[must_use]
    pub fn new(y2: f32, z2: f32) -> Self {
        Self { y2, z2 }
    }

    /// Variance along one axis.
    #[inline]
    #[must_use]
    pub fn get(&self, axis: Axis) -> f32 {
        match axis {
            Axis::Y => self.y2,
            Axis::Z => self.z2,
        }
    }

    /// Raises the variances according to the cluster quality flags.
    ///
    /// Additive penalties are applied first:
    /// - `edge`: `y2 += 0.35`, `z2 += 0.15`
    /// - `single`: `y2 += 0.2`, `z2 += 0.2`
    ///
    /// then the multiplicative ones, each at most once per axis:
    /// - any of `split_pad`, `shared`, `single`: `y2 = (y2 + 0.03) * 3`
    /// - any of `split_time`, `shared`, `single`: `z2 = (z2 + 0.03) * 3`
    ///
    /// The result depends only on which flags are set. For non-negative
    /// input the output is never smaller than the input.
    #[must_use]
    pub fn with_state(self, state: ClusterState) -> Self {
        let Self { mut y2, mut z2 } = self;
        if state.edge {
            y2 += 0.35;
            z2 += 0.15;
        }
        if state.single {
            y2 += 0.2;
            z2 += 0.2;
        }
        if state.split_pad || state.shared || state.single {
            y2 = (y2 + 0.03) * 3.0;
        }
        if state.split_time || state.shared || state.single {
            z2 = (z2 + 0.03) * 3.0;
        }
        Self { y2, z2 }
    }
}

/// Squared crossing-angle tangents `(angle_y2, angle_z2)` of a track.
#[inline]
fn crossing_angles2(sin_phi: f32, dz_ds: f32) -> (f32, f32) {
    let s2 = (sin_phi * sin_phi).min(MAX_SIN_PHI * MAX_SIN_PHI);
    let sec2 = 1.0 / (1.0 - s2);
    (s2 * sec2, dz_ds * dz_ds * sec2)
}

/// Cluster error model: calibrated coefficients plus the geometry needed to
/// classify rows and compute drift lengths.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterErrorModel {
    coefficients: ClusterErrorCoefficients,
    geometry: TpcGeometry,
    correction_y: f32,
    correction_z: f32,
}

impl ClusterErrorModel {
    /// Creates a model without variance scaling.
    #[must_use]
    pub fn new(coefficients: ClusterErrorCoefficients, geometry: TpcGeometry) -> Self {
        Self {
            coefficients,
            geometry,
            correction_y: 1.0,
            correction_z: 1.0,
        }
    }

    /// Sets the multiplicative variance corrections for Y and Z.
    pub fn with_corrections(mut self, correction_y: f32, correction_z: f32) -> Result<Self> {
        for (name, value) in [("y", correction_y), ("z", correction_z)] {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::ConfigError(format!(
                    "cluster error correction {name} must be finite and non-negative, got {value}"
                )));
            }
        }
        self.correction_y = correction_y;
        self.correction_z = correction_z;
        Ok(self)
    }

    /// Loaded coefficients.
    #[must_use]
    pub fn coefficients(&self) -> &ClusterErrorCoefficients {
        &self.coefficients
    }

    /// Variance correction applied to one axis.
    #[must_use]
    pub fn correction(&self, axis: Axis) -> f32 {
        match axis {
            Axis::Y => self.correction_y,
            Axis::Z => self.correction_z,
        }
    }

    /// Cluster RMS for a drift length `z` and squared angle tangent `angle2`.
    #[must_use]
    pub fn rms(&self, axis: Axis, region: RowRegion, z: f32, angle2: f32) -> f32 {
        let c = self.coefficients.rms_terms(axis, region);
        (c[0] + c[1] * z + c[2] * angle2).abs()
    }

    /// Squared cluster RMS of a row for a track with `sin_phi` and `dz_ds` at `z`.
    pub fn rms2(&self, row: usize, z: f32, sin_phi: f32, dz_ds: f32) -> Result<ClusterVariance> {
        let region = self.geometry.region(row)?;
        let drift = self.geometry.drift_length(z);
        let (angle_y2, angle_z2) = crossing_angles2(sin_phi, dz_ds);

        let y = self.rms(Axis::Y, region, drift, angle_y2);
        let z = self.rms(Axis::Z, region, drift, angle_z2);
        Ok(ClusterVariance::new(y * y, z * z))
    }

    /// Parameterized position variance for a drift length `z` and squared
    /// angle tangent `angle2`.
    #[must_use]
    pub fn error2(&self, axis: Axis, region: RowRegion, z: f32, angle2: f32) -> f32 {
        let c = self.coefficients.error2_terms(axis, region);
        let v = c[0]
            + c[1] * z
            + c[2] * angle2
            + c[3] * z * z
            + c[4] * angle2 * angle2
            + c[5] * z * angle2;
        v.abs().max(MIN_ERROR2) * self.correction(axis)
    }

    /// Position variances of a row for a track with `sin_phi` and `dz_ds` at `z`.
    pub fn errors2(
        &self,
        row: usize,
        z: f32,
        sin_phi: f32,
        dz_ds: f32,
    ) -> Result<ClusterVariance> {
        let region = self.geometry.region(row)?;
        let drift = self.geometry.drift_length(z);
        let (angle_y2, angle_z2) = crossing_angles2(sin_phi, dz_ds);

        Ok(ClusterVariance::new(
            self.error2(Axis::Y, region, drift, angle_y2),
            self.error2(Axis::Z, region, drift, angle_z2),
        ))
    }

    /// Raises a variance pair according to cluster quality flags.
    #[must_use]
    pub fn update_by_state(&self, state: ClusterState, variance: ClusterVariance) -> ClusterVariance {
        variance.with_state(state)
    }
}
