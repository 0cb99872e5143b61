//! Static TPC geometry: slice layout, pad rows and readout regions.
#![allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_wrap,
    clippy::cast_possible_truncation
)]

use crate::error::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Number of slices (sectors): 18 per side, two sides.
pub const NSLICES: usize = 36;

/// Number of pad rows per slice.
pub const NROWS: usize = 159;

/// Rotation angle of slice 0 (half a sector, 10 degrees).
pub const BASE_ALPHA: f32 = 0.174_533;

/// Angular size of one slice (20 degrees).
pub const DALPHA: f32 = 0.349_066;

/// Readout region a pad row belongs to.
///
/// The cluster error tables carry one set of coefficients per region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum RowRegion {
    /// Inner readout chamber, short pads.
    Inner,
    /// Outer readout chamber, medium pads.
    OuterMedium,
    /// Outer readout chamber, long pads.
    OuterLong,
}

struct RegionLayout {
    first_row: usize,
    n_rows: usize,
    /// Radius of the first pad row in cm.
    first_x: f32,
    /// Pad length (row pitch) in cm.
    row_pitch: f32,
    /// Pad width in cm.
    pad_width: f32,
}

const REGION_LAYOUT: [RegionLayout; 3] = [
    RegionLayout {
        first_row: 0,
        n_rows: 63,
        first_x: 85.225,
        row_pitch: 0.75,
        pad_width: 0.4,
    },
    RegionLayout {
        first_row: 63,
        n_rows: 64,
        first_x: 135.1,
        row_pitch: 1.0,
        pad_width: 0.6,
    },
    RegionLayout {
        first_row: 127,
        n_rows: 32,
        first_x: 199.35,
        row_pitch: 1.5,
        pad_width: 0.6,
    },
];

impl RowRegion {
    /// All regions in row order.
    pub const ALL: [RowRegion; 3] = [Self::Inner, Self::OuterMedium, Self::OuterLong];

    /// Index of the region in the coefficient tables.
    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        match self {
            Self::Inner => 0,
            Self::OuterMedium => 1,
            Self::OuterLong => 2,
        }
    }

    /// First pad row of the region.
    #[must_use]
    pub fn first_row(self) -> usize {
        self.layout().first_row
    }

    /// Number of pad rows in the region.
    #[must_use]
    pub fn row_count(self) -> usize {
        self.layout().n_rows
    }

    /// Short name used in logs and the CLI.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Inner => "inner",
            Self::OuterMedium => "outer-medium",
            Self::OuterLong => "outer-long",
        }
    }

    fn layout(self) -> &'static RegionLayout {
        &REGION_LAYOUT[self.index()]
    }
}

/// Fixed description of the TPC layout.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TpcGeometry {
    /// Angular size of a slice in radians.
    pub dalpha: f32,
    /// Inner radius of the sensitive volume in cm.
    pub r_min: f32,
    /// Outer radius of the sensitive volume in cm.
    pub r_max: f32,
    /// Pad pitch in cm.
    pub pad_pitch: f32,
    /// Half length of the drift volume in cm.
    pub z_length: f32,
    /// Distance between the readout plane and the end of the drift volume in cm.
    pub z_offset: f32,
}

impl Default for TpcGeometry {
    fn default() -> Self {
        Self::nominal()
    }
}

impl TpcGeometry {
    /// Nominal detector geometry.
    #[must_use]
    pub fn nominal() -> Self {
        Self {
            dalpha: DALPHA,
            r_min: 83.65,
            r_max: 247.7,
            pad_pitch: 0.4,
            z_length: 250.0,
            z_offset: 0.275,
        }
    }

    /// Number of slices.
    #[inline]
    #[must_use]
    pub fn slice_count(&self) -> usize {
        NSLICES
    }

    /// Number of pad rows.
    #[inline]
    #[must_use]
    pub fn row_count(&self) -> usize {
        NROWS
    }

    /// Checks that `slice` is a valid slice index.
    pub fn check_slice(&self, slice: usize) -> Result<()> {
        if slice < NSLICES {
            Ok(())
        } else {
            Err(Error::InvalidSlice {
                slice,
                count: NSLICES,
            })
        }
    }

    /// Rotation angle of a slice.
    ///
    /// The slice index is folded twice: indices of the second half map onto
    /// the first half, then indices past a quarter are shifted back by half
    /// a turn. The result lies in `(-pi, pi]`.
    pub fn alpha(&self, slice: usize) -> Result<f32> {
        self.check_slice(slice)?;
        Ok(BASE_ALPHA + self.dalpha * reduced_slice_index(slice) as f32)
    }

    /// Readout region of a pad row.
    pub fn region(&self, row: usize) -> Result<RowRegion> {
        match row {
            0..=62 => Ok(RowRegion::Inner),
            63..=126 => Ok(RowRegion::OuterMedium),
            127..=158 => Ok(RowRegion::OuterLong),
            _ => Err(Error::InvalidRow { row, count: NROWS }),
        }
    }

    /// Radius of a pad row centre in the slice-local frame, in cm.
    pub fn row_x(&self, row: usize) -> Result<f32> {
        let layout = self.region(row)?.layout();
        Ok(layout.first_x + layout.row_pitch * (row - layout.first_row) as f32)
    }

    /// Pad width of a row, in cm.
    pub fn pad_width(&self, row: usize) -> Result<f32> {
        Ok(self.region(row)?.layout().pad_width)
    }

    /// Pad length (radial extent) of a row, in cm.
    pub fn pad_height(&self, row: usize) -> Result<f32> {
        Ok(self.region(row)?.layout().row_pitch)
    }

    /// Distance of a cluster at `z` from the readout plane.
    #[inline]
    #[must_use]
    pub fn drift_length(&self, z: f32) -> f32 {
        ((self.z_length - self.z_offset) - z.abs()).abs()
    }
}

/// Folds a slice index onto the representative sector, in `[-NSLICES/4, NSLICES/4)`.
///
/// Callers must pass an index below [`NSLICES`].
#[inline]
#[must_use]
pub(crate) fn reduced_slice_index(slice: usize) -> i32 {
    let mut i = slice as i32;
    if i >= (NSLICES / 2) as i32 {
        i -= (NSLICES / 2) as i32;
    }
    if i >= (NSLICES / 4) as i32 {
        i -= (NSLICES / 2) as i32;
    }
    i
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f32::consts::PI;

    #[test]
    fn test_alpha_reduction() {
        let geo = TpcGeometry::nominal();
        assert_eq!(reduced_slice_index(0), 0);
        assert_eq!(reduced_slice_index(8), 8);
        assert_eq!(reduced_slice_index(9), -9);
        assert_eq!(reduced_slice_index(17), -1);
        assert_eq!(reduced_slice_index(18), 0);
        assert_eq!(reduced_slice_index(35), -1);

        assert_relative_eq!(geo.alpha(0).unwrap(), BASE_ALPHA);
        assert_relative_eq!(geo.alpha(17).unwrap(), BASE_ALPHA - DALPHA);
    }

    #[test]
    fn test_alpha_rejects_wrapping_index() {
        // usize::MAX truncates to -1 as i32, so the range check must come first
        let geo = TpcGeometry::nominal();
        assert!(matches!(geo.alpha(NSLICES), Err(Error::InvalidSlice { .. })));
        assert!(matches!(geo.alpha(usize::MAX), Err(Error::InvalidSlice { .. })));
    }

    #[test]
    fn test_alpha_sides_agree() {
        let geo = TpcGeometry::nominal();
        for slice in 0..NSLICES / 2 {
            let a = geo.alpha(slice).unwrap();
            let c = geo.alpha(slice + NSLICES / 2).unwrap();
            assert_eq!(a.to_bits(), c.to_bits(), "slice {slice}");
        }
    }

    #[test]
    fn test_alpha_range() {
        let geo = TpcGeometry::nominal();
        for slice in 0..NSLICES {
            let a = geo.alpha(slice).unwrap();
            assert!(a > -PI && a <= PI, "slice {slice}: {a}");
        }
    }

    #[test]
    fn test_alpha_matches_unreduced_angle() {
        let geo = TpcGeometry::nominal();
        for slice in 0..NSLICES / 2 {
            let folded = geo.alpha(slice).unwrap();
            let direct = BASE_ALPHA + DALPHA * slice as f32;
            assert_relative_eq!(folded.cos(), direct.cos(), epsilon = 1e-5);
            assert_relative_eq!(folded.sin(), direct.sin(), epsilon = 1e-5);
        }
    }

    #[test]
    fn test_invalid_slice() {
        let geo = TpcGeometry::nominal();
        assert_eq!(
            geo.alpha(NSLICES),
            Err(Error::InvalidSlice {
                slice: NSLICES,
                count: NSLICES
            })
        );
    }

    #[test]
    fn test_region_boundaries() {
        let geo = TpcGeometry::nominal();
        assert_eq!(geo.region(0).unwrap(), RowRegion::Inner);
        assert_eq!(geo.region(62).unwrap(), RowRegion::Inner);
        assert_eq!(geo.region(63).unwrap(), RowRegion::OuterMedium);
        assert_eq!(geo.region(126).unwrap(), RowRegion::OuterMedium);
        assert_eq!(geo.region(127).unwrap(), RowRegion::OuterLong);
        assert_eq!(geo.region(NROWS - 1).unwrap(), RowRegion::OuterLong);
        assert!(geo.region(NROWS).is_err());
    }

    #[test]
    fn test_region_layout_covers_all_rows() {
        let total: usize = RowRegion::ALL.iter().map(|r| r.row_count()).sum();
        assert_eq!(total, NROWS);

        let geo = TpcGeometry::nominal();
        for region in RowRegion::ALL {
            assert_eq!(geo.region(region.first_row()).unwrap(), region);
            let last = region.first_row() + region.row_count() - 1;
            assert_eq!(geo.region(last).unwrap(), region);
        }
    }

    #[test]
    fn test_row_radii_increase_within_bounds() {
        let geo = TpcGeometry::nominal();
        let mut previous = 0.0;
        for row in 0..NROWS {
            let x = geo.row_x(row).unwrap();
            assert!(x > previous, "row {row}");
            assert!(x > geo.r_min && x < geo.r_max, "row {row}: {x}");
            previous = x;
        }
        assert_relative_eq!(geo.row_x(0).unwrap(), 85.225);
        assert_relative_eq!(geo.row_x(63).unwrap(), 135.1, epsilon = 1e-4);
        assert_relative_eq!(geo.pad_height(130).unwrap(), 1.5);
        assert_relative_eq!(geo.pad_width(10).unwrap(), 0.4);
    }

    #[test]
    fn test_drift_length() {
        let geo = TpcGeometry::nominal();
        assert_relative_eq!(geo.drift_length(0.0), 249.725, epsilon = 1e-4);
        assert_relative_eq!(geo.drift_length(249.725), 0.0, epsilon = 1e-4);
        assert_relative_eq!(geo.drift_length(-100.0), 149.725, epsilon = 1e-4);
        assert!(geo.drift_length(260.0) >= 0.0);
    }
}
