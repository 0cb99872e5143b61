//! Per-slice parameters and slice-local/global coordinate transforms.
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]

use std::f32::consts::{PI, TAU};

use crate::error::{Error, Result};
use crate::geometry::{reduced_slice_index, TpcGeometry, BASE_ALPHA, NSLICES};
use crate::point::Point3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Geometry of a single slice.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SliceParam {
    /// Rotation angle of the slice frame.
    pub alpha: f32,
    /// Cosine of the rotation angle.
    pub cos_alpha: f32,
    /// Sine of the rotation angle.
    pub sin_alpha: f32,
    /// Lower edge of the azimuthal acceptance.
    pub angle_min: f32,
    /// Upper edge of the azimuthal acceptance.
    pub angle_max: f32,
    /// Lower edge of the z acceptance.
    pub z_min: f32,
    /// Upper edge of the z acceptance.
    pub z_max: f32,
}

impl SliceParam {
    /// Slice-local to global coordinates.
    #[inline]
    #[must_use]
    pub fn to_global(&self, local: Point3) -> Point3 {
        local.rotate_z(self.cos_alpha, self.sin_alpha)
    }

    /// Global to slice-local coordinates.
    #[inline]
    #[must_use]
    pub fn to_local(&self, global: Point3) -> Point3 {
        global.rotate_z(self.cos_alpha, -self.sin_alpha)
    }

    /// Whether `z` lies on this slice's side of the central electrode.
    #[inline]
    #[must_use]
    pub fn contains_z(&self, z: f32) -> bool {
        z >= self.z_min && z <= self.z_max
    }
}

/// Table of all slices, built once from the geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct SliceTable {
    slices: [SliceParam; NSLICES],
    dalpha: f32,
}

impl SliceTable {
    /// Builds the slice table.
    ///
    /// Slices `0..NSLICES/2` cover positive z, the rest negative z.
    #[must_use]
    pub fn new(geometry: &TpcGeometry) -> Self {
        let slices = std::array::from_fn(|i| {
            let alpha = BASE_ALPHA + geometry.dalpha * reduced_slice_index(i) as f32;
            let (z_min, z_max) = if i < NSLICES / 2 {
                (0.0, geometry.z_length)
            } else {
                (-geometry.z_length, 0.0)
            };
            SliceParam {
                alpha,
                cos_alpha: alpha.cos(),
                sin_alpha: alpha.sin(),
                angle_min: alpha - geometry.dalpha / 2.0,
                angle_max: alpha + geometry.dalpha / 2.0,
                z_min,
                z_max,
            }
        });
        Self {
            slices,
            dalpha: geometry.dalpha,
        }
    }

    /// Parameters of one slice.
    pub fn get(&self, slice: usize) -> Result<&SliceParam> {
        self.slices.get(slice).ok_or(Error::InvalidSlice {
            slice,
            count: NSLICES,
        })
    }

    /// Iterates over all slices in index order.
    pub fn iter(&self) -> impl Iterator<Item = &SliceParam> {
        self.slices.iter()
    }

    /// Number of slices.
    #[must_use]
    pub fn slice_count(&self) -> usize {
        self.slices.len()
    }

    /// Converts slice-local coordinates of `slice` to global coordinates.
    pub fn slice_to_global(&self, slice: usize, local: Point3) -> Result<Point3> {
        Ok(self.get(slice)?.to_global(local))
    }

    /// Converts global coordinates to the local frame of `slice`.
    pub fn global_to_slice(&self, slice: usize, global: Point3) -> Result<Point3> {
        Ok(self.get(slice)?.to_local(global))
    }

    /// Slice whose azimuthal and z acceptance contains a global point.
    ///
    /// Points exactly at `z = 0` are assigned to the positive side.
    #[must_use]
    pub fn find_slice(&self, global: Point3) -> usize {
        let first_edge = self.slices[0].angle_min;
        let mut phi = global.phi() - first_edge;
        if phi < 0.0 {
            phi += TAU;
        }
        let per_side = NSLICES / 2;
        let sector = ((phi / self.dalpha) as usize).min(per_side - 1);
        if global.z < 0.0 {
            sector + per_side
        } else {
            sector
        }
    }
}

/// Normalizes an angle to `(-pi, pi]`.
///
/// Non-finite input is returned unchanged.
#[must_use]
pub fn normalize_angle(angle: f32) -> f32 {
    if !angle.is_finite() {
        return angle;
    }
    let a = angle.rem_euclid(TAU);
    if a > PI {
        a - TAU
    } else {
        a
    }
}
