//! Cartesian points in the detector frame.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A point (or vector) in cm, either slice-local or global.
///
/// In the slice-local frame `x` points radially outward through the slice
/// centre, `y` along the pad row and `z` along the beam axis.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Point3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Point3 {
    /// Creates a new point.
    #[inline]
    #[must_use]
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Distance from the beam axis.
    #[inline]
    #[must_use]
    pub fn r(&self) -> f32 {
        self.x.hypot(self.y)
    }

    /// Azimuthal angle in `(-pi, pi]`.
    #[inline]
    #[must_use]
    pub fn phi(&self) -> f32 {
        self.y.atan2(self.x)
    }

    /// Euclidean norm.
    #[inline]
    #[must_use]
    pub fn norm(&self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Rotates the point by `(cos, sin)` of an angle around the z axis.
    #[inline]
    #[must_use]
    pub fn rotate_z(&self, cos: f32, sin: f32) -> Self {
        Self {
            x: self.x * cos - self.y * sin,
            y: self.x * sin + self.y * cos,
            z: self.z,
        }
    }
}

impl From<[f32; 3]> for Point3 {
    fn from(v: [f32; 3]) -> Self {
        Self::new(v[0], v[1], v[2])
    }
}

impl From<Point3> for [f32; 3] {
    fn from(p: Point3) -> Self {
        [p.x, p.y, p.z]
    }
}
