//! Magnetic field model.
//!
//! Field values are returned in kG multiplied by [`CLIGHT`], the unit the
//! track propagation consumes. The constant mode returns a pure solenoid
//! field along z; the polynomial mode evaluates a second-order fit over the
//! tracking volume.

use crate::point::Point3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Curvature constant in GeV/(kG cm).
pub const CLIGHT: f32 = 0.000_299_792_458;

/// Number of monomials per field component: `1, x, y, z, x², xy, xz, y², yz, z²`.
pub const N_FIELD_TERMS: usize = 10;

/// Relative field curvature of the default solenoid map, in cm⁻².
///
/// `Bz` drops by `SOLENOID_FRINGE * z²` towards the end plates and the
/// radial components follow from `div B = 0` and `curl B = 0`.
pub const SOLENOID_FRINGE: f32 = 1.0e-6;

/// How the field is evaluated for the whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FieldMode {
    /// Homogeneous field along z.
    Constant,
    /// Polynomial field map.
    #[default]
    Polynomial,
}

/// Second-order polynomial approximation of the field, coefficients in kG·c.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PolynomialField {
    bx: [f32; N_FIELD_TERMS],
    by: [f32; N_FIELD_TERMS],
    bz: [f32; N_FIELD_TERMS],
}

impl PolynomialField {
    /// Homogeneous field of `bz_kg` kG along z.
    #[must_use]
    pub fn uniform(bz_kg: f32) -> Self {
        let mut bz = [0.0; N_FIELD_TERMS];
        bz[0] = bz_kg * CLIGHT;
        Self {
            bx: [0.0; N_FIELD_TERMS],
            by: [0.0; N_FIELD_TERMS],
            bz,
        }
    }

    /// Default solenoid map for a nominal field of `bz_kg` kG.
    #[must_use]
    pub fn solenoid(bz_kg: f32) -> Self {
        let b0 = bz_kg * CLIGHT;
        let k = SOLENOID_FRINGE * b0;

        let mut bx = [0.0; N_FIELD_TERMS];
        let mut by = [0.0; N_FIELD_TERMS];
        let mut bz = [0.0; N_FIELD_TERMS];
        bx[6] = k; // xz
        by[8] = k; // yz
        bz[0] = b0;
        bz[4] = 0.5 * k; // x²
        bz[7] = 0.5 * k; // y²
        bz[9] = -k; // z²
        Self { bx, by, bz }
    }

    /// Field map from fitted coefficients, already scaled to kG·c.
    #[must_use]
    pub fn from_coefficients(
        bx: [f32; N_FIELD_TERMS],
        by: [f32; N_FIELD_TERMS],
        bz: [f32; N_FIELD_TERMS],
    ) -> Self {
        Self { bx, by, bz }
    }

    /// Coefficients of the three components.
    #[must_use]
    pub fn coefficients(&self) -> [&[f32; N_FIELD_TERMS]; 3] {
        [&self.bx, &self.by, &self.bz]
    }

    #[inline]
    fn monomials(p: Point3) -> [f32; N_FIELD_TERMS] {
        let Point3 { x, y, z } = p;
        [1.0, x, y, z, x * x, x * y, x * z, y * y, y * z, z * z]
    }

    #[inline]
    fn dot(c: &[f32; N_FIELD_TERMS], f: &[f32; N_FIELD_TERMS]) -> f32 {
        c.iter().zip(f).map(|(c, f)| c * f).sum()
    }

    /// Field vector at `p`.
    #[must_use]
    pub fn field(&self, p: Point3) -> Point3 {
        let f = Self::monomials(p);
        Point3::new(
            Self::dot(&self.bx, &f),
            Self::dot(&self.by, &f),
            Self::dot(&self.bz, &f),
        )
    }

    /// Longitudinal component at `p`.
    #[must_use]
    pub fn bz(&self, p: Point3) -> f32 {
        Self::dot(&self.bz, &Self::monomials(p))
    }
}

/// Magnetic field used for the run.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MagneticField {
    mode: FieldMode,
    bz_kg: f32,
    polynomial: PolynomialField,
}

impl MagneticField {
    /// Field for a nominal solenoid strength in kG.
    ///
    /// The polynomial map is the default solenoid map in polynomial mode and
    /// the uniform map in constant mode.
    #[must_use]
    pub fn new(bz_kg: f32, mode: FieldMode) -> Self {
        let polynomial = match mode {
            FieldMode::Constant => PolynomialField::uniform(bz_kg),
            FieldMode::Polynomial => PolynomialField::solenoid(bz_kg),
        };
        Self {
            mode,
            bz_kg,
            polynomial,
        }
    }

    /// Polynomial mode with an externally fitted map.
    #[must_use]
    pub fn with_polynomial(bz_kg: f32, polynomial: PolynomialField) -> Self {
        Self {
            mode: FieldMode::Polynomial,
            bz_kg,
            polynomial,
        }
    }

    /// Evaluation mode.
    #[inline]
    #[must_use]
    pub fn mode(&self) -> FieldMode {
        self.mode
    }

    /// Nominal field in kG.
    #[inline]
    #[must_use]
    pub fn bz_kg(&self) -> f32 {
        self.bz_kg
    }

    /// Nominal field in kG·c.
    #[inline]
    #[must_use]
    pub fn const_bz(&self) -> f32 {
        self.bz_kg * CLIGHT
    }

    /// Polynomial map backing the field.
    #[must_use]
    pub fn polynomial(&self) -> &PolynomialField {
        &self.polynomial
    }

    /// Field vector at a global position, in kG·c.
    #[must_use]
    pub fn field(&self, p: Point3) -> Point3 {
        match self.mode {
            FieldMode::Constant => Point3::new(0.0, 0.0, self.const_bz()),
            FieldMode::Polynomial => self.polynomial.field(p),
        }
    }

    /// Longitudinal field component at a global position, in kG·c.
    #[must_use]
    pub fn bz(&self, p: Point3) -> f32 {
        match self.mode {
            FieldMode::Constant => self.const_bz(),
            FieldMode::Polynomial => self.polynomial.bz(p),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_constant_field() {
        let field = MagneticField::new(5.0, FieldMode::Constant);
        let b = field.field(Point3::new(120.0, -40.0, 80.0));
        assert_eq!(b.x, 0.0);
        assert_eq!(b.y, 0.0);
        assert_eq!(b.z, 5.0 * CLIGHT);
        assert_eq!(field.bz(Point3::default()), field.const_bz());
    }

    #[test]
    fn test_mode_changes_field() {
        let p = Point3::new(120.0, -40.0, 80.0);
        let constant = MagneticField::new(5.0, FieldMode::Constant).field(p);
        let polynomial = MagneticField::new(5.0, FieldMode::Polynomial).field(p);
        assert_ne!(constant, polynomial);
        assert!(polynomial.x.abs() > 0.0);
        assert!(polynomial.y.abs() > 0.0);
    }

    #[test]
    fn test_uniform_polynomial_matches_constant() {
        let poly = PolynomialField::uniform(-2.0);
        let b = poly.field(Point3::new(200.0, 30.0, -150.0));
        assert_eq!(b, Point3::new(0.0, 0.0, -2.0 * CLIGHT));
    }

    #[test]
    fn test_solenoid_centre_is_nominal() {
        let poly = PolynomialField::solenoid(5.0);
        let b = poly.field(Point3::default());
        assert_eq!(b, Point3::new(0.0, 0.0, 5.0 * CLIGHT));
        // Field drops towards the end plates.
        assert!(poly.bz(Point3::new(0.0, 0.0, 240.0)) < b.z);
    }

    #[test]
    fn test_solenoid_map_is_source_free() {
        // Finite-difference divergence and curl of the quadratic map vanish.
        let poly = PolynomialField::solenoid(5.0);
        let p = Point3::new(110.0, 60.0, 90.0);
        let h = 1.0;
        let d = |dx: f32, dy: f32, dz: f32| {
            let plus = poly.field(Point3::new(p.x + dx, p.y + dy, p.z + dz));
            let minus = poly.field(Point3::new(p.x - dx, p.y - dy, p.z - dz));
            Point3::new(
                (plus.x - minus.x) / (2.0 * h),
                (plus.y - minus.y) / (2.0 * h),
                (plus.z - minus.z) / (2.0 * h),
            )
        };
        let ddx = d(h, 0.0, 0.0);
        let ddy = d(0.0, h, 0.0);
        let ddz = d(0.0, 0.0, h);

        let scale = 5.0 * CLIGHT * SOLENOID_FRINGE * 100.0;
        assert_relative_eq!(ddx.x + ddy.y + ddz.z, 0.0, epsilon = scale * 5e-2);
        assert_relative_eq!(ddy.z - ddz.y, 0.0, epsilon = scale * 5e-2);
        assert_relative_eq!(ddz.x - ddx.z, 0.0, epsilon = scale * 5e-2);
    }

    #[test]
    fn test_custom_polynomial() {
        let mut bz = [0.0; N_FIELD_TERMS];
        bz[0] = 1.0;
        bz[3] = 0.5;
        let poly =
            PolynomialField::from_coefficients([0.0; N_FIELD_TERMS], [0.0; N_FIELD_TERMS], bz);
        let field = MagneticField::with_polynomial(5.0, poly);
        assert_eq!(field.mode(), FieldMode::Polynomial);
        assert_relative_eq!(field.bz(Point3::new(0.0, 0.0, 2.0)), 2.0);
    }
}
