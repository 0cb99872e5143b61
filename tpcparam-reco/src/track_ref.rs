//! Track references: true positions and momenta supplied by the simulation.
//!
//! A reference is the boundary type between the transport code and the
//! reconstruction. It can be turned into local track parameters in any
//! slice frame for comparison with reconstructed tracks.

use tpcparam_core::{normalize_angle, Error, Point3, Result};

/// Transport status of the particle when the reference was recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct TrackStatus {
    pub new_track: bool,
    pub alive: bool,
    pub disappeared: bool,
    pub entering: bool,
    pub exiting: bool,
    pub inside: bool,
    pub out: bool,
    pub stop: bool,
}

impl TrackStatus {
    /// Decodes the packed status bits (bit 0 = new track ... bit 7 = stop).
    #[must_use]
    pub fn from_bits(bits: u8) -> Self {
        let bit = |i: u8| bits & (1 << i) != 0;
        Self {
            new_track: bit(0),
            alive: bit(1),
            disappeared: bit(2),
            entering: bit(3),
            exiting: bit(4),
            inside: bit(5),
            out: bit(6),
            stop: bit(7),
        }
    }

    /// Packs the status into a byte.
    #[must_use]
    pub fn bits(self) -> u8 {
        [
            self.new_track,
            self.alive,
            self.disappeared,
            self.entering,
            self.exiting,
            self.inside,
            self.out,
            self.stop,
        ]
        .iter()
        .enumerate()
        .fold(0, |acc, (i, &set)| if set { acc | (1 << i) } else { acc })
    }
}

/// True kinematics of a particle at a detector boundary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackReference {
    /// Simulation label of the particle.
    pub label: i32,
    /// Global position in cm.
    pub position: Point3,
    /// Momentum in GeV/c.
    pub momentum: Point3,
    /// Track length up to this point, in cm.
    pub length: f32,
    /// Time of flight up to this point, in s.
    pub time: f32,
    pub user_id: i32,
    /// Detector that recorded the reference; `-999` if unset.
    pub detector_id: i32,
    pub status: TrackStatus,
}

impl Default for TrackReference {
    fn default() -> Self {
        Self {
            label: 0,
            position: Point3::default(),
            momentum: Point3::default(),
            length: 0.0,
            time: 0.0,
            user_id: 0,
            detector_id: -999,
            status: TrackStatus::default(),
        }
    }
}

/// Local track parameters in a rotated frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TrackParam {
    /// Local x (radial) coordinate.
    pub x: f32,
    /// Rotation angle of the frame.
    pub alpha: f32,
    /// Local y coordinate.
    pub y: f32,
    /// z coordinate.
    pub z: f32,
    /// Sine of the momentum direction relative to the frame.
    pub snp: f32,
    /// Dip tangent, `pz / pt`.
    pub tgl: f32,
    /// Signed inverse transverse momentum.
    pub q_pt: f32,
}

impl TrackReference {
    /// Creates a reference at `position` with `momentum`.
    #[must_use]
    pub fn new(label: i32, position: Point3, momentum: Point3) -> Self {
        Self {
            label,
            position,
            momentum,
            ..Self::default()
        }
    }

    /// Transverse momentum.
    #[must_use]
    pub fn pt(&self) -> f32 {
        self.momentum.r()
    }

    /// Total momentum.
    #[must_use]
    pub fn p(&self) -> f32 {
        self.momentum.norm()
    }

    /// Azimuth of the position, the natural frame angle of the reference.
    #[must_use]
    pub fn alpha(&self) -> f32 {
        self.position.phi()
    }

    /// Radial coordinate in the reference's own frame.
    #[must_use]
    pub fn local_x(&self) -> f32 {
        self.position.r()
    }

    /// Transverse coordinate in the reference's own frame.
    #[must_use]
    pub fn local_y(&self) -> f32 {
        let alpha = self.alpha();
        -self.position.x * alpha.sin() + self.position.y * alpha.cos()
    }

    /// Azimuth of the momentum.
    #[must_use]
    pub fn phi(&self) -> f32 {
        self.momentum.phi()
    }

    /// Polar angle of the momentum.
    #[must_use]
    pub fn theta(&self) -> f32 {
        self.pt().atan2(self.momentum.z)
    }

    /// Track parameters in the reference's own frame.
    ///
    /// A negative `mass` flips the charge sign.
    pub fn make_track(&self, mass: f32) -> Result<TrackParam> {
        self.track_param_in_frame(self.alpha(), mass)
    }

    /// Track parameters in a frame rotated by `alpha`.
    pub fn track_param_in_frame(&self, alpha: f32, mass: f32) -> Result<TrackParam> {
        let pt = self.pt();
        if pt == 0.0 {
            return Err(Error::DegenerateMomentum {
                pz: self.momentum.z,
            });
        }
        let (sin, cos) = alpha.sin_cos();
        let local = self.position.rotate_z(cos, -sin);
        let direction = normalize_angle(self.phi() - alpha);
        let mut q_pt = 1.0 / pt;
        if mass < 0.0 {
            q_pt = -q_pt;
        }
        Ok(TrackParam {
            x: local.x,
            alpha,
            y: local.y,
            z: self.position.z,
            snp: direction.sin(),
            tgl: self.momentum.z / pt,
            q_pt,
        })
    }
}
