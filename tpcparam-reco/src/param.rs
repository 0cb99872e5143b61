//! Run parameter aggregator.
//!
//! [`Param`] owns the geometry, the slice table, the magnetic field and the
//! cluster error model for a run. It is built once from a [`ParamConfig`],
//! optionally updated per event, and then shared read-only between the
//! tracking workers.

use tpcparam_core::{
    Axis, CalibrationSource, ClusterErrorModel, ClusterState, ClusterVariance, Error, FieldMode,
    MagneticField, Point3, PolynomialField, Result, RowRegion, SliceParam, SliceTable,
    TpcGeometry,
};

use crate::settings::{
    EventSettings, ParamConfig, ProcessingSettings, RecoSettings, TPC_MAX_TF_TIME_BIN,
};
use crate::track_ref::{TrackParam, TrackReference};

/// Default cluster Y error in cm.
pub const DEFAULT_ERR_Y: f32 = 1.0;

/// Default cluster Z error in cm.
pub const DEFAULT_ERR_Z: f32 = 0.228_808;

/// Drift position used for row queries when the absolute z is unknown.
pub const CONTINUOUS_QUERY_Z: f32 = 125.0;

/// Run-level switches derived from the settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParamFlags {
    /// The field is treated as homogeneous.
    pub assume_constant_bz: bool,
    /// Events come from the toy generator.
    pub toy_mc_events: bool,
    /// Continuous readout, cluster z is relative to the time frame.
    pub continuous_tracking: bool,
    pub reset_timers: bool,
    /// dE/dx is computed.
    pub dedx: bool,
    /// Clusters are transformed before tracking.
    pub early_transform: bool,
}

/// Parameters of one reconstruction run.
#[derive(Debug, Clone)]
pub struct Param {
    reco: RecoSettings,
    geometry: TpcGeometry,
    slices: SliceTable,
    field: MagneticField,
    err_x: f32,
    err_y: f32,
    err_z: f32,
    flags: ParamFlags,
    debug_level: i32,
    continuous_max_time_bin: i32,
    cluster_errors: Option<ClusterErrorModel>,
    calibration_field: Option<PolynomialField>,
}

impl Param {
    /// Builds the parameters for a run.
    pub fn new(config: &ParamConfig) -> Result<Self> {
        config.validate()?;
        let geometry = TpcGeometry::nominal();
        let slices = SliceTable::new(&geometry);
        let mut param = Self {
            reco: RecoSettings::default(),
            field: MagneticField::new(config.event.solenoid_bz, FieldMode::default()),
            err_x: 0.0,
            err_y: DEFAULT_ERR_Y,
            err_z: DEFAULT_ERR_Z,
            flags: ParamFlags::default(),
            debug_level: 0,
            continuous_max_time_bin: 0,
            cluster_errors: None,
            calibration_field: None,
            geometry,
            slices,
        };
        param.set_defaults(config)?;
        Ok(param)
    }

    /// Resets every parameter from `config`.
    ///
    /// Loaded cluster error coefficients and calibration field maps are
    /// dropped; call [`Param::load_cluster_errors`] again afterwards.
    pub fn set_defaults(&mut self, config: &ParamConfig) -> Result<()> {
        config.validate()?;

        self.geometry = TpcGeometry::nominal();
        self.slices = SliceTable::new(&self.geometry);
        self.err_x = self.geometry.pad_pitch / 12.0_f32.sqrt();
        self.err_y = DEFAULT_ERR_Y;
        self.err_z = DEFAULT_ERR_Z;
        self.cluster_errors = None;
        self.calibration_field = None;
        self.flags = ParamFlags {
            dedx: config.workflow.as_ref().is_some_and(|w| w.tpc_dedx),
            ..ParamFlags::default()
        };

        self.reco = config.reco.clone().unwrap_or_default();
        if self.reco.fit_propagate_bz_only == -1 {
            self.reco.fit_propagate_bz_only =
                i8::try_from(self.reco.n_ways).map_or(i8::MAX, |n| n - 1);
        }

        // The nominal field is fixed here; event updates only switch the mode.
        self.field = MagneticField::new(config.event.solenoid_bz, FieldMode::default());

        tracing::debug!(
            bz_kg = config.event.solenoid_bz,
            n_ways = self.reco.n_ways,
            dedx = self.flags.dedx,
            "Parameters reset to defaults"
        );
        self.update_event_settings(&config.event, config.processing.as_ref())
    }

    /// Applies per-event settings.
    ///
    /// The nominal field strength, the geometry and the slice table are not
    /// touched; only the derived flags and the field evaluation mode change.
    pub fn update_event_settings(
        &mut self,
        event: &EventSettings,
        processing: Option<&ProcessingSettings>,
    ) -> Result<()> {
        event.validate()?;

        self.flags.assume_constant_bz = event.const_bz;
        self.flags.toy_mc_events = event.homemade_events;
        self.flags.continuous_tracking = event.continuous_max_time_bin != 0;
        self.continuous_max_time_bin = if event.continuous_max_time_bin == -1 {
            TPC_MAX_TF_TIME_BIN
        } else {
            event.continuous_max_time_bin
        };
        self.rebuild_field();

        if let Some(processing) = processing {
            self.debug_level = processing.debug_level;
            self.flags.reset_timers = processing.reset_timers;
        }

        self.flags.early_transform = match self.reco.force_early_tpc_transform {
            -1 => !self.flags.continuous_tracking,
            force => force != 0,
        };

        tracing::debug!(
            const_bz = self.flags.assume_constant_bz,
            continuous = self.flags.continuous_tracking,
            max_time_bin = self.continuous_max_time_bin,
            early_transform = self.flags.early_transform,
            "Event settings applied"
        );
        Ok(())
    }

    fn rebuild_field(&mut self) {
        let bz_kg = self.field.bz_kg();
        self.field = if self.flags.assume_constant_bz {
            MagneticField::new(bz_kg, FieldMode::Constant)
        } else if let Some(polynomial) = &self.calibration_field {
            MagneticField::with_polynomial(bz_kg, polynomial.clone())
        } else {
            MagneticField::new(bz_kg, FieldMode::Polynomial)
        };
    }

    /// Loads cluster error coefficients, and a fitted field map if the
    /// source provides one.
    ///
    /// With `print` set, every loaded table row is logged at info level.
    pub fn load_cluster_errors(
        &mut self,
        source: &dyn CalibrationSource,
        print: bool,
    ) -> Result<()> {
        let coefficients = source.cluster_error_coefficients()?;
        let field = source.polynomial_field()?;

        if print {
            for axis in Axis::ALL {
                for region in RowRegion::ALL {
                    tracing::info!(
                        source = source.name(),
                        ?axis,
                        region = region.name(),
                        rms = ?coefficients.rms_terms(axis, region),
                        error2 = ?coefficients.error2_terms(axis, region),
                        "Cluster error coefficients"
                    );
                }
            }
        }

        let model = ClusterErrorModel::new(coefficients, self.geometry.clone()).with_corrections(
            self.reco.cluster_error2_correction_y,
            self.reco.cluster_error2_correction_z,
        )?;
        self.cluster_errors = Some(model);

        if field.is_some() {
            self.calibration_field = field;
            self.rebuild_field();
        }

        tracing::debug!(
            source = source.name(),
            field_map = self.calibration_field.is_some(),
            "Cluster errors loaded"
        );
        Ok(())
    }

    /// Rotation angle of a slice.
    pub fn alpha(&self, slice: usize) -> Result<f32> {
        self.geometry.alpha(slice)
    }

    /// Per-slice geometry.
    pub fn slice(&self, slice: usize) -> Result<&SliceParam> {
        self.slices.get(slice)
    }

    /// Converts slice-local coordinates to global coordinates.
    pub fn slice_to_global(&self, slice: usize, local: Point3) -> Result<Point3> {
        self.slices.slice_to_global(slice, local)
    }

    /// Converts global coordinates to slice-local coordinates.
    pub fn global_to_slice(&self, slice: usize, global: Point3) -> Result<Point3> {
        self.slices.global_to_slice(slice, global)
    }

    /// Field vector at a global position, in kG·c.
    #[must_use]
    pub fn field(&self, p: Point3) -> Point3 {
        self.field.field(p)
    }

    /// Longitudinal field at a global position, in kG·c.
    #[must_use]
    pub fn bz(&self, p: Point3) -> f32 {
        self.field.bz(p)
    }

    /// Loaded cluster error model.
    pub fn cluster_errors(&self) -> Result<&ClusterErrorModel> {
        self.cluster_errors
            .as_ref()
            .ok_or(Error::CoefficientsNotLoaded)
    }

    /// Cluster RMS for a drift length `z` and squared angle tangent.
    pub fn cluster_rms(&self, axis: Axis, region: RowRegion, z: f32, angle2: f32) -> Result<f32> {
        Ok(self.cluster_errors()?.rms(axis, region, z, angle2))
    }

    /// Squared cluster RMS of a row for a track at `z`.
    ///
    /// `z` is replaced by [`CONTINUOUS_QUERY_Z`] in continuous tracking.
    pub fn cluster_rms2(&self, row: usize, z: f32, sin_phi: f32, dz_ds: f32) -> Result<ClusterVariance> {
        self.cluster_errors()?.rms2(row, self.query_z(z), sin_phi, dz_ds)
    }

    /// Parameterized position variance for a drift length `z`.
    pub fn cluster_error2(
        &self,
        axis: Axis,
        region: RowRegion,
        z: f32,
        angle2: f32,
    ) -> Result<f32> {
        Ok(self.cluster_errors()?.error2(axis, region, z, angle2))
    }

    /// Position variances of a row for a track at `z`.
    ///
    /// `z` is replaced by [`CONTINUOUS_QUERY_Z`] in continuous tracking.
    pub fn cluster_errors2(
        &self,
        row: usize,
        z: f32,
        sin_phi: f32,
        dz_ds: f32,
    ) -> Result<ClusterVariance> {
        self.cluster_errors()?.errors2(row, self.query_z(z), sin_phi, dz_ds)
    }

    /// Raises a variance pair according to cluster quality flags.
    #[must_use]
    pub fn update_cluster_error2_by_state(
        &self,
        state: ClusterState,
        variance: ClusterVariance,
    ) -> ClusterVariance {
        variance.with_state(state)
    }

    /// Track parameters of a reference in the frame of `slice`.
    pub fn track_param_in_slice(
        &self,
        reference: &TrackReference,
        slice: usize,
        mass: f32,
    ) -> Result<TrackParam> {
        let alpha = self.slice(slice)?.alpha;
        reference.track_param_in_frame(alpha, mass)
    }

    /// z used by every row-based variance query (`cluster_rms2`,
    /// `cluster_errors2` and the batch queries built on them).
    ///
    /// In continuous tracking the absolute cluster z is unknown, so all of
    /// these evaluate at [`CONTINUOUS_QUERY_Z`], not only track seeding.
    #[inline]
    fn query_z(&self, z: f32) -> f32 {
        if self.flags.continuous_tracking {
            CONTINUOUS_QUERY_Z
        } else {
            z
        }
    }

    #[must_use]
    pub fn geometry(&self) -> &TpcGeometry {
        &self.geometry
    }

    #[must_use]
    pub fn slices(&self) -> &SliceTable {
        &self.slices
    }

    #[must_use]
    pub fn magnetic_field(&self) -> &MagneticField {
        &self.field
    }

    /// Nominal field in kG.
    #[must_use]
    pub fn bz_kg(&self) -> f32 {
        self.field.bz_kg()
    }

    /// Nominal field in kG·c.
    #[must_use]
    pub fn const_bz(&self) -> f32 {
        self.field.const_bz()
    }

    /// Default cluster errors `(x, y, z)` in cm.
    #[must_use]
    pub fn default_errors(&self) -> (f32, f32, f32) {
        (self.err_x, self.err_y, self.err_z)
    }

    #[must_use]
    pub fn flags(&self) -> ParamFlags {
        self.flags
    }

    #[must_use]
    pub fn reco(&self) -> &RecoSettings {
        &self.reco
    }

    #[must_use]
    pub fn debug_level(&self) -> i32 {
        self.debug_level
    }

    /// Max time bin for continuous tracking, `0` when disabled.
    #[must_use]
    pub fn continuous_max_time_bin(&self) -> i32 {
        self.continuous_max_time_bin
    }
}
