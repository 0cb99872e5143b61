//! Run, event and processing settings consumed by [`crate::Param`].
//!
//! Every struct deserializes with defaults for missing fields, so a settings
//! document only needs to name what differs from the defaults.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tpcparam_core::{Error, Result};

/// Largest time bin of a continuous readout time frame.
pub const TPC_MAX_TF_TIME_BIN: i32 = (256 * 3564 + 2 * 8 - 2) / 8;

/// Event-scoped settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventSettings {
    /// Nominal solenoid field in kG.
    pub solenoid_bz: f32,
    /// Assume a homogeneous field.
    pub const_bz: bool,
    /// Events come from the built-in toy generator.
    pub homemade_events: bool,
    /// Max time bin for continuous tracking: `0` disables continuous
    /// tracking, `-1` selects a full time frame.
    pub continuous_max_time_bin: i32,
}

impl Default for EventSettings {
    fn default() -> Self {
        Self {
            solenoid_bz: -5.006_68,
            const_bz: false,
            homemade_events: false,
            continuous_max_time_bin: 0,
        }
    }
}

impl EventSettings {
    /// Event settings for a bare solenoid field value.
    #[must_use]
    pub fn with_solenoid_bz(bz_kg: f32) -> Self {
        Self {
            solenoid_bz: bz_kg,
            ..Self::default()
        }
    }

    /// Enables continuous tracking up to `max_time_bin` (`-1` for a full time frame).
    #[must_use]
    pub fn with_continuous(mut self, max_time_bin: i32) -> Self {
        self.continuous_max_time_bin = max_time_bin;
        self
    }

    /// Sets the constant-field assumption.
    #[must_use]
    pub fn with_const_bz(mut self, const_bz: bool) -> Self {
        self.const_bz = const_bz;
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if !self.solenoid_bz.is_finite() {
            return Err(Error::ConfigError(format!(
                "solenoid field must be finite, got {}",
                self.solenoid_bz
            )));
        }
        if self.continuous_max_time_bin < -1 {
            return Err(Error::ConfigError(format!(
                "continuous max time bin must be -1, 0 or positive, got {}",
                self.continuous_max_time_bin
            )));
        }
        Ok(())
    }
}

/// Reconstruction settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecoSettings {
    /// Scale factor applied to parameterized Y variances.
    pub cluster_error2_correction_y: f32,
    /// Scale factor applied to parameterized Z variances.
    pub cluster_error2_correction_z: f32,
    /// `-1`: decide from the tracking mode, `0`: off, `1`: on.
    pub force_early_tpc_transform: i8,
    /// Number of fit passes.
    pub n_ways: u8,
    /// Propagate with Bz only for the first fit passes; `-1` derives it from `n_ways`.
    pub fit_propagate_bz_only: i8,
}

impl Default for RecoSettings {
    fn default() -> Self {
        Self {
            cluster_error2_correction_y: 1.0,
            cluster_error2_correction_z: 1.0,
            force_early_tpc_transform: -1,
            n_ways: 3,
            fit_propagate_bz_only: -1,
        }
    }
}

impl RecoSettings {
    pub(crate) fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("y", self.cluster_error2_correction_y),
            ("z", self.cluster_error2_correction_z),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::ConfigError(format!(
                    "cluster error correction {name} must be finite and non-negative, got {value}"
                )));
            }
        }
        if self.n_ways == 0 {
            return Err(Error::ConfigError("n_ways must be at least 1".to_string()));
        }
        Ok(())
    }
}

/// Processing settings.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingSettings {
    /// Debug verbosity.
    pub debug_level: i32,
    /// Reset benchmark timers before each event.
    pub reset_timers: bool,
}

/// Reconstruction steps enabled in the workflow.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowSteps {
    /// dE/dx computation.
    pub tpc_dedx: bool,
}

/// Everything needed to initialize a [`crate::Param`].
///
/// A bare field value and a full settings bundle go through the same entry
/// point; absent sections keep their defaults.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParamConfig {
    pub event: EventSettings,
    pub reco: Option<RecoSettings>,
    pub processing: Option<ProcessingSettings>,
    pub workflow: Option<WorkflowSteps>,
}

impl ParamConfig {
    /// Configuration from a bare solenoid field value in kG.
    #[must_use]
    pub fn from_solenoid_bz(bz_kg: f32) -> Self {
        Self {
            event: EventSettings::with_solenoid_bz(bz_kg),
            ..Self::default()
        }
    }

    /// Configuration from event settings.
    #[must_use]
    pub fn from_event(event: EventSettings) -> Self {
        Self {
            event,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_reco(mut self, reco: RecoSettings) -> Self {
        self.reco = Some(reco);
        self
    }

    #[must_use]
    pub fn with_processing(mut self, processing: ProcessingSettings) -> Self {
        self.processing = Some(processing);
        self
    }

    #[must_use]
    pub fn with_workflow(mut self, workflow: WorkflowSteps) -> Self {
        self.workflow = Some(workflow);
        self
    }

    /// Load configuration from a JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|e| Error::ConfigError(format!("{}: {e}", path.display())))?;
        let reader = BufReader::new(file);
        serde_json::from_reader(reader)
            .map_err(|e| Error::ConfigError(format!("{}: {e}", path.display())))
    }

    /// Load configuration from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::ConfigError(e.to_string()))
    }

    /// Checks every section for values the parameter model cannot use.
    pub fn validate(&self) -> Result<()> {
        self.event.validate()?;
        if let Some(reco) = &self.reco {
            reco.validate()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_time_bin() {
        assert_eq!(TPC_MAX_TF_TIME_BIN, 114_049);
    }

    #[test]
    fn test_json_partial_config_field_only() {
        let config = ParamConfig::from_json(r#"{ "event": { "solenoid_bz": 2.0 } }"#)
            .expect("Should parse partial config");
        assert_eq!(config.event.solenoid_bz, 2.0);
        assert!(!config.event.const_bz); // Default
        assert_eq!(config.reco, None);
        assert_eq!(config.processing, None);
    }

    #[test]
    fn test_json_full_bundle() {
        let json = r#"{
            "event": { "solenoid_bz": 5.0, "const_bz": true, "continuous_max_time_bin": -1 },
            "reco": { "cluster_error2_correction_y": 1.5, "n_ways": 5 },
            "processing": { "debug_level": 2, "reset_timers": true },
            "workflow": { "tpc_dedx": true }
        }"#;
        let config = ParamConfig::from_json(json).expect("Should parse");
        assert!(config.event.const_bz);
        assert_eq!(config.event.continuous_max_time_bin, -1);
        let reco = config.reco.as_ref().unwrap();
        assert_eq!(reco.cluster_error2_correction_y, 1.5);
        assert_eq!(reco.cluster_error2_correction_z, 1.0); // Default
        assert_eq!(reco.n_ways, 5);
        assert_eq!(config.processing.as_ref().unwrap().debug_level, 2);
        assert!(config.workflow.as_ref().unwrap().tpc_dedx);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_json_empty() {
        let config = ParamConfig::from_json("{}").expect("Should parse minimal config");
        assert_eq!(config, ParamConfig::default());
    }

    #[test]
    fn test_invalid_settings() {
        let mut config = ParamConfig::from_solenoid_bz(f32::NAN);
        assert!(config.validate().is_err());

        config.event.solenoid_bz = 5.0;
        config.event.continuous_max_time_bin = -7;
        assert!(config.validate().is_err());

        let config = ParamConfig::from_solenoid_bz(5.0).with_reco(RecoSettings {
            cluster_error2_correction_z: -1.0,
            ..RecoSettings::default()
        });
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("correction z"), "unexpected error: {err}");
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            ParamConfig::from_json("{ \"event\": 3 }"),
            Err(Error::ConfigError(_))
        ));
    }
}
