//! tpcparam CLI
//!
//! Inspects the reconstruction parameters of a run: slice layout, frame
//! transforms, the magnetic field and calibrated cluster errors.
#![allow(clippy::uninlined_format_args)]

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use thiserror::Error;
use tpcparam_calib::JsonCalibration;
use tpcparam_reco::{ClusterQuery, ClusterState, Param, ParamConfig, Point3};
use tracing_subscriber::EnvFilter;

/// Result type for CLI operations.
type Result<T> = std::result::Result<T, CliError>;

/// CLI error types.
#[derive(Error, Debug)]
enum CliError {
    #[error("Core error: {0}")]
    Core(#[from] tpcparam_core::Error),

    #[error("Calibration error: {0}")]
    Calibration(#[from] tpcparam_calib::Error),

    #[error("{0}")]
    Usage(String),
}

/// Inspect TPC reconstruction parameters.
#[derive(Parser)]
#[command(name = "tpcparam")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Settings file (JSON); defaults apply when omitted
    #[arg(short, long, global = true)]
    settings: Option<PathBuf>,

    /// Nominal solenoid field in kG, overrides the settings file
    #[arg(long, global = true, allow_negative_numbers = true)]
    bz: Option<f32>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the slice table
    Slices,

    /// Convert a point between a slice frame and the global frame
    Transform {
        /// Slice index
        #[arg(long)]
        slice: usize,

        /// Point coordinates x y z (cm)
        #[arg(num_args = 3, value_names = ["X", "Y", "Z"], allow_negative_numbers = true)]
        point: Vec<f32>,

        /// Interpret the point as global and convert it to the slice frame
        #[arg(long)]
        to_slice: bool,
    },

    /// Evaluate the magnetic field at a global position
    Field {
        /// Position x y z (cm)
        #[arg(num_args = 3, value_names = ["X", "Y", "Z"], allow_negative_numbers = true)]
        point: Vec<f32>,
    },

    /// Evaluate calibrated cluster errors
    Errors {
        /// Calibration file (JSON)
        #[arg(short, long)]
        calibration: PathBuf,

        /// Pad row
        #[arg(long)]
        row: usize,

        /// Cluster z (cm)
        #[arg(long, default_value = "0.0", allow_negative_numbers = true)]
        z: f32,

        /// Sine of the track azimuth in the slice frame
        #[arg(long, default_value = "0.0", allow_negative_numbers = true)]
        sin_phi: f32,

        /// Track dip dz/ds
        #[arg(long, default_value = "0.0", allow_negative_numbers = true)]
        dz_ds: f32,

        /// Packed cluster state flags (0x01 split pad ... 0x10 shared)
        #[arg(long, default_value = "0")]
        state: u8,

        /// Log every loaded coefficient row
        #[arg(long)]
        print: bool,
    },
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(settings: Option<&Path>, bz: Option<f32>) -> Result<ParamConfig> {
    let mut config = match settings {
        Some(path) => ParamConfig::from_file(path)?,
        None => ParamConfig::default(),
    };
    if let Some(bz) = bz {
        config.event.solenoid_bz = bz;
    }
    tracing::debug!(
        settings = ?settings,
        bz_kg = config.event.solenoid_bz,
        "Run configuration loaded"
    );
    Ok(config)
}

fn point(values: &[f32]) -> Result<Point3> {
    match values {
        [x, y, z] => Ok(Point3::new(*x, *y, *z)),
        _ => Err(CliError::Usage(format!(
            "expected 3 coordinates, got {}",
            values.len()
        ))),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = load_config(cli.settings.as_deref(), cli.bz)?;
    let mut param = Param::new(&config)?;

    match cli.command {
        Commands::Slices => {
            println!(
                "{:>5} {:>10} {:>10} {:>10} {:>8} {:>8}",
                "slice", "alpha", "min", "max", "z_min", "z_max"
            );
            for (i, slice) in param.slices().iter().enumerate() {
                println!(
                    "{:>5} {:>10.4} {:>10.4} {:>10.4} {:>8.1} {:>8.1}",
                    i,
                    slice.alpha.to_degrees(),
                    slice.angle_min.to_degrees(),
                    slice.angle_max.to_degrees(),
                    slice.z_min,
                    slice.z_max
                );
            }
        }

        Commands::Transform {
            slice,
            point: values,
            to_slice,
        } => {
            let p = point(&values)?;
            let (label, out) = if to_slice {
                ("local", param.global_to_slice(slice, p)?)
            } else {
                ("global", param.slice_to_global(slice, p)?)
            };
            println!("{}: {:.6} {:.6} {:.6}", label, out.x, out.y, out.z);
            if !to_slice && cli.verbose {
                eprintln!("Containing slice: {}", param.slices().find_slice(out));
            }
        }

        Commands::Field { point: values } => {
            let p = point(&values)?;
            let b = param.field(p);
            let flags = param.flags();
            println!(
                "Mode: {}",
                if flags.assume_constant_bz {
                    "constant"
                } else {
                    "polynomial"
                }
            );
            println!("Nominal: {} kG", param.bz_kg());
            println!("B (kG*c): {:.6e} {:.6e} {:.6e}", b.x, b.y, b.z);
        }

        Commands::Errors {
            calibration,
            row,
            z,
            sin_phi,
            dz_ds,
            state,
            print,
        } => {
            let source = JsonCalibration::from_file(&calibration)?;
            tracing::info!(path = %calibration.display(), "Loading calibration");
            param.load_cluster_errors(&source, print)?;

            let rms2 = param.cluster_rms2(row, z, sin_phi, dz_ds)?;
            let query =
                ClusterQuery::new(row, z, sin_phi, dz_ds).with_state(ClusterState::from_bits(state));
            let errors2 = param.cluster_query(&query)?;

            if param.flags().continuous_tracking {
                println!("Continuous tracking: z ignored");
            }
            println!("RMS^2:   y {:.6e}  z {:.6e}", rms2.y2, rms2.z2);
            println!("Error^2: y {:.6e}  z {:.6e}", errors2.y2, errors2.z2);
        }
    }

    Ok(())
}
