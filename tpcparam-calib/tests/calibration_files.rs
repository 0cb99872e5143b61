use std::io::Write;

use tempfile::NamedTempFile;
use tpcparam_calib::{CalibrationSource, Error, JsonCalibration};
use tpcparam_core::{
    Axis, ClusterErrorCoefficients, RowRegion, N_AXES, N_ERROR2_TERMS, N_REGIONS, N_RMS_TERMS,
};

fn document() -> String {
    let row4 = |base: f32| format!("[{base}, 1e-4, 0.05, 0.5]");
    let row6 = |base: f32| format!("[{base}, 2e-5, 0.02, 1e-8, 0.004, 1e-4]");
    format!(
        r#"{{
            "cluster_errors": {{
                "rms": {{ "y": [{}, {}, {}], "z": [{}, {}, {}] }},
                "error2": {{ "y": [{}, {}, {}], "z": [{}, {}, {}] }}
            }}
        }}"#,
        row4(0.04),
        row4(0.08),
        row4(0.09),
        row4(0.06),
        row4(0.061),
        row4(0.066),
        row6(0.0006),
        row6(0.001),
        row6(0.00007),
        row6(0.0015),
        row6(0.0012),
        row6(0.0006),
    )
}

#[test]
fn test_load_from_file() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(document().as_bytes()).unwrap();

    let calib = JsonCalibration::from_file(file.path()).expect("calibration file should load");
    assert_eq!(calib.name(), file.path().display().to_string());

    let coefficients = calib.cluster_error_coefficients().unwrap();
    assert_eq!(coefficients.rms_terms(Axis::Y, RowRegion::OuterMedium)[0], 0.08);
    assert_eq!(coefficients.error2_terms(Axis::Z, RowRegion::Inner)[0], 0.0015);
}

#[test]
fn test_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let result = JsonCalibration::from_file(dir.path().join("missing.json"));
    assert!(matches!(result, Err(Error::IoError(_))));
}

#[test]
fn test_overflowing_literal_is_json_error() {
    // serde_json refuses out-of-range numbers before any table is built
    let json = document().replacen("0.04,", "1e999,", 1);
    let err = JsonCalibration::from_json(&json).unwrap_err();
    assert!(matches!(err, Error::JsonError(_)), "unexpected error: {err:?}");

    let core: tpcparam_core::Error = err.into();
    assert!(
        matches!(core, tpcparam_core::Error::Calibration(ref msg) if msg.contains("JSON")),
        "unexpected error: {core:?}"
    );
}

#[test]
fn test_non_finite_coefficient_rejected() {
    let mut rms = [[[0.1; N_RMS_TERMS]; N_REGIONS]; N_AXES];
    rms[1][2][3] = f32::INFINITY;
    let error2 = [[[0.01; N_ERROR2_TERMS]; N_REGIONS]; N_AXES];
    assert_eq!(
        ClusterErrorCoefficients::new(rms, error2),
        Err(tpcparam_core::Error::InvalidCoefficient {
            table: "rms",
            axis: 1,
            region: 2,
            term: 3,
            value: f32::INFINITY,
        })
    );

    let rms = [[[0.1; N_RMS_TERMS]; N_REGIONS]; N_AXES];
    let mut error2 = [[[0.01; N_ERROR2_TERMS]; N_REGIONS]; N_AXES];
    error2[0][0][5] = f32::NEG_INFINITY;
    assert!(matches!(
        ClusterErrorCoefficients::new(rms, error2),
        Err(tpcparam_core::Error::InvalidCoefficient { table: "error2", term: 5, .. })
    ));
}
