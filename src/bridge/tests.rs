use super::*;
use crate::config::{DataRequest, RunConfig, SpectrumOptions};
use crate::run_pipeline::{ParameterSource, QuantificationSource, RunInput};
use crate::sample_pipeline::spcglyc::Biomarkers;
use crate::types::{ByteOrder, CalibrationParams, SampleIdentity};
use arrow::array::{Array, Float64Array, StringArray};

// Test Helpers

/// Native axis [3.01, 3.46] in 10 points, no SR shift.
fn flat_calibration() -> CalibrationParams {
    CalibrationParams {
        spectrometer_freq_mhz: 600.0,
        base_freq_mhz: 600.0,
        sweep_width_hz: 270.0,
        offset_ppm: 3.46,
    }
}

fn spectrum_source(path: &str, id: &str) -> SpectrumSource {
    let buffer: Vec<u8> = [10i32, 20, 30, 40, 50, 60, 70, 80, 90, 100]
        .iter()
        .flat_map(|v| v.to_le_bytes())
        .collect();
    SpectrumSource {
        identity: SampleIdentity::new(path, id),
        buffer,
        byte_order: ByteOrder::Little,
        scale_exponent: 0,
        eretic_factor: None,
    }
}

fn run_input(paths: &[(&str, &str)]) -> RunInput {
    RunInput {
        experiment: "exp".to_string(),
        spectra: paths.iter().map(|(p, id)| spectrum_source(p, id)).collect(),
        parameters: paths
            .iter()
            .map(|(p, _)| ParameterSource {
                data_path: p.to_string(),
                calibration: flat_calibration(),
                pulse_program: "noesygppr1d".to_string(),
            })
            .collect(),
        quantification: vec![],
    }
}

fn config(what: DataRequest) -> RunConfig {
    RunConfig {
        what,
        spectrum: SpectrumOptions {
            uncalibrate: false,
            ppm_low: 3.06,
            ppm_high: 3.41,
            grid_length: 8,
        },
        ..Default::default()
    }
}

fn column_as_f64(batch: &arrow::record_batch::RecordBatch, idx: usize) -> Vec<f64> {
    batch
        .column(idx)
        .as_any()
        .downcast_ref::<Float64Array>()
        .unwrap()
        .values()
        .to_vec()
}

// Tests

#[test]
fn test_spectra_tables_shape_and_keys() {
    let input = run_input(&[("/run/10", "Subj001"), ("/run/11", "QC_pool")]);
    let output = parse_run(input, &config(DataRequest::Spectra)).unwrap();
    let tables = &output.tables;

    // Wide table: sample_key + one column per grid point.
    assert_eq!(tables.data.num_columns(), 9);
    assert_eq!(tables.data.num_rows(), 2);
    assert!(tables.audit_regions.is_none());

    // Keys are identical and identically ordered across tables.
    let keys = |batch: &arrow::record_batch::RecordBatch| -> Vec<String> {
        batch
            .column(0)
            .as_any()
            .downcast_ref::<StringArray>()
            .unwrap()
            .iter()
            .map(|v| v.unwrap().to_string())
            .collect()
    };
    assert_eq!(keys(&tables.data), keys(&tables.metadata));
    assert_eq!(keys(&tables.data).len(), 2);

    // Variables describe every data column after the key.
    assert_eq!(tables.variables.num_rows(), 8);

    // Long-format params: seven rows per sample (no ERETIC factor supplied).
    assert_eq!(tables.params.num_rows(), 14);

    assert_eq!(output.summary.processed, 2);
}

#[test]
fn test_metadata_columns() {
    let mut cfg = config(DataRequest::Spectra);
    cfg.project_name = "HB".to_string();
    cfg.sample_matrix_type = "plasma".to_string();
    let input = run_input(&[("/cohort/3mm/42", "QC_pool")]);
    let output = parse_run(input, &cfg).unwrap();
    let metadata = &output.tables.metadata;

    let by_name = |name: &str| -> String {
        let idx = metadata.schema().index_of(name).unwrap();
        metadata
            .column(idx)
            .as_any()
            .downcast_ref::<StringArray>()
            .unwrap()
            .value(0)
            .to_string()
    };
    assert_eq!(by_name("sample_type"), "qc");
    assert_eq!(by_name("tube_type"), "3mm");
    assert_eq!(by_name("project_name"), "HB");
    assert_eq!(by_name("sample_matrix_type"), "plasma");
    assert_eq!(by_name("data_type"), "NMR");
    assert_eq!(by_name("parser_version"), crate::VERSION);
}

#[test]
fn test_biomarker_tables_shape() {
    let input = run_input(&[("/run/10", "Subj001")]);
    let output = parse_run(input, &config(DataRequest::SpcGlyc)).unwrap();
    let tables = &output.tables;

    // Panel table: sample_key + the eleven named values, in order.
    assert_eq!(tables.data.num_columns(), 12);
    for (i, name) in Biomarkers::NAMES.iter().enumerate() {
        assert_eq!(tables.data.schema().field(i + 1).name(), name);
    }

    // SPC_All integral for the synthetic ramp: (60+50+40) * 0.05.
    let spc_all = column_as_f64(&tables.data, 1);
    assert!((spc_all[0] - 7.5).abs() < 1e-9);

    let regions = tables.audit_regions.as_ref().unwrap();
    // Three grid points fall in the SPC window; none in reference/Glyc.
    assert_eq!(regions.spc.num_columns(), 4);
    assert_eq!(regions.reference.num_columns(), 1);
    assert_eq!(regions.glyc.num_columns(), 1);
    assert_eq!(regions.spc.num_rows(), 1);

    // Variables table describes the fixed panel.
    assert_eq!(tables.variables.num_rows(), 11);
    let centers = tables
        .variables
        .column(4)
        .as_any()
        .downcast_ref::<Float64Array>()
        .unwrap();
    assert!((centers.value(0) - 3.25).abs() < 1e-12); // SPC_All center
    assert!(centers.is_null(9) && centers.is_null(10)); // the two ratios
}

#[test]
fn test_empty_batch_keeps_schemas() {
    // Quantification names a path no spectrum has: the intersection is
    // empty, yet every table still carries its full schema.
    let mut input = run_input(&[("/run/10", "Subj001")]);
    input.quantification = vec![QuantificationSource {
        data_path: "/run/99".to_string(),
        qc_present: false,
    }];
    let output = parse_run(input, &config(DataRequest::Spectra)).unwrap();
    assert_eq!(output.summary.processed, 0);
    assert_eq!(output.tables.data.num_rows(), 0);
    assert_eq!(output.tables.data.num_columns(), 9);
    assert_eq!(output.tables.metadata.num_rows(), 0);
    assert_eq!(output.tables.variables.num_rows(), 8);
}
