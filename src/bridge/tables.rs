//! Pivots a processed batch into the Arrow record batches handed to the
//! persistence collaborator.
//!
//! Every table is keyed by `sample_key`. Wide tables (spectra, audit
//! regions) carry one Float64 column per grid point, named by its ppm value,
//! matching the per-sample row order established by the orchestrator's
//! deterministic merge.

use std::sync::Arc;

use arrow::array::{ArrayRef, BooleanArray, Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::Utc;
use ndarray::Array2;

use super::{AuditRegionTables, RunTables};
use crate::config::{DataRequest, RunConfig};
use crate::error::NmrError;
use crate::run_pipeline::{ProcessedSample, RunBatch};
use crate::sample_pipeline::spcglyc::{
    Biomarkers, Region, ALB1, ALB2, GLYC_A, GLYC_ALL, GLYC_B, SPC1, SPC2, SPC3, SPC_ALL,
};
use crate::types::CalibratedSpectrum;
use crate::VERSION;

//==================================================================================
// 1. Shared Helpers
//==================================================================================

fn key_field() -> Field {
    Field::new("sample_key", DataType::Utf8, false)
}

fn keys_array(samples: &[ProcessedSample]) -> ArrayRef {
    let keys: Vec<&str> = samples.iter().map(|s| s.sample_key.as_str()).collect();
    Arc::new(StringArray::from(keys))
}

fn string_column(values: Vec<String>) -> ArrayRef {
    Arc::new(StringArray::from(values))
}

/// Stacks equal-length per-sample intensity rows into a samples x points
/// matrix for column-wise Arrow assembly. `n_cols` is passed explicitly so
/// an empty batch still yields a matrix with the full column count.
fn intensity_matrix(rows: Vec<&[f64]>, n_cols: usize) -> Result<Array2<f64>, NmrError> {
    let n_rows = rows.len();
    let mut flat = Vec::with_capacity(n_rows * n_cols);
    for row in rows {
        if row.len() != n_cols {
            return Err(NmrError::Internal(format!(
                "Ragged intensity rows: expected {} points, got {}",
                n_cols,
                row.len()
            )));
        }
        flat.extend_from_slice(row);
    }
    Array2::from_shape_vec((n_rows, n_cols), flat)
        .map_err(|e| NmrError::Internal(format!("Intensity matrix shape error: {}", e)))
}

/// A wide table: `sample_key` plus one Float64 column per ppm grid point.
fn wide_table(
    samples: &[ProcessedSample],
    point_ppm: &[f64],
    matrix: &Array2<f64>,
) -> Result<RecordBatch, NmrError> {
    let mut fields = Vec::with_capacity(point_ppm.len() + 1);
    let mut columns: Vec<ArrayRef> = Vec::with_capacity(point_ppm.len() + 1);
    fields.push(key_field());
    columns.push(keys_array(samples));

    for (j, ppm) in point_ppm.iter().enumerate() {
        fields.push(Field::new(format!("{}", ppm), DataType::Float64, false));
        let column = Float64Array::from_iter_values(matrix.column(j).iter().copied());
        columns.push(Arc::new(column));
    }

    Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)?)
}

fn biomarker_record(sample: &ProcessedSample) -> Result<&crate::sample_pipeline::spcglyc::BiomarkerRecord, NmrError> {
    sample.biomarkers.as_ref().ok_or_else(|| {
        NmrError::Internal(format!(
            "Sample {} reached biomarker assembly without a derived record",
            sample.sample_key
        ))
    })
}

//==================================================================================
// 2. Table Builders
//==================================================================================

/// The wide calibrated-spectrum table.
fn spectra_table(samples: &[ProcessedSample], grid: &[f64]) -> Result<RecordBatch, NmrError> {
    let rows: Vec<&[f64]> = samples.iter().map(|s| s.spectrum.intensity()).collect();
    let matrix = intensity_matrix(rows, grid.len())?;
    wide_table(samples, grid, &matrix)
}

/// The eleven-column biomarker panel.
fn biomarker_table(samples: &[ProcessedSample]) -> Result<RecordBatch, NmrError> {
    let mut values: Vec<[f64; 11]> = Vec::with_capacity(samples.len());
    for sample in samples {
        values.push(biomarker_record(sample)?.biomarkers.values());
    }

    let mut fields = vec![key_field()];
    let mut columns: Vec<ArrayRef> = vec![keys_array(samples)];
    for (i, name) in Biomarkers::NAMES.iter().enumerate() {
        fields.push(Field::new(*name, DataType::Float64, false));
        let column = Float64Array::from_iter_values(values.iter().map(|v| v[i]));
        columns.push(Arc::new(column));
    }

    Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)?)
}

/// One audit window across all samples.
fn region_table(
    samples: &[ProcessedSample],
    extract: impl Fn(&crate::sample_pipeline::spcglyc::BiomarkerRecord) -> &CalibratedSpectrum,
) -> Result<RecordBatch, NmrError> {
    let mut rows: Vec<&[f64]> = Vec::with_capacity(samples.len());
    let mut point_ppm: &[f64] = &[];
    for sample in samples {
        let excerpt = extract(biomarker_record(sample)?);
        point_ppm = excerpt.ppm();
        rows.push(excerpt.intensity());
    }
    let matrix = intensity_matrix(rows, point_ppm.len())?;
    wide_table(samples, point_ppm, &matrix)
}

/// Per-sample run metadata.
fn metadata_table(batch: &RunBatch, config: &RunConfig) -> Result<RecordBatch, NmrError> {
    let samples = &batch.samples;
    let context = &batch.context;
    let n = samples.len();
    let created_at = Utc::now().to_rfc3339();

    let repeat = |value: &str| -> Vec<String> { vec![value.to_string(); n] };

    let fields = vec![
        key_field(),
        Field::new("data_path", DataType::Utf8, false),
        Field::new("sample_id", DataType::Utf8, false),
        Field::new("sample_type", DataType::Utf8, false),
        Field::new("experiment", DataType::Utf8, false),
        Field::new("project_name", DataType::Utf8, false),
        Field::new("cohort_name", DataType::Utf8, false),
        Field::new("run_name", DataType::Utf8, false),
        Field::new("sample_matrix_type", DataType::Utf8, false),
        Field::new("method", DataType::Utf8, false),
        Field::new("data_type", DataType::Utf8, false),
        Field::new("is_ivdr", DataType::Boolean, false),
        Field::new("tube_type", DataType::Utf8, false),
        Field::new("created_at", DataType::Utf8, false),
        Field::new("parser_version", DataType::Utf8, false),
    ];

    let columns: Vec<ArrayRef> = vec![
        keys_array(samples),
        string_column(samples.iter().map(|s| s.identity.data_path.clone()).collect()),
        string_column(samples.iter().map(|s| s.identity.sample_id.clone()).collect()),
        string_column(samples.iter().map(|s| s.sample_type.to_string()).collect()),
        string_column(repeat(&context.experiment)),
        string_column(repeat(&config.project_name)),
        string_column(repeat(&config.cohort_name)),
        string_column(repeat(&config.run_name)),
        string_column(repeat(&config.sample_matrix_type)),
        string_column(repeat(&context.method)),
        string_column(repeat(context.data_type)),
        Arc::new(BooleanArray::from(vec![context.is_ivdr; n])),
        string_column(samples.iter().map(|s| s.tube.to_string()).collect()),
        string_column(repeat(&created_at)),
        string_column(repeat(VERSION)),
    ];

    Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)?)
}

/// Long-format acquisition and calibration parameters.
fn params_table(samples: &[ProcessedSample]) -> Result<RecordBatch, NmrError> {
    let mut keys = Vec::new();
    let mut names = Vec::new();
    let mut values = Vec::new();
    let mut sources = Vec::new();

    for sample in samples {
        let mut push = |name: &str, value: String, source: &str| {
            keys.push(sample.sample_key.clone());
            names.push(name.to_string());
            values.push(value);
            sources.push(source.to_string());
        };
        let cal = &sample.calibration;
        push("PULPROG", sample.pulse_program.clone(), "acqus");
        push("SF", format!("{}", cal.spectrometer_freq_mhz), "acqus");
        push("BF1", format!("{}", cal.base_freq_mhz), "acqus");
        push("SW_p", format!("{}", cal.sweep_width_hz), "acqus");
        push("OFFSET", format!("{}", cal.offset_ppm), "acqus");
        push("SR", format!("{}", sample.info.sr_hz), "calibration");
        push(
            "uncalibrated",
            if sample.info.uncalibrated { "1" } else { "0" }.to_string(),
            "calibration",
        );
        if let Some(factor) = sample.info.eretic_factor {
            push("ereticFactor", format!("{}", factor), "calibration");
        }
    }

    let fields = vec![
        key_field(),
        Field::new("name", DataType::Utf8, false),
        Field::new("value", DataType::Utf8, false),
        Field::new("source", DataType::Utf8, false),
    ];
    let columns: Vec<ArrayRef> = vec![
        string_column(keys),
        string_column(names),
        string_column(values),
        string_column(sources),
    ];
    Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)?)
}

/// One descriptive row per `data` column.
fn variables_table(what: DataRequest, grid: &[f64]) -> Result<RecordBatch, NmrError> {
    let (names, types, units, centers, mins, maxs, descriptions) = match what {
        DataRequest::SpcGlyc => {
            let integrals: [&Region; 9] = [
                &SPC_ALL, &SPC3, &SPC2, &SPC1, &GLYC_ALL, &GLYC_A, &GLYC_B, &ALB1, &ALB2,
            ];
            let labels = [
                "Total SPC",
                "SPC subregion 3",
                "SPC subregion 2",
                "SPC subregion 1",
                "Total Glycoprotein",
                "GlycA",
                "GlycB",
                "Albumin proxy 1",
                "Albumin proxy 2",
            ];
            let mut names: Vec<String> = Vec::new();
            let mut centers: Vec<Option<f64>> = Vec::new();
            let mut mins: Vec<Option<f64>> = Vec::new();
            let mut maxs: Vec<Option<f64>> = Vec::new();
            let mut descriptions: Vec<String> = Vec::new();
            for (region, label) in integrals.iter().zip(labels) {
                names.push(region.name.to_string());
                centers.push(Some(region.center()));
                mins.push(Some(region.low));
                maxs.push(Some(region.high));
                descriptions.push(format!("{} ({}-{} ppm)", label, region.low, region.high));
            }
            for (name, description) in [("SPC3_2", "SPC3/SPC2 ratio"), ("SPC_Glyc", "SPC/Glyc ratio")] {
                names.push(name.to_string());
                centers.push(None);
                mins.push(None);
                maxs.push(None);
                descriptions.push(description.to_string());
            }
            let n = names.len();
            (
                names,
                vec!["biomarker".to_string(); n],
                vec!["ratio".to_string(); n],
                centers,
                mins,
                maxs,
                descriptions,
            )
        }
        DataRequest::Spectra => {
            let names: Vec<String> = grid.iter().map(|p| format!("{}", p)).collect();
            let descriptions = grid
                .iter()
                .map(|p| format!("NMR intensity at {} ppm", p))
                .collect();
            let n = grid.len();
            (
                names,
                vec!["ppm".to_string(); n],
                vec!["ppm".to_string(); n],
                grid.iter().map(|p| Some(*p)).collect(),
                vec![None; n],
                vec![None; n],
                descriptions,
            )
        }
    };

    let var_ids: Vec<String> = (0..names.len()).map(|i| format!("var_{:05}", i)).collect();

    let fields = vec![
        Field::new("var_id", DataType::Utf8, false),
        Field::new("var_name", DataType::Utf8, false),
        Field::new("var_type", DataType::Utf8, false),
        Field::new("var_unit", DataType::Utf8, false),
        Field::new("ppm_center", DataType::Float64, true),
        Field::new("ppm_min", DataType::Float64, true),
        Field::new("ppm_max", DataType::Float64, true),
        Field::new("description", DataType::Utf8, false),
    ];
    let columns: Vec<ArrayRef> = vec![
        string_column(var_ids),
        string_column(names),
        string_column(types),
        string_column(units),
        Arc::new(Float64Array::from(centers)),
        Arc::new(Float64Array::from(mins)),
        Arc::new(Float64Array::from(maxs)),
        string_column(descriptions),
    ];
    Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)?)
}

//==================================================================================
// 3. Assembly Entry Point
//==================================================================================

/// Builds every output table from a processed batch.
pub(crate) fn assemble(batch: &RunBatch, config: &RunConfig) -> Result<RunTables, NmrError> {
    let samples = &batch.samples;

    // All samples share the common grid; reconstruct it from the options
    // only when the batch came back empty.
    let grid: Vec<f64> = match samples.first() {
        Some(sample) => sample.spectrum.ppm().to_vec(),
        None => {
            let opts = config.spectrum;
            let step = (opts.ppm_high - opts.ppm_low) / (opts.grid_length - 1) as f64;
            (0..opts.grid_length)
                .map(|j| opts.ppm_low + j as f64 * step)
                .collect()
        }
    };

    let (data, audit_regions) = match config.what {
        DataRequest::Spectra => (spectra_table(samples, &grid)?, None),
        DataRequest::SpcGlyc => {
            let data = biomarker_table(samples)?;
            let regions = AuditRegionTables {
                reference: region_table(samples, |r| &r.regions.reference)?,
                spc: region_table(samples, |r| &r.regions.spc)?,
                glyc: region_table(samples, |r| &r.regions.glyc)?,
            };
            (data, Some(regions))
        }
    };

    Ok(RunTables {
        data,
        metadata: metadata_table(batch, config)?,
        params: params_table(samples)?,
        variables: variables_table(config.what, &grid)?,
        audit_regions,
    })
}
