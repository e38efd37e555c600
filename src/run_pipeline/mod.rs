// In: src/run_pipeline/mod.rs

//! Whole-batch orchestration.
//!
//! This layer owns everything that spans samples: de-duplicating sample ids,
//! fanning the per-sample pipeline out over a worker pool, reconciling the
//! three upstream path sets, deriving biomarkers when requested, and merging
//! results deterministically by sample key. Per-sample failures are caught at
//! the task boundary, logged with the offending path, and recorded in the run
//! summary; only invalid run configuration aborts the whole invocation.

pub mod reconcile;


use std::collections::{BTreeMap, BTreeSet};

use log::{info, warn};
use rayon::prelude::*;

use crate::config::{DataRequest, RunConfig};
use crate::error::NmrError;
use crate::sample_pipeline::spcglyc::{self, BiomarkerRecord};
use crate::sample_pipeline::{self, SpectrumSource};
use crate::types::{
    CalibratedSpectrum, CalibrationInfo, CalibrationParams, SampleIdentity, SampleType, TubeType,
};
use crate::utils;

//==================================================================================
// 1. Collaborator Inputs
//==================================================================================

/// One sample's share of the parameter collaborator's output. The data path
/// doubles as the tube-geometry detection string.
#[derive(Debug, Clone)]
pub struct ParameterSource {
    pub data_path: String,
    pub calibration: CalibrationParams,
    pub pulse_program: String,
}

/// One sample's share of the quantification/QC collaborators' output.
#[derive(Debug, Clone)]
pub struct QuantificationSource {
    pub data_path: String,
    pub qc_present: bool,
}

/// Everything the collaborators hand the core for one run invocation.
#[derive(Debug, Clone, Default)]
pub struct RunInput {
    /// Experiment label for method naming (cleaned before use).
    pub experiment: String,
    pub spectra: Vec<SpectrumSource>,
    pub parameters: Vec<ParameterSource>,
    pub quantification: Vec<QuantificationSource>,
}

//==================================================================================
// 2. Batch Records
//==================================================================================

/// A fully processed sample, ready for table assembly.
#[derive(Debug, Clone)]
pub struct ProcessedSample {
    pub identity: SampleIdentity,
    pub sample_key: String,
    pub sample_type: SampleType,
    pub tube: TubeType,
    pub qc_present: bool,
    pub pulse_program: String,
    pub calibration: CalibrationParams,
    pub info: CalibrationInfo,
    pub spectrum: CalibratedSpectrum,
    pub biomarkers: Option<BiomarkerRecord>,
}

/// A sample dropped from the run, with the path and the reason surfaced to
/// the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExcludedSample {
    pub data_path: String,
    pub reason: String,
}

/// Counts and exclusions reported to the caller after every run.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub processed: usize,
    pub excluded: Vec<ExcludedSample>,
    pub type_counts: BTreeMap<&'static str, usize>,
}

/// Run-level facts shared by every output table.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub experiment: String,
    pub method: String,
    pub data_type: &'static str,
    pub is_ivdr: bool,
}

/// The orchestrator's complete result, consumed by the bridge.
#[derive(Debug, Clone)]
pub struct RunBatch {
    pub samples: Vec<ProcessedSample>,
    pub context: RunContext,
    pub summary: RunSummary,
}

//==================================================================================
// 3. Internal Stages
//==================================================================================

/// A sample that survived decode + calibrate.
struct CalibratedSample {
    identity: SampleIdentity,
    pulse_program: String,
    calibration: CalibrationParams,
    info: CalibrationInfo,
    spectrum: CalibratedSpectrum,
}

/// Fans decode + calibrate out over the worker pool, one task per sample.
/// A sample without acquisition parameters cannot be positioned on the ppm
/// axis and fails here, at the task boundary.
fn calibrate_all(
    spectra: Vec<SpectrumSource>,
    parameters: &[ParameterSource],
    config: &RunConfig,
    excluded: &mut Vec<ExcludedSample>,
) -> Vec<CalibratedSample> {
    let opts = config.effective_spectrum_options();
    let param_map: BTreeMap<&str, &ParameterSource> = parameters
        .iter()
        .map(|p| (p.data_path.as_str(), p))
        .collect();

    let results: Vec<Result<CalibratedSample, ExcludedSample>> = spectra
        .into_par_iter()
        .map(|source| {
            let path = source.identity.data_path.clone();
            let params = param_map.get(path.as_str()).ok_or_else(|| ExcludedSample {
                data_path: path.clone(),
                reason: "no acquisition parameters supplied for this path".to_string(),
            })?;
            match sample_pipeline::process_spectrum(&source, &params.calibration, &opts) {
                Ok((spectrum, info)) => Ok(CalibratedSample {
                    identity: source.identity,
                    pulse_program: params.pulse_program.clone(),
                    calibration: params.calibration,
                    info,
                    spectrum,
                }),
                Err(err) => Err(ExcludedSample {
                    data_path: path,
                    reason: err.to_string(),
                }),
            }
        })
        .collect();

    let mut calibrated = Vec::with_capacity(results.len());
    for result in results {
        match result {
            Ok(sample) => calibrated.push(sample),
            Err(exclusion) => {
                warn!("{} >> {}", exclusion.data_path, exclusion.reason);
                excluded.push(exclusion);
            }
        }
    }
    calibrated
}

/// Restricts the calibrated samples to the cross-source intersection and
/// records every discarded path. A source that contributed nothing at all
/// (no parameter records, or a non-IVDr run without quantification reports)
/// does not restrict the intersection.
fn reconcile_sources(
    calibrated: Vec<CalibratedSample>,
    input: &RunInput,
    excluded: &mut Vec<ExcludedSample>,
) -> Vec<CalibratedSample> {
    let spectra_paths: BTreeSet<String> = calibrated
        .iter()
        .map(|s| s.identity.data_path.clone())
        .collect();
    let parameter_paths: BTreeSet<String> = if input.parameters.is_empty() {
        spectra_paths.clone()
    } else {
        input.parameters.iter().map(|p| p.data_path.clone()).collect()
    };
    let quantification_paths: BTreeSet<String> = if input.quantification.is_empty() {
        spectra_paths.clone()
    } else {
        input
            .quantification
            .iter()
            .map(|q| q.data_path.clone())
            .collect()
    };

    let reconciliation =
        reconcile::reconcile(&spectra_paths, &parameter_paths, &quantification_paths);

    for exclusion in &reconciliation.exclusions {
        for path in &exclusion.paths {
            excluded.push(ExcludedSample {
                data_path: path.clone(),
                reason: format!(
                    "dropped by reconciliation: contributed by the {} source but absent elsewhere",
                    exclusion.source
                ),
            });
        }
    }

    let shared: BTreeSet<&str> = reconciliation.shared.iter().map(String::as_str).collect();
    calibrated
        .into_iter()
        .filter(|s| shared.contains(s.identity.data_path.as_str()))
        .collect()
}

/// Derives the spcglyc panel for every surviving sample, one task per sample.
fn derive_biomarkers(
    calibrated: Vec<CalibratedSample>,
    excluded: &mut Vec<ExcludedSample>,
) -> Vec<(CalibratedSample, BiomarkerRecord)> {
    let results: Vec<Result<(CalibratedSample, BiomarkerRecord), ExcludedSample>> = calibrated
        .into_par_iter()
        .map(|sample| {
            match spcglyc::derive(&sample.spectrum, &sample.identity.data_path) {
                Ok(record) => Ok((sample, record)),
                Err(err) => Err(ExcludedSample {
                    data_path: sample.identity.data_path.clone(),
                    reason: err.to_string(),
                }),
            }
        })
        .collect();

    let mut derived = Vec::with_capacity(results.len());
    for result in results {
        match result {
            Ok(pair) => derived.push(pair),
            Err(exclusion) => {
                warn!("{} >> {}", exclusion.data_path, exclusion.reason);
                excluded.push(exclusion);
            }
        }
    }
    derived
}

//==================================================================================
// 4. Public Orchestration API
//==================================================================================

/// Runs the whole batch: calibrate, reconcile, derive, merge.
///
/// The returned samples are sorted by sample key, so downstream assembly is
/// deterministic regardless of worker-pool scheduling.
pub fn execute(mut input: RunInput, config: &RunConfig) -> Result<RunBatch, NmrError> {
    config.validate()?;

    // Duplicate human-readable ids are disambiguated before classification
    // and key generation.
    let ids: Vec<String> = input
        .spectra
        .iter()
        .map(|s| s.identity.sample_id.clone())
        .collect();
    for (source, unique_id) in input.spectra.iter_mut().zip(utils::make_unique(&ids)) {
        source.identity.sample_id = unique_id;
    }

    info!("Processing {} sample(s)", input.spectra.len());

    let mut excluded = Vec::new();
    let spectra = std::mem::take(&mut input.spectra);
    let calibrated = calibrate_all(spectra, &input.parameters, config, &mut excluded);
    let calibrated = reconcile_sources(calibrated, &input, &mut excluded);

    let is_ivdr = input.quantification.iter().any(|q| q.qc_present);
    if is_ivdr {
        info!("IVDr QC data found");
    } else {
        info!("Non-IVDr data (no QC found)");
    }
    let qc_map: BTreeMap<&str, bool> = input
        .quantification
        .iter()
        .map(|q| (q.data_path.as_str(), q.qc_present))
        .collect();

    let derived: Vec<(CalibratedSample, Option<BiomarkerRecord>)> = match config.what {
        DataRequest::SpcGlyc => derive_biomarkers(calibrated, &mut excluded)
            .into_iter()
            .map(|(sample, record)| (sample, Some(record)))
            .collect(),
        DataRequest::Spectra => calibrated.into_iter().map(|s| (s, None)).collect(),
    };

    let mut samples: Vec<ProcessedSample> = derived
        .into_iter()
        .map(|(sample, biomarkers)| {
            let sample_key = sample.identity.sample_key();
            let sample_type = SampleType::classify(&sample.identity.sample_id);
            let tube = TubeType::from_path(&sample.identity.data_path);
            let qc_present = qc_map
                .get(sample.identity.data_path.as_str())
                .copied()
                .unwrap_or(false);
            ProcessedSample {
                sample_key,
                sample_type,
                tube,
                qc_present,
                identity: sample.identity,
                pulse_program: sample.pulse_program,
                calibration: sample.calibration,
                info: sample.info,
                spectrum: sample.spectrum,
                biomarkers,
            }
        })
        .collect();
    samples.sort_by(|a, b| a.sample_key.cmp(&b.sample_key));

    let mut type_counts: BTreeMap<&'static str, usize> = BTreeMap::new();
    for sample in &samples {
        *type_counts.entry(sample.sample_type.as_str()).or_insert(0) += 1;
    }

    let experiment = utils::clean_name(&input.experiment);
    let (method, data_type) = match config.what {
        DataRequest::SpcGlyc => (format!("spcglyc_{}", experiment), "QUANT"),
        DataRequest::Spectra => {
            let base = if config.method.is_empty() {
                samples
                    .first()
                    .map(|s| s.pulse_program.clone())
                    .unwrap_or_else(|| "noesygppr1d".to_string())
            } else {
                config.method.clone()
            };
            (format!("{}@{}", base, experiment), "NMR")
        }
    };

    let breakdown: Vec<String> = type_counts
        .iter()
        .map(|(t, n)| format!("{}: {}", t, n))
        .collect();
    info!(
        "Run complete: {} processed ({}) | {} excluded | method {}",
        samples.len(),
        breakdown.join(" | "),
        excluded.len(),
        method
    );

    Ok(RunBatch {
        summary: RunSummary {
            processed: samples.len(),
            excluded,
            type_counts,
        },
        context: RunContext {
            experiment,
            method,
            data_type,
            is_ivdr,
        },
        samples,
    })
}
