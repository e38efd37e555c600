// In: src/config.rs

//! The single source of truth for all nmrparse run configuration.
//!
//! This module defines the unified `RunConfig` struct, which is designed to be
//! created once at the application boundary (e.g., from a caller's JSON
//! options) and then passed down through the system as a shared, read-only
//! value. The original per-run global configuration and logging side channel
//! become explicit values here; nothing in the crate mutates process-wide
//! state.

use serde::{Deserialize, Serialize};

use crate::error::NmrError;

//==================================================================================
// I. Core Configuration Enums & Structs
//==================================================================================

/// What the run should produce. This is a high-level setting that determines
/// both the reading mode and the shape of the assembled output tables.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DataRequest {
    /// **Default:** the wide calibrated-spectrum table, one column per grid point.
    #[default]
    Spectra,

    /// The eleven-value spcglyc biomarker panel plus the three audit-region
    /// tables. Forces uncalibrated spectrum positions during reading.
    SpcGlyc,
}

/// Options controlling spectrum calibration and resampling.
///
/// These correspond one-to-one to the knobs of the Calibrator/Resampler and
/// are shared by every sample in a run; the common grid is what makes the
/// per-sample outputs comparable row-for-row.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct SpectrumOptions {
    /// Strip the SR calibration shift so positions reflect raw acquisition
    /// geometry. Forced to `true` when the run requests spcglyc.
    #[serde(default)]
    pub uncalibrate: bool,

    /// Lower bound of the common ppm grid.
    #[serde(default = "default_ppm_low")]
    pub ppm_low: f64,

    /// Upper bound of the common ppm grid.
    #[serde(default = "default_ppm_high")]
    pub ppm_high: f64,

    /// Number of points in the common grid.
    #[serde(default = "default_grid_length")]
    pub grid_length: usize,
}

impl Default for SpectrumOptions {
    fn default() -> Self {
        Self {
            uncalibrate: false,
            ppm_low: default_ppm_low(),
            ppm_high: default_ppm_high(),
            grid_length: default_grid_length(),
        }
    }
}

//==================================================================================
// II. The Unified RunConfig
//==================================================================================

/// The single, unified configuration for one parse invocation.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "snake_case")]
pub struct RunConfig {
    /// What to read and derive.
    #[serde(default)]
    pub what: DataRequest,

    /// Calibration/resampling options shared by every sample.
    #[serde(default)]
    pub spectrum: SpectrumOptions,

    /// Project identifier carried into the metadata table.
    #[serde(default)]
    pub project_name: String,

    /// Cohort identifier carried into the metadata table.
    #[serde(default)]
    pub cohort_name: String,

    /// Run identifier carried into the metadata table.
    #[serde(default)]
    pub run_name: String,

    /// Sample matrix type (e.g. "plasma") carried into the metadata table.
    #[serde(default)]
    pub sample_matrix_type: String,

    /// Method name override. Empty means "derive from the pulse program".
    #[serde(default)]
    pub method: String,
}

impl RunConfig {
    /// Builds a config from the caller's JSON options blob.
    pub fn from_json(json: &str) -> Result<Self, NmrError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Validates the run-level invariants that are fatal to the whole
    /// invocation. Per-sample problems are handled later, at task boundaries.
    pub fn validate(&self) -> Result<(), NmrError> {
        let s = &self.spectrum;
        if !(s.ppm_low < s.ppm_high) {
            return Err(NmrError::Config(format!(
                "ppm_low ({}) must be strictly below ppm_high ({})",
                s.ppm_low, s.ppm_high
            )));
        }
        if s.grid_length <= 1 {
            return Err(NmrError::Config(format!(
                "grid_length must be at least 2, got {}",
                s.grid_length
            )));
        }
        Ok(())
    }

    /// The spectrum options actually used for reading: requesting spcglyc
    /// forces uncalibrated positions before any resampling.
    pub fn effective_spectrum_options(&self) -> SpectrumOptions {
        let mut opts = self.spectrum;
        if self.what == DataRequest::SpcGlyc {
            opts.uncalibrate = true;
        }
        opts
    }
}

/// Helper for `serde` to default the grid lower bound.
fn default_ppm_low() -> f64 {
    -0.1
}

/// Helper for `serde` to default the grid upper bound.
fn default_ppm_high() -> f64 {
    10.0
}

/// Helper for `serde` to default the common grid length.
fn default_grid_length() -> usize {
    44_079
}

//==================================================================================
// III. Unit Tests
//==================================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_ivdr_grid() {
        let config = RunConfig::default();
        assert_eq!(config.spectrum.ppm_low, -0.1);
        assert_eq!(config.spectrum.ppm_high, 10.0);
        assert_eq!(config.spectrum.grid_length, 44_079);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_json_partial_options() {
        let config = RunConfig::from_json(
            r#"{"what": "spc_glyc", "spectrum": {"grid_length": 128}, "run_name": "EXTr01"}"#,
        )
        .unwrap();
        assert_eq!(config.what, DataRequest::SpcGlyc);
        assert_eq!(config.spectrum.grid_length, 128);
        assert_eq!(config.spectrum.ppm_high, 10.0);
        assert_eq!(config.run_name, "EXTr01");
    }

    #[test]
    fn test_validate_rejects_inverted_range() {
        let mut config = RunConfig::default();
        config.spectrum.ppm_low = 10.0;
        config.spectrum.ppm_high = -0.1;
        assert!(matches!(config.validate(), Err(NmrError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_degenerate_grid() {
        let mut config = RunConfig::default();
        config.spectrum.grid_length = 1;
        assert!(matches!(config.validate(), Err(NmrError::Config(_))));
    }

    #[test]
    fn test_spcglyc_forces_uncalibrate() {
        let mut config = RunConfig::default();
        config.what = DataRequest::SpcGlyc;
        assert!(!config.spectrum.uncalibrate);
        assert!(config.effective_spectrum_options().uncalibrate);
    }
}
