// In: src/sample_pipeline/mod.rs

//! The per-sample pipeline: everything that happens to ONE sample,
//! independently of every other sample in the batch.
//!
//! The run orchestrator fans these functions out over a worker pool; they are
//! pure coordinators over the kernels and must stay free of shared state so
//! per-sample tasks remain safely parallelizable. Errors returned here are
//! caught at the task boundary and exclude the sample, never the batch.

pub mod spcglyc;

use crate::config::SpectrumOptions;
use crate::error::NmrError;
use crate::kernels;
use crate::types::{
    ByteOrder, CalibratedSpectrum, CalibrationInfo, CalibrationParams, SampleIdentity,
};

/// One sample's share of the spectrum-reading collaborators' output: the
/// already-read binary buffer plus the scaling/order declarations and the
/// optional ERETIC reference factor.
#[derive(Debug, Clone)]
pub struct SpectrumSource {
    pub identity: SampleIdentity,
    pub buffer: Vec<u8>,
    pub byte_order: ByteOrder,
    pub scale_exponent: i32,
    pub eretic_factor: Option<f64>,
}

/// Decodes and calibrates a single sample's spectrum onto the common grid.
///
/// Processed Bruker spectra store 32-bit signed integers; the decode kernel
/// stays generic underneath for other element widths.
pub fn process_spectrum(
    source: &SpectrumSource,
    params: &CalibrationParams,
    opts: &SpectrumOptions,
) -> Result<(CalibratedSpectrum, CalibrationInfo), NmrError> {
    let raw = kernels::decode::decode_intensities::<i32>(
        &source.buffer,
        source.byte_order,
        source.scale_exponent,
    )?;
    kernels::resample::calibrate(&raw, params, opts, source.eretic_factor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_then_calibrate_roundtrip() {
        // Four i32 points, stored high-ppm first, nc = 1 doubles them.
        let buffer: Vec<u8> = [40i32, 30, 20, 10]
            .iter()
            .flat_map(|v| v.to_le_bytes())
            .collect();
        let source = SpectrumSource {
            identity: SampleIdentity::new("/run/10", "Subj001"),
            buffer,
            byte_order: ByteOrder::Little,
            scale_exponent: 1,
            eretic_factor: None,
        };
        let params = CalibrationParams {
            spectrometer_freq_mhz: 600.0,
            base_freq_mhz: 600.0,
            sweep_width_hz: 600.0 * 3.0,
            offset_ppm: 4.0,
        };
        let opts = SpectrumOptions {
            uncalibrate: false,
            ppm_low: 1.0,
            ppm_high: 4.0,
            grid_length: 4,
        };

        let (spec, info) = process_spectrum(&source, &params, &opts).unwrap();
        // Native axis [1, 4]; ascending intensities after reversal and scaling.
        assert_eq!(spec.ppm(), &[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(spec.intensity(), &[20.0, 40.0, 60.0, 80.0]);
        assert!(!info.uncalibrated);
    }

    #[test]
    fn test_bad_buffer_fails_the_sample() {
        let source = SpectrumSource {
            identity: SampleIdentity::new("/run/11", "Subj002"),
            buffer: vec![0u8; 10],
            byte_order: ByteOrder::Little,
            scale_exponent: 0,
            eretic_factor: None,
        };
        let params = CalibrationParams {
            spectrometer_freq_mhz: 600.0,
            base_freq_mhz: 600.0,
            sweep_width_hz: 1800.0,
            offset_ppm: 4.0,
        };
        let result = process_spectrum(&source, &params, &SpectrumOptions::default());
        assert!(matches!(result, Err(NmrError::BufferMismatch(4, 10))));
    }
}
