//! Spectrum-side records: the decoded intensity buffer, the acquisition
//! parameters that position it on the ppm axis, and the calibrated result.

use serde::{Deserialize, Serialize};

/// Byte order of a raw binary spectrum buffer, as declared by the processing
/// parameter file (`BYTORDP`). The decoder refuses to guess: an explicit
/// order must always be supplied by the parameter collaborator.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ByteOrder {
    Little,
    Big,
}

impl ByteOrder {
    /// The byte order of the host this library was compiled for.
    pub const fn native() -> Self {
        #[cfg(target_endian = "little")]
        {
            ByteOrder::Little
        }
        #[cfg(target_endian = "big")]
        {
            ByteOrder::Big
        }
    }
}

/// A decoded spectrum on its native index axis: real intensities after the
/// `2^nc` power-factor scaling, not yet positioned in ppm. Immutable once
/// produced by the decoder; consumed only by the calibrator.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSpectrum {
    intensities: Vec<f64>,
}

impl RawSpectrum {
    pub fn new(intensities: Vec<f64>) -> Self {
        Self { intensities }
    }

    pub fn intensities(&self) -> &[f64] {
        &self.intensities
    }

    pub fn len(&self) -> usize {
        self.intensities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intensities.is_empty()
    }
}

/// The acquisition parameters the calibrator needs to construct the native
/// ppm axis. All four are read from the instrument's parameter files by the
/// (out-of-scope) parameter collaborator.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct CalibrationParams {
    /// Spectrometer frequency in MHz (`SF`).
    pub spectrometer_freq_mhz: f64,
    /// Base frequency in MHz (`BF1`).
    pub base_freq_mhz: f64,
    /// Sweep width in Hz (`SW_p`).
    pub sweep_width_hz: f64,
    /// Chemical shift of the first (highest-ppm) point (`OFFSET`).
    pub offset_ppm: f64,
}

impl CalibrationParams {
    /// Sweep width expressed in ppm.
    pub fn sweep_width_ppm(&self) -> f64 {
        self.sweep_width_hz / self.spectrometer_freq_mhz
    }

    /// The SR calibration shift in ppm.
    pub fn sr_ppm(&self) -> f64 {
        (self.spectrometer_freq_mhz - self.base_freq_mhz) * 1e6 / self.spectrometer_freq_mhz
    }

    /// The SR calibration shift in Hz.
    pub fn sr_hz(&self) -> f64 {
        (self.spectrometer_freq_mhz - self.base_freq_mhz) * 1e6
    }
}

/// Per-sample side record of how a spectrum was calibrated, retained for the
/// long-format parameter table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationInfo {
    pub sr_hz: f64,
    pub uncalibrated: bool,
    pub eretic_factor: Option<f64>,
}

/// A calibrated, resampled spectrum: equal-length ppm and intensity
/// sequences with a strictly ascending, uniform ppm axis.
#[derive(Debug, Clone, PartialEq)]
pub struct CalibratedSpectrum {
    ppm: Vec<f64>,
    intensity: Vec<f64>,
}

impl CalibratedSpectrum {
    /// Invariant: both sequences share their length and `ppm` is ascending.
    /// Callers inside the crate construct this only via the resampler.
    pub(crate) fn new(ppm: Vec<f64>, intensity: Vec<f64>) -> Self {
        debug_assert_eq!(ppm.len(), intensity.len());
        debug_assert!(ppm.windows(2).all(|w| w[0] < w[1]));
        Self { ppm, intensity }
    }

    pub fn ppm(&self) -> &[f64] {
        &self.ppm
    }

    pub fn intensity(&self) -> &[f64] {
        &self.intensity
    }

    pub fn len(&self) -> usize {
        self.ppm.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ppm.is_empty()
    }

    /// The uniform grid step. Requires at least two points, which the
    /// run-level config validation guarantees.
    pub fn step(&self) -> f64 {
        self.ppm[1] - self.ppm[0]
    }

    /// Copies out the points whose ppm lies in the closed interval
    /// `[lo, hi]`. Used for the retained audit regions.
    pub fn excerpt(&self, lo: f64, hi: f64) -> CalibratedSpectrum {
        let (mut ppm, mut intensity) = (Vec::new(), Vec::new());
        for (&p, &y) in self.ppm.iter().zip(&self.intensity) {
            if p >= lo && p <= hi {
                ppm.push(p);
                intensity.push(y);
            }
        }
        CalibratedSpectrum { ppm, intensity }
    }

    pub fn into_intensity(self) -> Vec<f64> {
        self.intensity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sr_shift_math() {
        let params = CalibrationParams {
            spectrometer_freq_mhz: 600.25,
            base_freq_mhz: 600.25,
            sweep_width_hz: 7211.54,
            offset_ppm: 14.8,
        };
        assert_eq!(params.sr_ppm(), 0.0);
        assert_eq!(params.sr_hz(), 0.0);
        assert!((params.sweep_width_ppm() - 12.0142).abs() < 1e-3);
    }

    #[test]
    fn test_excerpt_is_closed_interval() {
        let spec = CalibratedSpectrum::new(vec![0.0, 0.5, 1.0, 1.5], vec![1.0, 2.0, 3.0, 4.0]);
        let cut = spec.excerpt(0.5, 1.0);
        assert_eq!(cut.ppm(), &[0.5, 1.0]);
        assert_eq!(cut.intensity(), &[2.0, 3.0]);
    }

    #[test]
    fn test_excerpt_outside_range_is_empty() {
        let spec = CalibratedSpectrum::new(vec![0.0, 1.0], vec![1.0, 2.0]);
        assert!(spec.excerpt(5.0, 6.0).is_empty());
    }
}
