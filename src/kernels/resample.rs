//! This module contains the pure, stateless kernel for chemical-shift
//! calibration and grid resampling.
//!
//! The decoder leaves intensities on a native index axis; this kernel
//! positions them in ppm using the acquisition parameters, optionally strips
//! the SR calibration shift ("uncalibrate"), divides out an ERETIC reference
//! factor, and resamples onto the caller's uniform grid. Resampling is
//! deterministic linear interpolation and never extrapolates: grid points
//! outside the native axis range are zero.

use crate::config::SpectrumOptions;
use crate::error::NmrError;
use crate::types::{CalibratedSpectrum, CalibrationInfo, CalibrationParams, RawSpectrum};

//==================================================================================
// 1. Private Core Logic
//==================================================================================

/// Linear interpolation of `(x, y)` at `xi`, zero outside `[x[0], x[last]]`.
/// `x` is ascending; callers guarantee `x.len() == y.len() >= 2`.
fn interp_or_zero(x: &[f64], y: &[f64], xi: f64) -> f64 {
    let last = x.len() - 1;
    if xi < x[0] || xi > x[last] {
        return 0.0;
    }
    // First native point at or above xi.
    let k = x.partition_point(|&p| p < xi);
    if k == 0 {
        return y[0];
    }
    if x[k] == xi {
        return y[k];
    }
    let t = (xi - x[k - 1]) / (x[k] - x[k - 1]);
    y[k - 1] + t * (y[k] - y[k - 1])
}

/// Builds the ascending native ppm axis and the matching intensity order.
///
/// The raw buffer stores the highest-ppm point first, so the intensity
/// sequence is reversed while the axis is generated low-to-high:
/// `x[i] = offset - sw + i * (sw / (n - 1))`.
fn native_axis(
    raw: &RawSpectrum,
    params: &CalibrationParams,
    uncalibrate: bool,
) -> Result<(Vec<f64>, Vec<f64>), NmrError> {
    let n = raw.len();
    if n < 2 {
        return Err(NmrError::Format(format!(
            "Cannot position a spectrum with {} point(s) on a ppm axis",
            n
        )));
    }

    let sw = params.sweep_width_ppm();
    let mut offset = params.offset_ppm;
    if uncalibrate {
        offset += params.sr_ppm();
    }

    let inc = sw / (n - 1) as f64;
    let low = offset - sw;
    let x: Vec<f64> = (0..n).map(|i| low + i as f64 * inc).collect();
    let y: Vec<f64> = raw.intensities().iter().rev().copied().collect();
    Ok((x, y))
}

//==================================================================================
// 2. Public API
//==================================================================================

/// Calibrates a decoded spectrum and resamples it onto the common grid.
///
/// Guarantees an ascending ppm axis of exactly `opts.grid_length` points.
/// A zero or non-finite ERETIC divisor is a `Calibration` error; a
/// degenerate grid is a `Config` error (normally caught once per run by
/// `RunConfig::validate`).
pub fn calibrate(
    raw: &RawSpectrum,
    params: &CalibrationParams,
    opts: &SpectrumOptions,
    eretic_factor: Option<f64>,
) -> Result<(CalibratedSpectrum, CalibrationInfo), NmrError> {
    if !(opts.ppm_low < opts.ppm_high) || opts.grid_length <= 1 {
        return Err(NmrError::Config(format!(
            "Invalid resampling grid: [{}, {}] x {}",
            opts.ppm_low, opts.ppm_high, opts.grid_length
        )));
    }

    let (x, mut y) = native_axis(raw, params, opts.uncalibrate)?;

    if let Some(factor) = eretic_factor {
        if factor == 0.0 || !factor.is_finite() {
            return Err(NmrError::Calibration(format!(
                "ERETIC factor must be finite and non-zero, got {}",
                factor
            )));
        }
        for value in &mut y {
            *value /= factor;
        }
    }

    let n_out = opts.grid_length;
    let step = (opts.ppm_high - opts.ppm_low) / (n_out - 1) as f64;
    let mut grid = Vec::with_capacity(n_out);
    let mut intensity = Vec::with_capacity(n_out);
    for j in 0..n_out {
        let xi = opts.ppm_low + j as f64 * step;
        grid.push(xi);
        intensity.push(interp_or_zero(&x, &y, xi));
    }

    let info = CalibrationInfo {
        sr_hz: params.sr_hz(),
        uncalibrated: opts.uncalibrate,
        eretic_factor,
    };
    Ok((CalibratedSpectrum::new(grid, intensity), info))
}

//==================================================================================
// 3. Unit Tests
//==================================================================================

#[cfg(test)]
mod tests {
    use super::*;

    /// Geometry with no SR shift: native axis spans [offset - sw, offset].
    fn flat_params(offset_ppm: f64, sweep_ppm: f64) -> CalibrationParams {
        CalibrationParams {
            spectrometer_freq_mhz: 600.0,
            base_freq_mhz: 600.0,
            sweep_width_hz: sweep_ppm * 600.0,
            offset_ppm,
        }
    }

    fn opts(lo: f64, hi: f64, n: usize) -> SpectrumOptions {
        SpectrumOptions {
            uncalibrate: false,
            ppm_low: lo,
            ppm_high: hi,
            grid_length: n,
        }
    }

    /// A ramp whose intensity equals its ppm position, so linear
    /// interpolation must reproduce the requested coordinate exactly.
    fn ramp_spectrum(n: usize, offset: f64, sweep: f64) -> RawSpectrum {
        let inc = sweep / (n - 1) as f64;
        // Raw buffers are stored high-ppm first.
        RawSpectrum::new((0..n).map(|i| offset - i as f64 * inc).collect())
    }

    #[test]
    fn test_output_length_and_ascending_axis() {
        let raw = ramp_spectrum(101, 10.0, 12.0);
        let (spec, _) = calibrate(&raw, &flat_params(10.0, 12.0), &opts(-1.0, 9.5, 77), None).unwrap();
        assert_eq!(spec.len(), 77);
        assert!(spec.ppm().windows(2).all(|w| w[0] < w[1]));
        assert_eq!(spec.ppm()[0], -1.0);
        assert_eq!(*spec.ppm().last().unwrap(), 9.5);
    }

    #[test]
    fn test_linear_interpolation_is_exact_on_a_ramp() {
        let raw = ramp_spectrum(1001, 10.0, 12.0);
        let (spec, _) = calibrate(&raw, &flat_params(10.0, 12.0), &opts(0.05, 9.05, 91), None).unwrap();
        for (p, v) in spec.ppm().iter().zip(spec.intensity()) {
            assert!((p - v).abs() < 1e-9, "expected {} got {}", p, v);
        }
    }

    #[test]
    fn test_no_extrapolation_beyond_native_axis() {
        let raw = ramp_spectrum(101, 10.0, 12.0);
        // Grid reaching 1000 ppm beyond the native axis: zero, not a ramp.
        let (spec, _) =
            calibrate(&raw, &flat_params(10.0, 12.0), &opts(900.0, 1010.0, 12), None).unwrap();
        assert!(spec.intensity().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_partial_overlap_zero_fills_only_outside() {
        let raw = ramp_spectrum(101, 5.0, 10.0); // native [-5, 5]
        let (spec, _) = calibrate(&raw, &flat_params(5.0, 10.0), &opts(4.0, 6.0, 21), None).unwrap();
        for (p, v) in spec.ppm().iter().zip(spec.intensity()) {
            if *p > 5.0 {
                assert_eq!(*v, 0.0);
            } else {
                assert!((p - v).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn test_eretic_divides_every_intensity() {
        let raw = RawSpectrum::new(vec![8.0; 11]);
        let (spec, info) =
            calibrate(&raw, &flat_params(10.0, 10.0), &opts(1.0, 9.0, 5), Some(4.0)).unwrap();
        assert!(spec.intensity().iter().all(|&v| v == 2.0));
        assert_eq!(info.eretic_factor, Some(4.0));
    }

    #[test]
    fn test_eretic_zero_or_non_finite_is_a_calibration_error() {
        let raw = ramp_spectrum(11, 10.0, 10.0);
        let params = flat_params(10.0, 10.0);
        for bad in [0.0, f64::NAN, f64::INFINITY] {
            let result = calibrate(&raw, &params, &opts(1.0, 9.0, 5), Some(bad));
            assert!(matches!(result, Err(NmrError::Calibration(_))));
        }
    }

    #[test]
    fn test_uncalibrate_shifts_axis_by_sr() {
        // SF != BF1 gives a non-zero SR shift.
        let params = CalibrationParams {
            spectrometer_freq_mhz: 600.0,
            base_freq_mhz: 599.4,
            sweep_width_hz: 6000.0,
            offset_ppm: 10.0,
        };
        let sr = params.sr_ppm();
        let raw = ramp_spectrum(1001, 10.0, 10.0);

        let calibrated = calibrate(&raw, &params, &opts(2.0, 8.0, 61), None).unwrap().0;
        let mut unopts = opts(2.0 + sr, 8.0 + sr, 61);
        unopts.uncalibrate = true;
        let uncalibrated = calibrate(&raw, &params, &unopts, None).unwrap().0;

        // Same intensities, positions shifted by SR.
        for (a, b) in calibrated.intensity().iter().zip(uncalibrated.intensity()) {
            assert!((a - b).abs() < 1e-9);
        }
    }

    #[test]
    fn test_degenerate_grid_is_a_config_error() {
        let raw = ramp_spectrum(11, 10.0, 10.0);
        let params = flat_params(10.0, 10.0);
        assert!(matches!(
            calibrate(&raw, &params, &opts(9.0, 1.0, 5), None),
            Err(NmrError::Config(_))
        ));
        assert!(matches!(
            calibrate(&raw, &params, &opts(1.0, 9.0, 1), None),
            Err(NmrError::Config(_))
        ));
    }

    #[test]
    fn test_grid_contract_for_random_inputs() {
        use rand::{rngs::StdRng, Rng, SeedableRng};
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..100 {
            let n_native = rng.random_range(2..400usize);
            let sweep = rng.random_range(1.0..20.0);
            let offset = rng.random_range(-5.0..15.0);
            let lo = rng.random_range(-10.0..10.0);
            let hi = lo + rng.random_range(0.1..5.0);
            let n_out = rng.random_range(2..300usize);

            let raw = RawSpectrum::new(
                (0..n_native)
                    .map(|_| rng.random_range(-1e6..1e6))
                    .collect(),
            );
            let (spec, _) =
                calibrate(&raw, &flat_params(offset, sweep), &opts(lo, hi, n_out), None).unwrap();
            assert_eq!(spec.len(), n_out);
            assert!(spec.ppm().windows(2).all(|w| w[0] < w[1]));
            assert!(spec.intensity().iter().all(|v| v.is_finite()));
        }
    }

    #[test]
    fn test_single_point_spectrum_is_a_format_error() {
        let raw = RawSpectrum::new(vec![1.0]);
        let result = calibrate(&raw, &flat_params(10.0, 10.0), &opts(1.0, 9.0, 5), None);
        assert!(matches!(result, Err(NmrError::Format(_))));
    }
}
