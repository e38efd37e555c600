//! The spcglyc biomarker engine.
//!
//! Derives the eleven-value SPC/glycoprotein/albumin panel from a calibrated
//! spectrum as a fixed sequence of pure steps: region trim, per-sample
//! polarity correction, region integration, ratio derivation, tube-geometry
//! correction, audit-region retention. Each step returns a new record; the
//! input spectrum is never mutated, so per-sample tasks stay parallelizable.

use crate::error::NmrError;
use crate::types::{CalibratedSpectrum, TubeType};

//==================================================================================
// 1. Region Definitions
//==================================================================================

/// A named closed ppm interval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Region {
    pub name: &'static str,
    pub low: f64,
    pub high: f64,
}

impl Region {
    const fn new(name: &'static str, low: f64, high: f64) -> Self {
        Self { name, low, high }
    }

    pub fn contains(&self, ppm: f64) -> bool {
        ppm >= self.low && ppm <= self.high
    }

    pub fn center(&self) -> f64 {
        (self.low + self.high) / 2.0
    }
}

pub const SPC_ALL: Region = Region::new("SPC_All", 3.18, 3.32);
pub const SPC3: Region = Region::new("SPC3", 3.262, 3.30);
pub const SPC2: Region = Region::new("SPC2", 3.236, 3.262);
pub const SPC1: Region = Region::new("SPC1", 3.20, 3.236);
pub const GLYC_ALL: Region = Region::new("Glyc_All", 2.050, 2.118);
pub const GLYC_A: Region = Region::new("GlycA", 2.050, 2.089);
pub const GLYC_B: Region = Region::new("GlycB", 2.089, 2.118);
pub const ALB1: Region = Region::new("Alb1", 0.20, 0.70);
pub const ALB2: Region = Region::new("Alb2", 6.00, 10.0);

/// Solvent resonance removed before any integration.
const SOLVENT: Region = Region::new("solvent", 4.60, 4.85);
/// Everything at or below this is baseline noise.
const BASELINE_CEILING: f64 = 0.20;
/// Everything at or above this is acquisition edge artifact.
const HIGH_PPM_EDGE: f64 = 10.0;
/// Window whose integral sign decides the 180-degree phase flip.
const POLARITY_CHECK: Region = Region::new("polarity", 3.20, 3.30);
/// Retained audit window around the reference resonance.
pub const REFERENCE_WINDOW: Region = Region::new("reference", 0.0, 0.5);

//==================================================================================
// 2. Output Records
//==================================================================================

/// The eleven derived values, in their canonical output order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Biomarkers {
    pub spc_all: f64,
    pub spc3: f64,
    pub spc2: f64,
    pub spc1: f64,
    pub glyc_all: f64,
    pub glyc_a: f64,
    pub glyc_b: f64,
    pub alb1: f64,
    pub alb2: f64,
    pub spc3_2: f64,
    pub spc_glyc: f64,
}

impl Biomarkers {
    pub const NAMES: [&'static str; 11] = [
        "SPC_All", "SPC3", "SPC2", "SPC1", "Glyc_All", "GlycA", "GlycB", "Alb1", "Alb2",
        "SPC3_2", "SPC_Glyc",
    ];

    /// Values in the same order as `NAMES`.
    pub fn values(&self) -> [f64; 11] {
        [
            self.spc_all,
            self.spc3,
            self.spc2,
            self.spc1,
            self.glyc_all,
            self.glyc_a,
            self.glyc_b,
            self.alb1,
            self.alb2,
            self.spc3_2,
            self.spc_glyc,
        ]
    }

    fn scaled(self, factor: f64) -> Self {
        Self {
            spc_all: self.spc_all * factor,
            spc3: self.spc3 * factor,
            spc2: self.spc2 * factor,
            spc1: self.spc1 * factor,
            glyc_all: self.glyc_all * factor,
            glyc_a: self.glyc_a * factor,
            glyc_b: self.glyc_b * factor,
            alb1: self.alb1 * factor,
            alb2: self.alb2 * factor,
            spc3_2: self.spc3_2 * factor,
            spc_glyc: self.spc_glyc * factor,
        }
    }
}

/// Untrimmed, uncorrected spectral excerpts retained for audit.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditRegions {
    pub reference: CalibratedSpectrum,
    pub spc: CalibratedSpectrum,
    pub glyc: CalibratedSpectrum,
}

/// One sample's complete spcglyc output.
#[derive(Debug, Clone, PartialEq)]
pub struct BiomarkerRecord {
    pub biomarkers: Biomarkers,
    pub regions: AuditRegions,
}

//==================================================================================
// 3. Pipeline Steps
//==================================================================================

/// The working spectrum after the region trim. Not uniform across the trim
/// seams, but every integration window lies strictly inside one kept block.
#[derive(Debug, Clone, PartialEq)]
struct TrimmedSpectrum {
    ppm: Vec<f64>,
    intensity: Vec<f64>,
}

impl TrimmedSpectrum {
    fn is_empty(&self) -> bool {
        self.ppm.is_empty()
    }
}

/// Step 1: drop solvent, baseline, and acquisition-edge points.
fn trim(spectrum: &CalibratedSpectrum) -> TrimmedSpectrum {
    let (mut ppm, mut intensity) = (Vec::new(), Vec::new());
    for (&p, &y) in spectrum.ppm().iter().zip(spectrum.intensity()) {
        let excluded = SOLVENT.contains(p) || p <= BASELINE_CEILING || p >= HIGH_PPM_EDGE;
        if !excluded {
            ppm.push(p);
            intensity.push(y);
        }
    }
    TrimmedSpectrum { ppm, intensity }
}

/// Step 2: 180-degree phase correction, decided per sample on the trimmed
/// spectrum. A negative integral over the polarity window inverts every
/// downstream integral, so the whole spectrum is negated.
fn correct_polarity(trimmed: TrimmedSpectrum) -> TrimmedSpectrum {
    let check: f64 = trimmed
        .ppm
        .iter()
        .zip(&trimmed.intensity)
        .filter(|(&p, _)| POLARITY_CHECK.contains(p))
        .map(|(_, &y)| y)
        .sum();

    if check < 0.0 {
        TrimmedSpectrum {
            ppm: trimmed.ppm,
            intensity: trimmed.intensity.iter().map(|y| -y).collect(),
        }
    } else {
        trimmed
    }
}

/// Step 3: rectangle-rule integral of one region, `sum * step`. A window
/// with no surviving points integrates to zero.
fn integrate(trimmed: &TrimmedSpectrum, region: &Region, step: f64) -> f64 {
    let sum: f64 = trimmed
        .ppm
        .iter()
        .zip(&trimmed.intensity)
        .filter(|(&p, _)| region.contains(p))
        .map(|(_, &y)| y)
        .sum();
    sum * step
}

//==================================================================================
// 4. Public API
//==================================================================================

/// Derives the full spcglyc record for one sample.
///
/// `data_path` drives the narrow-bore tube detection. A spectrum whose trim
/// leaves no points at all is a `Data` error for this sample only.
pub fn derive(spectrum: &CalibratedSpectrum, data_path: &str) -> Result<BiomarkerRecord, NmrError> {
    if spectrum.len() < 2 {
        return Err(NmrError::Data(format!(
            "Spectrum for {} has {} point(s); cannot integrate",
            data_path,
            spectrum.len()
        )));
    }
    let step = spectrum.step();

    let trimmed = trim(spectrum);
    if trimmed.is_empty() {
        return Err(NmrError::Data(format!(
            "Trimmed spectrum has no points left for {}",
            data_path
        )));
    }
    let trimmed = correct_polarity(trimmed);

    let spc_all = integrate(&trimmed, &SPC_ALL, step);
    let spc3 = integrate(&trimmed, &SPC3, step);
    let spc2 = integrate(&trimmed, &SPC2, step);
    let spc1 = integrate(&trimmed, &SPC1, step);
    let glyc_all = integrate(&trimmed, &GLYC_ALL, step);
    let glyc_a = integrate(&trimmed, &GLYC_A, step);
    let glyc_b = integrate(&trimmed, &GLYC_B, step);
    let alb1 = integrate(&trimmed, &ALB1, step);
    let alb2 = integrate(&trimmed, &ALB2, step);

    // Division by zero propagates as inf/NaN; consumers filter such samples.
    let mut biomarkers = Biomarkers {
        spc_all,
        spc3,
        spc2,
        spc1,
        glyc_all,
        glyc_a,
        glyc_b,
        alb1,
        alb2,
        spc3_2: spc3 / spc2,
        spc_glyc: spc_all / glyc_all,
    };

    if TubeType::from_path(data_path) == TubeType::NarrowBore {
        biomarkers = biomarkers.scaled(0.5);
    }

    let regions = AuditRegions {
        reference: spectrum.excerpt(REFERENCE_WINDOW.low, REFERENCE_WINDOW.high),
        spc: spectrum.excerpt(SPC_ALL.low, SPC_ALL.high),
        glyc: spectrum.excerpt(GLYC_ALL.low, GLYC_ALL.high),
    };

    Ok(BiomarkerRecord { biomarkers, regions })
}

//==================================================================================
// 5. Unit Tests
//==================================================================================
