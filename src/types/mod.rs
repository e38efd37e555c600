//! This module defines the core, strongly-typed data representations used
//! throughout the nmrparse pipeline.
//!
//! It includes the spectrum-side records (`RawSpectrum`, `CalibratedSpectrum`
//! and the calibration parameter/result types) and the sample-side records
//! (`SampleIdentity`, `SampleType`, tube geometry). Everything here is created
//! and consumed within a single run invocation; nothing persists across runs.

pub mod sample;
pub mod spectrum;

// Re-export the main types for easier access.
pub use sample::{SampleIdentity, SampleType, TubeType};
pub use spectrum::{ByteOrder, CalibratedSpectrum, CalibrationInfo, CalibrationParams, RawSpectrum};
