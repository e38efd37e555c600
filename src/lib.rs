//! This file is the root of the `nmrparse_core` Rust crate.
//!
//! The crate turns already-read Bruker spectrum buffers and parsed
//! acquisition parameters into calibrated, analysis-ready Arrow tables, and
//! optionally derives the spcglyc biomarker panel. File discovery, parameter
//! text parsing, XML report parsing, and table persistence live in
//! collaborator crates; the `bridge` module is the only boundary they talk
//! to.

//==================================================================================
// 0. Constants
//==================================================================================
/// The crate version, automatically set from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//==================================================================================
// 1. Module Declarations
//==================================================================================
pub mod bridge;
pub mod config;
pub mod kernels;

mod error;
mod observability;
mod run_pipeline;
mod sample_pipeline;
mod types;
mod utils;

//==================================================================================
// 2. Public API Surface
//==================================================================================
pub use bridge::{
    parse_run, AuditRegionTables, ParameterSource, QuantificationSource, RunOutput, RunTables,
    SpectrumSource,
};
pub use config::{DataRequest, RunConfig, SpectrumOptions};
pub use error::NmrError;
pub use observability::init_logging;
pub use run_pipeline::reconcile::{reconcile, Reconciliation, SourceExclusions, SourceKind};
pub use run_pipeline::{ExcludedSample, RunInput, RunSummary};
pub use sample_pipeline::spcglyc::{self, AuditRegions, BiomarkerRecord, Biomarkers, Region};
pub use types::{
    ByteOrder, CalibratedSpectrum, CalibrationInfo, CalibrationParams, RawSpectrum, SampleIdentity,
    SampleType, TubeType,
};
