// In: src/bridge/mod.rs

// ====================================================================================
// ARCHITECTURAL OVERVIEW: The Bridge Layer
// ====================================================================================
//
// The `bridge` is the sole public-facing API of the nmrparse core. It is the
// authoritative boundary between the collaborators (file readers upstream,
// the persistence layer downstream) and the pure pipeline engine.
//
// Data Flow:
//
//   1. [Collaborators]              -> assemble a `RunInput` (byte buffers,
//         |                            parsed parameters, QC flags)
//         `-> parse_run(input, config)
//
//   2. [run_pipeline::execute]      -> calibrates, reconciles, derives;
//         |                            returns a `RunBatch` of per-sample
//         |                            records plus the run summary
//         `-> tables::assemble
//
//   3. [tables]                     -> pivots the batch into Arrow record
//                                      batches; the persistence collaborator
//                                      owns writing them anywhere
//
// ====================================================================================

pub(crate) mod tables;

#[cfg(test)]
mod tests;

use arrow::record_batch::RecordBatch;

use crate::config::RunConfig;
use crate::error::NmrError;
use crate::run_pipeline::{self, RunInput, RunSummary};

// --- Re-exported collaborator input types ---
pub use crate::run_pipeline::{ParameterSource, QuantificationSource};
pub use crate::sample_pipeline::SpectrumSource;

/// The three retained spcglyc audit windows as record batches.
#[derive(Debug, Clone)]
pub struct AuditRegionTables {
    pub reference: RecordBatch,
    pub spc: RecordBatch,
    pub glyc: RecordBatch,
}

/// Every table one run produces, keyed throughout by `sample_key`.
#[derive(Debug, Clone)]
pub struct RunTables {
    /// Wide spectra (one column per grid point) or the eleven-column
    /// biomarker panel, depending on the requested data type.
    pub data: RecordBatch,
    pub metadata: RecordBatch,
    /// Long-format acquisition/calibration parameters.
    pub params: RecordBatch,
    /// One row describing each column of `data`.
    pub variables: RecordBatch,
    /// Present only when spcglyc was requested.
    pub audit_regions: Option<AuditRegionTables>,
}

/// The complete result of one run invocation.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub tables: RunTables,
    pub summary: RunSummary,
}

/// Parses one batch of samples into analysis-ready tables.
///
/// Run-level configuration errors abort immediately; per-sample failures are
/// reported in `summary.excluded` and never abort the batch.
pub fn parse_run(input: RunInput, config: &RunConfig) -> Result<RunOutput, NmrError> {
    let batch = run_pipeline::execute(input, config)?;
    let tables = tables::assemble(&batch, config)?;
    Ok(RunOutput {
        tables,
        summary: batch.summary,
    })
}
