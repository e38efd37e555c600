// In: src/error.rs

//! This module defines the single, unified error type for the entire nmrparse library.
//! It uses the `thiserror` crate to provide ergonomic, context-aware error handling.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum NmrError {
    // =========================================================================
    // === High-Level, Semantic Errors (Specific to our library's logic)
    // =========================================================================
    /// Malformed binary spectrum input. Fatal for the sample, never the batch.
    #[error("Spectrum format error: {0}")]
    Format(String),

    /// Invalid resampling or ERETIC parameters. Fatal for the sample.
    #[error("Calibration failed: {0}")]
    Calibration(String),

    /// A sample whose trimmed spectrum carries no usable points. Fatal for the sample.
    #[error("Biomarker data error: {0}")]
    Data(String),

    /// Invalid run-level configuration. Fatal for the whole invocation,
    /// raised before any sample work starts.
    #[error("Invalid run configuration: {0}")]
    Config(String),

    #[error("Internal logic error (this is a bug): {0}")]
    Internal(String),

    // =========================================================================
    // === External Error Wrappers (Using #[from] for automatic conversion)
    // =========================================================================
    /// An error originating from the Arrow library.
    #[error("Arrow operation failed: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// An error originating from the underlying I/O subsystem.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An error from the Serde JSON library, typically during config parsing.
    #[error("Serde JSON error: {0}")]
    SerdeJson(#[from] serde_json::Error),

    /// An error from a safe byte-casting operation failing.
    #[error("Byte slice casting error: {0}")]
    PodCast(String), // Manual `From` impl is needed as bytemuck::PodCastError doesn't impl Error

    // =========================================================================
    // === Low-Level Kernel Errors
    // =========================================================================
    #[error("Buffer length mismatch: expected a multiple of {0}, got {1}")]
    BufferMismatch(usize, usize),
}

// =============================================================================
// === Manual `From` Implementations ===
// =============================================================================

impl From<bytemuck::PodCastError> for NmrError {
    fn from(err: bytemuck::PodCastError) -> Self {
        NmrError::PodCast(err.to_string())
    }
}
