//! Sample-side records: identity, canonical sample-type classification,
//! tube geometry detection, and the stable join key.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Case-insensitive marker that a sample was acquired in a reduced-diameter
/// tube and needs the fixed intensity correction.
pub const NARROW_BORE_MARKER: &str = "3mm";

/// Identifies one sample within a run. `sample_id` is derived upstream from
/// path/label conventions; this crate treats it as opaque except for
/// classification.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct SampleIdentity {
    pub data_path: String,
    pub sample_id: String,
}

impl SampleIdentity {
    pub fn new(data_path: impl Into<String>, sample_id: impl Into<String>) -> Self {
        Self {
            data_path: data_path.into(),
            sample_id: sample_id.into(),
        }
    }

    /// The deterministic join key used by every output table: the sample id
    /// plus a short digest of the data path, so two samples sharing a
    /// human-readable id still key apart.
    pub fn sample_key(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.data_path.as_bytes());
        let digest = hex::encode(hasher.finalize());
        format!("{}_{}", self.sample_id, &digest[..8])
    }
}

/// The canonical per-sample quality-control tag, derived purely from the
/// sample id.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SampleType {
    Sample,
    Qc,
    Pqc,
    Ltr,
    Sltr,
}

impl SampleType {
    /// Strict, ordered-priority, case-insensitive classification.
    ///
    /// "sltr" is matched as a substring *before* the "ltr"/"qc" prefixes:
    /// a looser substring check on "ltr" would swallow long-term-reference
    /// spikes labelled e.g. "SLTR_QC_01". The order below must not change.
    pub fn classify(sample_id: &str) -> Self {
        let id = sample_id.to_lowercase();
        if id.contains("sltr") {
            SampleType::Sltr
        } else if id.starts_with("ltr") {
            SampleType::Ltr
        } else if id.starts_with("pqc") {
            SampleType::Pqc
        } else if id.starts_with("qc") {
            SampleType::Qc
        } else {
            SampleType::Sample
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SampleType::Sample => "sample",
            SampleType::Qc => "qc",
            SampleType::Pqc => "pqc",
            SampleType::Ltr => "ltr",
            SampleType::Sltr => "sltr",
        }
    }
}

impl fmt::Display for SampleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sample tube geometry, detected from the originating data path.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TubeType {
    /// Standard 5mm tube; intensities are used as-is.
    Standard,
    /// Reduced-diameter 3mm tube; derived biomarkers are halved.
    NarrowBore,
}

impl TubeType {
    pub fn from_path(data_path: &str) -> Self {
        if data_path.to_lowercase().contains(NARROW_BORE_MARKER) {
            TubeType::NarrowBore
        } else {
            TubeType::Standard
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TubeType::Standard => "5mm",
            TubeType::NarrowBore => "3mm",
        }
    }
}

impl fmt::Display for TubeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//==================================================================================
// Unit Tests
//==================================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_priority_order() {
        // sltr wins over the qc prefix it also carries.
        assert_eq!(SampleType::classify("SLTR_QC_01"), SampleType::Sltr);
        assert_eq!(SampleType::classify("LTR_02"), SampleType::Ltr);
        assert_eq!(SampleType::classify("PQC_pool"), SampleType::Pqc);
        assert_eq!(SampleType::classify("QC_pool"), SampleType::Qc);
        assert_eq!(SampleType::classify("Subj001"), SampleType::Sample);
    }

    #[test]
    fn test_classification_is_case_insensitive() {
        assert_eq!(SampleType::classify("sLtR_99"), SampleType::Sltr);
        assert_eq!(SampleType::classify("qc01"), SampleType::Qc);
    }

    #[test]
    fn test_ltr_is_a_prefix_match_not_substring() {
        // "ltr" in the middle of an ordinary id must not reclassify it.
        assert_eq!(SampleType::classify("filtrate_07"), SampleType::Sample);
    }

    #[test]
    fn test_sample_key_is_stable_and_path_sensitive() {
        let a = SampleIdentity::new("/data/run1/10", "qc01");
        let b = SampleIdentity::new("/data/run2/10", "qc01");
        assert_eq!(a.sample_key(), a.sample_key());
        assert_ne!(a.sample_key(), b.sample_key());
        assert!(a.sample_key().starts_with("qc01_"));
    }

    #[test]
    fn test_tube_detection_case_insensitive_substring() {
        assert_eq!(TubeType::from_path("/cohort/3MM/42"), TubeType::NarrowBore);
        assert_eq!(TubeType::from_path("/cohort/plasma/42"), TubeType::Standard);
    }
}
