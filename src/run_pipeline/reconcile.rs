//! Sample-set reconciliation across the three upstream sources.
//!
//! Downstream tables must be aligned row-for-row across the spectra,
//! parameter, and quantification sources; padding missing rows with nulls
//! would corrupt the biomarker math, so only fully-covered samples proceed.
//! Every excluded path is surfaced to the caller; reporting data loss is an
//! obligation here, not a recoverable error. An empty intersection is valid
//! output with every input path reported excluded.

use std::collections::BTreeSet;
use std::fmt;

use log::{debug, warn};

/// The three upstream readers contributing per-sample path sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Spectra,
    Parameters,
    Quantification,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Spectra => "spectra",
            SourceKind::Parameters => "parameters",
            SourceKind::Quantification => "quantification",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Paths a single source contributed that did not make the intersection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceExclusions {
    pub source: SourceKind,
    pub paths: Vec<String>,
}

/// The reconciled sample set: the cross-source intersection plus the
/// per-source discarded remainders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    /// Paths present in every contributing source, sorted.
    pub shared: Vec<String>,
    /// Per-source set differences, one entry per source.
    pub exclusions: Vec<SourceExclusions>,
}

impl Reconciliation {
    pub fn excluded_total(&self) -> usize {
        self.exclusions.iter().map(|e| e.paths.len()).sum()
    }
}

/// Computes the path intersection across the three sources and reports every
/// discarded path. Has no failure mode.
pub fn reconcile(
    spectra: &BTreeSet<String>,
    parameters: &BTreeSet<String>,
    quantification: &BTreeSet<String>,
) -> Reconciliation {
    let shared: BTreeSet<String> = spectra
        .intersection(parameters)
        .filter(|path| quantification.contains(*path))
        .cloned()
        .collect();

    let exclusions: Vec<SourceExclusions> = [
        (SourceKind::Spectra, spectra),
        (SourceKind::Parameters, parameters),
        (SourceKind::Quantification, quantification),
    ]
    .into_iter()
    .map(|(source, paths)| SourceExclusions {
        source,
        paths: paths.difference(&shared).cloned().collect(),
    })
    .collect();

    for exclusion in &exclusions {
        if !exclusion.paths.is_empty() {
            warn!(
                "Reconciliation dropped {} path(s) contributed by the {} source",
                exclusion.paths.len(),
                exclusion.source
            );
            for path in &exclusion.paths {
                debug!("  excluded: {}", path);
            }
        }
    }

    Reconciliation {
        shared: shared.into_iter().collect(),
        exclusions,
    }
}

//==================================================================================
// Unit Tests
//==================================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn set(paths: &[&str]) -> BTreeSet<String> {
        paths.iter().map(|p| p.to_string()).collect()
    }

    #[test]
    fn test_intersection_and_per_source_exclusions() {
        let result = reconcile(&set(&["1", "2", "3"]), &set(&["2", "3", "4"]), &set(&["2", "3"]));
        assert_eq!(result.shared, vec!["2", "3"]);
        assert_eq!(result.exclusions[0].source, SourceKind::Spectra);
        assert_eq!(result.exclusions[0].paths, vec!["1"]);
        assert_eq!(result.exclusions[1].source, SourceKind::Parameters);
        assert_eq!(result.exclusions[1].paths, vec!["4"]);
        assert_eq!(result.exclusions[2].source, SourceKind::Quantification);
        assert!(result.exclusions[2].paths.is_empty());
        assert_eq!(result.excluded_total(), 2);
    }

    #[test]
    fn test_empty_intersection_reports_everything() {
        let result = reconcile(&set(&["a"]), &set(&["b"]), &set(&["c"]));
        assert!(result.shared.is_empty());
        assert_eq!(result.excluded_total(), 3);
    }

    #[test]
    fn test_identical_sources_exclude_nothing() {
        let all = set(&["x", "y"]);
        let result = reconcile(&all, &all, &all);
        assert_eq!(result.shared, vec!["x", "y"]);
        assert_eq!(result.excluded_total(), 0);
    }
}
