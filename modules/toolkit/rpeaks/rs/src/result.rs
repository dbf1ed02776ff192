use derive_getters::{Dissolve, Getters};
use derive_more::{Constructor, Display, Error};

use ecgbit_core_rs::num::Float;

/// Fatal errors of the adjustment engine.
#[derive(Clone, PartialEq, Eq, Hash, Debug, Display, Error)]
pub enum RefineError {
    #[display("No R-peaks detected")]
    NoPeaksDetected,
    #[display("R-peak index {index} is out of bounds for a signal of length {len}")]
    PeakOutOfBounds { index: usize, len: usize },
}

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Display)]
pub enum DiagnosticKind {
    /// Local maxima search failed during the main adjustment pass
    #[display("Segment maxima search")]
    SegmentMaximaSearch,
    /// Dominant maximum search failed during the fallback pass
    #[display("Candidate search")]
    CandidateSearch,
}

/// Non-fatal failure confined to a single inter-peak segment [left, right).
#[derive(Clone, PartialEq, Eq, Hash, Debug, Display, Constructor, Dissolve, Getters)]
#[display("{kind} failed for segment [{left}, {right}): {reason}")]
pub struct Diagnostic {
    kind: DiagnosticKind,
    left: usize,
    right: usize,
    reason: String,
}

#[derive(Clone, PartialEq, Debug, Constructor, Dissolve, Getters)]
pub struct Adjustment<S: Float> {
    // Input peaks and their adjusted counterparts (same length, slot by slot)
    original: Vec<usize>,
    adjusted: Vec<usize>,
    // Height floor of the main pass, None if the signal has no finite samples
    threshold: Option<S>,
    // Number of slots that differ between original and adjusted peaks
    changed: usize,
    // None if the fallback pass wasn't triggered
    candidates: Option<Vec<usize>>,
    diagnostics: Vec<Diagnostic>,
}

impl<S: Float> Adjustment<S> {
    pub fn fallback(&self) -> bool {
        self.candidates.is_some()
    }
}

#[derive(Clone, PartialEq, Debug)]
pub enum Refinement<S: Float> {
    Success(Adjustment<S>),
    NoPeaksDetected,
}

impl<S: Float> Refinement<S> {
    pub fn success(&self) -> Option<&Adjustment<S>> {
        match self {
            Refinement::Success(adjustment) => Some(adjustment),
            Refinement::NoPeaksDetected => None,
        }
    }

    pub fn into_success(self) -> Option<Adjustment<S>> {
        match self {
            Refinement::Success(adjustment) => Some(adjustment),
            Refinement::NoPeaksDetected => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let diagnostic = Diagnostic::new(
            DiagnosticKind::CandidateSearch,
            10,
            5,
            "Invalid segment".to_string(),
        );
        assert_eq!(
            diagnostic.to_string(),
            "Candidate search failed for segment [10, 5): Invalid segment"
        );

        assert_eq!(
            RefineError::PeakOutOfBounds { index: 100, len: 50 }.to_string(),
            "R-peak index 100 is out of bounds for a signal of length 50"
        );
        assert_eq!(RefineError::NoPeaksDetected.to_string(), "No R-peaks detected");
    }

    #[test]
    fn test_refinement() {
        let adjustment =
            Adjustment::<f64>::new(vec![1, 5], vec![1, 4], Some(0.4), 1, None, Vec::new());
        assert!(!adjustment.fallback());

        let refinement = Refinement::Success(adjustment.clone());
        assert_eq!(refinement.success(), Some(&adjustment));
        assert_eq!(refinement.into_success(), Some(adjustment));
        assert_eq!(Refinement::<f64>::NoPeaksDetected.success(), None);
    }
}
