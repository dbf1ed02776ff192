use std::cmp::Ordering;

use ahash::HashSet;
use eyre::{eyre, Result};
use itertools::Itertools;

use ecgbit_core_rs::num::Float;

use super::{report, Engine};
use crate::maxima::LocalMaximaFinder;
use crate::result::{Diagnostic, DiagnosticKind};

impl<M: LocalMaximaFinder> Engine<M> {
    /// Collect the tallest local maximum (no height floor) between each pair of consecutive
    /// adjusted peaks. Candidates that coincide with adjusted peaks are dropped, the order of
    /// the rest is preserved. Failed segments are reported to `saveto` and skipped.
    pub fn candidates<S: Float>(
        &self,
        signal: &[S],
        adjusted: &[usize],
        saveto: &mut Vec<Diagnostic>,
    ) -> Vec<usize> {
        let mut candidates = Vec::with_capacity(adjusted.len().saturating_sub(1));
        for (&left, &right) in adjusted.iter().tuple_windows() {
            match self.dominant(signal, left, right) {
                Ok(pos) => candidates.push(pos),
                Err(err) => report(DiagnosticKind::CandidateSearch, left, right, err, saveto),
            }
        }

        let adjusted: HashSet<usize> = adjusted.iter().copied().collect();
        candidates.retain(|x| !adjusted.contains(x));
        candidates
    }

    // Absolute position of the tallest local maximum in [left, right), the first one on ties
    fn dominant<S: Float>(&self, signal: &[S], left: usize, right: usize) -> Result<usize> {
        let (segment, maxima) = self.search(signal, left, right, None)?;
        maxima
            .iter()
            .min_by(|a, b| {
                b.amplitude()
                    .partial_cmp(a.amplitude())
                    .unwrap_or(Ordering::Equal)
            })
            .map(|x| segment.absolute(*x.offset()))
            .ok_or_else(|| eyre!("No local maxima in the segment"))
    }
}
