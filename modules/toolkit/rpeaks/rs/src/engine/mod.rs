use derive_getters::{Dissolve, Getters};
use eyre::{ensure, eyre, Result};

use ecgbit_core_rs::loc::Segment;
use ecgbit_core_rs::num::{self, Float};
use ecgbit_core_rs::Amplitude;

use crate::config::{validate_height_fraction, Config, DEFAULT_HEIGHT_FRACTION};
use crate::maxima::{LocalMaxima, LocalMaximaFinder, Maximum};
use crate::result::{Diagnostic, DiagnosticKind};

mod adjust;
mod fallback;

// The fallback pass runs when at least this fraction of peaks was changed by the main pass
const FALLBACK_FRACTION: f64 = 0.5;

/// R-peak adjustment engine. Stateless: every call works on its own inputs only.
#[derive(Clone, PartialEq, Debug, Dissolve, Getters)]
pub struct Engine<M> {
    finder: M,
    height_fraction: f64,
}

impl Default for Engine<LocalMaxima> {
    fn default() -> Self {
        Self {
            finder: LocalMaxima,
            height_fraction: DEFAULT_HEIGHT_FRACTION,
        }
    }
}

impl<M: LocalMaximaFinder> Engine<M> {
    pub fn new(finder: M, height_fraction: f64) -> Result<Self> {
        validate_height_fraction(height_fraction)?;
        Ok(Self {
            finder,
            height_fraction,
        })
    }

    // Config values are validated by the setters
    pub(crate) fn from_config(finder: M, config: &Config) -> Self {
        Self {
            finder,
            height_fraction: *config.height_fraction(),
        }
    }

    /// Minimum height of local maxima in the main pass: (max - min) * height fraction.
    /// None if the signal has no finite samples.
    pub fn threshold<S: Float>(&self, signal: &[S]) -> Option<S> {
        let fraction: S = num::cast(self.height_fraction)?;
        Amplitude::of(signal).map(|x| x.span() * fraction)
    }

    // Local maxima inside the segment [left, right)
    fn search<S: Float>(
        &self,
        signal: &[S],
        left: usize,
        right: usize,
        min_height: Option<S>,
    ) -> Result<(Segment, Vec<Maximum<S>>)> {
        let segment = Segment::new(left, right)?;
        let maxima = self.finder.find(segment.slice(signal)?, min_height)?;

        if let Some(maximum) = maxima.iter().find(|x| *x.offset() >= segment.len()) {
            return Err(eyre!(
                "Local maximum offset {} is outside of the segment {}",
                maximum.offset(),
                segment
            ));
        }
        ensure!(
            maxima.windows(2).all(|x| x[0].offset() < x[1].offset()),
            "Local maxima must be ordered by offset"
        );
        Ok((segment, maxima))
    }
}

fn report(
    kind: DiagnosticKind,
    left: usize,
    right: usize,
    err: eyre::Report,
    saveto: &mut Vec<Diagnostic>,
) {
    let diagnostic = Diagnostic::new(kind, left, right, format!("{err:#}"));
    log::warn!("{diagnostic}");
    saveto.push(diagnostic);
}
