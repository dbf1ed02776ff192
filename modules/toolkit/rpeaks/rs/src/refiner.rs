use derive_getters::{Dissolve, Getters};
use derive_more::Constructor;
use eyre::{Result, WrapErr};
use rayon::prelude::*;
use rayon::ThreadPool;

use ecgbit_core_rs::num::Float;

use crate::config::Config;
use crate::engine::Engine;
use crate::maxima::{LocalMaxima, LocalMaximaFinder};
use crate::prepare::{Cleaner, CleaningMethod, DetectionMethod, Detector};
use crate::result::{RefineError, Refinement};

/// Cleaned signal and the initial R-peaks detected in it.
#[derive(Clone, PartialEq, Debug, Default, Constructor, Dissolve, Getters)]
pub struct Prepared<S> {
    signal: Vec<S>,
    peaks: Vec<usize>,
}

/// Refinement pipeline: cleaning -> initial detection -> adjustment -> fallback candidates.
#[derive(Clone, Debug, Dissolve, Getters)]
pub struct Refiner<C = CleaningMethod, D = DetectionMethod, M = LocalMaxima> {
    config: Config,
    cleaner: C,
    detector: D,
    engine: Engine<M>,
}

impl Refiner {
    /// Pipeline with the cleaning and detection methods selected in the config.
    pub fn new(config: Config) -> Self {
        let (cleaner, detector) = (*config.cleaning(), *config.detection());
        Self::with_collaborators(config, cleaner, detector, LocalMaxima)
    }
}

impl Default for Refiner {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl<C: Cleaner, D: Detector, M: LocalMaximaFinder> Refiner<C, D, M> {
    /// Pipeline with custom collaborators. Method identifiers of the config are ignored,
    /// the sampling rate and the height fraction still apply.
    pub fn with_collaborators(config: Config, cleaner: C, detector: D, finder: M) -> Self {
        let engine = Engine::from_config(finder, &config);
        Self {
            config,
            cleaner,
            detector,
            engine,
        }
    }

    /// Clean the raw signal and detect initial R-peaks. Detection failures are logged and
    /// reported as an empty peak sequence.
    pub fn prepare<S: Float>(&self, raw: &[S]) -> Result<Prepared<S>> {
        let sampling_rate = *self.config.sampling_rate();
        let signal = self
            .cleaner
            .clean(raw, sampling_rate)
            .wrap_err("Failed to clean the ECG signal")?;
        if signal.len() != raw.len() {
            return Err(eyre::eyre!(
                "Cleaning changed the signal length: {} -> {}",
                raw.len(),
                signal.len()
            ));
        }

        let peaks = match self.detector.detect(&signal, sampling_rate) {
            Ok(peaks) => peaks,
            Err(err) => {
                log::warn!("R-peak detection failed: {err:#}");
                Vec::new()
            }
        };
        Ok(Prepared::new(signal, peaks))
    }

    /// Run the whole pipeline for a single recording.
    pub fn refine<S: Float>(&self, raw: &[S]) -> Result<Refinement<S>> {
        let (signal, peaks) = self.prepare(raw)?.dissolve();
        match self.engine.adjust(&signal, &peaks) {
            Ok(adjustment) => Ok(Refinement::Success(adjustment)),
            Err(RefineError::NoPeaksDetected) => Ok(Refinement::NoPeaksDetected),
            Err(err) => Err(err).wrap_err("R-peak adjustment failed"),
        }
    }

    /// Refine independent recordings in parallel. Results are in the order of `records`.
    pub fn run<S, R>(&self, pool: &ThreadPool, records: &[R]) -> Vec<Result<Refinement<S>>>
    where
        S: Float,
        R: AsRef<[S]> + Sync,
        C: Sync,
        D: Sync,
        M: Sync,
    {
        pool.install(|| {
            records
                .par_iter()
                .map(|raw| self.refine(raw.as_ref()))
                .collect()
        })
    }
}
