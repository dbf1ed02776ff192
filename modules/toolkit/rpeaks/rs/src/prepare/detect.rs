use std::rc::Rc;
use std::sync::Arc;

#[cfg(feature = "bitcode")]
use bitcode::{Decode, Encode};
use eyre::{ensure, eyre, Result};
use impl_tools::autoimpl;

use ecgbit_core_rs::num::{self, Float};
use ecgbit_core_rs::Amplitude;

use super::window;
use crate::config::validate_sampling_rate;
use crate::maxima::{LocalMaxima, LocalMaximaFinder, Maximum};

// Minimum distance between two heartbeats
const REFRACTORY_PERIOD_S: f64 = 0.25;
// Candidate R-peaks must reach this fraction of the signal maximum
const RELATIVE_HEIGHT: f64 = 0.5;

/// Locates initial R-peaks in a cleaned signal. Returned indices must be strictly ascending.
#[autoimpl(for <T: trait + ?Sized> &T, Box<T>, Rc<T>, Arc<T>)]
pub trait Detector {
    fn detect<S: Float>(&self, cleaned: &[S], sampling_rate: f64) -> Result<Vec<usize>>;
}

#[cfg_attr(feature = "bitcode", derive(Encode, Decode))]
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
pub enum DetectionMethod {
    /// Tall local maxima thinned by a refractory period, the taller peak wins a conflict
    #[default]
    Refractory,
}

impl Detector for DetectionMethod {
    fn detect<S: Float>(&self, cleaned: &[S], sampling_rate: f64) -> Result<Vec<usize>> {
        validate_sampling_rate(sampling_rate)?;
        match self {
            DetectionMethod::Refractory => {
                refractory(cleaned, window(sampling_rate, REFRACTORY_PERIOD_S))
            }
        }
    }
}

fn refractory<S: Float>(cleaned: &[S], period: usize) -> Result<Vec<usize>> {
    let amplitude = Amplitude::of(cleaned).ok_or_else(|| eyre!("Signal has no finite samples"))?;
    let top = *amplitude.max();
    ensure!(top > S::zero(), "Signal has no positive deflections");

    let fraction: S = num::cast(RELATIVE_HEIGHT)
        .ok_or_else(|| eyre!("Relative height can't be represented by the sample type"))?;
    let maxima = LocalMaxima.find(cleaned, Some(top * fraction))?;

    let mut peaks: Vec<Maximum<S>> = Vec::with_capacity(maxima.len());
    for maximum in maxima {
        match peaks.last_mut() {
            Some(last) if maximum.offset() - last.offset() < period => {
                if maximum.amplitude() > last.amplitude() {
                    *last = maximum;
                }
            }
            _ => peaks.push(maximum),
        }
    }
    Ok(peaks.into_iter().map(|x| *x.offset()).collect())
}
