use std::rc::Rc;
use std::sync::Arc;

#[cfg(feature = "bitcode")]
use bitcode::{Decode, Encode};
use eyre::{ensure, eyre, Result};
use impl_tools::autoimpl;

use ecgbit_core_rs::num::{self, Float};

use super::window;
use crate::config::validate_sampling_rate;

// Length of the moving average used to estimate the baseline wander
const DETREND_WINDOW_S: f64 = 0.75;

/// Transforms raw ECG samples into a cleaned signal of the same length.
#[autoimpl(for <T: trait + ?Sized> &T, Box<T>, Rc<T>, Arc<T>)]
pub trait Cleaner {
    fn clean<S: Float>(&self, raw: &[S], sampling_rate: f64) -> Result<Vec<S>>;
}

#[cfg_attr(feature = "bitcode", derive(Encode, Decode))]
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
pub enum CleaningMethod {
    /// Samples are used as is
    Identity,
    /// Baseline wander removal: subtract a centered moving average
    #[default]
    Detrend,
}

impl Cleaner for CleaningMethod {
    fn clean<S: Float>(&self, raw: &[S], sampling_rate: f64) -> Result<Vec<S>> {
        validate_sampling_rate(sampling_rate)?;
        match self {
            CleaningMethod::Identity => Ok(raw.to_vec()),
            CleaningMethod::Detrend => detrend(raw, window(sampling_rate, DETREND_WINDOW_S)),
        }
    }
}

fn detrend<S: Float>(raw: &[S], window: usize) -> Result<Vec<S>> {
    ensure!(
        raw.iter().all(|x| x.is_finite()),
        "Raw signal contains non-finite samples"
    );

    // Prefix sums in f64 to keep the moving average stable for f32 signals
    let mut prefix = Vec::with_capacity(raw.len() + 1);
    prefix.push(0.0f64);
    for x in raw {
        let x = x
            .to_f64()
            .ok_or_else(|| eyre!("Sample {x:?} can't be represented as f64"))?;
        prefix.push(prefix[prefix.len() - 1] + x);
    }

    let half = window / 2;
    let mut cleaned = Vec::with_capacity(raw.len());
    for (ind, x) in raw.iter().enumerate() {
        // The window is truncated at the signal boundaries
        let (start, end) = (ind.saturating_sub(half), (ind + half + 1).min(raw.len()));
        let baseline = (prefix[end] - prefix[start]) / (end - start) as f64;
        let baseline: S =
            num::cast(baseline).ok_or_else(|| eyre!("Baseline {baseline} is out of range"))?;
        cleaned.push(*x - baseline);
    }
    Ok(cleaned)
}
