#[cfg(feature = "bitcode")]
use bitcode::{Decode, Encode};
use derive_getters::{Dissolve, Getters};
use eyre::{ensure, Result};

use crate::prepare::{CleaningMethod, DetectionMethod};

pub const DEFAULT_SAMPLING_RATE: f64 = 250.0;
pub const DEFAULT_HEIGHT_FRACTION: f64 = 0.4;

#[cfg_attr(feature = "bitcode", derive(Encode, Decode))]
#[derive(Clone, Copy, PartialEq, Debug, Dissolve, Getters)]
pub struct Config {
    // Sampling rate of the recording in Hz. Used only for cleaning and initial detection.
    sampling_rate: f64,
    cleaning: CleaningMethod,
    detection: DetectionMethod,
    // Fraction of the signal amplitude range used as the height floor in the main pass
    height_fraction: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sampling_rate: DEFAULT_SAMPLING_RATE,
            cleaning: CleaningMethod::default(),
            detection: DetectionMethod::default(),
            height_fraction: DEFAULT_HEIGHT_FRACTION,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_sampling_rate(&mut self, sampling_rate: f64) -> Result<&mut Self> {
        validate_sampling_rate(sampling_rate)?;
        self.sampling_rate = sampling_rate;
        Ok(self)
    }

    pub fn set_cleaning(&mut self, cleaning: CleaningMethod) -> &mut Self {
        self.cleaning = cleaning;
        self
    }

    pub fn set_detection(&mut self, detection: DetectionMethod) -> &mut Self {
        self.detection = detection;
        self
    }

    pub fn set_height_fraction(&mut self, height_fraction: f64) -> Result<&mut Self> {
        validate_height_fraction(height_fraction)?;
        self.height_fraction = height_fraction;
        Ok(self)
    }
}

pub(crate) fn validate_sampling_rate(sampling_rate: f64) -> Result<()> {
    ensure!(
        sampling_rate.is_finite() && sampling_rate > 0.0,
        "Sampling rate must be a positive number, got {sampling_rate}"
    );
    Ok(())
}

pub(crate) fn validate_height_fraction(height_fraction: f64) -> Result<()> {
    ensure!(
        (0.0..=1.0).contains(&height_fraction),
        "Height fraction must be within [0, 1], got {height_fraction}"
    );
    Ok(())
}
