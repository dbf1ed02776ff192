use derive_getters::{Dissolve, Getters};

use crate::num::Float;

/// Amplitude range [min, max] of a signal. Non-finite samples are ignored.
#[derive(Copy, Clone, PartialEq, Debug, Default, Dissolve, Getters)]
pub struct Amplitude<S: Float> {
    min: S,
    max: S,
}

impl<S: Float> Amplitude<S> {
    /// Returns None if the signal has no finite samples.
    pub fn of(signal: &[S]) -> Option<Self> {
        signal
            .iter()
            .filter(|x| x.is_finite())
            .fold(None, |range, &x| match range {
                None => Some(Self { min: x, max: x }),
                Some(Self { min, max }) => Some(Self {
                    min: min.min(x),
                    max: max.max(x),
                }),
            })
    }

    pub fn span(&self) -> S {
        self.max - self.min
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amplitude() {
        let range = Amplitude::of(&[0.5, -1.0, 10.0, 3.0]).unwrap();
        assert_eq!(range.min(), &-1.0);
        assert_eq!(range.max(), &10.0);
        assert_eq!(range.span(), 11.0);
    }

    #[test]
    fn test_non_finite() {
        let range = Amplitude::of(&[f64::NAN, 2.0, f64::INFINITY, 1.0]).unwrap();
        assert_eq!(range.dissolve(), (1.0, 2.0));

        assert_eq!(Amplitude::<f64>::of(&[]), None);
        assert_eq!(Amplitude::of(&[f32::NAN, f32::NEG_INFINITY]), None);
    }
}
