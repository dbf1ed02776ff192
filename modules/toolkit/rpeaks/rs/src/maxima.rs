use std::rc::Rc;
use std::sync::Arc;

use derive_getters::{Dissolve, Getters};
use derive_more::Constructor;
use eyre::{bail, ensure, Result};
use impl_tools::autoimpl;

use ecgbit_core_rs::num::Float;

/// Local maximum of a sequence: offset from the sequence start and the sample value.
#[derive(Copy, Clone, PartialEq, Debug, Default, Constructor, Dissolve, Getters)]
pub struct Maximum<S> {
    offset: usize,
    amplitude: S,
}

/// Primitive that locates local maxima in a sequence of samples.
#[autoimpl(for <T: trait + ?Sized> &T, Box<T>, Rc<T>, Arc<T>)]
pub trait LocalMaximaFinder {
    /// Local maxima ordered by offset. Maxima below `min_height` (if any) are dropped, the
    /// comparison is inclusive.
    fn find<S: Float>(&self, sequence: &[S], min_height: Option<S>) -> Result<Vec<Maximum<S>>>;
}

/// Default local maxima search.
///
/// A sample is a local maximum if it is strictly greater than both neighbours. Flat tops are
/// reported once, at the midpoint of the plateau (rounded towards the left edge). The first and
/// the last samples of a sequence are never maxima. Non-finite samples are rejected.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
pub struct LocalMaxima;

impl LocalMaximaFinder for LocalMaxima {
    fn find<S: Float>(&self, sequence: &[S], min_height: Option<S>) -> Result<Vec<Maximum<S>>> {
        if let Some(offset) = sequence.iter().position(|x| !x.is_finite()) {
            bail!("Non-finite sample at offset {offset}");
        }
        if let Some(height) = min_height {
            ensure!(!height.is_nan(), "Minimum height must not be NaN");
        }

        let mut maxima = Vec::new();
        if sequence.len() < 3 {
            return Ok(maxima);
        }

        let last = sequence.len() - 1;
        let mut ind = 1;
        while ind < last {
            if sequence[ind - 1] < sequence[ind] {
                // Walk over the plateau (if any)
                let mut ahead = ind + 1;
                while ahead < last && sequence[ahead] == sequence[ind] {
                    ahead += 1;
                }

                if sequence[ahead] < sequence[ind] {
                    let offset = (ind + ahead - 1) / 2;
                    maxima.push(Maximum::new(offset, sequence[offset]));
                    // Samples on the descending side can't be maxima
                    ind = ahead;
                }
            }
            ind += 1;
        }

        if let Some(height) = min_height {
            maxima.retain(|x| x.amplitude >= height);
        }
        Ok(maxima)
    }
}
