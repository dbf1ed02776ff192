// Reference implementations of the signal preparation stage. Hosts with dedicated filters and
// QRS detectors are expected to plug them in through the Cleaner/Detector traits.

pub use clean::{Cleaner, CleaningMethod};
pub use detect::{DetectionMethod, Detector};

mod clean;
mod detect;

/// Window length in samples for a duration in seconds, at least 1 sample.
fn window(sampling_rate: f64, seconds: f64) -> usize {
    ((sampling_rate * seconds).round() as usize).max(1)
}
