use std::thread::available_parallelism;

use eyre::Result;

// Positive values are capped by the machine, negative values mean "all but |requested| - 1".
fn _clamp(requested: isize, max: usize) -> usize {
    if requested > 0 {
        requested.unsigned_abs().min(max)
    } else if requested < 0 {
        max.saturating_sub(requested.unsigned_abs() - 1).max(1)
    } else {
        1
    }
}

/// Number of worker threads to use for the requested parallelism level.
pub fn available(requested: isize) -> Result<usize> {
    let max = available_parallelism()?.get();
    Ok(_clamp(requested, max))
}
