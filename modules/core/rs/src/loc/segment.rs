use std::fmt::Display;
use std::ops::Range;

#[cfg(feature = "bitcode")]
use bitcode::{Decode, Encode};
use derive_getters::Dissolve;
use eyre::{ensure, eyre, Result};

/// Segment is a half-open range of sample positions [start, end).
/// It's not represented as a Rust-native Range for a couple of reasons:
/// - Prohibit 'empty' segments (start == end) or segments with negative length (start > end)
/// - Bounds-checked slicing of signals and offset <-> absolute position conversions.
#[cfg_attr(feature = "bitcode", derive(Encode, Decode))]
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Dissolve)]
pub struct Segment {
    start: usize,
    end: usize,
}

impl Segment {
    pub fn new(start: usize, end: usize) -> Result<Self> {
        if start < end {
            Ok(Self { start, end })
        } else {
            Err(eyre!("Invalid segment: start >= end ({start} >= {end})"))
        }
    }

    #[inline(always)]
    pub fn start(&self) -> usize {
        self.start
    }

    #[inline(always)]
    pub fn end(&self) -> usize {
        self.end
    }

    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn contains(&self, pos: usize) -> bool {
        self.start <= pos && pos < self.end
    }

    /// Convert an offset inside the segment into the absolute sample position.
    pub fn absolute(&self, offset: usize) -> usize {
        self.start + offset
    }

    /// Convert an absolute sample position into an offset inside the segment.
    pub fn relative(&self, pos: usize) -> Option<usize> {
        self.contains(pos).then(|| pos - self.start)
    }

    /// View the part of the signal covered by the segment.
    pub fn slice<'a, T>(&self, signal: &'a [T]) -> Result<&'a [T]> {
        ensure!(
            self.end <= signal.len(),
            "Segment {} is out of bounds for a signal of length {}",
            self,
            signal.len()
        );
        Ok(&signal[self.start..self.end])
    }
}

impl Display for Segment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

impl TryFrom<(usize, usize)> for Segment {
    type Error = eyre::Report;

    fn try_from(value: (usize, usize)) -> Result<Self> {
        Self::new(value.0, value.1)
    }
}

impl TryFrom<Range<usize>> for Segment {
    type Error = eyre::Report;

    fn try_from(value: Range<usize>) -> Result<Self> {
        Self::new(value.start, value.end)
    }
}

impl From<Segment> for Range<usize> {
    fn from(segment: Segment) -> Self {
        segment.start..segment.end
    }
}

impl PartialEq<Range<usize>> for Segment {
    fn eq(&self, other: &Range<usize>) -> bool {
        self.start == other.start && self.end == other.end
    }
}
