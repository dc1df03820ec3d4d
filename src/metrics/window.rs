use crate::error::{PipelineError, Result};

/// Half-open range of scheduled departure hours, `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HourWindow {
    start: u32,
    end: u32,
}

impl HourWindow {
    /// The whole day, `[0, 24)`.
    pub const FULL_DAY: HourWindow = HourWindow { start: 0, end: 24 };

    /// Builds a window, rejecting bounds outside `0..=24` and empty ranges.
    pub fn new(start: i32, end: i32) -> Result<Self> {
        if !(0..=24).contains(&start) || !(0..=24).contains(&end) || start >= end {
            return Err(PipelineError::InvalidWindow { start, end });
        }
        Ok(Self {
            start: start as u32,
            end: end as u32,
        })
    }

    pub fn start(&self) -> u32 {
        self.start
    }

    pub fn end(&self) -> u32 {
        self.end
    }

    pub fn contains(&self, hour: u32) -> bool {
        self.start <= hour && hour < self.end
    }
}

impl Default for HourWindow {
    fn default() -> Self {
        Self::FULL_DAY
    }
}
