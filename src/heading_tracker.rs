//! Keeps the current and previous compass heading and derives the spoken
//! description of where the user is facing.

use crate::angle::{normalize_360, Degrees, Region};

/// The two most recent heading samples, always normalized into [0, 360).
#[derive(Debug, Clone, Default)]
pub struct HeadingTracker {
    current: Degrees,
    previous: Degrees,
}

impl HeadingTracker {
    /// A tracker whose headings both start at 0 (due North).
    pub fn new() -> Self {
        Self::default()
    }

    /// Shifts the current heading into the previous slot and stores the
    /// normalized new sample.
    pub fn update(&mut self, new_heading: Degrees) {
        self.previous = self.current;
        self.current = normalize_360(new_heading);
    }

    /// The most recent heading.
    pub fn current(&self) -> Degrees {
        self.current
    }

    /// The heading before the most recent one.
    pub fn previous(&self) -> Degrees {
        self.previous
    }

    /// The compass octant the current heading falls in.
    pub fn region(&self) -> Region {
        Region::from_heading(self.current)
    }

    /// The current heading as it should be spoken, e.g.
    /// `"272 degrees West"`. Degrees are rounded half away from zero.
    pub fn spoken(&self) -> String {
        format!("{} degrees {}", self.current.round() as i32, self.region())
    }
}
