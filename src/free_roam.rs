//! Free-roam audio mapping: when no heading is locked, the in-quadrant
//! heading is quantized onto a semitone ladder and played as a harmonic
//! over the constant drone, and crossing a quadrant boundary speaks the
//! new compass region once.

use crate::angle::{
    frequency_for_semitone_offset, note_for_bucket, quadrant_index, Degrees, Region, HALF_RANGE,
};
use crate::config::EngineConfig;

/// What one free-roam evaluation produced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FreeRoamOutput {
    /// Frequency for the harmonic oscillator, in Hz.
    pub harmonic_frequency: f32,
    /// The region to announce, present only on a fresh boundary crossing.
    pub crossed_into: Option<Region>,
}

/// The free-roam mapper. The only carried state is the `aligned` flag,
/// which suppresses repeat announcements until the heading has moved
/// deep into a quadrant and back out again.
#[derive(Debug, Default)]
pub struct FreeRoamMapper {
    aligned: bool,
}

impl FreeRoamMapper {
    /// A mapper with the crossing announcement armed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Maps the current heading to a harmonic frequency and decides
    /// whether a boundary crossing should be announced. `current` and
    /// `previous` must be normalized into [0, 360).
    pub fn update(
        &mut self,
        current: Degrees,
        previous: Degrees,
        config: &EngineConfig,
    ) -> FreeRoamOutput {
        let quadrant = quadrant_index(current);
        let previous_quadrant = quadrant_index(previous);

        let mut crossed_into = None;
        if !self.aligned && quadrant != previous_quadrant {
            self.aligned = true;
            crossed_into = Some(Region::from_heading(current));
        }

        // Re-arm the announcement once the heading sits well inside the
        // quadrant, away from both boundaries.
        let quadrant_heading = current % 90.0;
        if quadrant_heading > config.aligned_threshold
            && quadrant_heading < 90.0 - config.aligned_threshold
        {
            self.aligned = false;
        }

        let n = (HALF_RANGE + HALF_RANGE) as usize;
        let mut bucket = (quadrant_heading / 90.0 * n as f32).floor() as usize;
        if bucket >= n {
            bucket = n - 1;
        }

        let note = note_for_bucket(bucket, HALF_RANGE);
        FreeRoamOutput {
            harmonic_frequency: frequency_for_semitone_offset(
                config.base_frequency,
                note as f32,
            ),
            crossed_into,
        }
    }

    /// Whether the crossing announcement is currently suppressed.
    pub fn is_aligned(&self) -> bool {
        self.aligned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> EngineConfig {
        EngineConfig::default()
    }

    #[test]
    fn crossing_a_boundary_announces_exactly_once() {
        let mut mapper = FreeRoamMapper::new();
        // Approach the East boundary from inside the first quadrant.
        let out = mapper.update(89.0, 88.0, &cfg());
        assert_eq!(out.crossed_into, None);
        assert!(!mapper.is_aligned());

        // Cross it.
        let out = mapper.update(91.0, 89.0, &cfg());
        assert_eq!(out.crossed_into, Some(Region::East));
        assert!(mapper.is_aligned());

        // Wobble around the boundary without re-arming first.
        let out = mapper.update(89.5, 91.0, &cfg());
        assert_eq!(out.crossed_into, None);
        let out = mapper.update(91.5, 89.5, &cfg());
        assert_eq!(out.crossed_into, None);
    }

    #[test]
    fn sitting_at_a_quadrant_center_never_retriggers() {
        let mut mapper = FreeRoamMapper::new();
        for _ in 0..5 {
            let out = mapper.update(45.0, 45.0, &cfg());
            assert_eq!(out.crossed_into, None);
        }
        // The center is deep inside the quadrant, so the flag is re-armed.
        assert!(!mapper.is_aligned());
    }

    #[test]
    fn deep_quadrant_rearm_allows_the_next_crossing() {
        let mut mapper = FreeRoamMapper::new();
        assert!(mapper.update(91.0, 89.0, &cfg()).crossed_into.is_some());
        // Walk deep into the second quadrant, then back across.
        assert!(mapper.update(135.0, 91.0, &cfg()).crossed_into.is_none());
        assert!(!mapper.is_aligned());
        let out = mapper.update(89.0, 135.0, &cfg());
        assert_eq!(out.crossed_into, Some(Region::East));
    }

    #[test]
    fn harmonic_tracks_the_in_quadrant_heading() {
        let mut mapper = FreeRoamMapper::new();
        let config = cfg();

        // Bottom of the quadrant: bucket 0, one octave down.
        let out = mapper.update(0.0, 0.0, &config);
        assert!((out.harmonic_frequency - 220.0).abs() < 0.01);

        // Top of the quadrant clamps to the last bucket, one octave up.
        let out = mapper.update(89.99, 89.99, &config);
        assert!((out.harmonic_frequency - 880.0).abs() < 0.5);

        // Just past the midpoint skips the unison and lands on +1.
        let out = mapper.update(45.0, 45.0, &config);
        let up_one = frequency_for_semitone_offset(config.base_frequency, 1.0);
        assert!((out.harmonic_frequency - up_one).abs() < 0.01);
    }
}
