//! Counts displacement from the lock point in feet and decides when a
//! new distance should be spoken. The reported value moves in fixed
//! increments toward the measured distance, so walking backward lowers
//! the count, and a large position jump still produces only one
//! announcement.

use log::error;

use crate::config::EngineConfig;
use crate::geo::{meters_to_feet, GeoPoint};

/// Bound on the reported-distance snapping loop. Exceeding it means the
/// position jumped absurdly far or the float comparison is oscillating,
/// and is treated as an internal error rather than looping on.
const MAX_SNAP_ITERATIONS: u32 = 1000;

/// Displacement tracking from the point where the heading was locked.
#[derive(Debug, Default)]
pub struct StepCounter {
    initial_position: Option<GeoPoint>,
    last_reported_feet: f32,
}

impl StepCounter {
    /// A counter with no origin and nothing reported.
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-arms the counter at a lock transition. `origin` is the latest
    /// known position, or `None` when no position has ever been received,
    /// in which case the counter stays inactive until the next lock.
    pub fn reset(&mut self, origin: Option<GeoPoint>) {
        self.initial_position = origin;
        self.last_reported_feet = 0.0;
    }

    /// Whether a lock-point position was captured.
    pub fn has_origin(&self) -> bool {
        self.initial_position.is_some()
    }

    /// The last distance value that was spoken, in feet.
    pub fn last_reported_feet(&self) -> f32 {
        self.last_reported_feet
    }

    /// Feeds one position sample. Returns the whole-feet value to
    /// announce, or `None` when the displacement has not crossed a new
    /// threshold multiple (or the counter has no origin).
    pub fn on_position(&mut self, current: GeoPoint, config: &EngineConfig) -> Option<i32> {
        let origin = self.initial_position?;
        let threshold = config.distance_threshold_feet;

        let distance_feet = meters_to_feet(current.distance_meters(&origin)) as f32;
        if (distance_feet - self.last_reported_feet).abs() <= threshold {
            return None;
        }

        let step = if distance_feet > self.last_reported_feet {
            threshold
        } else {
            -threshold
        };

        // Walk the reported value toward the measured distance in
        // threshold-sized increments. The value spoken is the last whole
        // multiple of the threshold on the near side of the measurement,
        // whichever direction the user is moving.
        let target = (distance_feet / threshold).floor() * threshold;
        let mut reported = self.last_reported_feet;
        let mut counter = 0;
        while (target - reported).abs() > threshold / 2.0 {
            reported += step;
            counter += 1;
            if counter > MAX_SNAP_ITERATIONS {
                error!(
                    "step counter failed to converge: reported {} feet toward {} feet",
                    self.last_reported_feet, distance_feet
                );
                return None;
            }
        }

        self.last_reported_feet = reported;
        Some(reported as i32)
    }
}
