//! Tunable constants for the guidance engine, gathered into one struct so
//! that the engine and its sub-components all read the same values.

/// Knobs for the guidance engine. The defaults reproduce the behavior of
/// the field-tested device: a 440 Hz drone, 10 degree alignment bands,
/// and a 9/10 degree on/off-track hysteresis pair.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Frequency of the constant drone oscillator, in Hz.
    pub base_frequency: f32,

    /// Amplitude applied to both oscillators when they are audible.
    pub default_amplitude: f32,

    /// Deviation below which locked guidance enters the on-track state,
    /// in degrees. Strictly less than `off_track_threshold` so the two
    /// states cannot chatter at the boundary.
    pub on_track_threshold: f32,

    /// Deviation at or above which locked guidance leaves the on-track
    /// state, in degrees.
    pub off_track_threshold: f32,

    /// Width of the re-arm band around each quadrant boundary for the
    /// free-roam crossing announcement, in degrees.
    pub aligned_threshold: f32,

    /// Distance between spoken step-count announcements, in feet.
    pub distance_threshold_feet: f32,

    /// Whether to count displacement from the lock point at all.
    pub count_steps: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            base_frequency: 440.0,
            default_amplitude: 0.2,
            on_track_threshold: 9.0,
            off_track_threshold: 10.0,
            aligned_threshold: 10.0,
            distance_threshold_feet: 10.0,
            count_steps: true,
        }
    }
}
