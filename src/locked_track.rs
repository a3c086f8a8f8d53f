//! Locked-track guidance: steers the user back toward a captured heading
//! by panning audio away from the direction of deviation and bending the
//! harmonic's pitch up as the deviation grows. A 9/10 degree hysteresis
//! pair keeps the on-track cue from chattering at the boundary.

use crate::angle::{frequency_for_semitone_offset, normalize_signed_180, Degrees};
use crate::config::EngineConfig;

/// A change of hysteresis state produced by one evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackTransition {
    /// Deviation dropped below the on-track threshold: play the cue and
    /// mute the oscillators.
    EnteredTrack,
    /// Deviation grew past the off-track threshold: restore the tones.
    LeftTrack,
}

/// What one locked-mode evaluation produced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LockedOutput {
    /// Stereo pan in [-1, 1]. Deviating right pans the audio left, so the
    /// sound always sits on the side the user should turn toward.
    pub pan: f32,
    /// Frequency for the harmonic oscillator, in Hz. A continuous bend,
    /// reaching one octave up as the deviation approaches 90 degrees.
    pub harmonic_frequency: f32,
    /// Hysteresis transition, if this sample caused one.
    pub transition: Option<TrackTransition>,
}

/// The locked-heading state machine. Starts off-track; the entry check
/// runs on every evaluation, so locking while already aligned fires the
/// cue on the first sample.
#[derive(Debug)]
pub struct LockedTrack {
    locked_heading: Degrees,
    on_track: bool,
}

impl LockedTrack {
    /// Locks onto `heading`, initially off-track.
    pub fn new(heading: Degrees) -> Self {
        Self {
            locked_heading: heading,
            on_track: false,
        }
    }

    /// The heading captured at lock time.
    pub fn locked_heading(&self) -> Degrees {
        self.locked_heading
    }

    /// Whether the user is currently within tolerance of the locked
    /// heading.
    pub fn is_on_track(&self) -> bool {
        self.on_track
    }

    /// Evaluates one heading sample against the locked heading.
    pub fn update(&mut self, current: Degrees, config: &EngineConfig) -> LockedOutput {
        let deviation = normalize_signed_180(current - self.locked_heading);
        let deviation_abs = deviation.abs();
        let sign = if deviation >= 0.0 { 1.0 } else { -1.0 };

        let mut transition = None;
        if !self.on_track && deviation_abs < config.on_track_threshold {
            self.on_track = true;
            transition = Some(TrackTransition::EnteredTrack);
        }
        if self.on_track && deviation_abs >= config.off_track_threshold {
            self.on_track = false;
            transition = Some(TrackTransition::LeftTrack);
        }

        let magnitude = (deviation_abs / 90.0).min(1.0);
        LockedOutput {
            pan: -sign * magnitude,
            harmonic_frequency: frequency_for_semitone_offset(
                config.base_frequency,
                magnitude * 12.0,
            ),
            transition,
        }
    }
}
