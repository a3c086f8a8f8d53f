//! The audio collaborators the guidance engine hands its output to: a
//! tone sink driving the continuously running oscillators, a one-shot
//! cue player, and an announcement sink feeding speech synthesis. The
//! engine treats all three as fire-and-forget.

use std::sync::{Arc, Mutex};

use log::{debug, info};

/// The desired instantaneous state of the device's oscillators and
/// panner. Produced fresh on every heading sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AudioParameters {
    /// Frequency of the drone oscillator, in Hz.
    pub tone_frequency: f32,
    /// Frequency of the harmonic oscillator, in Hz.
    pub harmonic_frequency: f32,
    /// Amplitude of the drone oscillator, 0 when muted.
    pub tone_amplitude: f32,
    /// Amplitude of the harmonic oscillator, 0 when muted.
    pub harmonic_amplitude: f32,
    /// Stereo pan in [-1, 1]; negative is left.
    pub pan: f32,
}

/// A piece of text queued for speech synthesis. Never mutated after
/// creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Announcement {
    /// The text to speak.
    pub text: String,
}

impl Announcement {
    /// Wraps `text` in an announcement.
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// Applies [`AudioParameters`] to continuously playing oscillators.
pub trait ToneSink {
    /// Apply the parameters. Must not block.
    fn apply(&self, params: &AudioParameters);
}

/// Plays a fixed short audio clip once. Re-triggerable.
pub trait CuePlayer {
    /// Start the clip from the beginning. Must not block.
    fn play(&self);
}

/// Queues spoken text for speech synthesis.
pub trait AnnouncementSink {
    /// Queue the announcement. Must not block.
    fn announce(&self, announcement: Announcement);
}

/// A sink that logs tone parameters and prints announcements, for
/// running the engine without audio hardware attached.
#[derive(Debug, Default, Clone)]
pub struct ConsoleAudio;

impl ToneSink for ConsoleAudio {
    fn apply(&self, params: &AudioParameters) {
        debug!(
            "tone {:.1} Hz @ {:.2}, harmonic {:.1} Hz @ {:.2}, pan {:+.2}",
            params.tone_frequency,
            params.tone_amplitude,
            params.harmonic_frequency,
            params.harmonic_amplitude,
            params.pan
        );
    }
}

impl CuePlayer for ConsoleAudio {
    fn play(&self) {
        info!("cue: on track");
    }
}

impl AnnouncementSink for ConsoleAudio {
    fn announce(&self, announcement: Announcement) {
        println!("{}", announcement.text);
        info!("announced: {}", announcement.text);
    }
}

#[derive(Debug, Default)]
struct AudioLogInner {
    frames: Vec<AudioParameters>,
    cue_count: usize,
    announcements: Vec<String>,
}

/// Records everything the engine emits. Clones share the same log, so
/// one copy can be handed to the engine while another is inspected, the
/// same way the hardware buffer is shared with its reader thread.
#[derive(Debug, Default, Clone)]
pub struct AudioLog {
    inner: Arc<Mutex<AudioLogInner>>,
}

impl AudioLog {
    /// An empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every parameter frame applied so far, oldest first.
    pub fn frames(&self) -> Vec<AudioParameters> {
        self.inner.lock().unwrap().frames.clone()
    }

    /// The most recently applied parameter frame.
    pub fn last_frame(&self) -> Option<AudioParameters> {
        self.inner.lock().unwrap().frames.last().copied()
    }

    /// How many times the one-shot cue has been triggered.
    pub fn cue_count(&self) -> usize {
        self.inner.lock().unwrap().cue_count
    }

    /// Every announcement queued so far, oldest first.
    pub fn announcements(&self) -> Vec<String> {
        self.inner.lock().unwrap().announcements.clone()
    }
}

impl ToneSink for AudioLog {
    fn apply(&self, params: &AudioParameters) {
        self.inner.lock().unwrap().frames.push(*params);
    }
}

impl CuePlayer for AudioLog {
    fn play(&self) {
        self.inner.lock().unwrap().cue_count += 1;
    }
}

impl AnnouncementSink for AudioLog {
    fn announce(&self, announcement: Announcement) {
        self.inner.lock().unwrap().announcements.push(announcement.text);
    }
}
