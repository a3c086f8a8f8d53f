//! The guidance engine: owns all per-walk state, consumes heading and
//! position samples, and drives the tone sink, cue player, and
//! announcement sink. All state lives behind one exclusive owner; the
//! caller serializes sample delivery (see [`crate::sample_queue`]).

use log::{debug, info};

use crate::angle::Degrees;
use crate::audio::{Announcement, AnnouncementSink, AudioParameters, CuePlayer, ToneSink};
use crate::config::EngineConfig;
use crate::free_roam::FreeRoamMapper;
use crate::geo::GeoPoint;
use crate::heading_tracker::HeadingTracker;
use crate::locked_track::{LockedTrack, TrackTransition};
use crate::sample_queue::Sample;
use crate::step_counter::StepCounter;

/// Which of the two guidance behaviors is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuidanceMode {
    /// No heading is locked; the harmonic sweeps with the heading.
    FreeRoam,
    /// A heading is locked; pan and pitch steer the user back to it.
    Locked,
}

/// External triggers at the integration boundary: a UI button, a remote
/// control, or a line typed on stdin, each mapped 1:1 onto an engine
/// operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Lock the current heading, or unlock if already locked.
    ToggleLock,
    /// Speak the current heading.
    SpeakHeading,
}

/// The orchestrator. Mode, hysteresis flags, and the step counter are
/// mutated only here; the locked-track state exists exactly while a
/// heading is locked.
pub struct GuidanceEngine {
    config: EngineConfig,
    tracker: HeadingTracker,
    free_roam: FreeRoamMapper,
    locked: Option<LockedTrack>,
    steps: StepCounter,
    current_position: Option<GeoPoint>,
    tone_frequency: f32,
    harmonic_frequency: f32,
    tone_amplitude: f32,
    harmonic_amplitude: f32,
    tone: Box<dyn ToneSink>,
    cue: Box<dyn CuePlayer>,
    voice: Box<dyn AnnouncementSink>,
}

impl GuidanceEngine {
    /// An engine in free-roam mode wired to the given collaborators.
    pub fn new(
        config: EngineConfig,
        tone: Box<dyn ToneSink>,
        cue: Box<dyn CuePlayer>,
        voice: Box<dyn AnnouncementSink>,
    ) -> Self {
        let tone_frequency = config.base_frequency;
        let amplitude = config.default_amplitude;
        Self {
            config,
            tracker: HeadingTracker::new(),
            free_roam: FreeRoamMapper::new(),
            locked: None,
            steps: StepCounter::new(),
            current_position: None,
            tone_frequency,
            harmonic_frequency: tone_frequency,
            tone_amplitude: amplitude,
            harmonic_amplitude: amplitude,
            tone,
            cue,
            voice,
        }
    }

    /// The active guidance mode.
    pub fn mode(&self) -> GuidanceMode {
        if self.locked.is_some() {
            GuidanceMode::Locked
        } else {
            GuidanceMode::FreeRoam
        }
    }

    /// The heading captured at lock time, while locked.
    pub fn locked_heading(&self) -> Option<Degrees> {
        self.locked.as_ref().map(|track| track.locked_heading())
    }

    /// The most recent heading sample.
    pub fn current_heading(&self) -> Degrees {
        self.tracker.current()
    }

    /// The last displacement value that was spoken, in feet.
    pub fn last_reported_distance_feet(&self) -> f32 {
        self.steps.last_reported_feet()
    }

    /// Feeds one sample of either kind, for callers draining a queue.
    pub fn on_sample(&mut self, sample: Sample) {
        match sample {
            Sample::Heading(heading) => self.on_heading_sample(heading),
            Sample::Position(position) => self.on_position_sample(position),
        }
    }

    /// Feeds one heading sample and re-evaluates the active mode.
    pub fn on_heading_sample(&mut self, heading: Degrees) {
        self.tracker.update(heading);
        self.evaluate();
    }

    /// Feeds one position sample. While locked with step counting on,
    /// this may announce a new distance.
    pub fn on_position_sample(&mut self, position: GeoPoint) {
        self.current_position = Some(position);
        if self.locked.is_some() && self.config.count_steps {
            if let Some(feet) = self.steps.on_position(position, &self.config) {
                self.voice
                    .announce(Announcement::new(format!("{} feet", feet)));
            }
        }
    }

    /// Locks the current heading: announces it, re-arms the step
    /// counter, mutes the free-roam tones, and evaluates locked guidance
    /// once immediately so the on-track cue fires right away.
    pub fn lock(&mut self) {
        if self.locked.is_some() {
            debug!("lock requested while already locked");
            return;
        }

        let mut message = format!("Locked on {}", self.tracker.spoken());
        if self.config.count_steps {
            self.steps.reset(self.current_position);
            if self.steps.has_origin() {
                message.push_str(" counting steps");
            } else {
                message.push_str(" Location not available");
            }
        }
        info!("{}", message);
        self.voice.announce(Announcement::new(message));

        self.tone_amplitude = 0.0;
        self.harmonic_amplitude = 0.0;
        self.locked = Some(LockedTrack::new(self.tracker.current()));
        self.evaluate();
    }

    /// Unlocks: restores the default amplitudes and centered pan, then
    /// evaluates free-roam once.
    pub fn unlock(&mut self) {
        if self.locked.is_none() {
            debug!("unlock requested while not locked");
            return;
        }

        self.locked = None;
        self.tone_amplitude = self.config.default_amplitude;
        self.harmonic_amplitude = self.config.default_amplitude;
        info!("unlocked");
        self.voice.announce(Announcement::new("Unlocked"));
        self.evaluate();
    }

    /// Speaks the current heading on demand. Read-only with respect to
    /// guidance state; callable in either mode.
    pub fn speak_heading(&self) -> String {
        let text = self.tracker.spoken();
        self.voice.announce(Announcement::new(text.clone()));
        text
    }

    /// Dispatches an external command.
    pub fn handle_command(&mut self, command: Command) {
        match command {
            Command::ToggleLock => {
                if self.locked.is_some() {
                    self.unlock();
                } else {
                    self.lock();
                }
            }
            Command::SpeakHeading => {
                self.speak_heading();
            }
        }
    }

    /// Runs the active mode against the current heading and hands the
    /// resulting parameters to the tone sink.
    fn evaluate(&mut self) {
        let pan = match &mut self.locked {
            None => {
                let out = self.free_roam.update(
                    self.tracker.current(),
                    self.tracker.previous(),
                    &self.config,
                );
                if let Some(region) = out.crossed_into {
                    self.voice.announce(Announcement::new(region.name()));
                }
                self.tone_frequency = self.config.base_frequency;
                self.harmonic_frequency = out.harmonic_frequency;
                0.0
            }
            Some(track) => {
                let out = track.update(self.tracker.current(), &self.config);
                match out.transition {
                    Some(TrackTransition::EnteredTrack) => {
                        self.tone_amplitude = 0.0;
                        self.harmonic_amplitude = 0.0;
                        self.cue.play();
                    }
                    Some(TrackTransition::LeftTrack) => {
                        self.tone_amplitude = self.config.default_amplitude;
                        self.harmonic_amplitude = self.config.default_amplitude;
                    }
                    None => {}
                }
                // The drone frequency is held at its prior value while
                // locked; only the harmonic bends.
                self.harmonic_frequency = out.harmonic_frequency;
                out.pan
            }
        };

        let params = AudioParameters {
            tone_frequency: self.tone_frequency,
            harmonic_frequency: self.harmonic_frequency,
            tone_amplitude: self.tone_amplitude,
            harmonic_amplitude: self.harmonic_amplitude,
            pan,
        };
        self.tone.apply(&params);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::AudioLog;

    fn engine_with_log() -> (GuidanceEngine, AudioLog) {
        let log = AudioLog::new();
        let engine = GuidanceEngine::new(
            EngineConfig::default(),
            Box::new(log.clone()),
            Box::new(log.clone()),
            Box::new(log.clone()),
        );
        (engine, log)
    }

    #[test]
    fn quadrant_crossing_announces_the_region_once() {
        let (mut engine, log) = engine_with_log();
        engine.on_heading_sample(89.0);
        assert!(log.announcements().is_empty());
        engine.on_heading_sample(91.0);
        assert_eq!(log.announcements(), vec!["East".to_string()]);
        // Wobbling at the boundary stays quiet.
        engine.on_heading_sample(89.5);
        engine.on_heading_sample(91.0);
        assert_eq!(log.announcements().len(), 1);
    }

    #[test]
    fn lock_without_position_says_so_and_fires_the_cue() {
        let (mut engine, log) = engine_with_log();
        engine.on_heading_sample(45.0);
        engine.lock();

        assert_eq!(engine.mode(), GuidanceMode::Locked);
        assert_eq!(engine.locked_heading(), Some(45.0));
        assert_eq!(
            log.announcements(),
            vec!["Locked on 45 degrees NorthEast Location not available".to_string()]
        );
        // Deviation is zero at lock, so the cue fires immediately and
        // the oscillators are muted.
        assert_eq!(log.cue_count(), 1);
        let frame = log.last_frame().unwrap();
        assert_eq!(frame.tone_amplitude, 0.0);
        assert_eq!(frame.harmonic_amplitude, 0.0);
        assert_eq!(frame.pan, 0.0);
    }

    #[test]
    fn pan_steers_back_toward_the_locked_heading() {
        let (mut engine, log) = engine_with_log();
        engine.on_heading_sample(0.0);
        engine.lock();

        engine.on_heading_sample(45.0);
        assert_eq!(log.last_frame().unwrap().pan, -0.5);
        // Leaving the track restored the default amplitude.
        let frame = log.last_frame().unwrap();
        assert_eq!(frame.tone_amplitude, 0.2);

        engine.on_heading_sample(315.0);
        assert_eq!(log.last_frame().unwrap().pan, 0.5);
    }

    #[test]
    fn hysteresis_fires_the_cue_once_per_reentry() {
        let (mut engine, log) = engine_with_log();
        engine.on_heading_sample(0.0);
        engine.lock();
        assert_eq!(log.cue_count(), 1);

        engine.on_heading_sample(15.0); // off track
        engine.on_heading_sample(9.0); // still off: 9 is not < 9
        assert_eq!(log.cue_count(), 1);
        engine.on_heading_sample(5.0); // back on
        assert_eq!(log.cue_count(), 2);
        engine.on_heading_sample(9.0); // hysteresis holds: 9 < 10
        assert_eq!(log.cue_count(), 2);
        let frame = log.last_frame().unwrap();
        assert_eq!(frame.tone_amplitude, 0.0);
    }

    #[test]
    fn lock_with_position_counts_steps() {
        let (mut engine, log) = engine_with_log();
        let origin = GeoPoint { lat: 42.360082, lon: -71.058880 };
        engine.on_heading_sample(0.0);
        engine.on_position_sample(origin);
        engine.lock();
        assert!(log.announcements()[0].ends_with("counting steps"));

        // 25 feet north of the lock point.
        let north = GeoPoint {
            lat: origin.lat + ((25.0 / 3.280_839_895) / crate::geo::EARTH_RADIUS_M).to_degrees(),
            lon: origin.lon,
        };
        engine.on_position_sample(north);
        assert!(log.announcements().contains(&"20 feet".to_string()));
        assert_eq!(engine.last_reported_distance_feet(), 20.0);
    }

    #[test]
    fn positions_are_ignored_while_free_roaming() {
        let (mut engine, log) = engine_with_log();
        let origin = GeoPoint { lat: 42.36, lon: -71.06 };
        engine.on_position_sample(origin);
        engine.on_position_sample(GeoPoint { lat: 42.37, lon: -71.06 });
        assert!(log.announcements().is_empty());
    }

    #[test]
    fn unlock_restores_pan_and_amplitude() {
        let (mut engine, log) = engine_with_log();
        engine.on_heading_sample(0.0);
        engine.lock();
        engine.on_heading_sample(45.0);
        engine.unlock();

        assert_eq!(engine.mode(), GuidanceMode::FreeRoam);
        let announcements = log.announcements();
        assert_eq!(announcements.last().unwrap(), "Unlocked");
        let frame = log.last_frame().unwrap();
        assert_eq!(frame.pan, 0.0);
        assert_eq!(frame.tone_amplitude, 0.2);
        assert_eq!(frame.harmonic_amplitude, 0.2);
    }

    #[test]
    fn speak_heading_reads_without_changing_mode() {
        let (mut engine, log) = engine_with_log();
        engine.on_heading_sample(272.4);
        let spoken = engine.speak_heading();
        assert_eq!(spoken, "272 degrees West");
        assert_eq!(log.announcements(), vec![spoken]);
        assert_eq!(engine.mode(), GuidanceMode::FreeRoam);
    }

    #[test]
    fn toggle_command_flips_the_mode() {
        let (mut engine, _log) = engine_with_log();
        engine.on_heading_sample(10.0);
        engine.handle_command(Command::ToggleLock);
        assert_eq!(engine.mode(), GuidanceMode::Locked);
        engine.handle_command(Command::ToggleLock);
        assert_eq!(engine.mode(), GuidanceMode::FreeRoam);
    }
}
