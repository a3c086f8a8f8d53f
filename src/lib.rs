//! SoundCompass helps a blind or low-vision walker hold a compass
//! heading by ear. A wearable compass unit streams heading and position
//! fixes; the guidance engine maps them onto two continuously playing
//! oscillators, a stereo panner, and spoken announcements. In free roam
//! the harmonic sweeps a semitone ladder as the user turns and each
//! octant boundary is called out; once a heading is locked, pan and a
//! pitch bend steer the user back onto it, and displacement from the
//! lock point is counted off in feet.
//!
//! The engine itself is a pure state machine: sensor delivery, speech
//! synthesis, and the oscillators are collaborators behind the traits in
//! [`audio`], so the same engine runs against a serial device, the
//! simulated walker, or a recorded trace.

#![warn(missing_docs)]
pub mod angle;
pub mod args;
pub mod audio;
pub mod config;
pub mod dummy_source;
pub mod engine;
pub mod free_roam;
pub mod geo;
pub mod heading_tracker;
pub mod locked_track;
pub mod sample_queue;
pub mod sensor_decoder;
pub mod stage;
pub mod step_counter;
pub mod tone_renderer;
pub mod trace;
