//! A simulated walker for development without the wearable unit: a
//! background thread emits heading samples that wander around a
//! commanded bearing and position samples that advance along it at a
//! steady walking speed.

use rand::prelude::*;
use std::collections::VecDeque;
use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::Duration;

use crate::angle::normalize_360;
use crate::geo::{GeoPoint, EARTH_RADIUS_M};
use crate::sample_queue::{Sample, SampleSource};

/// Where simulated walks start, for lack of anywhere better: the corner
/// of Congress and Hanover, Boston.
pub const START_POINT: GeoPoint = GeoPoint {
    lat: 42.360082,
    lon: -71.058880,
};

const TICK: Duration = Duration::from_millis(100);

enum Signal {
    Bearing(f32),
    Noise(f32),
    Speed(f64),
    Stop,
}

/// A [`SampleSource`] backed by the simulation thread. Dropping it
/// without calling [`DummyWalker::stop`] leaves the thread running until
/// the process exits, so call `stop` when done.
pub struct DummyWalker {
    handle: Option<thread::JoinHandle<()>>,
    tx: mpsc::Sender<Signal>,
    msgs: Arc<Mutex<VecDeque<Sample>>>,
}

impl DummyWalker {
    /// Spawns the simulation thread. The walker starts at
    /// [`START_POINT`], facing and walking due North at 1.4 m/s with a
    /// few degrees of heading jitter.
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel::<Signal>();
        let msgs = Arc::new(Mutex::new(VecDeque::new()));
        let th_msgs = Arc::clone(&msgs);

        let handle = thread::spawn(move || {
            let mut rng = thread_rng();
            let mut running = true;
            let mut bearing: f32 = 0.0;
            let mut noise: f32 = 4.0;
            let mut speed: f64 = 1.4;
            let mut position = START_POINT;

            while running {
                while let Ok(received) = rx.try_recv() {
                    match received {
                        Signal::Bearing(new_bearing) => bearing = new_bearing,
                        Signal::Noise(new_noise) => noise = new_noise,
                        Signal::Speed(new_speed) => speed = new_speed,
                        Signal::Stop => running = false,
                    }
                }

                let jitter = if noise > 0.0 {
                    rng.gen_range(-noise..noise)
                } else {
                    0.0
                };
                let heading = normalize_360(bearing + jitter);
                position = advance(position, bearing as f64, speed * TICK.as_secs_f64());

                {
                    let mut msgs = th_msgs.lock().unwrap();
                    msgs.push_back(Sample::Heading(heading));
                    msgs.push_back(Sample::Position(position));
                }
                thread::sleep(TICK);
            }
        });

        DummyWalker {
            handle: Some(handle),
            tx,
            msgs,
        }
    }

    /// Changes the bearing the walker faces and moves along, in degrees.
    pub fn set_bearing(&self, bearing: f32) {
        self.tx.send(Signal::Bearing(bearing)).unwrap();
    }

    /// Changes the half-width of the heading jitter, in degrees.
    pub fn set_noise(&self, noise: f32) {
        self.tx.send(Signal::Noise(noise)).unwrap();
    }

    /// Changes the walking speed, in meters per second.
    pub fn set_speed(&self, speed: f64) {
        self.tx.send(Signal::Speed(speed)).unwrap();
    }

    /// Stops the simulation thread and waits for it to finish.
    pub fn stop(&mut self) {
        self.tx.send(Signal::Stop).unwrap();
        if let Some(thread) = self.handle.take() {
            thread.join().unwrap();
        }
    }
}

impl Default for DummyWalker {
    fn default() -> Self {
        Self::new()
    }
}

impl Iterator for DummyWalker {
    type Item = Sample;

    fn next(&mut self) -> Option<Self::Item> {
        self.msgs.lock().unwrap().pop_front()
    }
}

impl SampleSource for DummyWalker {
    fn clear(&mut self) {
        self.msgs.lock().unwrap().clear();
    }
}

/// Moves `from` by `distance_m` meters along `bearing_deg` on a flat
/// local approximation, which is plenty for walking distances.
fn advance(from: GeoPoint, bearing_deg: f64, distance_m: f64) -> GeoPoint {
    let bearing = bearing_deg.to_radians();
    let dlat = (distance_m * bearing.cos() / EARTH_RADIUS_M).to_degrees();
    let dlon = (distance_m * bearing.sin()
        / (EARTH_RADIUS_M * from.lat.to_radians().cos()))
    .to_degrees();
    GeoPoint {
        lat: from.lat + dlat,
        lon: from.lon + dlon,
    }
}
