//! The single-consumer queue that serializes sensor delivery into the
//! engine. Reader threads push decoded samples in; the engine loop
//! drains them on its own schedule.

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
};

use crate::angle::Degrees;
use crate::geo::GeoPoint;

/// One sensor sample, of either kind the engine consumes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Sample {
    /// A compass heading, in degrees [0, 360).
    Heading(Degrees),
    /// A position fix.
    Position(GeoPoint),
}

/// A typed, clearable iterator that emits [`Sample`]s when iterated
/// upon. Designed to be maximally flexible to allow various sources:
/// a serial device, a simulator, or a replayed trace.
pub trait SampleSource: Iterator<Item = Sample> {
    /// Discards everything buffered so far.
    fn clear(&mut self);
}

/// A thread-safe buffer of pending samples. Clones share the same
/// buffer, so one copy can live on the reader thread while the engine
/// loop drains another.
#[derive(Debug, Default, Clone)]
pub struct SampleQueue {
    msgs: Arc<Mutex<VecDeque<Sample>>>,
}

impl SampleQueue {
    /// An empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a sample to the back of the queue.
    pub fn push(&self, sample: Sample) {
        self.msgs.lock().unwrap().push_back(sample);
    }
}

impl Iterator for SampleQueue {
    type Item = Sample;

    fn next(&mut self) -> Option<Self::Item> {
        self.msgs.lock().unwrap().pop_front()
    }
}

impl SampleSource for SampleQueue {
    fn clear(&mut self) {
        self.msgs.lock().unwrap().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn samples_come_out_in_push_order() {
        let mut queue = SampleQueue::new();
        queue.push(Sample::Heading(10.0));
        queue.push(Sample::Heading(20.0));
        assert_eq!(queue.next(), Some(Sample::Heading(10.0)));
        assert_eq!(queue.next(), Some(Sample::Heading(20.0)));
        assert_eq!(queue.next(), None);
    }

    #[test]
    fn clear_discards_pending_samples() {
        let mut queue = SampleQueue::new();
        queue.push(Sample::Heading(10.0));
        queue.clear();
        assert_eq!(queue.next(), None);
    }

    #[test]
    fn pushes_from_another_thread_are_visible() {
        let queue = SampleQueue::new();
        let producer = queue.clone();
        let handle = thread::spawn(move || {
            for i in 0..10 {
                producer.push(Sample::Heading(i as f32));
            }
        });
        handle.join().unwrap();
        assert_eq!(queue.clone().count(), 10);
    }
}
