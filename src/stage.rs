//! Defines the Stage trait, the seam between the threads of the
//! SoundCompass pipeline. A stage consumes data from the preceding
//! thread over a channel, processes it, and passes new data to the
//! subsequent thread.

use log::{info, warn};
use std::fmt;
use std::sync::mpsc::{Receiver, Sender};
use std::thread::{self, JoinHandle};

/// Errors a stage can hit while shutting down.
#[derive(Debug)]
pub enum StageError {
    /// The WAV writer failed to finalize its header.
    Wav(hound::Error),
}

impl fmt::Display for StageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageError::Wav(error) => write!(f, "wav error: {}", error),
        }
    }
}

impl std::error::Error for StageError {}

/// A step of the SoundCompass pipeline. Anything that transforms a
/// stream of values can run as a stage on its own thread.
pub trait Stage: fmt::Display {
    /// What the stage consumes.
    type InData;
    /// What the stage produces.
    type OutData;

    /// Converts one input value into one output value.
    fn convert(&mut self, input: Self::InData) -> Self::OutData;

    /// Cleans up when the input channel closes.
    fn finalize(&mut self) -> Result<(), StageError>;
}

/// Runs the given stage on its own thread. On receiving data on the
/// input channel, the stage converts it and sends the result to the
/// output channel; when the input channel closes, the stage finalizes
/// and the thread ends.
pub fn run_stage<S: Stage + Send + 'static>(
    mut stage: Box<S>,
    input: Receiver<S::InData>,
    output: Sender<S::OutData>,
) -> JoinHandle<()>
where
    S::InData: Send + 'static,
    S::OutData: Send + 'static,
{
    thread::spawn(move || {
        while let Ok(data) = input.recv() {
            let out_data = stage.convert(data);
            if let Err(error) = output.send(out_data) {
                warn!("{} : received error {}.", stage, error);
            }
        }

        if let Err(stage_error) = stage.finalize() {
            warn!("{} : error during terminating : {stage_error}.", stage);
        }
        info!("{} : terminated.", stage);
    })
}
