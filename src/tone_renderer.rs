//! Renders a recorded guidance session to audio: two phase-continuous
//! sine oscillators (the drone and the harmonic), an equal-power stereo
//! pan, and a short beep wherever the on-track cue fired, written out as
//! a stereo float WAV.

use hound::{Error as HoundError, SampleFormat, WavSpec, WavWriter};
use std::fmt;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use crate::audio::AudioParameters;
use crate::stage::{Stage, StageError};
use crate::trace::TraceTag;

const TAU: f32 = 2.0 * std::f32::consts::PI;

const CUE_FREQUENCY: f32 = 880.0;
const CUE_AMPLITUDE: f32 = 0.3;

/// One engine tick's worth of audio state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderFrame {
    /// The oscillator parameters in force during the tick.
    pub params: AudioParameters,
    /// Whether the on-track cue fired on this tick.
    pub cue: bool,
}

impl RenderFrame {
    /// A frame that renders as silence, for ticks recorded before the
    /// first heading sample arrived.
    pub const SILENT: RenderFrame = RenderFrame {
        params: AudioParameters {
            tone_frequency: 0.0,
            harmonic_frequency: 0.0,
            tone_amplitude: 0.0,
            harmonic_amplitude: 0.0,
            pan: 0.0,
        },
        cue: false,
    };
}

/// Synthesizes ticks of [`RenderFrame`]s into stereo sample buffers.
/// Oscillator phase carries across ticks, so frequency changes do not
/// click.
pub struct ToneRenderer {
    sample_rate: u32,
    samples_per_tick: usize,
    tone_phase: f32,
    harmonic_phase: f32,
}

impl ToneRenderer {
    /// A renderer producing `sample_rate` audio frames per second from
    /// `update_rate` engine ticks per second.
    pub fn new(sample_rate: u32, update_rate: f32) -> Self {
        Self {
            sample_rate,
            samples_per_tick: (sample_rate as f32 / update_rate).round() as usize,
            tone_phase: 0.0,
            harmonic_phase: 0.0,
        }
    }

    /// Renders one tick into left and right sample buffers.
    pub fn render_tick(&mut self, frame: &RenderFrame) -> (Vec<f32>, Vec<f32>) {
        let (left_gain, right_gain) = pan_gains(frame.params.pan);
        let cue_len = if frame.cue {
            // A tenth of a second, or the whole tick if ticks are shorter.
            (self.sample_rate as usize / 10).min(self.samples_per_tick)
        } else {
            0
        };

        let mut left = Vec::with_capacity(self.samples_per_tick);
        let mut right = Vec::with_capacity(self.samples_per_tick);
        for i in 0..self.samples_per_tick {
            self.tone_phase =
                (self.tone_phase + TAU * frame.params.tone_frequency / self.sample_rate as f32) % TAU;
            self.harmonic_phase = (self.harmonic_phase
                + TAU * frame.params.harmonic_frequency / self.sample_rate as f32)
                % TAU;

            let mut sample = frame.params.tone_amplitude * self.tone_phase.sin()
                + frame.params.harmonic_amplitude * self.harmonic_phase.sin();
            if i < cue_len {
                sample += CUE_AMPLITUDE
                    * (TAU * CUE_FREQUENCY * i as f32 / self.sample_rate as f32).sin();
            }

            left.push(sample * left_gain);
            right.push(sample * right_gain);
        }

        (left, right)
    }

    /// Renders a whole session of ticks into one pair of buffers.
    pub fn render_session(&mut self, frames: &[RenderFrame]) -> (Vec<f32>, Vec<f32>) {
        let mut left = Vec::new();
        let mut right = Vec::new();
        for frame in frames {
            let (mut l, mut r) = self.render_tick(frame);
            left.append(&mut l);
            right.append(&mut r);
        }
        (left, right)
    }
}

impl Stage for ToneRenderer {
    type InData = RenderFrame;
    type OutData = (Vec<f32>, Vec<f32>);

    fn convert(&mut self, input: RenderFrame) -> (Vec<f32>, Vec<f32>) {
        self.render_tick(&input)
    }

    fn finalize(&mut self) -> Result<(), StageError> {
        Ok(())
    }
}

impl fmt::Display for ToneRenderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ToneRenderer")
    }
}

/// Equal-power pan gains for a pan in [-1, 1]; -1 is fully left.
fn pan_gains(pan: f32) -> (f32, f32) {
    let angle = (pan.clamp(-1.0, 1.0) + 1.0) * std::f32::consts::FRAC_PI_4;
    (angle.cos(), angle.sin())
}

/// Rebuilds render frames from extracted trace streams. Streams the
/// trace does not carry fall back to silence; the cue stream is treated
/// as fired wherever it exceeds one half.
pub fn frames_from_streams(streams: &[(TraceTag, Vec<f32>)]) -> Vec<RenderFrame> {
    let stream = |tag: TraceTag| streams.iter().find(|(t, _)| *t == tag).map(|(_, v)| v);
    let value = |tag: TraceTag, i: usize| stream(tag).and_then(|v| v.get(i)).copied();

    let n_ticks = streams.iter().map(|(_, v)| v.len()).min().unwrap_or(0);
    (0..n_ticks)
        .map(|i| RenderFrame {
            params: AudioParameters {
                tone_frequency: value(TraceTag::ToneFrequency, i).unwrap_or(0.0),
                harmonic_frequency: value(TraceTag::HarmonicFrequency, i).unwrap_or(0.0),
                tone_amplitude: value(TraceTag::ToneAmplitude, i).unwrap_or(0.0),
                harmonic_amplitude: value(TraceTag::HarmonicAmplitude, i).unwrap_or(0.0),
                pan: value(TraceTag::Pan, i).unwrap_or(0.0),
            },
            cue: value(TraceTag::Cue, i).unwrap_or(0.0) > 0.5,
        })
        .collect()
}

/// A wrapper for the hound WAV writer that writes rendered stereo audio
/// to the user-specified output file, one tick's buffers at a time.
pub struct WavSink {
    writer: Option<WavWriter<BufWriter<File>>>,
}

impl WavSink {
    /// Opens `path` for writing as a 32-bit float stereo WAV.
    pub fn create(path: impl AsRef<Path>, sample_rate: u32) -> Result<Self, HoundError> {
        let spec = WavSpec {
            channels: 2,
            sample_rate,
            bits_per_sample: 32,
            sample_format: SampleFormat::Float,
        };
        let writer = WavWriter::create(path, spec)?;
        Ok(Self {
            writer: Some(writer),
        })
    }
}

impl Stage for WavSink {
    type InData = (Vec<f32>, Vec<f32>);
    type OutData = Result<(), HoundError>;

    /// Appends one tick of rendered audio to the output WAV file,
    /// flushing so the header stays valid if the run is interrupted.
    fn convert(&mut self, input: (Vec<f32>, Vec<f32>)) -> Result<(), HoundError> {
        let writer = match self.writer.as_mut() {
            Some(writer) => writer,
            None => return Ok(()),
        };

        let (left_samps, right_samps) = input;
        for (left, right) in std::iter::zip(left_samps, right_samps) {
            writer.write_sample(left)?;
            writer.write_sample(right)?;
        }
        writer.flush()
    }

    /// Finalizes the WAV header. This happens automatically when the
    /// writer is dropped, but calling it gives us controlled error
    /// checking.
    fn finalize(&mut self) -> Result<(), StageError> {
        match self.writer.take() {
            Some(writer) => writer.finalize().map_err(StageError::Wav),
            None => Ok(()),
        }
    }
}

impl fmt::Display for WavSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WavSink")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stage::run_stage;
    use hound::WavReader;
    use std::sync::mpsc::channel;

    fn audible_frame() -> RenderFrame {
        RenderFrame {
            params: AudioParameters {
                tone_frequency: 440.0,
                harmonic_frequency: 660.0,
                tone_amplitude: 0.2,
                harmonic_amplitude: 0.2,
                pan: 0.0,
            },
            cue: false,
        }
    }

    #[test]
    fn tick_length_matches_the_rates() {
        let mut renderer = ToneRenderer::new(1000, 10.0);
        let (left, right) = renderer.render_tick(&audible_frame());
        assert_eq!(left.len(), 100);
        assert_eq!(right.len(), 100);
    }

    #[test]
    fn muted_frames_render_silence() {
        let mut renderer = ToneRenderer::new(1000, 10.0);
        let mut frame = audible_frame();
        frame.params.tone_amplitude = 0.0;
        frame.params.harmonic_amplitude = 0.0;
        let (left, right) = renderer.render_tick(&frame);
        assert!(left.iter().all(|s| *s == 0.0));
        assert!(right.iter().all(|s| *s == 0.0));
    }

    #[test]
    fn hard_left_pan_silences_the_right_channel() {
        let mut renderer = ToneRenderer::new(1000, 10.0);
        let mut frame = audible_frame();
        frame.params.pan = -1.0;
        let (left, right) = renderer.render_tick(&frame);
        assert!(left.iter().any(|s| s.abs() > 0.01));
        assert!(right.iter().all(|s| s.abs() < 1e-6));
    }

    #[test]
    fn cue_ticks_are_louder_than_muted_silence() {
        let mut renderer = ToneRenderer::new(1000, 10.0);
        let mut frame = audible_frame();
        frame.params.tone_amplitude = 0.0;
        frame.params.harmonic_amplitude = 0.0;
        frame.cue = true;
        let (left, _right) = renderer.render_tick(&frame);
        assert!(left.iter().any(|s| s.abs() > 0.1));
    }

    #[test]
    fn session_concatenates_ticks() {
        let mut renderer = ToneRenderer::new(1000, 10.0);
        let frames = vec![audible_frame(); 5];
        let (left, _right) = renderer.render_session(&frames);
        assert_eq!(left.len(), 500);
    }

    #[test]
    fn frames_rebuild_from_trace_streams() {
        let streams = vec![
            (TraceTag::ToneFrequency, vec![440.0, 440.0]),
            (TraceTag::HarmonicFrequency, vec![660.0, 880.0]),
            (TraceTag::ToneAmplitude, vec![0.2, 0.0]),
            (TraceTag::HarmonicAmplitude, vec![0.2, 0.0]),
            (TraceTag::Pan, vec![0.0, -0.5]),
            (TraceTag::Cue, vec![0.0, 1.0]),
        ];
        let frames = frames_from_streams(&streams);
        assert_eq!(frames.len(), 2);
        assert!(!frames[0].cue);
        assert!(frames[1].cue);
        assert_eq!(frames[1].params.pan, -0.5);
    }

    /// Render a few ticks through the threaded stage pair and read the
    /// WAV back, checking that the right number of interleaved samples
    /// landed on disk.
    #[test]
    fn renderer_and_wav_sink_run_as_stages() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.wav");

        let renderer = ToneRenderer::new(1000, 10.0);
        let sink = WavSink::create(&path, 1000).unwrap();

        let (frame_tx, render_rx) = channel::<RenderFrame>();
        let (render_tx, sink_rx) = channel::<(Vec<f32>, Vec<f32>)>();
        let (sink_tx, result_rx) = channel::<Result<(), HoundError>>();

        let render_handle = run_stage(Box::new(renderer), render_rx, render_tx);
        let sink_handle = run_stage(Box::new(sink), sink_rx, sink_tx);

        for _ in 0..3 {
            frame_tx.send(audible_frame()).unwrap();
        }
        drop(frame_tx);
        for result in result_rx.iter() {
            assert!(result.is_ok());
        }
        render_handle.join().unwrap();
        sink_handle.join().unwrap();

        let mut reader = WavReader::open(&path).unwrap();
        let all_samps = reader
            .samples::<f32>()
            .collect::<Result<Vec<f32>, hound::Error>>()
            .unwrap();
        assert_eq!(all_samps.len(), 3 * 100 * 2);
    }
}
