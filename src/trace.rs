//! Reading and writing guidance traces: recordings of a walk's heading
//! and audio-parameter streams, for replaying or rendering a session
//! after the fact. The file layout is:
//!
//! - A header with the number of streams, the tick rate (engine updates
//!   per second), and one [`TraceTag`] per stream, serialized with
//!   [serde] and [ron]:
//!
//! ```text
//! (n_streams:A,sample_rate:B,tags:[C, D,...])
//! ```
//!
//! - A separator byte of all 1s, `0xFF`.
//! - The samples, `f32`s in big-endian, interleaved across streams in
//!   tag order.

use serde::{Deserialize, Serialize};
use std::{
    borrow::Cow,
    cmp::Ordering,
    fmt,
    fs::File,
    io::{Read, Write},
    path::Path,
};

/// A recorded guidance session: header plus interleaved samples.
#[derive(Debug, Clone, PartialEq)]
pub struct TraceFile {
    header: TraceHeader,
    samples: Vec<f32>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
struct TraceHeader {
    n_streams: u64,
    sample_rate: u64,
    tags: Vec<TraceTag>,
}

/// Identifies the kind of data contained within a particular stream.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
pub enum TraceTag {
    /// Compass heading, degrees [0, 360).
    Heading,
    /// Stereo pan, [-1, 1].
    Pan,
    /// Drone oscillator frequency, Hz.
    ToneFrequency,
    /// Harmonic oscillator frequency, Hz.
    HarmonicFrequency,
    /// Drone oscillator amplitude.
    ToneAmplitude,
    /// Harmonic oscillator amplitude.
    HarmonicAmplitude,
    /// One-shot cue trigger, 1.0 on ticks where the cue fired.
    Cue,
    /// Last spoken displacement from the lock point, feet.
    DistanceFeet,
}

/// Everything that can go wrong while building, writing, or reading a
/// [`TraceFile`].
#[derive(Debug)]
pub enum TraceError {
    /// Returned when trying to build a trace and the stream buffers are
    /// of unequal lengths.
    UnequalStreamLengths,

    /// Returned when reading a trace without the delimiter between the
    /// header and the sample binary.
    NoDelimiter,

    /// Returned when the sample section is not a whole number of f32s.
    TryInto,

    /// Returned when io fails when reading or writing files.
    IoError(std::io::Error),

    /// Returned when serialization of the header fails.
    RonError(ron::Error),

    /// Returned when deserialization of the header fails.
    RonSpannedError(ron::de::SpannedError),
}

impl fmt::Display for TraceError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use TraceError as TE;
        let msg = match self {
            TE::UnequalStreamLengths => Cow::from("unequal stream buffer lengths"),
            TE::NoDelimiter => Cow::from("no delimiter in trace file"),
            TE::TryInto => Cow::from("sample bytes did not divide into f32s"),
            TE::IoError(error) => Cow::from(format!("io error: {}", error)),
            TE::RonError(error) => Cow::from(format!("ron error: {}", error)),
            TE::RonSpannedError(error) => Cow::from(format!("ron spanning error: {}", error)),
        };

        write!(f, "{}", msg)
    }
}

impl std::error::Error for TraceError {}

impl TraceFile {
    /// Make a [`TraceBuilder`], which can be used to set the tick rate
    /// and add streams before building the trace.
    pub fn builder() -> TraceBuilder {
        TraceBuilder::new()
    }

    /// Write out a trace to the path provided.
    pub fn to_path(&self, path: impl AsRef<Path>) -> Result<(), TraceError> {
        let mut handle = File::create(path).map_err(TraceError::IoError)?;
        self.to_file(&mut handle)
    }

    /// Write out a trace to the [`Write`]able object provided.
    pub fn to_file(&self, file: &mut impl Write) -> Result<(), TraceError> {
        let header = ron::ser::to_string(&self.header).map_err(TraceError::RonError)?;

        let mut buf = Vec::with_capacity(header.len() + 1 + self.samples.len() * 4);
        buf.extend_from_slice(header.as_bytes());
        buf.push(0xFF);
        for sample in &self.samples {
            buf.extend_from_slice(&sample.to_be_bytes());
        }
        file.write_all(&buf).map_err(TraceError::IoError)
    }

    /// Read a trace from the path provided.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, TraceError> {
        let mut handle = File::open(path).map_err(TraceError::IoError)?;
        Self::from_file(&mut handle)
    }

    /// Read a trace from the [`Read`]able object provided.
    pub fn from_file(file: &mut impl Read) -> Result<Self, TraceError> {
        let mut raw = Vec::new();
        file.read_to_end(&mut raw).map_err(TraceError::IoError)?;

        // The delimiter can never occur inside the ron header, so the
        // first 0xFF is always the right split point.
        let delim_idx = raw
            .iter()
            .position(|b| *b == 0xFF)
            .ok_or(TraceError::NoDelimiter)?;
        let header = ron::de::from_bytes::<TraceHeader>(&raw[..delim_idx])
            .map_err(TraceError::RonSpannedError)?;

        let body = &raw[delim_idx + 1..];
        let mut samples = Vec::with_capacity(body.len() / 4);
        for chunk in body.chunks(4) {
            let bytes: [u8; 4] = chunk.try_into().map_err(|_| TraceError::TryInto)?;
            samples.push(f32::from_be_bytes(bytes));
        }

        Ok(TraceFile { header, samples })
    }

    /// Extract the streams at the rate they were recorded. Also returns
    /// that rate, since traces can be recorded at any tick rate.
    pub fn streams_native_sample_rate(&self) -> (u64, Vec<(TraceTag, Vec<f32>)>) {
        let sample_vecs = self.get_raw_streams();
        let res_vecs = Self::attach_tags(&self.header.tags, sample_vecs);
        (self.header.sample_rate, res_vecs)
    }

    /// Extracts the streams, interpolating or quantizing to produce data
    /// points at the requested rate.
    pub fn streams_with_sample_rate(&self, sample_rate: u64) -> Vec<(TraceTag, Vec<f32>)> {
        match sample_rate.cmp(&self.header.sample_rate) {
            Ordering::Equal => self.streams_native_sample_rate().1,
            Ordering::Less => self.streams_quantized(sample_rate),
            Ordering::Greater => self.streams_interpolated(sample_rate),
        }
    }

    /// Take a slice of [`TraceTag`]s and sample vectors and zip them.
    fn attach_tags(tags: &[TraceTag], samples: Vec<Vec<f32>>) -> Vec<(TraceTag, Vec<f32>)> {
        assert_eq!(tags.len(), samples.len());
        tags.iter().cloned().zip(samples).collect()
    }

    /// Returns a cloned, de-interleaved version of the samples.
    fn get_raw_streams(&self) -> Vec<Vec<f32>> {
        let n_streams = self.header.n_streams as usize;
        let n_ticks = if n_streams == 0 {
            0
        } else {
            self.samples.len() / n_streams
        };

        let mut streams = vec![Vec::with_capacity(n_ticks); n_streams];
        for row in self.samples.chunks(n_streams) {
            for (stream, sample) in streams.iter_mut().zip(row) {
                stream.push(*sample);
            }
        }
        streams
    }

    /// Interpolates data points to reach a higher sample rate. Only
    /// really works when the requested rate is a multiple of the native
    /// rate.
    fn streams_interpolated(&self, sample_rate: u64) -> Vec<(TraceTag, Vec<f32>)> {
        debug_assert!(sample_rate > self.header.sample_rate);
        let per_point = (sample_rate / self.header.sample_rate) as usize;
        let interpolated = self
            .get_raw_streams()
            .into_iter()
            .map(|stream| {
                let mut out = Vec::with_capacity(stream.len().saturating_sub(1) * per_point);
                for pair in stream.windows(2) {
                    let step = (pair[1] - pair[0]) / per_point as f32;
                    for i in 0..per_point {
                        out.push(pair[0] + i as f32 * step);
                    }
                }
                out
            })
            .collect();
        Self::attach_tags(&self.header.tags, interpolated)
    }

    /// Averages data points down to a lower sample rate. Only really
    /// works when the requested rate is a factor of the native rate.
    fn streams_quantized(&self, sample_rate: u64) -> Vec<(TraceTag, Vec<f32>)> {
        debug_assert!(sample_rate < self.header.sample_rate);
        let per_sample = (self.header.sample_rate / sample_rate) as usize;
        let quantized = self
            .get_raw_streams()
            .into_iter()
            .map(|stream| {
                stream
                    .chunks(per_sample)
                    .map(|window| window.iter().sum::<f32>() / window.len() as f32)
                    .collect()
            })
            .collect();
        Self::attach_tags(&self.header.tags, quantized)
    }
}

/// Accumulates tagged streams and a tick rate before building a
/// [`TraceFile`].
#[derive(Debug, Clone)]
pub struct TraceBuilder {
    sample_rate: u64,
    streams: Vec<(TraceTag, Vec<f32>)>,
}

impl Default for TraceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TraceBuilder {
    /// A builder with no streams and the engine's default 10 ticks per
    /// second.
    fn new() -> Self {
        TraceBuilder {
            sample_rate: 10,
            streams: Vec::new(),
        }
    }

    /// Sets the tick rate of the builder, in samples per second.
    pub fn set_samplerate(self, sample_rate: u64) -> Self {
        TraceBuilder {
            sample_rate,
            ..self
        }
    }

    /// Adds a tagged stream to the builder.
    pub fn add_stream(mut self, stream: &[f32], tag: TraceTag) -> Self {
        self.streams.push((tag, stream.to_vec()));
        self
    }

    /// Builds a [`TraceFile`], truncating all streams to the length of
    /// the shortest stream.
    pub fn build_truncate(self) -> TraceFile {
        let tags: Vec<TraceTag> = self.streams.iter().map(|(tag, _)| *tag).collect();
        let n_ticks = self
            .streams
            .iter()
            .map(|(_, stream)| stream.len())
            .min()
            .unwrap_or(0);

        let mut samples = Vec::with_capacity(n_ticks * self.streams.len());
        for tick in 0..n_ticks {
            for (_, stream) in &self.streams {
                samples.push(stream[tick]);
            }
        }

        TraceFile {
            header: TraceHeader {
                n_streams: self.streams.len() as u64,
                sample_rate: self.sample_rate,
                tags,
            },
            samples,
        }
    }

    /// Builds a [`TraceFile`], returning it if all streams are of the
    /// same length and [`TraceError::UnequalStreamLengths`] otherwise.
    pub fn build(self) -> Result<TraceFile, TraceError> {
        let lens: Vec<usize> = self.streams.iter().map(|(_tag, v)| v.len()).collect();

        if lens.windows(2).all(|w| w[0] == w[1]) {
            Ok(self.build_truncate())
        } else {
            Err(TraceError::UnequalStreamLengths)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const A_FLOAT: f32 = 12.078_431;

    #[test]
    fn write_and_read_path() {
        let tempfile = tempfile::NamedTempFile::new().unwrap();
        let path = tempfile.path();
        let data = TraceFile::builder()
            .set_samplerate(10)
            .add_stream(&[A_FLOAT; 4], TraceTag::Heading)
            .add_stream(&[A_FLOAT; 4], TraceTag::Pan)
            .build()
            .unwrap();

        data.to_path(path).unwrap();
        let read_data = TraceFile::from_path(path).unwrap();
        assert_eq!(data, read_data);
    }

    #[test]
    fn write_and_read_cursor() {
        let mut buf = Cursor::new(Vec::new());
        let data = TraceFile::builder()
            .set_samplerate(10)
            .add_stream(&[A_FLOAT; 4], TraceTag::Heading)
            .add_stream(&[A_FLOAT; 4], TraceTag::Pan)
            .build()
            .unwrap();

        data.to_file(&mut buf).unwrap();
        buf.set_position(0);
        let read_data = TraceFile::from_file(&mut buf).unwrap();
        assert_eq!(data, read_data);
    }

    #[test]
    fn unequal_streams_do_not_build() {
        let result = TraceFile::builder()
            .add_stream(&[1.0, 2.0], TraceTag::Heading)
            .add_stream(&[1.0], TraceTag::Pan)
            .build();
        assert!(matches!(result, Err(TraceError::UnequalStreamLengths)));
    }

    #[test]
    fn native_sample_rate_read() {
        let stream_data = vec![
            (TraceTag::Heading, vec![A_FLOAT; 4]),
            (TraceTag::Pan, vec![A_FLOAT; 4]),
        ];

        let data = TraceFile::builder()
            .set_samplerate(10)
            .add_stream(&stream_data[0].1, stream_data[0].0)
            .add_stream(&stream_data[1].1, stream_data[1].0)
            .build()
            .unwrap();

        let (sr, streams) = data.streams_native_sample_rate();
        assert_eq!(10, sr);
        assert_eq!(stream_data, streams);
    }

    #[test]
    fn quantize_read() {
        let data = TraceFile::builder()
            .set_samplerate(10)
            .add_stream(&[A_FLOAT; 4], TraceTag::Heading)
            .build()
            .unwrap();

        let streams = data.streams_with_sample_rate(5);
        assert_eq!(vec![(TraceTag::Heading, vec![A_FLOAT; 2])], streams);
    }

    #[test]
    fn interpolate_range() {
        let stream_data = vec![0.0, 0.2, 0.8];

        let data = TraceFile::builder()
            .set_samplerate(5)
            .add_stream(&stream_data, TraceTag::Pan)
            .build()
            .unwrap();

        let streams = data.streams_with_sample_rate(10);
        assert_eq!(vec![(TraceTag::Pan, vec![0.0, 0.1, 0.2, 0.5])], streams);
    }

    #[test]
    fn read_from_empty() {
        let data = TraceFile::builder().build().unwrap();

        let expected: Vec<(TraceTag, Vec<f32>)> = vec![];
        let (_, streams1) = data.streams_native_sample_rate();
        let streams2 = data.streams_with_sample_rate(5);
        let streams3 = data.streams_with_sample_rate(100);

        assert_eq!(expected, streams1);
        assert_eq!(expected, streams2);
        assert_eq!(expected, streams3);
    }
}
