//! Parses the line-oriented ASCII sentences emitted by the wearable
//! compass unit over serial. Two sentence kinds exist: `+CHDG` for
//! heading fixes and `+CPOS` for position fixes.

use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::u32,
    combinator::map,
    error::Error,
    number::complete::{double, float},
    sequence::{preceded, tuple},
    Finish, IResult,
};

use std::str::FromStr;

use crate::geo::GeoPoint;
use crate::sample_queue::Sample;

/// A heading fix: `+CHDG:<heading_deg>,<accuracy_deg>,<timestamp_ms>`.
#[derive(Debug, Clone, PartialEq)]
pub struct HeadingSentence {
    /// True heading, in degrees.
    pub heading_deg: f32,
    /// Estimated accuracy of the fix, in whole degrees.
    pub accuracy_deg: u32,
    /// Milliseconds since the unit powered on.
    pub timestamp_ms: u32,
}

/// A position fix: `+CPOS:<lat>,<lon>,<h_accuracy_m>,<timestamp_ms>`.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionSentence {
    /// Latitude, decimal degrees, positive north.
    pub lat_deg: f64,
    /// Longitude, decimal degrees, positive east.
    pub lon_deg: f64,
    /// Estimated horizontal accuracy, in meters.
    pub h_accuracy_m: f32,
    /// Milliseconds since the unit powered on.
    pub timestamp_ms: u32,
}

/// Any sentence the unit can emit.
#[derive(Debug, Clone, PartialEq)]
pub enum SensorEvent {
    /// A `+CHDG` heading fix.
    Heading(HeadingSentence),
    /// A `+CPOS` position fix.
    Position(PositionSentence),
}

impl SensorEvent {
    /// The engine-facing sample carried by this sentence.
    pub fn to_sample(&self) -> Sample {
        match self {
            SensorEvent::Heading(h) => Sample::Heading(h.heading_deg),
            SensorEvent::Position(p) => Sample::Position(GeoPoint {
                lat: p.lat_deg,
                lon: p.lon_deg,
            }),
        }
    }
}

fn parse_heading(s: &str) -> IResult<&str, HeadingSentence> {
    map(
        tuple((
            preceded(tag("+CHDG:"), float),
            preceded(tag(","), u32),
            preceded(tag(","), u32),
        )),
        |(heading_deg, accuracy_deg, timestamp_ms)| HeadingSentence {
            heading_deg,
            accuracy_deg,
            timestamp_ms,
        },
    )(s)
}

fn parse_position(s: &str) -> IResult<&str, PositionSentence> {
    map(
        tuple((
            preceded(tag("+CPOS:"), double),
            preceded(tag(","), double),
            preceded(tag(","), float),
            preceded(tag(","), u32),
        )),
        |(lat_deg, lon_deg, h_accuracy_m, timestamp_ms)| PositionSentence {
            lat_deg,
            lon_deg,
            h_accuracy_m,
            timestamp_ms,
        },
    )(s)
}

fn parse_sensor_event(s: &str) -> IResult<&str, SensorEvent> {
    alt((
        map(parse_heading, SensorEvent::Heading),
        map(parse_position, SensorEvent::Position),
    ))(s)
}

impl FromStr for SensorEvent {
    type Err = Error<String>;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match parse_sensor_event(s.trim_end()).finish() {
            Ok((_remaining, event)) => Ok(event),
            Err(Error { input, code }) => Err(Error {
                input: input.to_string(),
                code,
            }),
        }
    }
}
