// Commandline argument parser using clap for SoundCompass

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser, Clone)]
#[clap(version, about)]
/// Walk a fixed compass heading by ear.
pub struct CompassArgs {
    #[command(subcommand, long_about)]
    /// Which task to perform: live guidance, simulation, or rendering
    pub command: CommandTask,

    /// How often the engine re-evaluates guidance, in ticks per second
    #[arg(short = 'u', long = "update", default_value_t = 10.0)]
    pub update_rate: f32,
}

/// The soundcompass subcommands.
#[derive(Debug, Subcommand, Clone)]
pub enum CommandTask {
    /// Run live guidance from a serial compass unit
    #[command(about)]
    Serial(SerialCommand),

    /// Drive the engine from a simulated walker
    #[command(about)]
    Simulate(SimulateCommand),

    /// Render a recorded trace to a stereo WAV file
    #[command(about)]
    Render(RenderCommand),
}

/// Options for live guidance over serial.
#[derive(Debug, Args, Clone)]
#[command(version, about)]
pub struct SerialCommand {
    /// Serial device of the compass unit; prompts with a list when omitted
    #[arg(short = 'p', long = "port")]
    pub port: Option<String>,

    /// Baud rate of the serial device
    #[arg(short = 'b', long = "baud", default_value_t = 115200)]
    pub baud: u32,
}

/// Options for the simulated walker.
#[derive(Debug, Args, Clone)]
#[command(version, about)]
pub struct SimulateCommand {
    /// How long to walk, in seconds
    #[arg(short = 'd', long = "duration", default_value_t = 30.0)]
    pub duration_secs: f32,

    /// Bearing the simulated walker holds, in degrees
    #[arg(long = "bearing", default_value_t = 45.0)]
    pub bearing: f32,

    /// Half-width of the simulated heading jitter, in degrees
    #[arg(long = "noise", default_value_t = 4.0)]
    pub noise: f32,

    /// Walking speed, in meters per second
    #[arg(long = "speed", default_value_t = 1.4)]
    pub speed: f64,

    /// Lock the heading after this many seconds
    #[arg(long = "lock-after", default_value_t = 5.0)]
    pub lock_after_secs: f32,

    /// Filename for the recorded guidance trace
    #[arg(short = 't', long = "trace")]
    pub trace_out: Option<String>,

    /// Filename for the rendered stereo WAV
    #[arg(short = 'o', long = "out")]
    pub wav_out: Option<String>,

    /// Sample rate of the rendered WAV, in Hz. Will often be 44100
    #[arg(short = 's', long = "samp", default_value_t = 44100)]
    pub samp_rate: u32,
}

/// Options for rendering a recorded trace.
#[derive(Debug, Args, Clone)]
#[command(version, about)]
pub struct RenderCommand {
    /// Trace file recorded by a previous run
    #[arg(short = 't', long = "trace")]
    pub trace_in: String,

    /// Filename for the rendered stereo WAV
    #[arg(short = 'o', long = "out")]
    pub wav_out: String,

    /// Sample rate of the rendered WAV, in Hz. Will often be 44100
    #[arg(short = 's', long = "samp", default_value_t = 44100)]
    pub samp_rate: u32,
}
