//! The soundcompass binary. Three ways to run the guidance engine:
//! live against a serial compass unit, against the simulated walker, or
//! offline, rendering a previously recorded trace to a WAV file.

use clap::Parser;
use log::{info, warn};
use serial2::SerialPort;
use soundcompass::{
    args::{CommandTask, CompassArgs, RenderCommand, SerialCommand, SimulateCommand},
    audio::{AudioLog, ConsoleAudio},
    config::EngineConfig,
    dummy_source::DummyWalker,
    engine::{Command, GuidanceEngine},
    sample_queue::SampleQueue,
    sensor_decoder::SensorEvent,
    stage::{run_stage, Stage},
    tone_renderer::{frames_from_streams, RenderFrame, ToneRenderer, WavSink},
    trace::{TraceFile, TraceTag},
};
use std::{
    io::{self, BufRead},
    process::exit,
    str::{self, FromStr},
    sync::mpsc::{channel, Receiver},
    thread::spawn,
    time::Duration,
};

// Example:
// cargo run --bin soundcompass --
//                              --update    10 simulate
//                              --duration  30
//                              --bearing   45
//                              --lock-after 5
//                              --trace     walk.trace
//                              --out       walk.wav

fn main() {
    env_logger::init();
    let args = CompassArgs::parse();

    let result = match args.command.clone() {
        CommandTask::Serial(cmd) => run_serial(&args, cmd),
        CommandTask::Simulate(cmd) => run_simulate(&args, cmd),
        CommandTask::Render(cmd) => run_render(&args, cmd),
    };

    if let Err(message) = result {
        eprintln!("soundcompass: {}", message);
        exit(1);
    }
}

fn tick_duration(update_rate: f32) -> Duration {
    Duration::from_secs_f32(1.0 / update_rate)
}

/// Live guidance: a reader thread decodes sentences from the serial
/// port into the sample queue, a second thread turns stdin lines into
/// engine commands, and the main loop drains both at the update rate.
fn run_serial(args: &CompassArgs, cmd: SerialCommand) -> Result<(), String> {
    let device_name = match cmd.port {
        Some(name) => name,
        None => prompt_for_device()?,
    };

    // If the unit is missing, say so once and never start the engine.
    let mut port = SerialPort::open(device_name.trim(), cmd.baud)
        .map_err(|e| format!("compass unit not available on {}: {}", device_name.trim(), e))?;
    port.set_read_timeout(Duration::MAX)
        .map_err(|e| format!("failed to set read timeout: {}", e))?;

    let mut queue = SampleQueue::new();
    let reader_queue = queue.clone();

    let _reader_thread = spawn(move || {
        let mut buffer = [0; 256];
        let mut read_buf = Vec::new();

        loop {
            let read_len = match port.read(&mut buffer) {
                Ok(len) => len,
                Err(e) => {
                    warn!("compass unit disconnected: {}", e);
                    return;
                }
            };

            for &c in buffer.iter().take(read_len) {
                read_buf.push(c);
                if c == b'\n' {
                    match str::from_utf8(&read_buf) {
                        Ok(s) => match SensorEvent::from_str(s) {
                            Ok(event) => reader_queue.push(event.to_sample()),
                            Err(e) => warn!("was unable to parse sentence: {}", e),
                        },
                        // Often happens at the beginning of transmission
                        // when there is still garbage in the hardware
                        // buffer.
                        Err(e) => warn!("failed to decode utf-8: {:?}", e),
                    }
                    read_buf.clear();
                }
            }
        }
    });

    let command_rx = spawn_command_reader();

    let mut engine = GuidanceEngine::new(
        EngineConfig::default(),
        Box::new(ConsoleAudio),
        Box::new(ConsoleAudio),
        Box::new(ConsoleAudio),
    );

    println!("Listening on {}. Commands: lock, unlock, speak.", device_name.trim());
    let sleeper = spin_sleep::SpinSleeper::default();
    let tick = tick_duration(args.update_rate);
    loop {
        for sample in queue.by_ref() {
            engine.on_sample(sample);
        }
        while let Ok(command) = command_rx.try_recv() {
            engine.handle_command(command);
        }
        sleeper.sleep(tick);
    }
}

/// Asks the user which serial device the compass unit is on.
fn prompt_for_device() -> Result<String, String> {
    let available_ports =
        SerialPort::available_ports().map_err(|e| format!("failed to get available ports: {}", e))?;
    println!("Available devices:");
    for port in available_ports {
        println!("\t{}", port.to_string_lossy());
    }
    println!("Enter the device name: ");
    let mut device_name = String::new();
    io::stdin()
        .read_line(&mut device_name)
        .map_err(|e| format!("failed to read line: {}", e))?;
    Ok(device_name)
}

/// Maps stdin lines onto engine commands, the same way the remote
/// control buttons map on the device build.
fn spawn_command_reader() -> Receiver<Command> {
    let (tx, rx) = channel();
    spawn(move || {
        for line in io::stdin().lock().lines() {
            let line = match line {
                Ok(line) => line,
                Err(_) => return,
            };
            let command = match line.trim().to_lowercase().as_str() {
                "lock" | "unlock" | "l" => Command::ToggleLock,
                "speak" | "s" => Command::SpeakHeading,
                "" => continue,
                other => {
                    println!("unknown command {:?}; try lock, unlock, or speak", other);
                    continue;
                }
            };
            if tx.send(command).is_err() {
                return;
            }
        }
    });
    rx
}

/// Walks the simulated walker for the requested duration, locking the
/// heading partway through, then writes out the trace and the rendered
/// WAV as requested.
fn run_simulate(args: &CompassArgs, cmd: SimulateCommand) -> Result<(), String> {
    let mut walker = DummyWalker::new();
    walker.set_bearing(cmd.bearing);
    walker.set_noise(cmd.noise);
    walker.set_speed(cmd.speed);

    let log = AudioLog::new();
    let mut engine = GuidanceEngine::new(
        EngineConfig::default(),
        Box::new(log.clone()),
        Box::new(log.clone()),
        Box::new(ConsoleAudio),
    );

    let n_ticks = (cmd.duration_secs * args.update_rate).ceil() as usize;
    let lock_tick = (cmd.lock_after_secs * args.update_rate).round() as usize;
    let sleeper = spin_sleep::SpinSleeper::default();
    let tick = tick_duration(args.update_rate);

    let mut frames: Vec<RenderFrame> = Vec::with_capacity(n_ticks);
    let mut headings: Vec<f32> = Vec::with_capacity(n_ticks);
    let mut distances: Vec<f32> = Vec::with_capacity(n_ticks);
    let mut seen_cues = 0;

    info!(
        "simulating {} ticks at {} per second, locking at tick {}",
        n_ticks, args.update_rate, lock_tick
    );
    for tick_idx in 0..n_ticks {
        for sample in walker.by_ref() {
            engine.on_sample(sample);
        }
        if tick_idx == lock_tick {
            engine.handle_command(Command::ToggleLock);
        }

        let params = log.last_frame().unwrap_or(RenderFrame::SILENT.params);
        let cue_count = log.cue_count();
        frames.push(RenderFrame {
            params,
            cue: cue_count > seen_cues,
        });
        seen_cues = cue_count;
        headings.push(engine.current_heading());
        distances.push(engine.last_reported_distance_feet());

        sleeper.sleep(tick);
    }
    walker.stop();

    if let Some(path) = cmd.trace_out {
        let trace = build_trace(args.update_rate, &frames, &headings, &distances)
            .map_err(|e| format!("failed to build trace: {}", e))?;
        trace
            .to_path(&path)
            .map_err(|e| format!("failed to write trace {}: {}", path, e))?;
        println!("Wrote trace to {}", path);
    }

    if let Some(path) = cmd.wav_out {
        render_to_wav(&frames, cmd.samp_rate, args.update_rate, &path)?;
        println!("Wrote audio to {}", path);
    }

    Ok(())
}

/// Packs the per-tick records into the on-disk trace format.
fn build_trace(
    update_rate: f32,
    frames: &[RenderFrame],
    headings: &[f32],
    distances: &[f32],
) -> Result<TraceFile, soundcompass::trace::TraceError> {
    let pans: Vec<f32> = frames.iter().map(|f| f.params.pan).collect();
    let tone_freqs: Vec<f32> = frames.iter().map(|f| f.params.tone_frequency).collect();
    let harm_freqs: Vec<f32> = frames.iter().map(|f| f.params.harmonic_frequency).collect();
    let tone_amps: Vec<f32> = frames.iter().map(|f| f.params.tone_amplitude).collect();
    let harm_amps: Vec<f32> = frames.iter().map(|f| f.params.harmonic_amplitude).collect();
    let cues: Vec<f32> = frames
        .iter()
        .map(|f| if f.cue { 1.0 } else { 0.0 })
        .collect();

    TraceFile::builder()
        .set_samplerate(update_rate.round() as u64)
        .add_stream(headings, TraceTag::Heading)
        .add_stream(&pans, TraceTag::Pan)
        .add_stream(&tone_freqs, TraceTag::ToneFrequency)
        .add_stream(&harm_freqs, TraceTag::HarmonicFrequency)
        .add_stream(&tone_amps, TraceTag::ToneAmplitude)
        .add_stream(&harm_amps, TraceTag::HarmonicAmplitude)
        .add_stream(&cues, TraceTag::Cue)
        .add_stream(distances, TraceTag::DistanceFeet)
        .build()
}

/// Streams the frames through the renderer and WAV sink stages, each on
/// its own thread, and waits for the file to finalize.
fn render_to_wav(
    frames: &[RenderFrame],
    samp_rate: u32,
    update_rate: f32,
    path: &str,
) -> Result<(), String> {
    let renderer = ToneRenderer::new(samp_rate, update_rate);
    let sink = WavSink::create(path, samp_rate)
        .map_err(|e| format!("failed to create {}: {}", path, e))?;

    let (frame_tx, render_rx) = channel();
    let (render_tx, sink_rx) = channel();
    let (sink_tx, result_rx) = channel();

    let render_handle = run_stage(Box::new(renderer), render_rx, render_tx);
    let sink_handle = run_stage(Box::new(sink), sink_rx, sink_tx);

    for frame in frames {
        frame_tx
            .send(*frame)
            .map_err(|e| format!("render pipeline died early: {}", e))?;
    }
    drop(frame_tx);

    for result in result_rx.iter() {
        result.map_err(|e| format!("failed to write {}: {}", path, e))?;
    }
    render_handle
        .join()
        .map_err(|_| "render thread panicked".to_string())?;
    sink_handle
        .join()
        .map_err(|_| "wav sink thread panicked".to_string())?;
    Ok(())
}

/// Renders a previously recorded trace, resampled to the requested
/// update rate, into a stereo WAV.
fn run_render(args: &CompassArgs, cmd: RenderCommand) -> Result<(), String> {
    let trace = TraceFile::from_path(&cmd.trace_in)
        .map_err(|e| format!("failed to read trace {}: {}", cmd.trace_in, e))?;
    let streams = trace.streams_with_sample_rate(args.update_rate.round() as u64);
    let frames = frames_from_streams(&streams);
    info!("rendering {} ticks from {}", frames.len(), cmd.trace_in);

    let mut renderer = ToneRenderer::new(cmd.samp_rate, args.update_rate);
    let session = renderer.render_session(&frames);

    let mut sink = WavSink::create(&cmd.wav_out, cmd.samp_rate)
        .map_err(|e| format!("failed to create {}: {}", cmd.wav_out, e))?;
    sink.convert(session)
        .map_err(|e| format!("failed to write {}: {}", cmd.wav_out, e))?;
    sink.finalize()
        .map_err(|e| format!("failed to finalize {}: {}", cmd.wav_out, e))?;
    println!("Wrote audio to {}", cmd.wav_out);
    Ok(())
}
