use std::{
    io::Write,
    path::{Path, PathBuf},
};

use clap::{Parser, Subcommand};
use sketchreel_core::{
    build_timeline, AppConfig, FrameClock, FrameRecord, Recorder, RecordingCanvas,
    RecordingSettings, Timeline,
};
use tracing_subscriber::EnvFilter;

fn main() -> sketchreel_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init { output } => run_init(&output),
        Commands::Preview { config, frames } => run_preview(config.as_deref(), frames),
        Commands::Export {
            config,
            frames,
            output,
        } => run_export(config.as_deref(), frames, output),
    }
}

fn run_init(output: &Path) -> sketchreel_core::Result<()> {
    tracing::info!(?output, "writing default config");
    AppConfig::default().save(output)
}

fn run_preview(config: Option<&Path>, frames: Option<u64>) -> sketchreel_core::Result<()> {
    let config = load_config(config)?;
    let frames = frames.unwrap_or(config.playback.frames);
    let mut timeline = build_timeline::<RecordingCanvas>(&config)?;
    let mut canvas = RecordingCanvas::new(config.canvas.width, config.canvas.height);
    let mut clock = FrameClock::new(config.playback.fps);

    tracing::info!(
        scenes = timeline.len(),
        total_length = timeline.total_length(),
        looping = timeline.is_looping(),
        frames,
        "starting preview"
    );

    let mut draw_calls = 0;
    let mut busiest = 0;
    let mut passes = 0;
    while clock.frame() < frames {
        let tick = timeline.play(clock.tick(), &mut canvas)?;
        let commands = canvas.take_commands().len();
        draw_calls += commands;
        busiest = busiest.max(tick.executed);
        if tick.finished {
            passes += 1;
        }
    }

    tracing::info!(
        frames,
        seconds = clock.seconds(),
        draw_calls,
        busiest,
        passes,
        "preview finished"
    );
    Ok(())
}

fn run_export(
    config: Option<&Path>,
    frames: Option<u64>,
    output: PathBuf,
) -> sketchreel_core::Result<()> {
    let config = load_config(config)?;
    let frames = frames.unwrap_or(config.playback.frames);
    let mut timeline = build_timeline::<RecordingCanvas>(&config)?;
    let mut canvas = RecordingCanvas::new(config.canvas.width, config.canvas.height);
    let mut clock = FrameClock::new(config.playback.fps);
    let mut recorder = Recorder::create(RecordingSettings {
        output_path: output.clone(),
    })?;

    tracing::info!(?output, frames, "exporting draw commands");

    let written = record_frames(&mut timeline, &mut canvas, &mut clock, frames, &mut recorder)?;
    recorder.finish()?;
    tracing::info!(?output, frames = written, "export finished");
    Ok(())
}

/// Plays up to `frames` host frames into `recorder` and returns how many were
/// written. A one-shot timeline stops on the tick its completion fires.
fn record_frames<W: Write>(
    timeline: &mut Timeline<RecordingCanvas>,
    canvas: &mut RecordingCanvas,
    clock: &mut FrameClock,
    frames: u64,
    recorder: &mut Recorder<W>,
) -> sketchreel_core::Result<u64> {
    while clock.frame() < frames {
        let mut finished = false;
        let tick = timeline.play_with(clock.tick(), canvas, || finished = true)?;
        if finished && !timeline.is_looping() {
            break;
        }
        recorder.record(&FrameRecord {
            frame: tick.frame,
            effective: tick.effective,
            commands: canvas.take_commands(),
        })?;
    }
    Ok(recorder.frames_written())
}

fn load_config(path: Option<&Path>) -> sketchreel_core::Result<AppConfig> {
    match path {
        Some(path) => {
            tracing::info!(?path, "loading config");
            AppConfig::load(path)
        }
        None => Ok(AppConfig::default()),
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Headless host for frame-indexed sketch timelines", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write the built-in demo configuration to a file.
    Init {
        /// Where to write the config.
        output: PathBuf,
    },
    /// Play the timeline headlessly and log a summary.
    Preview {
        /// Config file; the built-in demo is used when omitted.
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Number of host frames to play, overriding the config.
        #[arg(short, long)]
        frames: Option<u64>,
    },
    /// Play the timeline and write every frame's draw calls as JSON lines.
    Export {
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(short, long)]
        frames: Option<u64>,
        /// Output path for the recording.
        output: PathBuf,
    },
}
