use std::f32::consts::TAU;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use clap::{Args, Parser, Subcommand};
use soundwavez_core::{
    FeatureExtractor, FileSource, GraphHandle, ManualScheduler, PerformanceReporter,
    RecordingSurface, RenderLoop, SettingsSnapshot, VizMode,
};
use tracing_subscriber::EnvFilter;

mod mic;

fn main() -> soundwavez_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let graph = GraphHandle::new();

    match cli.command {
        Commands::Play { input, opts } => {
            graph.connect_file(&input)?;
            run(&graph, &opts)
        }
        Commands::Mic { opts } => {
            let mut backend = mic::CpalMicBackend;
            graph.connect_mic(&mut backend)?;
            run(&graph, &opts)
        }
        Commands::Demo { opts } => {
            graph.connect_decoded(demo_tone(opts.duration_secs + 1.0))?;
            run(&graph, &opts)
        }
    }
}

fn run(graph: &GraphHandle, opts: &RunOpts) -> soundwavez_core::Result<()> {
    let settings = opts.settings()?;
    tracing::info!(mode = ?settings.mode, palette = %settings.palette, "starting visualizer");

    let extractor = FeatureExtractor::new(graph.clone());
    let reporter = PerformanceReporter::new(|sample| {
        tracing::info!(fps = sample.fps, dropped = sample.dropped_frames, "performance");
    });
    let mut render_loop = RenderLoop::new(extractor, reporter);
    let mut scheduler = ManualScheduler::new();
    let mut surface = RecordingSurface::new(opts.width, opts.height);

    render_loop.start(&mut scheduler);
    let deadline = Instant::now() + Duration::from_secs_f32(opts.duration_secs);
    let frame = Duration::from_micros(16_667);
    let mut draw_calls = 0usize;

    while Instant::now() < deadline {
        if scheduler.take() {
            render_loop.tick(Instant::now(), &settings, &mut surface, &mut scheduler)?;
            draw_calls += surface.take_commands().len();
        }
        std::thread::sleep(frame);
    }

    render_loop.stop(&mut scheduler);
    graph.disconnect()?;
    tracing::info!(draw_calls, "visualizer finished");
    Ok(())
}

/// A short amplitude-modulated tone so the demo has something to show.
fn demo_tone(seconds: f32) -> FileSource {
    let rate = 48_000u32;
    let count = (seconds * rate as f32) as usize;
    let samples = (0..count)
        .map(|n| {
            let t = n as f32 / rate as f32;
            let envelope = 0.5 + 0.5 * (TAU * 2.0 * t).sin();
            (TAU * 220.0 * t).sin() * 0.6 * envelope
        })
        .collect();
    FileSource::from_samples(samples, rate)
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Audio-reactive music visualizer", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Visualize a decoded WAV file.
    Play {
        /// Path to the WAV file to visualize.
        input: PathBuf,
        #[command(flatten)]
        opts: RunOpts,
    },
    /// Visualize the default microphone input.
    Mic {
        #[command(flatten)]
        opts: RunOpts,
    },
    /// Visualize a built-in synthetic tone.
    Demo {
        #[command(flatten)]
        opts: RunOpts,
    },
}

#[derive(Args, Debug)]
struct RunOpts {
    /// How long to run, in seconds.
    #[arg(long, default_value_t = 10.0)]
    duration_secs: f32,
    /// Visualization mode: bars, wave, or radial.
    #[arg(long, default_value = "bars")]
    mode: String,
    /// Palette name.
    #[arg(long, default_value = "Neon")]
    palette: String,
    /// Amplitude sensitivity.
    #[arg(long, default_value_t = 1.0)]
    sensitivity: f32,
    /// Requested FFT size.
    #[arg(long, default_value_t = 1024)]
    fft_size: usize,
    /// Surface width in pixels.
    #[arg(long, default_value_t = 960)]
    width: u32,
    /// Surface height in pixels.
    #[arg(long, default_value_t = 480)]
    height: u32,
    /// Optional settings snapshot (JSON) overriding the flags above.
    #[arg(long)]
    settings: Option<PathBuf>,
}

impl RunOpts {
    fn settings(&self) -> soundwavez_core::Result<SettingsSnapshot> {
        if let Some(path) = &self.settings {
            return load_settings(path);
        }
        Ok(SettingsSnapshot {
            mode: VizMode::from_name(&self.mode),
            sensitivity: self.sensitivity,
            fft_size: self.fft_size,
            palette: self.palette.clone(),
            ..Default::default()
        })
    }
}

fn load_settings(path: &Path) -> soundwavez_core::Result<SettingsSnapshot> {
    let raw = std::fs::read_to_string(path)?;
    serde_json::from_str(&raw)
        .map_err(|err| soundwavez_core::VizError::msg(format!("{}: {err}", path.display())))
}
