//! spotterd - camera object detection with spoken alerts
//!
//! This daemon:
//! 1. Loads configuration (file + env + flags), labels and the alert policy
//! 2. Builds the detector and the voice output (silent if speech is unavailable)
//! 3. Opens the capture source (exits non-zero if it cannot)
//! 4. Runs the drive loop until Ctrl-C or end of stream

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use spotter::{
    build_backend, init_voice, open_source, AlertEngine, DriveLoop, MonotonicClock,
    SpotterConfig, VoiceMode,
};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Config file (TOML, or JSON with a .json extension).
    #[arg(long, env = "SPOTTER_CONFIG")]
    config: Option<PathBuf>,
    /// Capture source: `stub://name` or a V4L2 device path.
    #[arg(long)]
    source: Option<String>,
    /// Newline-delimited label file (line index = class id).
    #[arg(long)]
    labels: Option<PathBuf>,
    /// ONNX detection model; selects the tract backend.
    #[arg(long)]
    model: Option<PathBuf>,
    /// Minimum confidence (exclusive) for a detection to count.
    #[arg(long)]
    threshold: Option<f32>,
    /// Seconds between two alerts for the same class.
    #[arg(long)]
    cooldown: Option<f64>,
    /// Log alerts instead of speaking them.
    #[arg(long)]
    silent: bool,
    /// Speak through a bounded queue so inference never waits on speech.
    #[arg(long)]
    queued: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let mut cfg = SpotterConfig::load_from(args.config.as_deref())?;
    apply_args(&mut cfg, args);
    cfg.validate()?;

    let labels = cfg.labels()?;
    log::info!(
        "{} labels, {} alert classes, threshold {}, cooldown {}s",
        labels.len(),
        cfg.policy.len(),
        cfg.alerts.threshold,
        cfg.alerts.cooldown_secs
    );
    let engine = AlertEngine::new(cfg.alerts, labels, cfg.policy.clone())?;
    let backend = build_backend(&cfg.detector).context("failed to load detector")?;
    let voice = init_voice(&cfg.voice);
    let source = open_source(&cfg.source)?;

    let stop = Arc::new(AtomicBool::new(false));
    let handler_stop = stop.clone();
    ctrlc::set_handler(move || {
        handler_stop.store(true, Ordering::SeqCst);
    })
    .context("error setting Ctrl-C handler")?;

    let mut drive = DriveLoop::new(source, backend, engine, voice, MonotonicClock::new());
    drive.start()?;
    log::info!("Press Ctrl+C to stop...");

    let summary = drive.run(&stop)?;
    println!(
        "spotterd: {} frames, {} alerts ({:?})",
        summary.frames, summary.alerts, summary.stop_reason
    );
    Ok(())
}

fn apply_args(cfg: &mut SpotterConfig, args: Args) {
    if let Some(source) = args.source {
        cfg.source.uri = source;
    }
    if let Some(labels) = args.labels {
        cfg.labels_path = Some(labels);
    }
    if let Some(model) = args.model {
        cfg.detector.backend = "tract".to_string();
        cfg.detector.model_path = Some(model);
    }
    if let Some(threshold) = args.threshold {
        cfg.alerts.threshold = threshold;
    }
    if let Some(cooldown) = args.cooldown {
        cfg.alerts.cooldown_secs = cooldown;
    }
    if args.silent {
        cfg.voice.enabled = false;
    }
    if args.queued {
        cfg.voice.mode = VoiceMode::Queued;
    }
}
