//! assist_demo - synthetic end-to-end run of the detection event pipeline
//!
//! A seeded generator stands in for the camera and classifier. Time comes from
//! a manual clock advanced by one frame interval per iteration, so a given
//! seed always produces the same alerts.

use anyhow::{anyhow, Result};
use clap::Parser;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::PathBuf;
use std::time::Duration;

use visual_assist::{
    AssistConfig, ClassifierLabel, Clock, Dispatcher, ManualClock, Pipeline, Timestamp,
};

const FRAME_WIDTH: f32 = 640.0;

/// Labels the synthetic classifier draws from, including known confusions
/// and scene labels the filter drops.
const SYNTHETIC_LABELS: &[&str] = &[
    "Person", "Chair", "Guitar", "Keyboard", "Screen", "Cup", "Bottle", "Indoor", "Wall",
    "Hair", "Door", "Television",
];

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Duration in seconds of synthetic frames.
    #[arg(long, default_value_t = 10)]
    seconds: u64,
    /// Classified frames per second.
    #[arg(long, default_value_t = 5)]
    fps: u32,
    /// Seed for the synthetic classifier.
    #[arg(long, default_value_t = 7)]
    seed: u64,
    /// Config file (JSON, or TOML with a .toml extension).
    #[arg(long, env = "VISUAL_ASSIST_CONFIG")]
    config: Option<PathBuf>,
    /// Pretend the device has no vibration motor.
    #[arg(long)]
    no_motor: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let frame_interval = frame_interval(args.fps)?;

    let cfg = AssistConfig::load_from(args.config.as_deref())?;
    let pipeline = Pipeline::from_config(&cfg);
    let dispatcher = Dispatcher::logging(cfg.speech.clone(), !args.no_motor);
    let clock = ManualClock::new(Timestamp::from_millis(0));
    let mut rng = StdRng::seed_from_u64(args.seed);

    let frames = args.seconds * u64::from(args.fps);
    let mut status_count = 0u64;
    let mut alert_count = 0u64;

    log::info!(
        "demo: {} frames at {} fps, seed={}, threshold={:.2}",
        frames,
        args.fps,
        args.seed,
        cfg.confidence_threshold
    );

    for _ in 0..frames {
        let now = clock.advance(frame_interval);
        let labels = synthetic_labels(&mut rng);
        let observed_x = rng.gen_range(0.0..FRAME_WIDTH);

        let output = pipeline.process_labels(&labels, observed_x, FRAME_WIDTH, now);
        if output.status.is_some() {
            status_count += 1;
        }
        if output.alert.is_some() {
            alert_count += 1;
        }
        dispatcher.dispatch(&output);
    }

    log::info!(
        "demo complete at {}ms: {} status updates, {} alerts, {} labels tracked",
        clock.now().as_millis(),
        status_count,
        alert_count,
        pipeline.gate().tracked_labels()
    );
    Ok(())
}

/// The manual clock ticks in whole milliseconds, so 1000 fps is the ceiling.
fn frame_interval(fps: u32) -> Result<Duration> {
    if !(1..=1000).contains(&fps) {
        return Err(anyhow!("fps must be in 1..=1000, got {}", fps));
    }
    Ok(Duration::from_secs(1) / fps)
}

/// Ranked labels for one frame; roughly one frame in ten classifies nothing.
fn synthetic_labels(rng: &mut StdRng) -> Vec<ClassifierLabel> {
    if rng.gen_bool(0.1) {
        return Vec::new();
    }
    let count = rng.gen_range(1..=3);
    let mut labels: Vec<ClassifierLabel> = (0..count)
        .map(|_| ClassifierLabel {
            text: SYNTHETIC_LABELS[rng.gen_range(0..SYNTHETIC_LABELS.len())].to_string(),
            confidence: rng.gen_range(0.5..1.0),
        })
        .collect();
    labels.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    labels
}
