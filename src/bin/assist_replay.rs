//! assist_replay - run recorded classifier output through the pipeline
//!
//! Reads JSON-lines records (see `visual_assist::replay`) from a file or
//! stdin. Blank lines and lines starting with `#` are skipped; malformed
//! records are logged and skipped.

use anyhow::{anyhow, Result};
use clap::Parser;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;

use visual_assist::{parse_replay_line, AssistConfig, Dispatcher, Pipeline};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Recording to replay; reads stdin when omitted.
    input: Option<PathBuf>,
    /// Config file (JSON, or TOML with a .toml extension).
    #[arg(long, env = "VISUAL_ASSIST_CONFIG")]
    config: Option<PathBuf>,
    /// Print each non-empty output as a JSON line on stdout.
    #[arg(long)]
    json: bool,
    /// Pretend the device has no vibration motor.
    #[arg(long)]
    no_motor: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let cfg = AssistConfig::load_from(args.config.as_deref())?;
    let pipeline = Pipeline::from_config(&cfg);
    let dispatcher = Dispatcher::logging(cfg.speech.clone(), !args.no_motor);

    let reader: Box<dyn BufRead> = match &args.input {
        Some(path) => Box::new(BufReader::new(File::open(path).map_err(|e| {
            anyhow!("failed to open recording {}: {}", path.display(), e)
        })?)),
        None => Box::new(BufReader::new(io::stdin())),
    };
    let stdout = io::stdout();
    let mut out = stdout.lock();

    let mut records = 0u64;
    let mut rejected = 0u64;
    let mut alerts = 0u64;
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let record = match parse_replay_line(trimmed) {
            Ok(record) => record,
            Err(e) => {
                log::warn!("line {} rejected: {}", idx + 1, e);
                rejected += 1;
                continue;
            }
        };
        records += 1;

        let output = record.run(&pipeline);
        if output.alert.is_some() {
            alerts += 1;
        }
        dispatcher.dispatch(&output);
        if args.json && !output.is_empty() {
            serde_json::to_writer(&mut out, &output)?;
            writeln!(out)?;
        }
    }

    log::info!(
        "replayed {} records ({} rejected), {} alerts",
        records,
        rejected,
        alerts
    );
    Ok(())
}
