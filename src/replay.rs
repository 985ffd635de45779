//! JSON-lines classifier recordings.
//!
//! Each line is one classifier callback:
//!
//! ```text
//! {"t_ms": 1200, "labels": [{"text": "Guitar", "confidence": 0.93}], "observed_x": 410.0, "frame_width": 640.0}
//! {"t_ms": 1300, "error": "model not loaded"}
//! ```

use anyhow::{anyhow, Result};
use serde::Deserialize;

use crate::clock::Timestamp;
use crate::pipeline::{ClassifierLabel, Output, Pipeline};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ReplayLine {
    t_ms: u64,
    #[serde(default)]
    labels: Option<Vec<ClassifierLabel>>,
    #[serde(default)]
    observed_x: Option<f32>,
    #[serde(default)]
    frame_width: Option<f32>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ReplayRecord {
    Labels {
        at: Timestamp,
        labels: Vec<ClassifierLabel>,
        observed_x: f32,
        frame_width: f32,
    },
    Failure {
        at: Timestamp,
        message: String,
    },
}

impl ReplayRecord {
    pub fn at(&self) -> Timestamp {
        match self {
            ReplayRecord::Labels { at, .. } | ReplayRecord::Failure { at, .. } => *at,
        }
    }

    pub fn run(&self, pipeline: &Pipeline) -> Output {
        match self {
            ReplayRecord::Labels {
                at,
                labels,
                observed_x,
                frame_width,
            } => pipeline.process_outcome(Ok(labels.clone()), *observed_x, *frame_width, *at),
            ReplayRecord::Failure { at, message } => {
                pipeline.process_outcome(Err(anyhow!(message.clone())), 0.0, 0.0, *at)
            }
        }
    }
}

pub fn parse_replay_line(line: &str) -> Result<ReplayRecord> {
    let raw: ReplayLine =
        serde_json::from_str(line).map_err(|e| anyhow!("invalid replay record: {}", e))?;
    let at = Timestamp::from_millis(raw.t_ms);

    if let Some(message) = raw.error {
        if raw.labels.is_some() {
            return Err(anyhow!("replay record has both labels and error"));
        }
        return Ok(ReplayRecord::Failure { at, message });
    }

    let labels = raw.labels.unwrap_or_default();
    if labels.is_empty() {
        // Position is irrelevant when nothing was classified.
        return Ok(ReplayRecord::Labels {
            at,
            labels,
            observed_x: raw.observed_x.unwrap_or(0.0),
            frame_width: raw.frame_width.unwrap_or(0.0),
        });
    }
    let observed_x = raw
        .observed_x
        .ok_or_else(|| anyhow!("replay record at t_ms={} needs observed_x", raw.t_ms))?;
    let frame_width = raw
        .frame_width
        .ok_or_else(|| anyhow!("replay record at t_ms={} needs frame_width", raw.t_ms))?;
    Ok(ReplayRecord::Labels {
        at,
        labels,
        observed_x,
        frame_width,
    })
}
