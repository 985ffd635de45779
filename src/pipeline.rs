//! Per-frame orchestration: normalize, filter, locate, debounce, format.
//!
//! `Pipeline` takes `&self` everywhere; the only mutable state is the cooldown
//! map inside `DebounceGate`, which serializes its own check-then-act. One
//! pipeline can therefore be shared through an `Arc` by several classifier
//! worker threads.

use serde::{Deserialize, Serialize};

use crate::alert::{Alert, AlertFormatter, StatusText};
use crate::clock::Timestamp;
use crate::config::AssistConfig;
use crate::direction::{estimate_direction, Direction};
use crate::gate::DebounceGate;
use crate::label::{CorrectionTable, RelevanceFilter};

/// One classifier result for a single evaluated frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub raw_label: String,
    /// 0..=1; out-of-range values are clamped.
    pub confidence: f32,
    /// Horizontal position supplied by the localizer, in frame pixels.
    pub observed_x: f32,
    pub frame_width: f32,
}

/// A ranked entry from the classifier, best first.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClassifierLabel {
    pub text: String,
    pub confidence: f32,
}

/// A detection whose label has been folded and corrected. Never empty.
#[derive(Clone, Debug, PartialEq)]
pub struct NormalizedDetection {
    canonical_label: String,
    confidence: f32,
    observed_x: f32,
    frame_width: f32,
}

impl NormalizedDetection {
    pub fn new(detection: &Detection, corrections: &CorrectionTable) -> Option<Self> {
        let canonical_label = corrections.normalize(&detection.raw_label);
        if canonical_label.is_empty() {
            return None;
        }
        Some(Self {
            canonical_label,
            confidence: clamp_confidence(detection.confidence),
            observed_x: detection.observed_x,
            frame_width: detection.frame_width,
        })
    }

    pub fn canonical_label(&self) -> &str {
        &self.canonical_label
    }

    pub fn confidence(&self) -> f32 {
        self.confidence
    }

    pub fn confidence_percent(&self) -> f32 {
        self.confidence * 100.0
    }

    pub fn direction(&self) -> Direction {
        estimate_direction(self.observed_x, self.frame_width / 2.0)
    }
}

/// What one invocation hands to the display, speech and haptic collaborators.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Output {
    pub status: Option<StatusText>,
    pub alert: Option<Alert>,
}

impl Output {
    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.alert.is_none()
    }
}

#[derive(Debug)]
pub struct Pipeline {
    corrections: CorrectionTable,
    filter: RelevanceFilter,
    gate: DebounceGate,
    formatter: AlertFormatter,
}

impl Pipeline {
    pub fn new(
        corrections: CorrectionTable,
        filter: RelevanceFilter,
        gate: DebounceGate,
        formatter: AlertFormatter,
    ) -> Self {
        Self {
            corrections,
            filter,
            gate,
            formatter,
        }
    }

    pub fn from_config(cfg: &AssistConfig) -> Self {
        Self::new(
            cfg.corrections.clone(),
            RelevanceFilter::new(cfg.ignored.clone(), cfg.confidence_threshold),
            DebounceGate::new(cfg.gate.clone()),
            AlertFormatter::new(cfg.haptics.clone()),
        )
    }

    pub fn gate(&self) -> &DebounceGate {
        &self.gate
    }

    /// Runs one detection through the pipeline.
    ///
    /// A filtered detection returns an empty `Output`: the previous status
    /// stays on screen rather than being cleared.
    pub fn process(&self, detection: &Detection, now: Timestamp) -> Output {
        let Some(normalized) = NormalizedDetection::new(detection, &self.corrections) else {
            log::warn!("dropping detection with empty label");
            return Output::default();
        };
        if normalized.confidence() != detection.confidence {
            log::warn!(
                "clamped confidence {} to {} for {:?}",
                detection.confidence,
                normalized.confidence(),
                normalized.canonical_label()
            );
        }

        let label = normalized.canonical_label();
        if !self.filter.is_relevant(label, normalized.confidence()) {
            log::debug!(
                "filtered {:?} (raw {:?}) at {:.2}",
                label,
                detection.raw_label,
                normalized.confidence()
            );
            return Output::default();
        }

        if !(detection.frame_width.is_finite() && detection.frame_width > 0.0) {
            log::warn!(
                "frame width {} unusable, direction defaults to center",
                detection.frame_width
            );
        }
        let direction = normalized.direction();
        let percent = normalized.confidence_percent();
        let status = self.formatter.status(label, direction, percent);

        let alert = if self.gate.try_admit(label, now) {
            let alert = self.formatter.alert(label, direction, percent);
            log::info!(
                "alert at {}ms: {:?} pulse={}ms",
                now.as_millis(),
                alert.spoken_text,
                alert.haptic_duration_ms
            );
            Some(alert)
        } else {
            None
        };

        Output {
            status: Some(status),
            alert,
        }
    }

    /// Handles a ranked classifier result. Only the top label is considered;
    /// an empty list is reported as "No object detected".
    pub fn process_labels(
        &self,
        labels: &[ClassifierLabel],
        observed_x: f32,
        frame_width: f32,
        now: Timestamp,
    ) -> Output {
        let Some(top) = labels.first() else {
            return Output {
                status: Some(StatusText::no_object()),
                alert: None,
            };
        };
        let detection = Detection {
            raw_label: top.text.clone(),
            confidence: top.confidence,
            observed_x,
            frame_width,
        };
        self.process(&detection, now)
    }

    /// Entry point for one classifier callback: a ranked list or a failure.
    pub fn process_outcome(
        &self,
        outcome: anyhow::Result<Vec<ClassifierLabel>>,
        observed_x: f32,
        frame_width: f32,
        now: Timestamp,
    ) -> Output {
        match outcome {
            Ok(labels) => self.process_labels(&labels, observed_x, frame_width, now),
            Err(err) => self.classifier_failed(&err),
        }
    }

    /// A classifier failure is reported like an empty result, never as an error.
    pub fn classifier_failed(&self, err: &anyhow::Error) -> Output {
        log::error!("labeling failed: {:#}", err);
        Output {
            status: Some(StatusText::no_object()),
            alert: None,
        }
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::from_config(&AssistConfig::default())
    }
}

fn clamp_confidence(confidence: f32) -> f32 {
    if confidence.is_nan() {
        0.0
    } else {
        confidence.clamp(0.0, 1.0)
    }
}
