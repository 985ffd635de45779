use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use crate::alert::HapticSettings;
use crate::gate::GateSettings;
use crate::label::{CorrectionTable, IgnoreSet, DEFAULT_CONFIDENCE_THRESHOLD};
use crate::sink::SpeechSettings;

pub const CONFIG_ENV: &str = "VISUAL_ASSIST_CONFIG";

#[derive(Debug, Deserialize, Default)]
struct AssistConfigFile {
    confidence_threshold: Option<f32>,
    cooldown: Option<CooldownConfigFile>,
    corrections: Option<BTreeMap<String, String>>,
    ignored: Option<Vec<String>>,
    haptics: Option<HapticConfigFile>,
    speech: Option<SpeechConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
struct CooldownConfigFile {
    label_ms: Option<u64>,
    global_ms: Option<u64>,
    eviction_multiple: Option<u32>,
    max_tracked_labels: Option<usize>,
}

#[derive(Debug, Deserialize, Default)]
struct HapticConfigFile {
    crisp_pulse_ms: Option<u32>,
    soft_pulse_ms: Option<u32>,
    crisp_above_percent: Option<f32>,
}

#[derive(Debug, Deserialize, Default)]
struct SpeechConfigFile {
    language: Option<String>,
    rate: Option<f32>,
}

/// Everything the pipeline needs that used to be a compiled-in constant.
#[derive(Debug, Clone)]
pub struct AssistConfig {
    pub confidence_threshold: f32,
    pub gate: GateSettings,
    pub corrections: CorrectionTable,
    pub ignored: IgnoreSet,
    pub haptics: HapticSettings,
    pub speech: SpeechSettings,
}

impl Default for AssistConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            gate: GateSettings::default(),
            corrections: CorrectionTable::reference(),
            ignored: IgnoreSet::reference(),
            haptics: HapticSettings::default(),
            speech: SpeechSettings::default(),
        }
    }
}

impl AssistConfig {
    /// Reads `$VISUAL_ASSIST_CONFIG` if set, then applies env overrides.
    pub fn load() -> Result<Self> {
        let config_path = std::env::var(CONFIG_ENV).ok();
        Self::load_from(config_path.as_deref().map(Path::new))
    }

    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let file_cfg = match path {
            Some(path) => Some(read_config_file(path)?),
            None => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default())?;
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: AssistConfigFile) -> Result<Self> {
        let defaults = Self::default();

        let cooldown = file.cooldown.unwrap_or_default();
        let gate = GateSettings {
            per_label_cooldown: cooldown
                .label_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.gate.per_label_cooldown),
            global_min_spacing: cooldown
                .global_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.gate.global_min_spacing),
            eviction_multiple: cooldown
                .eviction_multiple
                .unwrap_or(defaults.gate.eviction_multiple),
            max_tracked_labels: cooldown
                .max_tracked_labels
                .unwrap_or(defaults.gate.max_tracked_labels),
        };

        let corrections = match file.corrections {
            Some(entries) => {
                CorrectionTable::new(entries).context("invalid corrections table")?
            }
            None => defaults.corrections,
        };
        let ignored = match file.ignored {
            Some(labels) => IgnoreSet::new(labels).context("invalid ignored labels")?,
            None => defaults.ignored,
        };

        let haptics = match file.haptics {
            Some(h) => HapticSettings {
                crisp_pulse_ms: h.crisp_pulse_ms.unwrap_or(defaults.haptics.crisp_pulse_ms),
                soft_pulse_ms: h.soft_pulse_ms.unwrap_or(defaults.haptics.soft_pulse_ms),
                crisp_above_percent: h
                    .crisp_above_percent
                    .unwrap_or(defaults.haptics.crisp_above_percent),
            },
            None => defaults.haptics,
        };
        let speech = match file.speech {
            Some(s) => SpeechSettings {
                language: s.language.unwrap_or(defaults.speech.language),
                rate: s.rate.unwrap_or(defaults.speech.rate),
            },
            None => defaults.speech,
        };

        Ok(Self {
            confidence_threshold: file
                .confidence_threshold
                .unwrap_or(defaults.confidence_threshold),
            gate,
            corrections,
            ignored,
            haptics,
            speech,
        })
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(threshold) = std::env::var("VISUAL_ASSIST_CONFIDENCE_THRESHOLD") {
            self.confidence_threshold = threshold.trim().parse().map_err(|_| {
                anyhow!("VISUAL_ASSIST_CONFIDENCE_THRESHOLD must be a number in 0..=1")
            })?;
        }
        if let Ok(cooldown) = std::env::var("VISUAL_ASSIST_LABEL_COOLDOWN_MS") {
            let ms: u64 = cooldown.trim().parse().map_err(|_| {
                anyhow!("VISUAL_ASSIST_LABEL_COOLDOWN_MS must be an integer number of milliseconds")
            })?;
            self.gate.per_label_cooldown = Duration::from_millis(ms);
        }
        if let Ok(spacing) = std::env::var("VISUAL_ASSIST_GLOBAL_SPACING_MS") {
            let ms: u64 = spacing.trim().parse().map_err(|_| {
                anyhow!("VISUAL_ASSIST_GLOBAL_SPACING_MS must be an integer number of milliseconds")
            })?;
            self.gate.global_min_spacing = Duration::from_millis(ms);
        }
        if let Ok(labels) = std::env::var("VISUAL_ASSIST_IGNORE_LABELS") {
            let parsed = split_csv(&labels);
            if !parsed.is_empty() {
                self.ignored =
                    IgnoreSet::new(parsed).context("invalid VISUAL_ASSIST_IGNORE_LABELS")?;
            }
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(anyhow!("confidence_threshold must be within 0..=1"));
        }
        if self.gate.per_label_cooldown.is_zero() {
            return Err(anyhow!("per-label cooldown must be greater than zero"));
        }
        if self.gate.eviction_multiple == 0 {
            return Err(anyhow!("cooldown.eviction_multiple must be at least 1"));
        }
        if self.gate.max_tracked_labels == 0 {
            return Err(anyhow!("cooldown.max_tracked_labels must be at least 1"));
        }
        if !(0.0..=100.0).contains(&self.haptics.crisp_above_percent) {
            return Err(anyhow!("haptics.crisp_above_percent must be within 0..=100"));
        }
        if self.speech.language.trim().is_empty() {
            return Err(anyhow!("speech.language must not be empty"));
        }
        if !(self.speech.rate.is_finite() && self.speech.rate > 0.0) {
            return Err(anyhow!("speech.rate must be a positive number"));
        }
        Ok(())
    }
}

fn read_config_file(path: &Path) -> Result<AssistConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let is_toml = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
    let cfg = if is_toml {
        toml::from_str(&raw)
            .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?
    } else {
        serde_json::from_str(&raw)
            .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?
    };
    Ok(cfg)
}

fn split_csv(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|entry| entry.trim())
        .filter(|entry| !entry.is_empty())
        .map(|entry| entry.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_behaviour() {
        let cfg = AssistConfig::default();
        assert!((cfg.confidence_threshold - 0.70).abs() < f32::EPSILON);
        assert_eq!(cfg.gate.per_label_cooldown, Duration::from_millis(4000));
        assert_eq!(cfg.gate.global_min_spacing, Duration::from_millis(800));
        assert_eq!(cfg.corrections.normalize("screen"), "monitor");
        assert!(cfg.ignored.contains("ceiling"));
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let file: AssistConfigFile = serde_json::from_str(
            r#"{ "confidence_threshold": 0.5, "cooldown": { "label_ms": 2500 } }"#,
        )
        .unwrap();
        let cfg = AssistConfig::from_file(file).unwrap();
        assert!((cfg.confidence_threshold - 0.5).abs() < f32::EPSILON);
        assert_eq!(cfg.gate.per_label_cooldown, Duration::from_millis(2500));
        assert_eq!(cfg.gate.global_min_spacing, Duration::from_millis(800));
        assert_eq!(cfg.corrections.normalize("guitar"), "laptop");
    }

    #[test]
    fn cyclic_corrections_fail_to_load() {
        let file: AssistConfigFile = serde_json::from_str(
            r#"{ "corrections": { "screen": "monitor", "monitor": "screen" } }"#,
        )
        .unwrap();
        let err = AssistConfig::from_file(file).unwrap_err();
        assert!(format!("{:#}", err).contains("cycle"));
    }

    #[test]
    fn validate_rejects_out_of_range_values() {
        let mut cfg = AssistConfig {
            confidence_threshold: 1.5,
            ..AssistConfig::default()
        };
        assert!(cfg.validate().is_err());
        cfg.confidence_threshold = 0.7;
        cfg.gate.per_label_cooldown = Duration::ZERO;
        assert!(cfg.validate().is_err());
        cfg.gate.per_label_cooldown = Duration::from_millis(10);
        cfg.speech.rate = 0.0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn split_csv_drops_blanks() {
        assert_eq!(split_csv(" sky, ,grass,"), vec!["sky", "grass"]);
    }
}
