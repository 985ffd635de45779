use serde::{Deserialize, Serialize};

use crate::direction::Direction;

pub const NO_OBJECT_TEXT: &str = "No object detected";

pub const DEFAULT_CRISP_PULSE_MS: u32 = 140;
pub const DEFAULT_SOFT_PULSE_MS: u32 = 240;
pub const DEFAULT_CRISP_ABOVE_PERCENT: f32 = 85.0;

/// Spoken sentence plus a one-shot haptic pulse.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    pub spoken_text: String,
    pub haptic_duration_ms: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusText {
    pub display_text: String,
}

impl StatusText {
    pub fn no_object() -> Self {
        Self {
            display_text: NO_OBJECT_TEXT.to_string(),
        }
    }
}

/// Pulse length policy. Higher confidence gets the shorter, crisper pulse.
#[derive(Clone, Debug, PartialEq)]
pub struct HapticSettings {
    pub crisp_pulse_ms: u32,
    pub soft_pulse_ms: u32,
    pub crisp_above_percent: f32,
}

impl Default for HapticSettings {
    fn default() -> Self {
        Self {
            crisp_pulse_ms: DEFAULT_CRISP_PULSE_MS,
            soft_pulse_ms: DEFAULT_SOFT_PULSE_MS,
            crisp_above_percent: DEFAULT_CRISP_ABOVE_PERCENT,
        }
    }
}

impl HapticSettings {
    pub fn pulse_ms(&self, confidence_percent: f32) -> u32 {
        if confidence_percent > self.crisp_above_percent {
            self.crisp_pulse_ms
        } else {
            self.soft_pulse_ms
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct AlertFormatter {
    haptics: HapticSettings,
}

impl AlertFormatter {
    pub fn new(haptics: HapticSettings) -> Self {
        Self { haptics }
    }

    pub fn alert(&self, label: &str, direction: Direction, confidence_percent: f32) -> Alert {
        Alert {
            spoken_text: spoken_text(label, direction),
            haptic_duration_ms: self.haptics.pulse_ms(confidence_percent),
        }
    }

    pub fn status(&self, label: &str, direction: Direction, confidence_percent: f32) -> StatusText {
        StatusText {
            display_text: format!(
                "{} detected on your {} ({}%)",
                label,
                direction,
                confidence_percent.round() as i64
            ),
        }
    }
}

pub fn spoken_text(label: &str, direction: Direction) -> String {
    match direction {
        Direction::Left => format!("There is a {} on your left", label),
        Direction::Right => format!("There is a {} on your right", label),
        Direction::Center => format!("A {} is in front of you", label),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spoken_sentences() {
        assert_eq!(
            spoken_text("laptop", Direction::Left),
            "There is a laptop on your left"
        );
        assert_eq!(
            spoken_text("laptop", Direction::Right),
            "There is a laptop on your right"
        );
        assert_eq!(
            spoken_text("person", Direction::Center),
            "A person is in front of you"
        );
    }

    #[test]
    fn status_rounds_confidence() {
        let formatter = AlertFormatter::default();
        let status = formatter.status("cup", Direction::Center, 72.5);
        assert_eq!(status.display_text, "cup detected on your center (73%)");
        let status = formatter.status("cup", Direction::Right, 94.49);
        assert_eq!(status.display_text, "cup detected on your right (94%)");
    }

    #[test]
    fn higher_confidence_gets_shorter_pulse() {
        let formatter = AlertFormatter::default();
        assert_eq!(
            formatter.alert("cup", Direction::Left, 95.0).haptic_duration_ms,
            140
        );
        assert_eq!(
            formatter.alert("cup", Direction::Left, 85.0).haptic_duration_ms,
            240
        );
        assert_eq!(
            formatter.alert("cup", Direction::Left, 70.0).haptic_duration_ms,
            240
        );
    }

    #[test]
    fn no_object_status_text() {
        assert_eq!(StatusText::no_object().display_text, "No object detected");
    }
}
