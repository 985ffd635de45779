//! Output collaborators: display, speech and haptics.
//!
//! The pipeline never waits on these. `Dispatcher` hands each `Output` to the
//! sinks and logs (rather than propagates) any failure, so a broken speaker
//! cannot stall classification.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use anyhow::Result;

use crate::alert::StatusText;
use crate::pipeline::Output;

#[derive(Clone, Debug, PartialEq)]
pub struct SpeechSettings {
    /// BCP-47 language tag handed to the synthesizer.
    pub language: String,
    /// 1.0 is the synthesizer's normal pace.
    pub rate: f32,
}

impl Default for SpeechSettings {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            rate: 1.0,
        }
    }
}

pub trait DisplaySink: Send + Sync {
    /// Render the status verbatim, replacing whatever was shown.
    fn show(&self, status: &StatusText) -> Result<()>;
}

/// Speech synthesizer.
///
/// Implementations must interrupt any utterance in progress and speak the new
/// text immediately: at most one utterance is ever active.
pub trait SpeechSink: Send + Sync {
    fn speak_now(&self, text: &str, settings: &SpeechSettings) -> Result<()>;
}

pub trait HapticSink: Send + Sync {
    fn has_motor(&self) -> bool;

    /// One-shot pulse at default amplitude.
    fn pulse(&self, duration: Duration) -> Result<()>;
}

pub struct Dispatcher {
    display: Arc<dyn DisplaySink>,
    speech: Arc<dyn SpeechSink>,
    haptics: Arc<dyn HapticSink>,
    speech_settings: SpeechSettings,
}

impl Dispatcher {
    pub fn new(
        display: Arc<dyn DisplaySink>,
        speech: Arc<dyn SpeechSink>,
        haptics: Arc<dyn HapticSink>,
        speech_settings: SpeechSettings,
    ) -> Self {
        Self {
            display,
            speech,
            haptics,
            speech_settings,
        }
    }

    /// Routes every sink to the same logging implementation.
    pub fn logging(speech_settings: SpeechSettings, has_motor: bool) -> Self {
        let sink = Arc::new(LogSink { has_motor });
        Self::new(sink.clone(), sink.clone(), sink, speech_settings)
    }

    pub fn dispatch(&self, output: &Output) {
        if let Some(status) = &output.status {
            if let Err(e) = self.display.show(status) {
                log::warn!("display update failed: {:#}", e);
            }
        }
        let Some(alert) = &output.alert else {
            return;
        };
        if let Err(e) = self
            .speech
            .speak_now(&alert.spoken_text, &self.speech_settings)
        {
            log::warn!("speech failed: {:#}", e);
        }
        if self.haptics.has_motor() {
            let duration = Duration::from_millis(u64::from(alert.haptic_duration_ms));
            if let Err(e) = self.haptics.pulse(duration) {
                log::warn!("haptic pulse failed: {:#}", e);
            }
        }
    }
}

/// Sink that writes every output to the log. Used by the command-line tools.
#[derive(Debug, Default)]
pub struct LogSink {
    pub has_motor: bool,
}

impl DisplaySink for LogSink {
    fn show(&self, status: &StatusText) -> Result<()> {
        log::info!("[display] {}", status.display_text);
        Ok(())
    }
}

impl SpeechSink for LogSink {
    fn speak_now(&self, text: &str, settings: &SpeechSettings) -> Result<()> {
        log::info!(
            "[speech {} x{:.1}] {}",
            settings.language,
            settings.rate,
            text
        );
        Ok(())
    }
}

impl HapticSink for LogSink {
    fn has_motor(&self) -> bool {
        self.has_motor
    }

    fn pulse(&self, duration: Duration) -> Result<()> {
        log::info!("[haptic] {}ms", duration.as_millis());
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SinkRecord {
    Display(String),
    Speech {
        text: String,
        interrupted: Option<String>,
    },
    Pulse(Duration),
}

#[derive(Debug, Default)]
struct Recorded {
    records: Vec<SinkRecord>,
    current_utterance: Option<String>,
}

/// In-memory sink that remembers everything it was asked to do.
#[derive(Debug, Default)]
pub struct RecordingSink {
    has_motor: bool,
    inner: Mutex<Recorded>,
}

impl RecordingSink {
    pub fn new(has_motor: bool) -> Self {
        Self {
            has_motor,
            inner: Mutex::new(Recorded::default()),
        }
    }

    pub fn records(&self) -> Vec<SinkRecord> {
        self.lock().records.clone()
    }

    pub fn current_utterance(&self) -> Option<String> {
        self.lock().current_utterance.clone()
    }

    fn lock(&self) -> MutexGuard<'_, Recorded> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl DisplaySink for RecordingSink {
    fn show(&self, status: &StatusText) -> Result<()> {
        self.lock()
            .records
            .push(SinkRecord::Display(status.display_text.clone()));
        Ok(())
    }
}

impl SpeechSink for RecordingSink {
    fn speak_now(&self, text: &str, _settings: &SpeechSettings) -> Result<()> {
        let mut inner = self.lock();
        let interrupted = inner.current_utterance.replace(text.to_string());
        inner.records.push(SinkRecord::Speech {
            text: text.to_string(),
            interrupted,
        });
        Ok(())
    }
}

impl HapticSink for RecordingSink {
    fn has_motor(&self) -> bool {
        self.has_motor
    }

    fn pulse(&self, duration: Duration) -> Result<()> {
        self.lock().records.push(SinkRecord::Pulse(duration));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::Alert;
    use anyhow::anyhow;

    fn alert_output(text: &str, pulse_ms: u32) -> Output {
        Output {
            status: Some(StatusText {
                display_text: format!("{text} status"),
            }),
            alert: Some(Alert {
                spoken_text: text.to_string(),
                haptic_duration_ms: pulse_ms,
            }),
        }
    }

    fn recording_dispatcher(has_motor: bool) -> (Dispatcher, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::new(has_motor));
        let dispatcher = Dispatcher::new(
            sink.clone(),
            sink.clone(),
            sink.clone(),
            SpeechSettings::default(),
        );
        (dispatcher, sink)
    }

    #[test]
    fn dispatch_reaches_every_sink() {
        let (dispatcher, sink) = recording_dispatcher(true);
        dispatcher.dispatch(&alert_output("A cup is in front of you", 240));
        assert_eq!(
            sink.records(),
            vec![
                SinkRecord::Display("A cup is in front of you status".to_string()),
                SinkRecord::Speech {
                    text: "A cup is in front of you".to_string(),
                    interrupted: None,
                },
                SinkRecord::Pulse(Duration::from_millis(240)),
            ]
        );
    }

    #[test]
    fn new_speech_interrupts_previous_utterance() {
        let (dispatcher, sink) = recording_dispatcher(false);
        dispatcher.dispatch(&alert_output("first", 140));
        dispatcher.dispatch(&alert_output("second", 140));
        assert_eq!(sink.current_utterance().as_deref(), Some("second"));
        assert!(sink.records().contains(&SinkRecord::Speech {
            text: "second".to_string(),
            interrupted: Some("first".to_string()),
        }));
    }

    #[test]
    fn no_motor_means_no_pulse() {
        let (dispatcher, sink) = recording_dispatcher(false);
        dispatcher.dispatch(&alert_output("x", 140));
        assert!(!sink
            .records()
            .iter()
            .any(|r| matches!(r, SinkRecord::Pulse(_))));
    }

    #[test]
    fn status_only_output_skips_speech() {
        let (dispatcher, sink) = recording_dispatcher(true);
        dispatcher.dispatch(&Output {
            status: Some(StatusText::no_object()),
            alert: None,
        });
        assert_eq!(
            sink.records(),
            vec![SinkRecord::Display("No object detected".to_string())]
        );
    }

    struct BrokenSpeaker;

    impl SpeechSink for BrokenSpeaker {
        fn speak_now(&self, _text: &str, _settings: &SpeechSettings) -> Result<()> {
            Err(anyhow!("audio device unavailable"))
        }
    }

    #[test]
    fn sink_failure_does_not_stop_other_sinks() {
        let sink = Arc::new(RecordingSink::new(true));
        let dispatcher = Dispatcher::new(
            sink.clone(),
            Arc::new(BrokenSpeaker),
            sink.clone(),
            SpeechSettings::default(),
        );
        dispatcher.dispatch(&alert_output("x", 140));
        assert_eq!(sink.records().len(), 2);
    }
}
