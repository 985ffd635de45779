//! Visual Assist detection event pipeline
//!
//! Turns a noisy stream of per-frame classifier results into a sparse stream
//! of spoken and haptic alerts for a visually-impaired user.
//!
//! # Architecture
//!
//! Every detection flows through the same stages:
//!
//! 1. **Normalize**: case-fold the raw label and apply the correction table.
//! 2. **Filter**: drop scene labels ("wall", "floor") and low-confidence results.
//! 3. **Locate**: map the observed horizontal position to left/center/right.
//! 4. **Debounce**: admit an announcement only when both the per-label cooldown
//!    and the global spacing have elapsed.
//! 5. **Format**: render the status line, spoken sentence and haptic pulse.
//!
//! Camera capture, the classifier itself, speech synthesis and the vibration
//! motor are collaborators outside this crate; `sink` defines their seams.
//!
//! # Module Structure
//!
//! - `label`: correction table, ignore set, relevance filter
//! - `direction`: horizontal position to `Direction`
//! - `gate`: per-label and global cooldown state machine
//! - `alert`: `Alert` / `StatusText` formatting
//! - `pipeline`: per-frame orchestration
//! - `sink`: display, speech and haptic collaborators
//! - `clock`: injectable time source
//! - `config`: file + environment configuration
//! - `replay`: JSON-lines classifier recordings

pub mod alert;
pub mod clock;
pub mod config;
pub mod direction;
pub mod gate;
pub mod label;
pub mod pipeline;
pub mod replay;
pub mod sink;

pub use alert::{Alert, AlertFormatter, HapticSettings, StatusText};
pub use clock::{Clock, ManualClock, SystemClock, Timestamp};
pub use config::AssistConfig;
pub use direction::{estimate_direction, Direction};
pub use gate::{CooldownState, DebounceGate, GateDecision, GateSettings, GateState};
pub use label::{CorrectionTable, IgnoreSet, RelevanceFilter};
pub use pipeline::{ClassifierLabel, Detection, NormalizedDetection, Output, Pipeline};
pub use replay::{parse_replay_line, ReplayRecord};
pub use sink::{
    Dispatcher, DisplaySink, HapticSink, LogSink, RecordingSink, SinkRecord, SpeechSettings,
    SpeechSink,
};
