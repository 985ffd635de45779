//! Two-tier announcement rate limiter.
//!
//! Each label has an implicit `Ready`/`Cooling` state (absent from the map
//! means `Ready`), and a single global gate enforces a minimum spacing between
//! any two announcements. A detection is admitted only when both gates are
//! `Ready`. Only an admit mutates state; a rejected candidate leaves every
//! timestamp untouched.
//!
//! The check and the update run inside one critical section, so concurrent
//! callers on different worker threads cannot both admit inside a window.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::clock::Timestamp;

pub const DEFAULT_LABEL_COOLDOWN: Duration = Duration::from_millis(4000);
pub const DEFAULT_GLOBAL_SPACING: Duration = Duration::from_millis(800);
pub const DEFAULT_EVICTION_MULTIPLE: u32 = 4;
pub const DEFAULT_MAX_TRACKED_LABELS: usize = 256;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GateSettings {
    pub per_label_cooldown: Duration,
    pub global_min_spacing: Duration,
    /// Entries older than `eviction_multiple * per_label_cooldown` are dropped on admit.
    pub eviction_multiple: u32,
    /// Soft cap on remembered labels. Past the cap the oldest expired entry
    /// goes first; entries still inside their cooldown are never dropped.
    pub max_tracked_labels: usize,
}

impl Default for GateSettings {
    fn default() -> Self {
        Self {
            per_label_cooldown: DEFAULT_LABEL_COOLDOWN,
            global_min_spacing: DEFAULT_GLOBAL_SPACING,
            eviction_multiple: DEFAULT_EVICTION_MULTIPLE,
            max_tracked_labels: DEFAULT_MAX_TRACKED_LABELS,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GateState {
    Ready,
    Cooling,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GateDecision {
    Admitted,
    /// This label was announced too recently.
    LabelCooling,
    /// Some announcement happened too recently.
    GlobalCooling,
}

impl GateDecision {
    pub fn is_admitted(self) -> bool {
        matches!(self, GateDecision::Admitted)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CooldownState {
    pub per_label_last_spoken_at: HashMap<String, Timestamp>,
    pub global_last_spoken_at: Option<Timestamp>,
}

impl CooldownState {
    fn label_state(&self, label: &str, now: Timestamp, cooldown: Duration) -> GateState {
        window_state(self.per_label_last_spoken_at.get(label).copied(), now, cooldown)
    }

    fn global_state(&self, now: Timestamp, spacing: Duration) -> GateState {
        window_state(self.global_last_spoken_at, now, spacing)
    }
}

/// Strict comparison: arriving exactly on the boundary is still `Cooling`.
fn window_state(last: Option<Timestamp>, now: Timestamp, window: Duration) -> GateState {
    match last {
        None => GateState::Ready,
        Some(last) if now.saturating_since(last) > window => GateState::Ready,
        Some(_) => GateState::Cooling,
    }
}

#[derive(Debug, Default)]
pub struct DebounceGate {
    settings: GateSettings,
    state: Mutex<CooldownState>,
}

impl DebounceGate {
    pub fn new(settings: GateSettings) -> Self {
        Self {
            settings,
            state: Mutex::new(CooldownState::default()),
        }
    }

    pub fn settings(&self) -> &GateSettings {
        &self.settings
    }

    pub fn try_admit(&self, label: &str, now: Timestamp) -> bool {
        self.decide(label, now).is_admitted()
    }

    /// Check both gates and, on admit, record `now` for the label and globally.
    pub fn decide(&self, label: &str, now: Timestamp) -> GateDecision {
        let mut state = self.lock();

        if state.label_state(label, now, self.settings.per_label_cooldown) == GateState::Cooling {
            log::debug!("gate: {:?} still cooling", label);
            return GateDecision::LabelCooling;
        }
        if state.global_state(now, self.settings.global_min_spacing) == GateState::Cooling {
            log::debug!("gate: global spacing not elapsed for {:?}", label);
            return GateDecision::GlobalCooling;
        }

        state.per_label_last_spoken_at.insert(label.to_string(), now);
        state.global_last_spoken_at = Some(now);
        self.evict(&mut state, label, now);
        GateDecision::Admitted
    }

    pub fn label_state(&self, label: &str, now: Timestamp) -> GateState {
        self.lock()
            .label_state(label, now, self.settings.per_label_cooldown)
    }

    pub fn global_state(&self, now: Timestamp) -> GateState {
        self.lock()
            .global_state(now, self.settings.global_min_spacing)
    }

    /// Copy of the current cooldown state.
    pub fn snapshot(&self) -> CooldownState {
        self.lock().clone()
    }

    pub fn tracked_labels(&self) -> usize {
        self.lock().per_label_last_spoken_at.len()
    }

    // The critical sections cannot panic half-way, so a poisoned lock still
    // guards a consistent state.
    fn lock(&self) -> MutexGuard<'_, CooldownState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn evict(&self, state: &mut CooldownState, keep: &str, now: Timestamp) {
        let horizon = self
            .settings
            .per_label_cooldown
            .saturating_mul(self.settings.eviction_multiple.max(1));
        let before = state.per_label_last_spoken_at.len();
        state
            .per_label_last_spoken_at
            .retain(|label, at| label == keep || now.saturating_since(*at) <= horizon);

        // Dropping a cooling entry would make its label look `Ready` again.
        let cooldown = self.settings.per_label_cooldown;
        let cap = self.settings.max_tracked_labels.max(1);
        while state.per_label_last_spoken_at.len() > cap {
            let oldest = state
                .per_label_last_spoken_at
                .iter()
                .filter(|(label, at)| {
                    label.as_str() != keep
                        && window_state(Some(**at), now, cooldown) == GateState::Ready
                })
                .min_by_key(|(_, at)| **at)
                .map(|(label, _)| label.clone());
            match oldest {
                Some(label) => {
                    state.per_label_last_spoken_at.remove(&label);
                }
                None => break,
            }
        }

        let evicted = before - state.per_label_last_spoken_at.len();
        if evicted > 0 {
            log::debug!("gate: evicted {} stale label entries", evicted);
        }
    }
}
