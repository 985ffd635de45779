use std::collections::HashSet;

use anyhow::Result;

use super::{fold_label, validate_label};

/// Scene-level labels that describe the surroundings, not an obstacle.
pub const DEFAULT_IGNORED: &[&str] = &[
    "room",
    "floor",
    "indoor",
    "wall",
    "home",
    "house",
    "interior design",
    "ceiling",
    "furniture",
];

pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.70;

#[derive(Clone, Debug, Default)]
pub struct IgnoreSet {
    labels: HashSet<String>,
}

impl IgnoreSet {
    pub fn new<I, S>(labels: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = HashSet::new();
        for label in labels {
            validate_label(label.as_ref())?;
            set.insert(fold_label(label.as_ref()));
        }
        Ok(Self { labels: set })
    }

    pub fn reference() -> Self {
        Self {
            labels: DEFAULT_IGNORED.iter().map(|l| l.to_string()).collect(),
        }
    }

    pub fn contains(&self, canonical_label: &str) -> bool {
        self.labels.contains(canonical_label)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Drops ignored labels and low-confidence results.
#[derive(Clone, Debug)]
pub struct RelevanceFilter {
    ignored: IgnoreSet,
    threshold: f32,
}

impl RelevanceFilter {
    pub fn new(ignored: IgnoreSet, threshold: f32) -> Self {
        Self { ignored, threshold }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn is_relevant(&self, canonical_label: &str, confidence: f32) -> bool {
        is_relevant(&self.ignored, canonical_label, confidence, self.threshold)
    }
}

impl Default for RelevanceFilter {
    fn default() -> Self {
        Self::new(IgnoreSet::reference(), DEFAULT_CONFIDENCE_THRESHOLD)
    }
}

/// Pure relevance predicate. Empty labels and NaN confidences never pass.
pub fn is_relevant(
    ignored: &IgnoreSet,
    canonical_label: &str,
    confidence: f32,
    threshold: f32,
) -> bool {
    if canonical_label.is_empty() || ignored.contains(canonical_label) {
        return false;
    }
    // Written as `>=` so a NaN confidence compares false and is dropped.
    confidence >= threshold
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ignored_labels_never_pass() {
        let filter = RelevanceFilter::default();
        assert!(!filter.is_relevant("indoor", 0.99));
        assert!(!filter.is_relevant("interior design", 1.0));
        assert!(filter.is_relevant("laptop", 0.99));
    }

    #[test]
    fn threshold_is_inclusive() {
        let filter = RelevanceFilter::new(IgnoreSet::default(), 0.70);
        assert!(filter.is_relevant("cup", 0.70));
        assert!(!filter.is_relevant("cup", 0.6999));
        assert!(!filter.is_relevant("cup", f32::NAN));
    }

    #[test]
    fn empty_label_is_not_relevant() {
        let filter = RelevanceFilter::new(IgnoreSet::default(), 0.0);
        assert!(!filter.is_relevant("", 1.0));
    }

    #[test]
    fn relevance_is_monotonic_in_confidence() {
        let filter = RelevanceFilter::default();
        let mut seen_pass = false;
        for step in 0..=100 {
            let confidence = step as f32 / 100.0;
            let pass = filter.is_relevant("chair", confidence);
            assert!(pass || !seen_pass, "dropped back at {confidence}");
            seen_pass |= pass;
        }
        assert!(seen_pass);
    }

    #[test]
    fn configured_ignore_set_is_folded() {
        let ignored = IgnoreSet::new(["Sky", "Grass"]).unwrap();
        assert!(ignored.contains("sky"));
        assert_eq!(ignored.len(), 2);
        assert!(IgnoreSet::new([""]).is_err());
    }
}
