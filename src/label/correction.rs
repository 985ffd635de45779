use std::collections::{HashMap, HashSet};

use anyhow::{anyhow, Result};

use super::{fold_label, validate_label};

/// Known classifier confusions, rewritten to the object the user actually has
/// in front of them (e.g. a laptop keyboard is often labelled "guitar").
pub const DEFAULT_CORRECTIONS: &[(&str, &str)] = &[
    ("guitar", "laptop"),
    ("musical instrument", "laptop"),
    ("string instrument", "laptop"),
    ("cool", "person"),
    ("hair", "person"),
    ("fashion", "person"),
    ("keyboard", "laptop"),
    ("computer keyboard", "laptop"),
    ("screen", "monitor"),
    ("television", "monitor"),
];

/// Immutable label rewrite table.
///
/// Chains are collapsed at construction (`a -> b`, `b -> c` becomes `a -> c`)
/// and cycles are rejected, so `normalize` is idempotent for any table that
/// constructs successfully.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CorrectionTable {
    map: HashMap<String, String>,
}

impl CorrectionTable {
    pub fn new<I, K, V>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut raw: HashMap<String, String> = HashMap::new();
        for (from, to) in entries {
            let (from, to) = (from.as_ref(), to.as_ref());
            validate_label(from)?;
            validate_label(to)?;
            let from = fold_label(from);
            let to = fold_label(to);
            if from == to {
                continue;
            }
            if let Some(existing) = raw.get(&from) {
                if existing != &to {
                    return Err(anyhow!(
                        "correction for {:?} is ambiguous ({:?} vs {:?})",
                        from,
                        existing,
                        to
                    ));
                }
            }
            raw.insert(from, to);
        }

        let mut map = HashMap::with_capacity(raw.len());
        for from in raw.keys() {
            map.insert(from.clone(), resolve_chain(&raw, from)?);
        }
        Ok(Self { map })
    }

    /// The built-in table. Its entries are already folded and terminal.
    pub fn reference() -> Self {
        Self {
            map: DEFAULT_CORRECTIONS
                .iter()
                .map(|(from, to)| (from.to_string(), to.to_string()))
                .collect(),
        }
    }

    /// Folds `raw` and applies the correction, if any. Total over any input;
    /// the empty string maps to the empty string.
    pub fn normalize(&self, raw: &str) -> String {
        let folded = fold_label(raw);
        match self.map.get(&folded) {
            Some(corrected) => corrected.clone(),
            None => folded,
        }
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

fn resolve_chain(raw: &HashMap<String, String>, start: &str) -> Result<String> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut current = start;
    seen.insert(current);
    while let Some(next) = raw.get(current) {
        if !seen.insert(next.as_str()) {
            return Err(anyhow!(
                "correction table has a cycle through {:?}",
                next
            ));
        }
        current = next;
    }
    Ok(current.to_string())
}
