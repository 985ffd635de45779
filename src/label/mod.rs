//! Label vocabulary: case folding, classifier-bias corrections and the
//! relevance filter.
//!
//! Both tables are built once from configuration and are immutable afterwards.
//! They are shared by reference across worker threads without locking.

mod correction;
mod filter;

use std::sync::OnceLock;

use anyhow::{anyhow, Result};

pub use correction::{CorrectionTable, DEFAULT_CORRECTIONS};
pub use filter::{
    is_relevant, IgnoreSet, RelevanceFilter, DEFAULT_CONFIDENCE_THRESHOLD, DEFAULT_IGNORED,
};

/// Locale-invariant case folding applied to every raw classifier label.
pub fn fold_label(raw: &str) -> String {
    raw.to_lowercase()
}

/// A configured label must be a short, printable vocabulary word.
///
/// Allowed: "laptop", "computer keyboard", "t-shirt", "person's bag"
/// Disallowed: empty strings, leading whitespace, control characters.
pub fn validate_label(label: &str) -> Result<()> {
    static LABEL_RE: OnceLock<regex::Regex> = OnceLock::new();
    let re = LABEL_RE.get_or_init(|| {
        regex::Regex::new(r"^[a-z0-9][a-z0-9 '_-]{0,63}$").expect("label pattern is valid")
    });

    let folded = fold_label(label);
    if !re.is_match(&folded) {
        return Err(anyhow!(
            "label {:?} must match ^[a-z0-9][a-z0-9 '_-]{{0,63}}$",
            label
        ));
    }
    Ok(())
}
