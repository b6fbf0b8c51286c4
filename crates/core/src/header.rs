//! Two-level header flattening and category column detection.

use crate::error::{PipelineError, PipelineResult};
use std::collections::HashSet;

/// Join one header pair into a flat column key.
///
/// Both levels are trimmed; the store level is appended with `_` only when present.
pub fn flatten_header(level_a: &str, level_b: &str) -> String {
    let level_a = level_a.trim();
    let level_b = level_b.trim();
    if level_b.is_empty() {
        level_a.to_string()
    } else {
        format!("{level_a}_{level_b}")
    }
}

/// Flatten every header pair, keeping input order.
///
/// # Errors
///
/// Returns `PipelineError::DuplicateColumnKey` when two pairs flatten to the same key.
pub fn flatten_headers(pairs: &[(String, String)]) -> PipelineResult<Vec<String>> {
    let mut seen = HashSet::with_capacity(pairs.len());
    let mut keys = Vec::with_capacity(pairs.len());

    for (level_a, level_b) in pairs {
        let key = flatten_header(level_a, level_b);
        if !seen.insert(key.clone()) {
            return Err(PipelineError::DuplicateColumnKey { key });
        }
        keys.push(key);
    }

    Ok(keys)
}

/// Index of the first key containing every marker (case-sensitive).
pub fn find_category_column<S: AsRef<str>>(keys: &[S], markers: &[String]) -> Option<usize> {
    keys.iter().position(|key| {
        let key = key.as_ref();
        markers.iter().all(|marker| key.contains(marker.as_str()))
    })
}
