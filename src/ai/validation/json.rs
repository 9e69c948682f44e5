//! JSON extraction from model responses.
//!
//! Models often wrap JSON in Markdown code fences (```json ... ``` or bare
//! ``` ... ```). The fence is stripped before a strict typed parse; nothing
//! else is repaired.

use serde::de::DeserializeOwned;

use crate::types::{GuideError, Result};

const FENCE: &str = "```";
const PREVIEW_CHARS: usize = 200;

/// Remove a leading fence (tagged `json` or untagged) and a trailing fence
pub fn strip_code_fences(raw: &str) -> &str {
    let mut s = raw.trim().trim_start_matches('\u{feff}').trim_start();

    if let Some(rest) = s.strip_prefix(FENCE) {
        s = match rest.find('\n') {
            Some(i) if is_fence_tag(&rest[..i]) => &rest[i + 1..],
            _ => strip_json_tag(rest),
        };
    }

    if let Some(rest) = s.trim_end().strip_suffix(FENCE) {
        s = rest;
    }

    s.trim()
}

fn is_fence_tag(tag: &str) -> bool {
    tag.trim()
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

fn strip_json_tag(s: &str) -> &str {
    match s.get(..4) {
        Some(tag) if tag.eq_ignore_ascii_case("json") => &s[4..],
        _ => s,
    }
}

/// Parse a model response into `T` after fence stripping.
///
/// Any failure is reported as `ModelOutputMalformed`; callers recover.
pub fn parse_model_json<T: DeserializeOwned>(raw: &str) -> Result<T> {
    let cleaned = strip_code_fences(raw);
    serde_json::from_str(cleaned).map_err(|e| {
        GuideError::ModelOutputMalformed(format!(
            "{} (content preview: {})",
            e,
            cleaned.chars().take(PREVIEW_CHARS).collect::<String>()
        ))
    })
}
