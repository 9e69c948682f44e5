//! Model Response Validation
//!
//! Structural parsing of model responses. Malformed output is surfaced as
//! `GuideError::ModelOutputMalformed` so each stage can substitute its own
//! empty result.

mod json;

pub use json::{parse_model_json, strip_code_fences};

use serde::de::DeserializeOwned;
use tracing::warn;

/// Parse a response or fall back to `T::default()` with a warning
pub fn parse_or_default<T>(raw: &str, context: &str) -> T
where
    T: DeserializeOwned + Default,
{
    match parse_model_json(raw) {
        Ok(value) => value,
        Err(e) => {
            warn!(context, error = %e, "Discarding malformed model output");
            T::default()
        }
    }
}
