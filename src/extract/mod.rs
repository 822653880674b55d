//! Pulls the structured JSON payload out of free-text model output.
//!
//! Two strategies, in order:
//! 1. the first fenced block (``` or ```json) whose body is a `{...}` object;
//! 2. the span from the first `{` to the last `}`.
//!
//! When the fenced body exists but does not deserialize, strategy 2 looks at
//! the text with that block cut out, so a bare payload elsewhere still wins.

use regex::Regex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::OnceLock;

use crate::errors::{MigrateError, Result};

pub const NEEDS_PARSING: &str = "needs_parsing";

fn fenced_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        // One fenced block per match; the body stops at the first closing fence.
        Regex::new(r"(?s)```(?:json)?(.*?)```").expect("static regex")
    })
}

/// First fenced block whose trimmed body is `{...}`, with its full match range.
fn first_object_fence(text: &str) -> Option<(std::ops::Range<usize>, &str)> {
    fenced_re().captures_iter(text).find_map(|caps| {
        let whole = caps.get(0)?;
        let body = caps.get(1)?.as_str().trim();
        (body.starts_with('{') && body.ends_with('}')).then(|| (whole.range(), body))
    })
}

/// Either the parsed payload or the raw text tagged `needs_parsing`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExtractionResult {
    NeedsParsing { raw_text: String, status: String },
    Parsed(Value),
}

impl ExtractionResult {
    pub fn needs_parsing(raw_text: impl Into<String>) -> Self {
        Self::NeedsParsing { raw_text: raw_text.into(), status: NEEDS_PARSING.to_string() }
    }

    pub fn is_parsed(&self) -> bool {
        matches!(self, Self::Parsed(_))
    }

    pub fn payload(&self) -> Option<&Value> {
        match self {
            Self::Parsed(v) => Some(v),
            Self::NeedsParsing { .. } => None,
        }
    }
}

fn brace_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

pub fn extract_payload(text: &str) -> Result<Value> {
    let mut rest = std::borrow::Cow::Borrowed(text);

    if let Some((range, body)) = first_object_fence(text) {
        if let Ok(v) = serde_json::from_str::<Value>(body) {
            return Ok(v);
        }
        let mut cut = String::with_capacity(text.len());
        cut.push_str(&text[..range.start]);
        cut.push_str(&text[range.end..]);
        rest = std::borrow::Cow::Owned(cut);
    }

    brace_span(&rest)
        .and_then(|span| serde_json::from_str::<Value>(span).ok())
        .ok_or(MigrateError::NoStructuredPayloadFound)
}

/// Typed variant; a payload of the wrong shape counts as not found.
pub fn extract_as<T: DeserializeOwned>(text: &str) -> Result<T> {
    let v = extract_payload(text)?;
    serde_json::from_value(v).map_err(|_| MigrateError::NoStructuredPayloadFound)
}

pub fn extract_or_fallback(text: &str) -> ExtractionResult {
    match extract_payload(text) {
        Ok(v) => ExtractionResult::Parsed(v),
        Err(_) => ExtractionResult::needs_parsing(text),
    }
}
