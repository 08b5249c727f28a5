use chrono::NaiveDateTime;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use crate::error::{NudgeError, Result};

/// Wire format for the extractor's `datetime` field.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M";

static CURLY_DOUBLE_QUOTES: Lazy<Regex> =
    Lazy::new(|| Regex::new("[\u{201C}\u{201D}\u{201E}]").expect("double quote pattern"));
static CURLY_SINGLE_QUOTES: Lazy<Regex> =
    Lazy::new(|| Regex::new("[\u{2018}\u{2019}\u{201A}]").expect("single quote pattern"));

/// A reminder payload that survived strict validation of the extractor's
/// untrusted output.
#[derive(Debug, Clone)]
pub struct ExtractedReminder {
    pub task: String,
    pub remind_at: NaiveDateTime,
}

#[derive(Deserialize)]
struct RawPayload {
    task: String,
    datetime: String,
}

/// Normalizes raw model output into something a strict JSON parser can
/// consume: fence delimiters stripped, a leading `json` language tag
/// removed, typographic quotes folded to ASCII, whitespace trimmed.
/// Idempotent on already-clean input.
pub fn sanitize(raw: &str) -> String {
    let mut text = raw.trim().to_string();

    if text.starts_with("```") {
        let segments: Vec<&str> = text.split("```").collect();
        if segments.len() >= 2 {
            let mut inner = segments[1].trim();
            if let Some(rest) = inner.strip_prefix("json") {
                inner = rest;
            }
            text = inner.to_string();
        }
    }

    let text = CURLY_DOUBLE_QUOTES.replace_all(&text, "\"");
    let text = CURLY_SINGLE_QUOTES.replace_all(&text, "'");
    text.trim().to_string()
}

/// Sanitizes and strictly decodes the extractor's output. Fails closed with
/// `MalformedExtraction` (carrying the normalized text for diagnostics) on
/// anything that is not an object with a non-empty `task` and a `datetime`
/// in `YYYY-MM-DD HH:MM` form.
pub fn parse_extraction(raw: &str) -> Result<ExtractedReminder> {
    let cleaned = sanitize(raw);

    let payload: RawPayload = serde_json::from_str(&cleaned)
        .map_err(|_| NudgeError::MalformedExtraction(cleaned.clone()))?;

    let task = payload.task.trim().to_string();
    if task.is_empty() {
        return Err(NudgeError::MalformedExtraction(cleaned));
    }

    let remind_at = NaiveDateTime::parse_from_str(&payload.datetime, DATETIME_FORMAT)
        .map_err(|_| NudgeError::MalformedExtraction(cleaned.clone()))?;

    Ok(ExtractedReminder { task, remind_at })
}
