//! Recover structured records from free-form model output
//!
//! Models are asked for bare JSON but routinely wrap it in prose, markdown
//! fences or comments. `parse` tries the least invasive fix first so a
//! valid record is never mangled by a later, more aggressive strategy:
//!
//! 1. the trimmed text as-is
//! 2. the span from the first `{` to the last `}`
//! 3. the whole text with `//` and `#` comment lines removed
//!
//! The parser never invents content; when all three fail the caller
//! decides what to substitute.

use crate::core::error::{DuelError, Result};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// A parsed JSON object
pub type Record = Map<String, Value>;

/// Characters of the offending text kept in a parse error
pub const EXCERPT_CHARS: usize = 200;

/// Which repair step produced the record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepairStrategy {
    Verbatim,
    Braced,
    CommentsStripped,
}

/// Parse `text` into a JSON object, repairing it if needed
pub fn parse(text: &str) -> Result<Record> {
    parse_with_strategy(text).map(|(record, _)| record)
}

/// Like `parse`, also reporting which strategy worked
pub fn parse_with_strategy(text: &str) -> Result<(Record, RepairStrategy)> {
    let trimmed = text.trim();

    if let Some(record) = parse_object(trimmed) {
        return Ok((record, RepairStrategy::Verbatim));
    }

    if let Some(record) = extract_json(trimmed).and_then(parse_object) {
        tracing::debug!("Recovered record from braced span");
        return Ok((record, RepairStrategy::Braced));
    }

    if let Some(record) = parse_object(&strip_comment_lines(trimmed)) {
        tracing::debug!("Recovered record after stripping comments");
        return Ok((record, RepairStrategy::CommentsStripped));
    }

    Err(DuelError::MalformedResponse {
        excerpt: excerpt(trimmed),
    })
}

/// Repair then deserialize into `T`
///
/// Draft types accept any object, so for them only the repair can fail.
pub fn parse_as<T: DeserializeOwned>(text: &str) -> Result<T> {
    let record = parse(text)?;
    serde_json::from_value(Value::Object(record))
        .map_err(|e| DuelError::IncompleteRecord(e.to_string()))
}

fn parse_object(text: &str) -> Option<Record> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

/// Span from the first `{` to the last `}`, inclusive
fn extract_json(response: &str) -> Option<&str> {
    let start = response.find('{')?;
    let end = response.rfind('}')?;
    (start < end).then(|| &response[start..=end])
}

/// Drop lines that start with `//` or `#` once trimmed
fn strip_comment_lines(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.starts_with("//") && !line.starts_with('#'))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Leading characters of `text`, for diagnostics
pub fn excerpt(text: &str) -> String {
    text.chars().take(EXCERPT_CHARS).collect()
}
