//! Maps raw progress payloads to a status tag and detects terminal outcomes.
//!
//! All phrase matching lives here. The orchestrator only asks
//! [`detect_terminal`] and never inspects message text itself.

use serde_json::Value;

/// Sentinel the processor sends when it has no more data for a job.
pub const STREAM_END: &str = "[STREAM_END]";

const SUCCESS_GLYPH: char = '\u{2705}';
const FAILURE_GLYPH: char = '\u{274C}';

const COMPLETION_PHRASES: &[&str] = &[
    "Processing complete",
    "Ready for download",
    "Word document saved",
];

const FAILURE_PHRASE: &str = "processing failed";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventStatus {
    Pending,
    Processing,
    Completed,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalSignal {
    Failure,
    Completion,
}

/// True for the end-of-stream sentinel, which is never a log entry.
pub fn is_stream_end(raw: &str) -> bool {
    raw.trim() == STREAM_END
}

/// Classifies one payload. Pure and deterministic.
///
/// Structured payloads (a JSON object with a `type` field) are classified by
/// their type; everything else goes through the text rules, first match wins.
pub fn classify(raw: &str) -> EventStatus {
    if let Some(kind) = structured_kind(raw) {
        return match kind.as_str() {
            "complete" => EventStatus::Completed,
            "error" | "file_error" => EventStatus::Error,
            "started" => EventStatus::Pending,
            _ => EventStatus::Processing,
        };
    }

    if has_completion_marker(raw) {
        EventStatus::Completed
    } else if has_failure_marker(raw) {
        EventStatus::Error
    } else {
        EventStatus::Processing
    }
}

/// Terminal outcome carried by a payload, if any.
///
/// Failure is checked first; completion only counts when no failure phrase is
/// present.
pub fn detect_terminal(raw: &str) -> Option<TerminalSignal> {
    if let Some(kind) = structured_kind(raw) {
        return match kind.as_str() {
            "error" => Some(TerminalSignal::Failure),
            "complete" => Some(TerminalSignal::Completion),
            _ => None,
        };
    }

    if raw.to_lowercase().contains(FAILURE_PHRASE) {
        Some(TerminalSignal::Failure)
    } else if COMPLETION_PHRASES.iter().any(|phrase| raw.contains(phrase)) {
        Some(TerminalSignal::Completion)
    } else {
        None
    }
}

/// Human-readable text for a payload: the `message` field of a structured
/// event, otherwise the raw text unchanged.
pub fn display_text(raw: &str) -> String {
    parse_structured(raw)
        .and_then(|value| {
            value
                .get("message")
                .and_then(Value::as_str)
                .map(ToOwned::to_owned)
        })
        .unwrap_or_else(|| raw.to_string())
}

fn has_completion_marker(raw: &str) -> bool {
    raw.contains(SUCCESS_GLYPH) || COMPLETION_PHRASES.iter().any(|phrase| raw.contains(phrase))
}

fn has_failure_marker(raw: &str) -> bool {
    raw.contains(FAILURE_GLYPH)
        || raw.to_lowercase().contains("error")
        || raw.contains("Processing failed")
}

fn structured_kind(raw: &str) -> Option<String> {
    parse_structured(raw)?
        .get("type")
        .and_then(Value::as_str)
        .map(str::to_ascii_lowercase)
}

fn parse_structured(raw: &str) -> Option<Value> {
    let trimmed = raw.trim_start();
    if !trimmed.starts_with('{') {
        return None;
    }
    serde_json::from_str::<Value>(trimmed)
        .ok()
        .filter(Value::is_object)
}
