//! Incremental decoding of the merge progress stream.
//!
//! The server frames every record as `data: <json>\n\n`. Bytes arrive in
//! arbitrary chunks, so the decoder keeps whatever follows the last complete
//! separator (and any trailing partial UTF-8 sequence) until more input comes.

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::api::models::MergeResult;

const RECORD_SEPARATOR: &str = "\n\n";
const DATA_PREFIX: &str = "data: ";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergeProgress {
    pub message: Option<String>,
    pub progress: Option<f64>,
}

/// One decoded record. Keep-alive pings never make it this far.
#[derive(Debug, Clone, PartialEq)]
pub enum MergeEvent {
    Progress(MergeProgress),
    Completed(MergeResult),
    Failed(String),
}

impl MergeEvent {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, MergeEvent::Progress(_))
    }
}

/// Flag fields are read loosely: the server decides with truthiness, so a
/// flag may be any JSON value.
#[derive(Debug, Deserialize)]
struct RawRecord {
    #[serde(default)]
    ping: Value,
    #[serde(default)]
    error: Value,
    #[serde(default)]
    complete: Value,
    #[serde(default)]
    result: Value,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    progress: Option<f64>,
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn error_message(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

#[derive(Debug, Default)]
pub struct EventDecoder {
    pending_bytes: Vec<u8>,
    buffer: String,
}

impl EventDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk and return every event completed by it, in stream order.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<MergeEvent> {
        self.decode_text(chunk);

        let mut events = Vec::new();
        while let Some(pos) = self.buffer.find(RECORD_SEPARATOR) {
            let record: String = self.buffer.drain(..pos + RECORD_SEPARATOR.len()).collect();
            if let Some(event) = parse_record(&record[..pos]) {
                events.push(event);
            }
        }
        events
    }

    /// Text still waiting for a separator.
    pub fn remainder(&self) -> &str {
        &self.buffer
    }

    fn decode_text(&mut self, chunk: &[u8]) {
        self.pending_bytes.extend_from_slice(chunk);

        let mut start = 0;
        loop {
            match std::str::from_utf8(&self.pending_bytes[start..]) {
                Ok(text) => {
                    self.buffer.push_str(text);
                    start = self.pending_bytes.len();
                    break;
                }
                Err(e) => {
                    let valid_end = start + e.valid_up_to();
                    self.buffer.push_str(
                        std::str::from_utf8(&self.pending_bytes[start..valid_end]).unwrap_or_default(),
                    );
                    match e.error_len() {
                        Some(len) => {
                            self.buffer.push(char::REPLACEMENT_CHARACTER);
                            start = valid_end + len;
                        }
                        // Truncated sequence at the end of the chunk: wait for the rest.
                        None => {
                            start = valid_end;
                            break;
                        }
                    }
                }
            }
        }

        self.pending_bytes.drain(..start);
    }
}

fn parse_record(record: &str) -> Option<MergeEvent> {
    let payload = record.strip_prefix(DATA_PREFIX)?;

    let raw: RawRecord = match serde_json::from_str(payload) {
        Ok(raw) => raw,
        Err(e) => {
            warn!("Skipping malformed merge record: {}", e);
            return None;
        }
    };

    if is_truthy(&raw.ping) {
        debug!("Keep-alive received");
        return None;
    }

    if is_truthy(&raw.error) {
        return Some(MergeEvent::Failed(error_message(raw.error)));
    }

    if is_truthy(&raw.complete) && is_truthy(&raw.result) {
        // Completion stands even when the result has an unexpected shape.
        let result = serde_json::from_value(raw.result).unwrap_or_else(|e| {
            warn!("Merge result did not match the expected shape: {}", e);
            MergeResult::default()
        });
        return Some(MergeEvent::Completed(result));
    }

    Some(MergeEvent::Progress(MergeProgress {
        message: raw.message,
        progress: raw.progress,
    }))
}
