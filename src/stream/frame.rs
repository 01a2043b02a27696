// SSE line classification and payload routing

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::ChatStreamEvent;

pub const DATA_PREFIX: &str = "data: ";
pub const DONE_SENTINEL: &str = "[DONE]";
pub const DONE_FRAME: &str = "data: [DONE]\n\n";
pub const FOLLOW_UP_TYPE: &str = "follow_up_questions";

/// One raw line of an event stream, with the trailing `\r` already removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SseLine<'a> {
    /// Frame separator
    Blank,
    /// `:` keep-alive / comment
    Comment,
    /// `event:`, `id:` and anything else we do not act on
    Other,
    /// `data: [DONE]`
    Done,
    /// Trimmed payload of a `data: ` line
    Data(&'a str),
}

pub fn classify_line(line: &str) -> SseLine<'_> {
    if line.trim().is_empty() {
        return SseLine::Blank;
    }
    if line.starts_with(':') {
        return SseLine::Comment;
    }
    let Some(payload) = line.strip_prefix(DATA_PREFIX) else {
        return SseLine::Other;
    };

    match payload.trim() {
        "" => SseLine::Other,
        DONE_SENTINEL => SseLine::Done,
        payload => SseLine::Data(payload),
    }
}

/// The side-channel frame the gateway appends after the completion stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowUpFrame {
    #[serde(rename = "type")]
    pub kind: String,
    pub questions: Vec<String>,
}

impl FollowUpFrame {
    pub fn new(questions: Vec<String>) -> Self {
        Self {
            kind: FOLLOW_UP_TYPE.to_string(),
            questions,
        }
    }
}

/// Route a `data:` payload.
///
/// `Err` means the payload is not (yet) valid JSON. `Ok(None)` is valid JSON
/// of a shape we do not know, or a chunk without any text.
pub fn parse_payload(payload: &str) -> Result<Option<ChatStreamEvent>, serde_json::Error> {
    let value: Value = serde_json::from_str(payload)?;

    if value.get("type").and_then(Value::as_str) == Some(FOLLOW_UP_TYPE) {
        let questions: Vec<String> = value
            .get("questions")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_owned)
                    .collect()
            })
            .unwrap_or_default();

        if !questions.is_empty() {
            return Ok(Some(ChatStreamEvent::FollowUpQuestions(questions)));
        }
    }

    let content = value
        .pointer("/choices/0/delta/content")
        .and_then(Value::as_str)
        .filter(|text| !text.is_empty());

    Ok(content.map(|text| ChatStreamEvent::ContentDelta(text.to_owned())))
}

/// Encode one `data:` frame, blank-line terminated.
pub fn data_frame<T: Serialize>(payload: &T) -> Result<String, serde_json::Error> {
    Ok(format!("{DATA_PREFIX}{}\n\n", serde_json::to_string(payload)?))
}
