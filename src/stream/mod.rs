//! Incremental reassembly of the assistant's SSE chat stream.
//!
//! The response body arrives as byte chunks with arbitrary boundaries. The
//! [`ChatStreamReassembler`] decodes them as UTF-8, splits the text into
//! newline-terminated lines and turns `data:` frames into
//! [`ChatStreamEvent`]s. A frame is only acted on once its newline has been
//! seen; a `data:` line whose JSON does not parse yet is pushed back into
//! the buffer and retried when more bytes arrive.
//!
//! [`event_stream`] drives a reassembler from any byte stream and honors a
//! [`CancellationToken`].

mod decoder;
mod frame;

pub use decoder::Utf8ChunkDecoder;
pub use frame::{
    classify_line, data_frame, parse_payload, FollowUpFrame, SseLine, DATA_PREFIX, DONE_FRAME,
    DONE_SENTINEL, FOLLOW_UP_TYPE,
};

use futures::stream::{Stream, StreamExt};
use std::collections::VecDeque;
use std::fmt::Display;
use std::pin::Pin;
use tokio_util::sync::CancellationToken;

use crate::error::ChatError;

/// Semantic events recovered from the stream, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatStreamEvent {
    /// A piece of assistant text to append
    ContentDelta(String),
    /// Suggested follow-up questions, replacing any earlier set
    FollowUpQuestions(Vec<String>),
    /// The body closed; emitted exactly once, last
    EndOfStream,
}

/// Events produced by a single `feed` or `finish` call.
pub type ChatStreamEvents = std::vec::IntoIter<ChatStreamEvent>;

pub type ChatEventStream =
    Pin<Box<dyn Stream<Item = Result<ChatStreamEvent, ChatError>> + Send>>;

#[derive(Debug, Default)]
pub struct ChatStreamReassembler {
    decoder: Utf8ChunkDecoder,
    buffer: String,
}

impl ChatStreamReassembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decoded text that has not formed a complete, actionable line yet.
    pub fn buffered(&self) -> &str {
        &self.buffer
    }

    pub fn feed(&mut self, chunk: &[u8]) -> ChatStreamEvents {
        let text = self.decoder.decode(chunk);
        self.buffer.push_str(&text);

        let mut events = Vec::new();
        self.drain(&mut events);
        events.into_iter()
    }

    /// Final flush once the body has closed. Nothing can be pushed back any
    /// more, so a line that still fails to parse is dropped.
    pub fn finish(mut self) -> ChatStreamEvents {
        let tail = self.decoder.finish();
        self.buffer.push_str(&tail);

        let mut events = Vec::new();
        for raw in self.buffer.split('\n') {
            let line = raw.strip_suffix('\r').unwrap_or(raw);
            if let SseLine::Data(payload) = classify_line(line) {
                match parse_payload(payload) {
                    Ok(Some(event)) => events.push(event),
                    Ok(None) => {}
                    Err(err) => {
                        tracing::debug!(error = %err, "Dropping unparseable trailing frame");
                    }
                }
            }
        }

        events.push(ChatStreamEvent::EndOfStream);
        events.into_iter()
    }

    fn drain(&mut self, events: &mut Vec<ChatStreamEvent>) {
        while let Some(newline) = self.buffer.find('\n') {
            // Split so that `line` holds everything up to and including the
            // newline and `buffer` keeps the rest
            let rest = self.buffer.split_off(newline + 1);
            let mut line = std::mem::replace(&mut self.buffer, rest);
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }

            let parsed = match classify_line(&line) {
                SseLine::Blank | SseLine::Comment | SseLine::Other => continue,
                SseLine::Done => break,
                SseLine::Data(payload) => parse_payload(payload),
            };

            match parsed {
                Ok(Some(event)) => events.push(event),
                Ok(None) => {}
                Err(_) => {
                    // Most likely a frame cut short upstream; wait for more bytes
                    line.push('\n');
                    self.buffer.insert_str(0, &line);
                    break;
                }
            }
        }
    }
}

struct Pump<S> {
    bytes: Pin<Box<S>>,
    reassembler: Option<ChatStreamReassembler>,
    pending: VecDeque<ChatStreamEvent>,
    cancel: CancellationToken,
}

/// Pull [`ChatStreamEvent`]s out of a byte stream.
///
/// Once `cancel` fires the stream ends quietly: no error item is produced
/// and events that were decoded but not yet yielded are discarded. A
/// transport error ends the stream after one `Err` item.
pub fn event_stream<S, B, E>(bytes: S, cancel: CancellationToken) -> ChatEventStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Display + Send + 'static,
{
    let pump = Pump {
        bytes: Box::pin(bytes),
        reassembler: Some(ChatStreamReassembler::new()),
        pending: VecDeque::new(),
        cancel,
    };

    let stream = futures::stream::unfold(pump, |mut pump| async move {
        loop {
            if pump.cancel.is_cancelled() {
                tracing::debug!("Chat stream cancelled by caller");
                return None;
            }
            if let Some(event) = pump.pending.pop_front() {
                return Some((Ok(event), pump));
            }
            if pump.reassembler.is_none() {
                return None;
            }

            let next = tokio::select! {
                biased;
                () = pump.cancel.cancelled() => {
                    tracing::debug!("Chat stream cancelled while waiting for bytes");
                    return None;
                }
                next = pump.bytes.next() => next,
            };

            match next {
                Some(Ok(chunk)) => {
                    if let Some(reassembler) = pump.reassembler.as_mut() {
                        pump.pending.extend(reassembler.feed(chunk.as_ref()));
                    }
                }
                Some(Err(err)) => {
                    tracing::warn!(error = %err, "Chat stream interrupted");
                    pump.reassembler = None;
                    pump.pending.clear();
                    return Some((Err(ChatError::Stream(err.to_string())), pump));
                }
                None => {
                    if let Some(reassembler) = pump.reassembler.take() {
                        pump.pending.extend(reassembler.finish());
                    }
                }
            }
        }
    });

    Box::pin(stream.fuse())
}
