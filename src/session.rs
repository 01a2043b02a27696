//! Chat transcript and request lifecycle for one conversation.
//!
//! The in-flight assistant reply lives in an [`AssistantDraft`] owned by the
//! session until the request ends. Consumers read immutable [`Transcript`]
//! snapshots and never touch the message list directly.

use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::error::ChatError;
use crate::i18n::Language;
use crate::models::{ChatMessage, ChatRequest};
use crate::stream::ChatStreamEvent;

/// `Idle → Streaming → {Completed | Aborted | Failed}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestPhase {
    #[default]
    Idle,
    Streaming,
    Completed,
    Aborted,
    Failed,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("message is empty")]
    EmptyMessage,
    #[error("a response is still streaming")]
    Busy,
}

/// Accumulates the assistant reply while it streams in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssistantDraft {
    content: String,
    follow_up_questions: Vec<String>,
}

impl AssistantDraft {
    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn follow_up_questions(&self) -> &[String] {
        &self.follow_up_questions
    }

    fn append(&mut self, delta: &str) {
        self.content.push_str(delta);
    }

    fn replace_follow_ups(&mut self, questions: Vec<String>) {
        self.follow_up_questions = questions;
    }

    fn to_message(&self) -> ChatMessage {
        ChatMessage::assistant(self.content.clone()).with_follow_ups(self.follow_up_questions.clone())
    }

    fn into_message(self) -> ChatMessage {
        ChatMessage::assistant(self.content).with_follow_ups(self.follow_up_questions)
    }
}

/// What the caller needs to run one request.
#[derive(Debug, Clone)]
pub struct ChatTurn {
    /// Increments per request; lets consumers drop events from stale turns
    pub id: u64,
    pub request: ChatRequest,
    pub cancel: CancellationToken,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcript {
    pub messages: Vec<ChatMessage>,
    pub phase: RequestPhase,
}

impl Transcript {
    /// Follow-up questions of the newest assistant message, if it is last.
    pub fn latest_follow_ups(&self) -> &[String] {
        match self.messages.last() {
            Some(message) if message.role == crate::models::MessageRole::Assistant => {
                message.follow_ups()
            }
            _ => &[],
        }
    }
}

#[derive(Debug, Default)]
pub struct ChatSession {
    language: Language,
    messages: Vec<ChatMessage>,
    draft: Option<AssistantDraft>,
    /// Follow-ups that arrived before any assistant text
    pending_follow_ups: Option<Vec<String>>,
    phase: RequestPhase,
    cancel: Option<CancellationToken>,
    turn: u64,
}

impl ChatSession {
    pub fn new(language: Language) -> Self {
        Self {
            language,
            ..Self::default()
        }
    }

    pub const fn language(&self) -> Language {
        self.language
    }

    pub fn set_language(&mut self, language: Language) {
        self.language = language;
    }

    pub const fn phase(&self) -> RequestPhase {
        self.phase
    }

    pub const fn is_streaming(&self) -> bool {
        matches!(self.phase, RequestPhase::Streaming)
    }

    pub const fn turn(&self) -> u64 {
        self.turn
    }

    pub fn draft(&self) -> Option<&AssistantDraft> {
        self.draft.as_ref()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Record the user's message and open a new request.
    pub fn begin(&mut self, text: &str) -> Result<ChatTurn, SessionError> {
        if self.is_streaming() {
            return Err(SessionError::Busy);
        }
        let text = text.trim();
        if text.is_empty() {
            return Err(SessionError::EmptyMessage);
        }

        if let Some(previous) = self.cancel.take() {
            previous.cancel();
        }

        self.messages.push(ChatMessage::user(text));
        self.draft = None;
        self.pending_follow_ups = None;
        self.phase = RequestPhase::Streaming;
        self.turn += 1;

        let cancel = CancellationToken::new();
        self.cancel = Some(cancel.clone());

        tracing::debug!(turn = self.turn, messages = self.messages.len(), "Chat request started");

        Ok(ChatTurn {
            id: self.turn,
            request: ChatRequest {
                messages: self.messages.clone(),
                language: self.language,
            },
            cancel,
        })
    }

    /// Fold one stream event into the draft. Ignored unless streaming.
    pub fn apply(&mut self, event: ChatStreamEvent) {
        if !self.is_streaming() {
            return;
        }

        match event {
            ChatStreamEvent::ContentDelta(delta) => {
                let pending = self.pending_follow_ups.take();
                let draft = self.draft.get_or_insert_with(|| {
                    let mut draft = AssistantDraft::default();
                    if let Some(questions) = pending {
                        draft.replace_follow_ups(questions);
                    }
                    draft
                });
                draft.append(&delta);
            }
            ChatStreamEvent::FollowUpQuestions(questions) => match self.draft.as_mut() {
                Some(draft) => draft.replace_follow_ups(questions),
                None => self.pending_follow_ups = Some(questions),
            },
            ChatStreamEvent::EndOfStream => self.complete(),
        }
    }

    pub fn complete(&mut self) {
        if !self.is_streaming() {
            return;
        }
        self.commit_draft();
        self.phase = RequestPhase::Completed;
        self.cancel = None;
        tracing::debug!(turn = self.turn, "Chat request completed");
    }

    /// Cancel the in-flight request. Text already shown stays.
    pub fn abort(&mut self) -> bool {
        if !self.is_streaming() {
            return false;
        }
        if let Some(cancel) = self.cancel.take() {
            cancel.cancel();
        }
        self.commit_draft();
        self.phase = RequestPhase::Aborted;
        tracing::debug!(turn = self.turn, "Chat request aborted");
        true
    }

    /// End the request with an error and return the notification text.
    ///
    /// If no assistant text arrived the user's message is removed, so the
    /// transcript never ends in an unanswered turn. A partial answer is kept.
    /// Cancellation is not a failure and yields `None`.
    pub fn fail(&mut self, error: &ChatError) -> Option<String> {
        if error.is_cancelled() {
            self.abort();
            return None;
        }
        if !self.is_streaming() {
            return None;
        }

        if self.draft.is_some() {
            self.commit_draft();
        } else if matches!(
            self.messages.last(),
            Some(message) if message.role == crate::models::MessageRole::User
        ) {
            self.messages.pop();
        }

        self.pending_follow_ups = None;
        self.cancel = None;
        self.phase = RequestPhase::Failed;
        tracing::warn!(turn = self.turn, error = %error, "Chat request failed");

        Some(error.user_message(self.language))
    }

    /// Start over with an empty transcript.
    pub fn clear(&mut self) -> Result<(), SessionError> {
        if self.is_streaming() {
            return Err(SessionError::Busy);
        }
        self.messages.clear();
        self.draft = None;
        self.pending_follow_ups = None;
        self.phase = RequestPhase::Idle;
        Ok(())
    }

    pub fn snapshot(&self) -> Transcript {
        let mut messages = self.messages.clone();
        if let Some(draft) = &self.draft {
            messages.push(draft.to_message());
        }
        Transcript {
            messages,
            phase: self.phase,
        }
    }

    fn commit_draft(&mut self) {
        if let Some(draft) = self.draft.take() {
            self.messages.push(draft.into_message());
        }
        self.pending_follow_ups = None;
    }
}
