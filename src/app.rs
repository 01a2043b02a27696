use civic_assistant::api::image_data_url;
use civic_assistant::models::{AnalysisRequest, AppConfig, ConversationMetadata, ThemeConfig};
use civic_assistant::session::{ChatSession, ChatTurn, SessionError};
use civic_assistant::storage::Storage;
use civic_assistant::stream::ChatStreamEvent;
use civic_assistant::{ChatError, Language};

use std::path::PathBuf;
use std::time::{Duration, Instant};

use crate::events::AppEvent;

const NOTIFICATION_TTL: Duration = Duration::from_secs(6);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
    Chat,
    Verify,
}

#[derive(Debug, Clone)]
pub struct Notification {
    pub text: String,
    pub is_error: bool,
    pub shown_at: Instant,
}

/// What the verify input asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyInput {
    Text(String),
    Image { path: PathBuf, text: Option<String> },
}

/// `/image <path> [text]` selects an image; anything else is a claim.
pub fn parse_verify_input(input: &str) -> Option<VerifyInput> {
    let input = input.trim();

    let image_args = input
        .strip_prefix("/image")
        .filter(|rest| rest.is_empty() || rest.starts_with(char::is_whitespace));

    if let Some(rest) = image_args {
        let rest = rest.trim_start();
        if rest.is_empty() {
            return None;
        }
        let (path, text) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
        let text = text.trim();
        return Some(VerifyInput::Image {
            path: PathBuf::from(path),
            text: (!text.is_empty()).then(|| text.to_string()),
        });
    }

    (!input.is_empty()).then(|| VerifyInput::Text(input.to_string()))
}

/// A verify request whose image, if any, has not been read yet.
#[derive(Debug, Clone)]
pub struct AnalysisJob {
    pub input: VerifyInput,
    pub language: Language,
}

impl AnalysisJob {
    /// Load the image off the input thread and build the request.
    pub async fn into_request(self) -> Result<AnalysisRequest, ChatError> {
        let language = self.language;
        let request = match self.input {
            VerifyInput::Text(text) => AnalysisRequest {
                text: Some(text),
                image_base64: None,
                language,
            },
            VerifyInput::Image { path, text } => AnalysisRequest {
                text,
                image_base64: Some(image_data_url(&path).await?),
                language,
            },
        };
        Ok(request)
    }
}

#[derive(Debug)]
pub struct App {
    pub mode: AppMode,
    pub should_quit: bool,
    pub session: ChatSession,
    pub conversation: ConversationMetadata,
    pub input_buffer: String,
    pub scroll_offset: usize,
    pub verify_scroll: usize,
    pub show_help: bool,
    pub exit_pending: bool,
    pub notification: Option<Notification>,
    pub is_analyzing: bool,
    pub analysis: Option<String>,
    pub theme: ThemeConfig,
}

impl App {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            mode: AppMode::Chat,
            should_quit: false,
            session: ChatSession::new(config.language),
            conversation: ConversationMetadata::new(config.language),
            input_buffer: String::new(),
            scroll_offset: 0,
            verify_scroll: 0,
            show_help: false,
            exit_pending: false,
            notification: None,
            is_analyzing: false,
            analysis: None,
            theme: config.theme.clone(),
        }
    }

    pub const fn language(&self) -> Language {
        self.session.language()
    }

    pub const fn quit(&mut self) {
        self.should_quit = true;
    }

    pub const fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    pub const fn toggle_mode(&mut self) {
        self.mode = match self.mode {
            AppMode::Chat => AppMode::Verify,
            AppMode::Verify => AppMode::Chat,
        };
    }

    pub fn toggle_language(&mut self) {
        let language = self.language().toggle();
        self.session.set_language(language);
        self.conversation.language = language;
    }

    pub fn notify(&mut self, text: impl Into<String>, is_error: bool) {
        self.notification = Some(Notification {
            text: text.into(),
            is_error,
            shown_at: Instant::now(),
        });
    }

    /// Drop the notification once it has been visible long enough.
    pub fn expire_notification(&mut self) {
        if self
            .notification
            .as_ref()
            .is_some_and(|n| n.shown_at.elapsed() >= NOTIFICATION_TTL)
        {
            self.notification = None;
        }
    }

    fn scroll_target(&mut self) -> &mut usize {
        match self.mode {
            AppMode::Chat => &mut self.scroll_offset,
            AppMode::Verify => &mut self.verify_scroll,
        }
    }

    pub fn scroll_up(&mut self, amount: usize) {
        let offset = self.scroll_target();
        *offset = offset.saturating_sub(amount);
    }

    pub fn scroll_down(&mut self, amount: usize) {
        let offset = self.scroll_target();
        *offset = offset.saturating_add(amount);
    }

    pub fn scroll_to_top(&mut self) {
        *self.scroll_target() = 0;
    }

    pub fn scroll_to_bottom(&mut self) {
        // The renderer clamps this to the real maximum
        *self.scroll_target() = usize::MAX;
    }

    /// Starter questions for an empty chat, otherwise the follow-ups of
    /// the latest answer.
    pub fn suggestions(&self) -> Vec<String> {
        if self.session.is_streaming() {
            return Vec::new();
        }

        let transcript = self.session.snapshot();
        if transcript.messages.is_empty() {
            return self
                .language()
                .suggested_questions()
                .iter()
                .map(ToString::to_string)
                .collect();
        }
        transcript.latest_follow_ups().to_vec()
    }

    pub fn pick_suggestion(&mut self, index: usize) {
        if self.mode != AppMode::Chat {
            return;
        }
        if let Some(question) = self.suggestions().into_iter().nth(index) {
            self.input_buffer = question;
        }
    }

    /// Start a chat request from the input line.
    pub fn begin_chat(&mut self) -> Option<ChatTurn> {
        match self.session.begin(&self.input_buffer) {
            Ok(turn) => {
                self.input_buffer.clear();
                self.exit_pending = false;
                self.scroll_to_bottom();
                Some(turn)
            }
            Err(SessionError::EmptyMessage) => None,
            Err(SessionError::Busy) => {
                tracing::debug!("Ignoring send while a reply is streaming");
                None
            }
        }
    }

    pub fn abort_chat(&mut self) -> bool {
        self.session.abort()
    }

    /// Take the verify input as an analysis job, or explain why not.
    pub fn begin_analysis(&mut self) -> Option<AnalysisJob> {
        if self.is_analyzing {
            return None;
        }
        let language = self.language();

        let Some(input) = parse_verify_input(&self.input_buffer) else {
            self.notify(language.input_required(), true);
            return None;
        };

        self.input_buffer.clear();
        self.is_analyzing = true;
        self.analysis = None;
        self.verify_scroll = 0;
        Some(AnalysisJob { input, language })
    }

    pub fn new_conversation(&mut self) {
        self.session.abort();
        if self.session.clear().is_ok() {
            self.conversation = ConversationMetadata::new(self.language());
            self.scroll_offset = 0;
            self.input_buffer.clear();
        }
    }

    /// Save the committed transcript to the archive.
    pub fn archive(&mut self, storage: &Storage) {
        if self.session.is_streaming() || self.session.messages().is_empty() {
            return;
        }

        match storage.archive(&mut self.conversation, self.session.messages()) {
            Ok(path) => {
                let text = format!("{} ({})", self.language().transcript_saved(), path.display());
                self.notify(text, false);
            }
            Err(err) => {
                tracing::error!(error = %err, "Failed to archive conversation");
                self.notify(err.to_string(), true);
            }
        }
    }

    pub fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::Stream { turn, event } => {
                if turn != self.session.turn() {
                    return;
                }
                let follow = matches!(
                    event,
                    ChatStreamEvent::ContentDelta(_) | ChatStreamEvent::EndOfStream
                );
                self.session.apply(event);
                if follow {
                    self.scroll_offset = usize::MAX;
                }
            }
            AppEvent::ChatFailed { turn, error } => {
                if turn != self.session.turn() {
                    return;
                }
                if let Some(message) = self.session.fail(&error) {
                    self.notify(message, true);
                }
            }
            AppEvent::AnalysisReady(analysis) => {
                self.is_analyzing = false;
                self.analysis = Some(analysis);
                self.verify_scroll = 0;
                self.notify(self.language().analysis_complete(), false);
            }
            AppEvent::AnalysisFailed(error) => {
                self.is_analyzing = false;
                let language = self.language();
                let message = match error {
                    ChatError::Http(_)
                    | ChatError::Stream(_)
                    | ChatError::InvalidResponse(_)
                    | ChatError::Io(_) => language.analysis_failed().to_string(),
                    other => other.user_message(language),
                };
                tracing::warn!(%message, "Analysis failed");
                self.notify(message, true);
            }
        }
    }
}
