use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::i18n::Language;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

impl MessageRole {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// One transcript entry, serialized the way the assistant function expects.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
    #[serde(
        rename = "followUpQuestions",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub follow_up_questions: Option<Vec<String>>,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
            follow_up_questions: None,
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
            follow_up_questions: None,
        }
    }

    #[must_use]
    pub fn with_follow_ups(mut self, questions: Vec<String>) -> Self {
        self.follow_up_questions = (!questions.is_empty()).then_some(questions);
        self
    }

    pub fn follow_ups(&self) -> &[String] {
        self.follow_up_questions.as_deref().unwrap_or_default()
    }
}

/// Body of `POST /functions/v1/civic-assistant`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    pub language: Language,
}

/// Body of `POST /functions/v1/analyze-misinformation`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnalysisRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(
        rename = "imageBase64",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub image_base64: Option<String>,
    pub language: Language,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnalysisResponse {
    pub analysis: String,
}

/// `{ "error": "..." }` returned with every non-2xx status.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConversationMetadata {
    pub id: Uuid,
    pub language: Language,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub message_count: usize,
}

impl ConversationMetadata {
    pub fn new(language: Language) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            language,
            created_at: now,
            updated_at: now,
            message_count: 0,
        }
    }

    pub fn touch(&mut self, message_count: usize) {
        self.message_count = message_count;
        self.updated_at = Utc::now();
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub gateway_url: String,
    /// Publishable key sent as the bearer token
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub language: Language,
    #[serde(default = "default_timeout")]
    pub request_timeout: u64,
    #[serde(default)]
    pub theme: ThemeConfig,
}

const fn default_timeout() -> u64 {
    600
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            gateway_url: "http://127.0.0.1:8787".to_string(),
            api_key: String::new(),
            language: Language::default(),
            request_timeout: default_timeout(),
            theme: ThemeConfig::default(),
        }
    }
}

#[allow(clippy::struct_field_names)]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThemeConfig {
    pub user_message_color: String,
    pub assistant_message_color: String,
    pub border_color: String,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            user_message_color: "cyan".to_string(),
            assistant_message_color: "green".to_string(),
            border_color: "cyan".to_string(),
        }
    }
}
