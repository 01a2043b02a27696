// Error types for the assistant client and stream consumer

use thiserror::Error;

use crate::i18n::Language;

/// Failures surfaced while talking to the assistant functions.
#[derive(Error, Debug)]
pub enum ChatError {
    /// 429 from the gateway. Carries the (already localized) server message.
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// 402 from the gateway, the workspace ran out of credits.
    #[error("payment required: {0}")]
    PaymentRequired(String),

    #[error("request failed with status {status}: {message}")]
    Upstream { status: u16, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The connection dropped after streaming had started.
    #[error("stream interrupted: {0}")]
    Stream(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("image is {size} bytes, the limit is {limit} bytes")]
    ImageTooLarge { size: u64, limit: u64 },

    #[error("unsupported image type: {0}")]
    UnsupportedImage(String),

    #[error("cannot read {path}: {source}")]
    ImageRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The caller aborted the request. Never shown to the user.
    #[error("request cancelled")]
    Cancelled,
}

impl ChatError {
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Text for the failure notification, in the user's language.
    pub fn user_message(&self, language: Language) -> String {
        match self {
            Self::RateLimited(message) if !message.is_empty() => message.clone(),
            Self::RateLimited(_) => language.rate_limited().to_string(),
            Self::PaymentRequired(message) if !message.is_empty() => message.clone(),
            Self::PaymentRequired(_) => language.payment_required().to_string(),
            Self::Upstream { message, .. } if !message.is_empty() => message.clone(),
            Self::ImageTooLarge { .. } => language.image_too_large().to_string(),
            Self::UnsupportedImage(_) => language.unsupported_image().to_string(),
            Self::ImageRead { path, source } => format!("{path}: {source}"),
            _ => language.send_failed().to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ChatError>;
