use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::i18n::Language;
use crate::models::ErrorBody;

/// Failures talking to the upstream completion API.
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("upstream rate limit exceeded")]
    RateLimited,

    #[error("upstream requires payment")]
    PaymentRequired,

    #[error("upstream returned {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid upstream response: {0}")]
    InvalidResponse(String),
}

impl GatewayError {
    /// Map to what the client sees. Rate and credit limits keep their
    /// status with a localized message; everything else becomes a 500
    /// carrying `fallback`.
    pub fn into_api_error(self, language: Language, fallback: &str) -> ApiError {
        match self {
            Self::RateLimited => {
                ApiError::new(StatusCode::TOO_MANY_REQUESTS, language.rate_limited())
            }
            Self::PaymentRequired => {
                ApiError::new(StatusCode::PAYMENT_REQUIRED, language.payment_required())
            }
            other => {
                tracing::error!(error = %other, "AI gateway error");
                ApiError::internal(fallback)
            }
        }
    }
}

/// An error response in the `{ "error": "..." }` shape.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: self.message,
        });
        (self.status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limits_keep_status_and_localize() {
        let err = GatewayError::RateLimited.into_api_error(Language::Bn, "AI chat failed");
        assert_eq!(err.status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(err.message, Language::Bn.rate_limited());

        let err = GatewayError::PaymentRequired.into_api_error(Language::En, "AI chat failed");
        assert_eq!(err.status, StatusCode::PAYMENT_REQUIRED);
        assert_eq!(err.message, Language::En.payment_required());
    }

    #[test]
    fn test_other_failures_use_fallback() {
        let err = GatewayError::Upstream {
            status: 503,
            body: "overloaded".to_string(),
        }
        .into_api_error(Language::En, "AI analysis failed");

        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message, "AI analysis failed");
    }
}
