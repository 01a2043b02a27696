use axum::{
    body::{Body, Bytes},
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};

use super::error::ApiError;
use super::prompts;
use super::relay::relay_with_trailer;
use super::upstream::{UpstreamMessage, ANALYSIS_TEMPERATURE};
use super::GatewayState;
use crate::i18n::Language;
use crate::models::AnalysisResponse;

const CHAT_FAILED: &str = "AI chat failed";
const ANALYSIS_FAILED: &str = "AI analysis failed";

/// Bodies are read as raw bytes so malformed JSON still gets our own
/// `{error}` response instead of axum's rejection text.
fn parse_body(body: &Bytes) -> Value {
    serde_json::from_slice(body).unwrap_or(Value::Null)
}

fn request_language(request: &Value) -> Language {
    request
        .get("language")
        .and_then(Value::as_str)
        .map_or(Language::Bn, Language::from_code)
}

fn non_empty<'a>(request: &'a Value, key: &str) -> Option<&'a str> {
    request
        .get(key)
        .and_then(Value::as_str)
        .filter(|value| !value.is_empty())
}

pub async fn civic_assistant(
    State(state): State<GatewayState>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let request = parse_body(&body);
    let language = request_language(&request);

    let Some(messages) = request.get("messages").and_then(Value::as_array) else {
        return Err(ApiError::bad_request("Messages array is required"));
    };

    let mut conversation = Vec::with_capacity(messages.len() + 1);
    conversation.push(UpstreamMessage::system(prompts::civic_assistant(language)));
    conversation.extend(messages.iter().map(UpstreamMessage::from_client));

    let follow_ups = state.upstream.suggest_follow_ups(&conversation).await;
    tracing::info!(count = follow_ups.len(), "Follow-up questions generated");

    let response = state
        .upstream
        .open_stream(&conversation)
        .await
        .map_err(|e| e.into_api_error(language, CHAT_FAILED))?;

    tracing::info!(language = language.code(), "Civic assistant chat streaming started");

    let body = Body::from_stream(relay_with_trailer(response.bytes_stream(), follow_ups));
    Ok(([(header::CONTENT_TYPE, "text/event-stream")], body).into_response())
}

pub async fn analyze_misinformation(
    State(state): State<GatewayState>,
    body: Bytes,
) -> Result<Json<AnalysisResponse>, ApiError> {
    let request = parse_body(&body);
    let language = request_language(&request);
    let text = non_empty(&request, "text");
    let image = non_empty(&request, "imageBase64");

    let (model, user) = match (text, image) {
        (None, None) => return Err(ApiError::bad_request("Either text or image is required")),
        (text, Some(image_url)) => (
            state.upstream.vision_model(),
            UpstreamMessage::user(json!([
                {
                    "type": "text",
                    "text": text.unwrap_or_else(|| prompts::default_image_prompt(language))
                },
                {
                    "type": "image_url",
                    "image_url": { "url": image_url }
                }
            ])),
        ),
        (Some(text), None) => (
            state.upstream.chat_model(),
            UpstreamMessage::user(Value::String(text.to_string())),
        ),
    };

    let messages = [
        UpstreamMessage::system(prompts::misinformation_analyst(language)),
        user,
    ];

    let analysis = state
        .upstream
        .complete(model, &messages, ANALYSIS_TEMPERATURE)
        .await
        .map_err(|e| e.into_api_error(language, ANALYSIS_FAILED))?;

    tracing::info!(model, "Misinformation analysis completed");
    Ok(Json(AnalysisResponse { analysis }))
}

pub async fn health() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_language() {
        assert_eq!(request_language(&json!({})), Language::Bn);
        assert_eq!(request_language(&json!({ "language": "bn" })), Language::Bn);
        assert_eq!(request_language(&json!({ "language": "en" })), Language::En);
        assert_eq!(request_language(&json!({ "language": "fr" })), Language::En);
    }

    #[test]
    fn test_parse_body_tolerates_garbage() {
        assert_eq!(parse_body(&Bytes::from_static(b"{not json")), Value::Null);
        assert_eq!(
            parse_body(&Bytes::from_static(b"{\"text\":\"x\"}")),
            json!({ "text": "x" })
        );
    }

    #[test]
    fn test_non_empty() {
        let request = json!({ "text": "", "imageBase64": "data:image/png;base64,AA" });
        assert_eq!(non_empty(&request, "text"), None);
        assert_eq!(
            non_empty(&request, "imageBase64"),
            Some("data:image/png;base64,AA")
        );
    }
}
