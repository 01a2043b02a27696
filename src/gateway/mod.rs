//! HTTP gateway in front of the AI completion API.
//!
//! Serves the two function routes the terminal client talks to. The chat
//! route relays the upstream SSE stream byte for byte and appends a
//! follow-up questions frame plus a closing `[DONE]`.

pub mod config;
pub mod error;
mod handlers;
pub mod prompts;
pub mod relay;
pub mod upstream;

pub use config::GatewayConfig;
pub use error::{ApiError, GatewayError};
pub use upstream::{UpstreamClient, UpstreamMessage};

use anyhow::Context;
use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderName},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::api::{ANALYZE_PATH, ASSISTANT_PATH};

/// Large enough for a 5 MB image after base64 encoding.
pub const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

#[derive(Clone)]
pub struct GatewayState {
    pub upstream: Arc<UpstreamClient>,
}

pub fn router(state: GatewayState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route(ASSISTANT_PATH, post(handlers::civic_assistant))
        .route(ANALYZE_PATH, post(handlers::analyze_misinformation))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers([
            header::AUTHORIZATION,
            HeaderName::from_static("x-client-info"),
            HeaderName::from_static("apikey"),
            header::CONTENT_TYPE,
        ])
}

pub async fn serve(config: GatewayConfig) -> anyhow::Result<()> {
    let upstream = UpstreamClient::new(&config)?;
    let app = router(GatewayState {
        upstream: Arc::new(upstream),
    });

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind))?;

    tracing::info!(
        addr = %config.bind,
        chat_model = %config.chat_model,
        vision_model = %config.vision_model,
        "Gateway listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Gateway server failed")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(%error, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutting down gateway");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::Language;
    use crate::stream::{ChatStreamEvent, ChatStreamReassembler};
    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const UPSTREAM_PATH: &str = "/v1/chat/completions";

    fn app_for(server: &MockServer) -> Router {
        let config = GatewayConfig {
            api_key: "upstream-key".to_string(),
            upstream_url: format!("{}{UPSTREAM_PATH}", server.uri()),
            chat_model: "test/chat".to_string(),
            vision_model: "test/vision".to_string(),
            bind: "127.0.0.1:0".parse().unwrap(),
        };
        router(GatewayState {
            upstream: Arc::new(UpstreamClient::new(&config).unwrap()),
        })
    }

    fn post_json(uri: &str, body: &Value) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn upstream_sse() -> String {
        [
            "data: {\"choices\":[{\"delta\":{\"content\":\"ভোট দিতে \"}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"NID লাগবে।\"}}]}\n\n",
            "data: [DONE]\n\n",
        ]
        .concat()
    }

    async fn mount_follow_ups(server: &MockServer, questions: &[&str]) {
        let arguments = json!({ "questions": questions }).to_string();
        Mock::given(method("POST"))
            .and(path(UPSTREAM_PATH))
            .and(body_partial_json(json!({ "tool_choice": { "type": "function" } })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{
                    "message": {
                        "tool_calls": [{ "function": { "arguments": arguments } }]
                    }
                }]
            })))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_health() {
        let server = MockServer::start().await;
        let response = app_for(&server)
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"OK");
    }

    #[tokio::test]
    async fn test_chat_requires_messages() {
        let server = MockServer::start().await;
        let app = app_for(&server);

        let response = app
            .clone()
            .oneshot(post_json(ASSISTANT_PATH, &json!({ "language": "en" })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await,
            json!({ "error": "Messages array is required" })
        );

        let response = app
            .oneshot(post_json(ASSISTANT_PATH, &json!({ "messages": "hello" })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_chat_stream_reassembles_end_to_end() {
        let server = MockServer::start().await;
        mount_follow_ups(&server, &["কোথায় ভোট দেব?", "NID কীভাবে পাব?"]).await;
        Mock::given(method("POST"))
            .and(path(UPSTREAM_PATH))
            .and(body_partial_json(json!({
                "model": "test/chat",
                "stream": true,
                "temperature": 0.7,
                "max_tokens": 1000,
                "messages": [{ "role": "system" }]
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw(upstream_sse(), "text/event-stream"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let request = json!({
            "messages": [{ "role": "user", "content": "ভোট দিতে কী লাগে?" }],
            "language": "bn"
        });
        let response = app_for(&server)
            .oneshot(post_json(ASSISTANT_PATH, &request))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get("content-type").unwrap(),
            "text/event-stream"
        );

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(bytes.starts_with(upstream_sse().as_bytes()));
        assert!(bytes.ends_with(b"data: [DONE]\n\n"));

        // Feed the relayed body back in awkward slices.
        let mut reassembler = ChatStreamReassembler::new();
        let mut events = Vec::new();
        for chunk in bytes.chunks(7) {
            events.extend(reassembler.feed(chunk));
        }
        events.extend(reassembler.finish());

        assert_eq!(
            events,
            vec![
                ChatStreamEvent::ContentDelta("ভোট দিতে ".to_string()),
                ChatStreamEvent::ContentDelta("NID লাগবে।".to_string()),
                ChatStreamEvent::FollowUpQuestions(vec![
                    "কোথায় ভোট দেব?".to_string(),
                    "NID কীভাবে পাব?".to_string(),
                ]),
                ChatStreamEvent::EndOfStream,
            ]
        );
    }

    #[tokio::test]
    async fn test_chat_without_follow_ups_still_streams() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(UPSTREAM_PATH))
            .and(body_partial_json(json!({ "stream": true })))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw(upstream_sse(), "text/event-stream"),
            )
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(UPSTREAM_PATH))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let request = json!({ "messages": [{ "role": "user", "content": "hi" }] });
        let response = app_for(&server)
            .oneshot(post_json(ASSISTANT_PATH, &request))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let expected = format!("{}data: [DONE]\n\n", upstream_sse());
        assert_eq!(&bytes[..], expected.as_bytes());
    }

    #[tokio::test]
    async fn test_chat_rate_limit_is_localized() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let request = json!({ "messages": [], "language": "bn" });
        let response = app_for(&server)
            .oneshot(post_json(ASSISTANT_PATH, &request))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            body_json(response).await,
            json!({ "error": Language::Bn.rate_limited() })
        );
    }

    #[tokio::test]
    async fn test_chat_payment_required() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(402))
            .mount(&server)
            .await;

        let request = json!({ "messages": [], "language": "en" });
        let response = app_for(&server)
            .oneshot(post_json(ASSISTANT_PATH, &request))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::PAYMENT_REQUIRED);
        assert_eq!(
            body_json(response).await,
            json!({ "error": Language::En.payment_required() })
        );
    }

    #[tokio::test]
    async fn test_chat_upstream_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .mount(&server)
            .await;

        let request = json!({ "messages": [] });
        let response = app_for(&server)
            .oneshot(post_json(ASSISTANT_PATH, &request))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(response).await, json!({ "error": "AI chat failed" }));
    }

    #[tokio::test]
    async fn test_analyze_requires_input() {
        let server = MockServer::start().await;
        let response = app_for(&server)
            .oneshot(post_json(ANALYZE_PATH, &json!({ "text": "", "language": "en" })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await,
            json!({ "error": "Either text or image is required" })
        );
    }

    #[tokio::test]
    async fn test_analyze_text_uses_chat_model() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(UPSTREAM_PATH))
            .and(body_partial_json(json!({
                "model": "test/chat",
                "temperature": 0.3,
                "messages": [
                    { "role": "system" },
                    { "role": "user", "content": "Voting age is 16" }
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{ "message": { "content": "False. Credibility: 5%" } }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let request = json!({ "text": "Voting age is 16", "language": "en" });
        let response = app_for(&server)
            .oneshot(post_json(ANALYZE_PATH, &request))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!({ "analysis": "False. Credibility: 5%" })
        );
    }

    #[tokio::test]
    async fn test_analyze_image_uses_vision_model() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(UPSTREAM_PATH))
            .and(body_partial_json(json!({
                "model": "test/vision",
                "messages": [
                    { "role": "system" },
                    {
                        "role": "user",
                        "content": [
                            { "type": "text", "text": prompts::default_image_prompt(Language::Bn) },
                            { "type": "image_url", "image_url": { "url": "data:image/png;base64,AA" } }
                        ]
                    }
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{ "message": { "content": "আংশিক সত্য" } }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let request = json!({ "imageBase64": "data:image/png;base64,AA" });
        let response = app_for(&server)
            .oneshot(post_json(ANALYZE_PATH, &request))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({ "analysis": "আংশিক সত্য" }));
    }

    #[tokio::test]
    async fn test_analyze_upstream_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let response = app_for(&server)
            .oneshot(post_json(ANALYZE_PATH, &json!({ "text": "claim" })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(response).await,
            json!({ "error": "AI analysis failed" })
        );
    }

    #[tokio::test]
    async fn test_cors_preflight() {
        let server = MockServer::start().await;
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri(ASSISTANT_PATH)
            .header("origin", "https://example.org")
            .header("access-control-request-method", "POST")
            .header("access-control-request-headers", "apikey, content-type")
            .body(Body::empty())
            .unwrap();

        let response = app_for(&server).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get("access-control-allow-origin").unwrap(),
            "*"
        );
        let allowed = response
            .headers()
            .get("access-control-allow-headers")
            .unwrap()
            .to_str()
            .unwrap();
        assert!(allowed.contains("apikey"));
        assert!(allowed.contains("x-client-info"));
    }
}
