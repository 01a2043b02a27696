// Client for the OpenAI-compatible completion endpoint behind the gateway

use anyhow::Context;
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;

use super::config::GatewayConfig;
use super::error::GatewayError;

pub const MAX_TOKENS: u32 = 1000;
pub const CHAT_TEMPERATURE: f64 = 0.7;
pub const ANALYSIS_TEMPERATURE: f64 = 0.3;
pub const FOLLOW_UP_TOOL: &str = "suggest_followup_questions";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UpstreamMessage {
    pub role: String,
    /// A string, or an array of content parts for multimodal turns.
    pub content: Value,
}

impl UpstreamMessage {
    pub fn system(prompt: &str) -> Self {
        Self {
            role: "system".to_string(),
            content: Value::String(prompt.to_string()),
        }
    }

    pub fn user(content: Value) -> Self {
        Self {
            role: "user".to_string(),
            content,
        }
    }

    /// Keep only `role` and `content` from a client transcript entry.
    pub fn from_client(message: &Value) -> Self {
        Self {
            role: message
                .get("role")
                .and_then(Value::as_str)
                .unwrap_or("user")
                .to_string(),
            content: message.get("content").cloned().unwrap_or(Value::Null),
        }
    }
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [UpstreamMessage],
    temperature: f64,
    max_tokens: u32,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<Value>,
}

impl<'a> CompletionRequest<'a> {
    const fn new(model: &'a str, messages: &'a [UpstreamMessage], temperature: f64) -> Self {
        Self {
            model,
            messages,
            temperature,
            max_tokens: MAX_TOKENS,
            stream: false,
            tools: None,
            tool_choice: None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Debug, Deserialize)]
struct ReplyMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<ToolCall>,
}

#[derive(Debug, Deserialize)]
struct ToolCall {
    function: FunctionCall,
}

#[derive(Debug, Deserialize)]
struct FunctionCall {
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct FollowUpArguments {
    #[serde(default)]
    questions: Vec<String>,
}

fn follow_up_tool() -> Value {
    json!([{
        "type": "function",
        "function": {
            "name": FOLLOW_UP_TOOL,
            "description": "Provide 3 relevant follow-up questions based on the conversation to help the user learn more",
            "parameters": {
                "type": "object",
                "properties": {
                    "questions": {
                        "type": "array",
                        "items": { "type": "string" },
                        "description": "Array of 3 follow-up questions in the same language as the conversation"
                    }
                },
                "required": ["questions"],
                "additionalProperties": false
            }
        }
    }])
}

#[derive(Debug, Clone)]
pub struct UpstreamClient {
    client: Client,
    url: String,
    api_key: String,
    chat_model: String,
    vision_model: String,
}

impl UpstreamClient {
    pub fn new(config: &GatewayConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            url: config.upstream_url.clone(),
            api_key: config.api_key.clone(),
            chat_model: config.chat_model.clone(),
            vision_model: config.vision_model.clone(),
        })
    }

    pub fn chat_model(&self) -> &str {
        &self.chat_model
    }

    pub fn vision_model(&self) -> &str {
        &self.vision_model
    }

    async fn send(&self, request: &CompletionRequest<'_>) -> Result<Response, GatewayError> {
        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => Ok(response),
            StatusCode::TOO_MANY_REQUESTS => Err(GatewayError::RateLimited),
            StatusCode::PAYMENT_REQUIRED => Err(GatewayError::PaymentRequired),
            status => Err(GatewayError::Upstream {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            }),
        }
    }

    /// Ask for follow-up questions through a forced tool call.
    ///
    /// Never fails: any problem is logged and yields no questions, so the
    /// chat itself is not held up by it.
    pub async fn suggest_follow_ups(&self, messages: &[UpstreamMessage]) -> Vec<String> {
        match self.request_follow_ups(messages).await {
            Ok(questions) => questions,
            Err(error) => {
                tracing::warn!(%error, "Follow-up question request failed");
                Vec::new()
            }
        }
    }

    async fn request_follow_ups(
        &self,
        messages: &[UpstreamMessage],
    ) -> Result<Vec<String>, GatewayError> {
        let mut request = CompletionRequest::new(&self.chat_model, messages, CHAT_TEMPERATURE);
        request.tools = Some(follow_up_tool());
        request.tool_choice = Some(json!({
            "type": "function",
            "function": { "name": FOLLOW_UP_TOOL }
        }));

        let body: CompletionResponse = self
            .send(&request)
            .await?
            .json()
            .await
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;

        let Some(call) = body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.tool_calls.into_iter().next())
        else {
            return Ok(Vec::new());
        };

        let arguments: FollowUpArguments = serde_json::from_str(&call.function.arguments)
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;
        Ok(arguments.questions)
    }

    /// Open the streaming chat completion. The response body is SSE.
    pub async fn open_stream(&self, messages: &[UpstreamMessage]) -> Result<Response, GatewayError> {
        let mut request = CompletionRequest::new(&self.chat_model, messages, CHAT_TEMPERATURE);
        request.stream = true;
        self.send(&request).await
    }

    /// Run a non-streaming completion and return the reply text.
    pub async fn complete(
        &self,
        model: &str,
        messages: &[UpstreamMessage],
        temperature: f64,
    ) -> Result<String, GatewayError> {
        let request = CompletionRequest::new(model, messages, temperature);
        let body: CompletionResponse = self
            .send(&request)
            .await?
            .json()
            .await
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;

        body.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| GatewayError::InvalidResponse("completion has no content".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> UpstreamClient {
        UpstreamClient::new(&GatewayConfig {
            api_key: "upstream-key".to_string(),
            upstream_url: format!("{}/v1/chat/completions", server.uri()),
            chat_model: "test/chat".to_string(),
            vision_model: "test/vision".to_string(),
            bind: "127.0.0.1:0".parse().unwrap(),
        })
        .unwrap()
    }

    fn conversation() -> Vec<UpstreamMessage> {
        vec![
            UpstreamMessage::system("be helpful"),
            UpstreamMessage::user(Value::String("How do I vote?".to_string())),
        ]
    }

    #[test]
    fn test_from_client_drops_extra_fields() {
        let message = UpstreamMessage::from_client(&json!({
            "role": "assistant",
            "content": "Go to the polling centre.",
            "followUpQuestions": ["Where is it?"]
        }));
        assert_eq!(
            serde_json::to_value(&message).unwrap(),
            json!({ "role": "assistant", "content": "Go to the polling centre." })
        );
    }

    #[test]
    fn test_request_omits_unused_fields() {
        let messages = conversation();
        let request = CompletionRequest::new("m", &messages, ANALYSIS_TEMPERATURE);
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(value["temperature"], json!(0.3));
        assert_eq!(value["max_tokens"], json!(1000));
        assert!(value.get("stream").is_none());
        assert!(value.get("tools").is_none());
    }

    #[tokio::test]
    async fn test_suggest_follow_ups() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer upstream-key"))
            .and(body_partial_json(json!({
                "tool_choice": { "function": { "name": FOLLOW_UP_TOOL } }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{
                    "message": {
                        "content": null,
                        "tool_calls": [{
                            "id": "call_1",
                            "type": "function",
                            "function": {
                                "name": FOLLOW_UP_TOOL,
                                "arguments": "{\"questions\":[\"Q1\",\"Q2\",\"Q3\"]}"
                            }
                        }]
                    }
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let questions = client_for(&server).suggest_follow_ups(&conversation()).await;
        assert_eq!(questions, vec!["Q1", "Q2", "Q3"]);
    }

    #[tokio::test]
    async fn test_follow_up_failures_yield_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let questions = client_for(&server).suggest_follow_ups(&conversation()).await;
        assert!(questions.is_empty());
    }

    #[tokio::test]
    async fn test_follow_up_bad_arguments_yield_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{
                    "message": {
                        "tool_calls": [{ "function": { "arguments": "{not json" } }]
                    }
                }]
            })))
            .mount(&server)
            .await;

        let questions = client_for(&server).suggest_follow_ups(&conversation()).await;
        assert!(questions.is_empty());
    }

    #[tokio::test]
    async fn test_status_mapping() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "stream": true })))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "model": "test/vision" })))
            .respond_with(ResponseTemplate::new(402))
            .mount(&server)
            .await;

        let client = client_for(&server);
        assert!(matches!(
            client.open_stream(&conversation()).await,
            Err(GatewayError::RateLimited)
        ));
        assert!(matches!(
            client
                .complete("test/vision", &conversation(), ANALYSIS_TEMPERATURE)
                .await,
            Err(GatewayError::PaymentRequired)
        ));
    }

    #[tokio::test]
    async fn test_complete_returns_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{ "message": { "role": "assistant", "content": "Mostly true." } }]
            })))
            .mount(&server)
            .await;

        let reply = client_for(&server)
            .complete("test/chat", &conversation(), ANALYSIS_TEMPERATURE)
            .await
            .unwrap();
        assert_eq!(reply, "Mostly true.");
    }

    #[tokio::test]
    async fn test_complete_without_choices_is_invalid() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
            .mount(&server)
            .await;

        let result = client_for(&server)
            .complete("test/chat", &conversation(), ANALYSIS_TEMPERATURE)
            .await;
        assert!(matches!(result, Err(GatewayError::InvalidResponse(_))));
    }
}
