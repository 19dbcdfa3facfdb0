//! OpenAI-compatible Provider
//!
//! Implementation of `LlmProvider` against a `/chat/completions` endpoint.
//! The same client is reused by the `ai_pipe` tool for workflow calls.

use std::collections::HashMap;

use agent_core::{
    error::{AgentError, Result},
    message::{Message, Role},
    provider::{GenerationOptions, LlmProvider, ProviderReply},
    session::SessionConfig,
    tool::{ToolCall, ToolDescriptor},
};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

/// Raw chat-completion response
#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    choices: Vec<ApiChoice>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiMessage,
}

/// Assistant message as returned by the endpoint
#[derive(Debug, Deserialize)]
pub struct ApiMessage {
    #[serde(default)]
    content: Option<Value>,
    #[serde(default)]
    tool_calls: Option<Vec<ApiToolCall>>,
}

#[derive(Debug, Deserialize)]
struct ApiToolCall {
    id: String,
    function: ApiFunction,
}

#[derive(Debug, Deserialize)]
struct ApiFunction {
    name: String,
    #[serde(default)]
    arguments: String,
}

impl ApiMessage {
    /// Textual content; anything else is a format error
    pub fn text(&self) -> Result<&str> {
        self.content
            .as_ref()
            .and_then(Value::as_str)
            .ok_or_else(|| AgentError::Format("response has no textual assistant content".into()))
    }
}

/// Thin client for `POST {base_url}/chat/completions`
#[derive(Clone, Debug)]
pub struct ChatCompletionsClient {
    http: reqwest::Client,
    base_url: String,
    credential: Option<String>,
}

impl ChatCompletionsClient {
    pub fn new(base_url: impl Into<String>, credential: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            credential,
        }
    }

    /// Send a request body and return the first choice's message
    pub async fn send(&self, body: &Value) -> Result<ApiMessage> {
        let url = format!("{}/chat/completions", self.base_url);
        tracing::debug!(%url, "Sending chat completion request");

        let mut request = self.http.post(&url).json(body);
        if let Some(key) = &self.credential {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AgentError::Network(e.to_string()))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| AgentError::Network(e.to_string()))?;

        if !status.is_success() {
            return Err(AgentError::Http {
                status: status.as_u16(),
                body: text,
            });
        }

        let parsed: ApiResponse = serde_json::from_str(&text)
            .map_err(|e| AgentError::Format(format!("invalid response body: {e}")))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message)
            .ok_or_else(|| AgentError::Format("response has no choices".into()))
    }
}

/// Chat-completion provider with tool calling
pub struct OpenAiProvider {
    client: ChatCompletionsClient,
    options: GenerationOptions,
}

impl OpenAiProvider {
    pub fn new(client: ChatCompletionsClient, options: GenerationOptions) -> Self {
        Self { client, options }
    }

    /// Create from a session's configuration
    pub fn from_session(config: &SessionConfig) -> Self {
        Self::new(
            ChatCompletionsClient::new(&config.base_url, config.credential.clone()),
            GenerationOptions {
                model: config.model.clone(),
                max_tokens: config.max_tokens,
            },
        )
    }

    /// Convert agent messages to wire format
    fn convert_messages(messages: &[Message]) -> Vec<Value> {
        messages
            .iter()
            .map(|m| match m.role {
                Role::Tool => json!({
                    "role": "tool",
                    "content": m.content,
                    "tool_call_id": m.tool_call_id,
                }),
                Role::Assistant if !m.tool_calls.is_empty() => json!({
                    "role": "assistant",
                    "content": m.content,
                    "tool_calls": m.tool_calls.iter().map(wire_tool_call).collect::<Vec<_>>(),
                }),
                _ => json!({ "role": m.role.to_string(), "content": m.content }),
            })
            .collect()
    }

    /// Convert the wire message into a provider reply
    fn convert_reply(message: ApiMessage) -> Result<ProviderReply> {
        let output_text = message.text()?.to_string();

        let tool_calls = message
            .tool_calls
            .map(|calls| calls.into_iter().map(parse_tool_call).collect::<Result<Vec<_>>>())
            .transpose()?;

        Ok(ProviderReply {
            output_text: Some(output_text),
            tool_calls,
        })
    }
}

fn wire_tool_call(call: &ToolCall) -> Value {
    json!({
        "id": call.id,
        "type": "function",
        "function": {
            "name": call.name,
            "arguments": json!(call.arguments).to_string(),
        }
    })
}

fn parse_tool_call(call: ApiToolCall) -> Result<ToolCall> {
    let raw = call.function.arguments.trim();
    let arguments: HashMap<String, Value> = if raw.is_empty() {
        HashMap::new()
    } else {
        serde_json::from_str(raw).map_err(|e| {
            AgentError::Format(format!("tool call '{}' has invalid arguments: {e}", call.id))
        })?
    };

    Ok(ToolCall {
        id: call.id,
        name: call.function.name,
        arguments,
    })
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn query(&self, messages: &[Message], tools: &[ToolDescriptor]) -> Result<ProviderReply> {
        let body = json!({
            "model": self.options.model,
            "messages": Self::convert_messages(messages),
            "tools": tools.iter().map(ToolDescriptor::to_function_spec).collect::<Vec<_>>(),
            "tool_choice": "auto",
            "max_tokens": self.options.max_tokens,
        });

        let message = self.client.send(&body).await?;
        let reply = Self::convert_reply(message)?;

        tracing::debug!(
            tool_calls = reply.calls().len(),
            "Provider replied"
        );
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::serve;
    use axum::{http::HeaderMap, http::StatusCode, routing::post, Json, Router};
    use agent_core::tool::ToolRegistry;

    fn provider(base_url: &str) -> OpenAiProvider {
        OpenAiProvider::new(
            ChatCompletionsClient::new(base_url, Some("sk-test".into())),
            GenerationOptions::default(),
        )
    }

    #[tokio::test]
    async fn test_request_shape_and_tool_call_parsing() {
        let app = Router::new().route(
            "/chat/completions",
            post(|headers: HeaderMap, Json(body): Json<Value>| async move {
                assert_eq!(headers["authorization"], "Bearer sk-test");
                assert_eq!(body["tool_choice"], "auto");
                assert_eq!(body["max_tokens"], 1000);
                assert_eq!(body["tools"].as_array().unwrap().len(), 3);
                assert_eq!(body["messages"][0]["role"], "user");
                Json(json!({
                    "choices": [{
                        "message": {
                            "content": "Searching now",
                            "tool_calls": [{
                                "id": "call_1",
                                "type": "function",
                                "function": {
                                    "name": "google_search",
                                    "arguments": "{\"query\":\"rust\"}"
                                }
                            }]
                        }
                    }]
                }))
            }),
        );
        let base = serve(app).await;

        let reply = provider(&base)
            .query(&[Message::user("find rust")], ToolRegistry::new().describe())
            .await
            .unwrap();

        assert_eq!(reply.output_text.as_deref(), Some("Searching now"));
        let calls = reply.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].id, "call_1");
        assert_eq!(calls[0].str_arg("query").unwrap(), "rust");
    }

    #[tokio::test]
    async fn test_non_success_status_is_http_error() {
        let app = Router::new().route(
            "/chat/completions",
            post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        );
        let base = serve(app).await;

        let err = provider(&base).query(&[Message::user("hi")], &[]).await.unwrap_err();
        assert!(matches!(err, AgentError::Http { status: 500, .. }));
    }

    #[tokio::test]
    async fn test_missing_content_is_format_error() {
        let app = Router::new().route(
            "/chat/completions",
            post(|| async { Json(json!({ "choices": [{ "message": { "content": null } }] })) }),
        );
        let base = serve(app).await;

        let err = provider(&base).query(&[Message::user("hi")], &[]).await.unwrap_err();
        assert!(matches!(err, AgentError::Format(_)));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_network_error() {
        // Port 9 (discard) is closed on test machines.
        let err = provider("http://127.0.0.1:9").query(&[], &[]).await.unwrap_err();
        assert!(matches!(err, AgentError::Network(_)));
    }

    #[test]
    fn test_history_conversion_keeps_tool_links() {
        let call = ToolCall::new("call_9", "execute_js").with_arg("code", "1+1");
        let messages = vec![
            Message::user("run it"),
            Message::assistant("Running").with_tool_calls(vec![call]),
            Message::tool("2", "call_9"),
        ];

        let wire = OpenAiProvider::convert_messages(&messages);
        assert_eq!(wire[1]["tool_calls"][0]["id"], "call_9");
        assert_eq!(wire[1]["tool_calls"][0]["function"]["arguments"], "{\"code\":\"1+1\"}");
        assert_eq!(wire[2]["role"], "tool");
        assert_eq!(wire[2]["tool_call_id"], "call_9");
    }

    #[test]
    fn test_invalid_arguments_are_format_error() {
        let message: ApiMessage = serde_json::from_value(json!({
            "content": "x",
            "tool_calls": [{
                "id": "c",
                "type": "function",
                "function": { "name": "ai_pipe", "arguments": "not json" }
            }]
        }))
        .unwrap();
        assert!(matches!(OpenAiProvider::convert_reply(message), Err(AgentError::Format(_))));
    }
}
