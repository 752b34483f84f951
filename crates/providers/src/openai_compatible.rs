//! Reference adapter for any OpenAI-compatible chat-completions endpoint.
//!
//! All reshaping between the canonical message model and the wire format
//! happens here; the orchestrator never sees provider-specific types.
//! Transient transport and 429/5xx failures are retried a bounded number of
//! times with exponential backoff; timeouts are terminal.

use async_trait::async_trait;
use hypr_scribe_core::{ChatProvider, Message, ProviderError, Role, ToolCall, ToolDefinition};
use reqwest::StatusCode;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, warn};

const MAX_ATTEMPTS: u32 = 3;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

pub struct OpenAiCompatibleProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

impl OpenAiCompatibleProvider {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>, model: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            client,
            base_url: base_url.into(),
            api_key,
            model: model.into(),
        }
    }
}

#[async_trait]
impl ChatProvider for OpenAiCompatibleProvider {
    async fn chat(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
    ) -> Result<Message, ProviderError> {
        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));

        let mut body = json!({
            "model": self.model,
            "messages": messages.iter().map(message_to_wire).collect::<Vec<_>>(),
        });
        if !tools.is_empty() {
            body["tools"] = tools.iter().map(definition_to_wire).collect();
        }

        let mut last_err = ProviderError::Http("no attempt made".to_string());

        for attempt in 0..MAX_ATTEMPTS {
            if attempt > 0 {
                // 1s, 2s backoff between the three attempts.
                tokio::time::sleep(Duration::from_secs(1 << (attempt - 1))).await;
            }

            let mut request = self.client.post(&url).json(&body);
            if let Some(api_key) = &self.api_key {
                request = request.bearer_auth(api_key);
            }

            let response = match request.send().await {
                Ok(response) => response,
                Err(err) if err.is_timeout() => return Err(ProviderError::Timeout),
                Err(err) => {
                    warn!(attempt = attempt + 1, %err, "transport error, will retry");
                    last_err = ProviderError::Http(err.to_string());
                    continue;
                }
            };

            let status = response.status();
            if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
                let text = response.text().await.unwrap_or_default();
                warn!(attempt = attempt + 1, %status, "retryable api error");
                last_err = ProviderError::Api(format!("{status}: {text}"));
                continue;
            }
            if !status.is_success() {
                let text = response.text().await.unwrap_or_default();
                return Err(ProviderError::Api(format!("{status}: {text}")));
            }

            let payload: serde_json::Value = response
                .json()
                .await
                .map_err(|e| ProviderError::Parse(e.to_string()))?;
            debug!(attempt = attempt + 1, "chat completion received");
            return response_to_message(&payload);
        }

        Err(match last_err {
            ProviderError::Http(msg) => {
                ProviderError::Http(format!("chat failed after {MAX_ATTEMPTS} attempts: {msg}"))
            }
            ProviderError::Api(msg) => {
                ProviderError::Api(format!("chat failed after {MAX_ATTEMPTS} attempts: {msg}"))
            }
            other => other,
        })
    }

    fn name(&self) -> &str {
        "openai-compatible"
    }
}

fn role_to_wire(role: Role) -> &'static str {
    match role {
        Role::System => "system",
        Role::User => "user",
        Role::Assistant => "assistant",
        Role::Tool => "tool",
    }
}

fn message_to_wire(message: &Message) -> serde_json::Value {
    // Tool results must carry non-empty content on this wire format.
    let content = if message.role == Role::Tool && message.content.is_empty() {
        "{}"
    } else {
        message.content.as_str()
    };

    let mut wire = json!({
        "role": role_to_wire(message.role),
        "content": content,
    });
    if let Some(name) = &message.name {
        wire["name"] = json!(name);
    }
    if let Some(id) = &message.tool_call_id {
        wire["tool_call_id"] = json!(id);
    }
    if !message.tool_calls.is_empty() {
        wire["tool_calls"] = message
            .tool_calls
            .iter()
            .map(|call| {
                json!({
                    "id": call.id,
                    "type": "function",
                    "function": {
                        "name": call.name,
                        "arguments": call.arguments.to_string(),
                    }
                })
            })
            .collect();
    }
    wire
}

fn definition_to_wire(def: &ToolDefinition) -> serde_json::Value {
    json!({
        "type": "function",
        "function": {
            "name": def.name,
            "description": def.description,
            "parameters": def.parameters,
        }
    })
}

fn response_to_message(payload: &serde_json::Value) -> Result<Message, ProviderError> {
    let message = payload["choices"]
        .get(0)
        .map(|choice| &choice["message"])
        .ok_or_else(|| ProviderError::Parse("no choices in response".to_string()))?;

    let content = message["content"].as_str().unwrap_or_default().to_string();

    let tool_calls = match message["tool_calls"].as_array() {
        Some(calls) => calls
            .iter()
            .map(|call| {
                let id = call["id"].as_str().unwrap_or_default().to_string();
                let name = call["function"]["name"]
                    .as_str()
                    .ok_or_else(|| ProviderError::Parse("tool call without a name".to_string()))?
                    .to_string();
                let raw_args = call["function"]["arguments"].as_str().unwrap_or("{}");
                let arguments = serde_json::from_str(raw_args)
                    .unwrap_or_else(|_| serde_json::Value::String(raw_args.to_string()));
                Ok(ToolCall {
                    id,
                    name,
                    arguments,
                })
            })
            .collect::<Result<Vec<_>, ProviderError>>()?,
        None => Vec::new(),
    };

    Ok(Message {
        role: Role::Assistant,
        content,
        name: None,
        tool_calls,
        tool_call_id: None,
    })
}
