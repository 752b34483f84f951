//! Canonical conversation model. Provider adapters reshape these types into
//! their wire formats; the core never observes provider-specific shapes.

use serde::{Deserialize, Serialize};

/// Message role in conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// A model-issued request to invoke a named capability. The id is scoped to
/// one model turn and pairs the call with its tool-role result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: serde_json::Value,
}

/// A single message in the conversation history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    /// Set when `role` is [`Role::Tool`]: the id of the [`ToolCall`] in the
    /// immediately preceding assistant message this result answers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self::plain(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::plain(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::plain(Role::Assistant, content)
    }

    pub fn tool(call_id: impl Into<String>, name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: content.into(),
            name: Some(name.into()),
            tool_calls: Vec::new(),
            tool_call_id: Some(call_id.into()),
        }
    }

    fn plain(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            name: None,
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }
}

/// Capability schema exposed to the model through the provider adapter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

/// Best-effort status notification for the presentation layer. When `diff`
/// is present the consumer is expected to render it immediately.
#[derive(Debug, Clone)]
pub struct StatusUpdate {
    pub message: String,
    pub diff: Option<String>,
}

impl StatusUpdate {
    pub fn text(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            diff: None,
        }
    }

    pub fn with_diff(message: impl Into<String>, diff: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            diff: Some(diff.into()),
        }
    }
}
