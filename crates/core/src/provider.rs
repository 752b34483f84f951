//! The narrow contract the orchestrator uses to talk to any model backend.

use crate::types::{Message, ToolDefinition};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("request timed out waiting for the model; the API may be slow or unavailable")]
    Timeout,
    #[error("request was cancelled")]
    Cancelled,
    #[error("http error: {0}")]
    Http(String),
    #[error("api error: {0}")]
    Api(String),
    #[error("parse error: {0}")]
    Parse(String),
}

/// One operation: send the conversation plus the capability schemas, get the
/// next assistant message back. Retry policy, if any, lives behind this
/// boundary; cancellation and deadline failures must surface as their own
/// error kinds so the orchestrator can abort without retrying.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    async fn chat(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
    ) -> Result<Message, ProviderError>;

    fn name(&self) -> &str;
}
