//! Conversation orchestrator: the send → respond → dispatch-tools loop.

use crate::provider::{ChatProvider, ProviderError};
use crate::tool::ToolRegistry;
use crate::types::{Message, StatusUpdate, ToolCall};
use futures::future;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub const DEFAULT_MAX_TURNS: usize = 25;

/// Returned as a normal final answer when the turn limit is exhausted; the
/// model getting stuck is a conversation outcome, not an engine failure.
pub const LOOP_LIMIT_REPLY: &str =
    "Agent loop limit reached without a final response. I got stuck trying to solve this request.";

const STATUS_CAPACITY: usize = 16;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("model request timed out; the API may be slow or unavailable")]
    Timeout,
    #[error("request was cancelled")]
    Cancelled,
    #[error("provider error: {0}")]
    Provider(String),
}

/// Drives the conversation between the user, the model and the capabilities.
///
/// The history is owned exclusively by this value; one `process_message`
/// call runs at a time per conversation.
pub struct Agent {
    provider: Arc<dyn ChatProvider>,
    registry: Arc<ToolRegistry>,
    history: Vec<Message>,
    system_prompt: String,
    max_turns: usize,
    updates: mpsc::Sender<StatusUpdate>,
}

impl Agent {
    /// Create an agent and the receiving end of its status-update channel.
    pub fn new(
        provider: Arc<dyn ChatProvider>,
        registry: Arc<ToolRegistry>,
        system_prompt: impl Into<String>,
        max_turns: usize,
    ) -> (Self, mpsc::Receiver<StatusUpdate>) {
        let (tx, rx) = mpsc::channel(STATUS_CAPACITY);
        let agent = Self {
            provider,
            registry,
            history: Vec::new(),
            system_prompt: system_prompt.into(),
            max_turns,
            updates: tx,
        };
        (agent, rx)
    }

    pub fn history(&self) -> &[Message] {
        &self.history
    }

    /// Clear the conversation history.
    pub fn reset(&mut self) {
        self.history.clear();
    }

    /// Handle one user message, looping through model turns and concurrent
    /// tool dispatch until the model answers without tool calls, the turn
    /// limit is reached, or the provider/cancellation aborts the call.
    pub async fn process_message(
        &mut self,
        cancel: &CancellationToken,
        input: &str,
    ) -> Result<String, EngineError> {
        info!("processing user input");
        self.send_update(StatusUpdate::text("Analysing request..."));

        if self.history.is_empty() && !self.system_prompt.is_empty() {
            self.history.push(Message::system(self.system_prompt.clone()));
        }
        self.history.push(Message::user(input));

        for turn in 0..self.max_turns {
            debug!(turn = turn + 1, max = self.max_turns, "agent loop turn");
            self.send_update(StatusUpdate::text(format!("Thinking (turn {})...", turn + 1)));

            let definitions = self.registry.definitions();
            let response = tokio::select! {
                _ = cancel.cancelled() => {
                    self.send_update(StatusUpdate::text("Request cancelled"));
                    return Err(EngineError::Cancelled);
                }
                response = self.provider.chat(&self.history, &definitions) => match response {
                    Ok(message) => message,
                    Err(ProviderError::Timeout) => {
                        self.send_update(StatusUpdate::text("Request timed out"));
                        return Err(EngineError::Timeout);
                    }
                    Err(ProviderError::Cancelled) => {
                        self.send_update(StatusUpdate::text("Request cancelled"));
                        return Err(EngineError::Cancelled);
                    }
                    Err(err) => {
                        warn!(%err, "provider call failed");
                        self.send_update(StatusUpdate::text("Error communicating with the model"));
                        return Err(EngineError::Provider(err.to_string()));
                    }
                },
            };

            debug!(
                content_len = response.content.len(),
                tool_calls = response.tool_calls.len(),
                "received model response"
            );
            self.history.push(response.clone());

            if response.tool_calls.is_empty() {
                info!("final response received");
                self.send_update(StatusUpdate::text("Done"));
                return Ok(response.content);
            }

            let results = self.dispatch(cancel, &response.tool_calls).await?;
            self.history.extend(results);
        }

        warn!("agent loop limit reached");
        self.send_update(StatusUpdate::text("Loop limit reached"));
        Ok(LOOP_LIMIT_REPLY.to_string())
    }

    /// Fan out every tool call of one response concurrently and fan back in.
    ///
    /// Results land in a slot indexed by the call's position in the response,
    /// never by completion order, so the history always reflects issuance
    /// order and downstream adapters can reconstruct strict call/response
    /// pairing. On cancellation the in-flight tasks run to completion in the
    /// background and their results are discarded.
    async fn dispatch(
        &self,
        cancel: &CancellationToken,
        calls: &[ToolCall],
    ) -> Result<Vec<Message>, EngineError> {
        let mut handles = Vec::with_capacity(calls.len());
        for call in calls {
            info!(tool = %call.name, id = %call.id, "tool call requested");
            self.send_update(StatusUpdate::text(action_label(&call.name)));

            let registry = Arc::clone(&self.registry);
            let updates = self.updates.clone();
            let call = call.clone();
            handles.push(tokio::spawn(execute_call(registry, updates, call)));
        }

        let joined = tokio::select! {
            _ = cancel.cancelled() => {
                self.send_update(StatusUpdate::text("Request cancelled"));
                return Err(EngineError::Cancelled);
            }
            joined = future::join_all(handles) => joined,
        };

        let mut results = Vec::with_capacity(calls.len());
        for (call, join) in calls.iter().zip(joined) {
            let message = match join {
                Ok(message) => message,
                // A panicking capability still yields a result the model sees.
                Err(err) => Message::tool(
                    call.id.clone(),
                    call.name.clone(),
                    format!("Error: tool {} aborted: {err}", call.name),
                ),
            };
            results.push(message);
        }
        Ok(results)
    }

    fn send_update(&self, update: StatusUpdate) {
        // Non-blocking: a full channel or absent listener drops the update.
        let _ = self.updates.try_send(update);
    }
}

async fn execute_call(
    registry: Arc<ToolRegistry>,
    updates: mpsc::Sender<StatusUpdate>,
    call: ToolCall,
) -> Message {
    let Some(tool) = registry.get(&call.name) else {
        warn!(tool = %call.name, "tool not found");
        return Message::tool(
            call.id,
            call.name.clone(),
            format!("Error: Tool {} not found", call.name),
        );
    };

    match tool.execute(call.arguments).await {
        Ok(output) => {
            debug!(tool = %call.name, "tool finished");
            if call.name == "make_patch" {
                let _ = updates.try_send(StatusUpdate::with_diff(
                    "Generated configuration patch",
                    output.clone(),
                ));
            } else {
                let _ = updates.try_send(StatusUpdate::text(format!("Finished {}", call.name)));
            }
            Message::tool(call.id, call.name, output)
        }
        Err(err) => {
            info!(tool = %call.name, %err, "tool execution error");
            let _ = updates.try_send(StatusUpdate::text(format!("Error in {}: {err}", call.name)));
            // The error text becomes the result content so the model can see
            // it and self-correct on the next turn.
            Message::tool(call.id, call.name, format!("Error: {err}"))
        }
    }
}

fn action_label(tool_name: &str) -> String {
    match tool_name {
        "detect_installation_root" => "Detecting Hyprland installation...".to_string(),
        "list_dir" => "Listing directory contents...".to_string(),
        "read_file" => "Reading configuration file...".to_string(),
        "parse_config" => "Parsing configuration structure...".to_string(),
        "make_patch" => "Generating configuration patch...".to_string(),
        "apply_patch" => "Applying configuration patch...".to_string(),
        "rollback" => "Restoring configuration snapshot...".to_string(),
        other => format!("Running {other}..."),
    }
}
