pub mod engine;
pub mod provider;
pub mod tool;
pub mod types;

pub use engine::{Agent, EngineError, DEFAULT_MAX_TURNS, LOOP_LIMIT_REPLY};
pub use provider::{ChatProvider, ProviderError};
pub use tool::{Tool, ToolError, ToolRegistry};
pub use types::{Message, Role, StatusUpdate, ToolCall, ToolDefinition};
