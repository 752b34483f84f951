pub mod discovery;
pub mod file_tools;
pub mod parse_tool;
pub mod patch_tools;

pub use discovery::DetectRootTool;
pub use file_tools::{ListDirTool, ReadFileTool};
pub use parse_tool::ParseConfigTool;
pub use patch_tools::{ApplyPatchTool, MakePatchTool, RollbackTool};

use hypr_scribe_core::ToolError;
use serde::de::DeserializeOwned;

/// Decode a capability's serialized argument object.
pub(crate) fn parse_args<T: DeserializeOwned>(args: serde_json::Value) -> Result<T, ToolError> {
    serde_json::from_value(args).map_err(|e| ToolError::InvalidArgs(e.to_string()))
}
