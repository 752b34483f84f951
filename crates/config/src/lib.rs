pub mod backend;
pub mod hyde;
pub mod ir;
pub mod native;
pub mod omarchy;
pub mod patch;

pub use backend::{BackendError, ConfigBackend, SourceKind};
pub use hyde::HydeBackend;
pub use ir::{ConfigLine, Ir, LineKind};
pub use native::NativeBackend;
pub use omarchy::OmarchyBackend;
pub use patch::{Patch, PatchError};
