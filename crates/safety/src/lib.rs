pub mod gate;
pub mod snapshot;

pub use gate::{BackendPolicy, GateError, SecurityGate};
pub use snapshot::{SnapshotError, SnapshotService};
