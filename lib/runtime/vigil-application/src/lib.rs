//! Safety monitoring runtime: rule evaluation loop, emergency handling,
//! command validation, and the orchestrator command slice.

pub mod alerts;
pub mod emergency;
pub mod monitor;
pub mod orchestrator;
pub mod policy;
pub mod tracker;
mod validator;

pub use alerts::AlertCenter;
pub use emergency::EmergencyHandler;
pub use monitor::SafetyMonitor;
pub use orchestrator::{CommandOutcome, Orchestrator, OrchestratorStats};
pub use policy::{CommandPolicy, TUNING_PARAMETERS};
pub use tracker::ViolationTracker;
