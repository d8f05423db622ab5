//! semsearch-model
//!
//! Readiness of the remote embedding model: status lookup, deploy, and a
//! bounded poll of the deploy task. Nothing here fails the caller; an
//! unreachable or undeployed model only means neural rewriting stays off.
pub mod lifecycle;
pub mod transport;

pub use lifecycle::{ModelLifecycle, ModelStatus, PollPolicy, TaskState};
pub use transport::{EngineHttp, MlTransport};
