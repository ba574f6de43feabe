// ABOUTME: Deployment orchestration using the type state pattern.
// ABOUTME: Exports state markers, the release flow, and the orchestrator.

mod cancel;
mod error;
mod flow;
mod lock;
mod orchestrator;
mod rollback;
mod state;
mod transitions;

pub use cancel::CancelToken;
pub use error::{FailureKind, OrchestrateError};
pub use flow::ReleaseFlow;
pub use lock::{EnvLockGuard, EnvLocks, LockInfo};
pub use orchestrator::{DeployRequest, Orchestrator};
pub use rollback::manual_rollback;
pub use state::{Built, HealthChecked, Migrated, Pending, Transported};
pub use transitions::TransitionResult;
