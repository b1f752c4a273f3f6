//! Remote automation bridge for live scene trees.
//!
//! An external test driver talks to the bridge over HTTP: `/alive` answers a
//! liveness check, `/action` carries a JSON action envelope. Listener threads
//! decode envelopes into typed [`ActionRequest`]s and hand them to the job
//! pipeline. The tree-owning thread drains one job per tick through
//! [`JobPump::tick`], so the scene is only ever touched from the thread that
//! owns it.
//!
//! Elements are addressed by durable ids (`HCP-<guid>` with an optional
//! `|<Component>` qualifier) that survive destroy/recreate cycles, or by
//! transient instance ids that do not. The [`ElementRegistry`] caches
//! resolved handles and evicts them when the scene reports destruction.
//!
//! The `hcpd` binary wires these parts together around a headless frame loop;
//! embedders drive [`JobPump::tick`] from their own loop instead.

mod bootstrap;
pub mod dispatch;
pub mod element;
mod health;
pub mod jobs;
mod process;
mod session;
pub mod telemetry;
mod transport;

pub use bootstrap::{
    BootstrapError, Bridge, ConfigLoader, StaticConfigLoader, SystemConfigLoader, bootstrap_with,
    load_scene,
};
pub use dispatch::{ActionRequest, DecodeError, DispatchTable, JobResponse};
pub use element::{ElementError, ElementHandle, ElementRegistry};
pub use health::{HealthReporter, StructuredHealthReporter};
pub use jobs::{JobError, JobPump, JobSender, JobState, JobTicket, job_queue};
pub use process::{
    LaunchError, ShutdownError, ShutdownFlag, ShutdownSignal, SystemShutdownSignal, run_bridge,
};
pub use session::{Server, SessionError, SessionState, Transition};
pub use telemetry::{TelemetryError, TelemetryHandle};
pub use transport::{ListenerError, READY_MESSAGE, TransportError};

#[cfg(test)]
mod tests;
