//! Test double for [`HealthReporter`] that records lifecycle events.

use std::net::SocketAddr;
use std::sync::Mutex;

use hcp_config::Config;

use crate::bootstrap::BootstrapError;
use crate::health::HealthReporter;
use crate::jobs::JobReport;

/// Lifecycle events tracked during scenarios.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthEvent {
    BootstrapStarting,
    BootstrapSucceeded,
    BootstrapFailed(String),
    ListenerStarted(SocketAddr),
    ListenerStopped,
    JobCompleted(&'static str),
    JobFailed(&'static str),
}

/// Records health events for assertions.
#[derive(Debug, Default)]
pub struct RecordingHealthReporter {
    events: Mutex<Vec<HealthEvent>>,
}

impl RecordingHealthReporter {
    /// Captures a copy of the recorded events.
    #[must_use]
    pub fn events(&self) -> Vec<HealthEvent> {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .clone()
    }

    /// Number of recorded events matching `predicate`.
    pub fn count(&self, predicate: impl Fn(&HealthEvent) -> bool) -> usize {
        self.events().iter().filter(|event| predicate(event)).count()
    }

    fn record(&self, event: HealthEvent) {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .push(event);
    }
}

impl HealthReporter for RecordingHealthReporter {
    fn bootstrap_starting(&self) {
        self.record(HealthEvent::BootstrapStarting);
    }

    fn bootstrap_succeeded(&self, _config: &Config) {
        self.record(HealthEvent::BootstrapSucceeded);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        self.record(HealthEvent::BootstrapFailed(error.to_string()));
    }

    fn listener_started(&self, address: SocketAddr) {
        self.record(HealthEvent::ListenerStarted(address));
    }

    fn listener_stopped(&self) {
        self.record(HealthEvent::ListenerStopped);
    }

    fn job_completed(&self, report: &JobReport) {
        self.record(HealthEvent::JobCompleted(report.action));
    }

    fn job_failed(&self, report: &JobReport) {
        self.record(HealthEvent::JobFailed(report.action));
    }
}
