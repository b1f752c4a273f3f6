//! Structured health reporting for bridge lifecycle events.

use std::net::SocketAddr;
use std::sync::Arc;

use hcp_config::Config;

use crate::bootstrap::BootstrapError;
use crate::jobs::JobReport;

/// Observer trait used to surface lifecycle events to telemetry sinks.
pub trait HealthReporter: Send + Sync {
    /// Invoked before configuration loading begins.
    fn bootstrap_starting(&self);

    /// Invoked after bootstrap completes successfully.
    fn bootstrap_succeeded(&self, config: &Config);

    /// Invoked when bootstrap fails.
    fn bootstrap_failed(&self, error: &BootstrapError);

    /// Invoked once the listener thread is accepting connections.
    fn listener_started(&self, address: SocketAddr);

    /// Invoked after the listener thread has been joined.
    fn listener_stopped(&self);

    fn job_completed(&self, report: &JobReport);

    fn job_failed(&self, report: &JobReport);
}

impl<T> HealthReporter for Arc<T>
where
    T: HealthReporter,
{
    fn bootstrap_starting(&self) {
        (**self).bootstrap_starting();
    }

    fn bootstrap_succeeded(&self, config: &Config) {
        (**self).bootstrap_succeeded(config);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        (**self).bootstrap_failed(error);
    }

    fn listener_started(&self, address: SocketAddr) {
        (**self).listener_started(address);
    }

    fn listener_stopped(&self) {
        (**self).listener_stopped();
    }

    fn job_completed(&self, report: &JobReport) {
        (**self).job_completed(report);
    }

    fn job_failed(&self, report: &JobReport) {
        (**self).job_failed(report);
    }
}

/// Default reporter that records lifecycle events using `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredHealthReporter;

impl StructuredHealthReporter {
    /// Builds a new reporter.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl HealthReporter for StructuredHealthReporter {
    fn bootstrap_starting(&self) {
        tracing::info!(
            target: "hcpd::health",
            event = "bootstrap_starting",
            "starting bridge bootstrap"
        );
    }

    fn bootstrap_succeeded(&self, config: &Config) {
        tracing::info!(
            target: "hcpd::health",
            event = "bootstrap_succeeded",
            listener = %config.listener_uri,
            log_filter = %config.log_filter(),
            log_format = ?config.log_format(),
            scene = ?config.scene_path(),
            "bridge bootstrap completed"
        );
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        tracing::error!(
            target: "hcpd::health",
            event = "bootstrap_failed",
            error = %error,
            "bridge bootstrap failed"
        );
    }

    fn listener_started(&self, address: SocketAddr) {
        tracing::info!(
            target: "hcpd::health",
            event = "listener_started",
            %address,
            "automation listener started"
        );
    }

    fn listener_stopped(&self) {
        tracing::info!(
            target: "hcpd::health",
            event = "listener_stopped",
            "automation listener stopped"
        );
    }

    fn job_completed(&self, report: &JobReport) {
        tracing::debug!(
            target: "hcpd::health",
            event = "job_completed",
            job = %report.id,
            action = report.action,
            "job completed"
        );
    }

    fn job_failed(&self, report: &JobReport) {
        tracing::warn!(
            target: "hcpd::health",
            event = "job_failed",
            job = %report.id,
            action = report.action,
            failure = ?report.failure,
            "job failed"
        );
    }
}
