//! Launch sequencing and the headless frame loop.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use hcp_scene::{ReflectionTable, Scene};
use tracing::info;

use crate::StructuredHealthReporter;
use crate::bootstrap::{ConfigLoader, SystemConfigLoader, bootstrap_with};
use crate::dispatch::DispatchTable;
use crate::health::HealthReporter;
use crate::jobs::{JobPump, job_queue};
use crate::session::Server;

use super::PROCESS_TARGET;
use super::errors::LaunchError;
use super::shutdown::{ShutdownFlag, ShutdownSignal, SystemShutdownSignal};

/// Service dependencies required to construct the bridge runtime.
pub(crate) struct ServiceDeps<L> {
    pub(crate) loader: L,
    pub(crate) reporter: Arc<dyn HealthReporter>,
}

/// Collaborators required to launch the bridge runtime.
pub(crate) struct LaunchPlan<L, S> {
    pub(crate) services: ServiceDeps<L>,
    pub(crate) shutdown: S,
}

/// Runs the bridge using the production collaborators.
///
/// # Errors
///
/// Returns a [`LaunchError`] when bootstrap, the session or the signal
/// handlers fail.
pub fn run_bridge() -> Result<(), LaunchError> {
    let plan = LaunchPlan {
        services: ServiceDeps {
            loader: SystemConfigLoader,
            reporter: Arc::new(StructuredHealthReporter::new()),
        },
        shutdown: SystemShutdownSignal::new(),
    };
    run_bridge_with(plan)
}

/// Runs the bridge with injected collaborators.
///
/// Stopping the session suspends the job queue before joining the listener,
/// so connections still waiting on a job are answered with an abandoned
/// ticket even though the frame loop has ended.
pub(crate) fn run_bridge_with<L, S>(plan: LaunchPlan<L, S>) -> Result<(), LaunchError>
where
    L: ConfigLoader,
    S: ShutdownSignal,
{
    let LaunchPlan { services, shutdown } = plan;
    let ServiceDeps { loader, reporter } = services;

    let bridge = bootstrap_with(&loader, reporter)?;
    let (config, endpoint, mut scene, reporter) = bridge.into_parts();
    info!(
        target: PROCESS_TARGET,
        %endpoint,
        tick_interval_ms = config.tick_interval_ms,
        nodes = scene.len(),
        "starting bridge runtime"
    );

    let flag = shutdown.arm()?;
    let (sender, pump) = job_queue(ReflectionTable::new());
    let mut pump = pump
        .with_strict_selectors(config.strict_selectors)
        .with_reporter(Arc::clone(&reporter));
    let server = Server::new(endpoint, DispatchTable::standard(), sender, reporter);
    server.start()?;

    let frames = run_frames(&mut scene, &mut pump, config.tick_interval(), &flag);
    info!(target: PROCESS_TARGET, frames, "shutdown requested");

    server.stop()?;
    drop(pump);
    info!(target: PROCESS_TARGET, "shutdown sequence completed");
    Ok(())
}

/// Ticks the pump once per frame until `shutdown` is raised.
///
/// Returns the number of frames run.
pub(crate) fn run_frames(
    scene: &mut Scene,
    pump: &mut JobPump,
    period: Duration,
    shutdown: &ShutdownFlag,
) -> u64 {
    let mut frames = 0_u64;
    while !shutdown.is_raised() {
        let started = Instant::now();
        pump.tick(scene);
        frames += 1;
        if let Some(remaining) = period.checked_sub(started.elapsed()) {
            thread::sleep(remaining);
        }
    }
    frames
}

#[cfg(test)]
mod tests {
    use std::io::{Read, Write};
    use std::net::{SocketAddr, TcpStream};
    use std::sync::mpsc;

    use hcp_config::Config;
    use hcp_scene::SceneTree;

    use super::*;
    use crate::bootstrap::{BootstrapError, StaticConfigLoader};
    use crate::jobs::JobReport;
    use crate::process::ShutdownError;
    use crate::transport::test_utils::{decode_chunked_body, parse_status, post_action};

    struct ManualShutdown(ShutdownFlag);

    impl ShutdownSignal for ManualShutdown {
        fn arm(&self) -> Result<ShutdownFlag, ShutdownError> {
            Ok(self.0.clone())
        }
    }

    struct AddressReporter(std::sync::Mutex<mpsc::Sender<SocketAddr>>);

    impl HealthReporter for AddressReporter {
        fn bootstrap_starting(&self) {}
        fn bootstrap_succeeded(&self, _config: &Config) {}
        fn bootstrap_failed(&self, _error: &BootstrapError) {}
        fn listener_started(&self, address: SocketAddr) {
            let _ = self.0.lock().expect("sender").send(address);
        }
        fn listener_stopped(&self) {}
        fn job_completed(&self, _report: &JobReport) {}
        fn job_failed(&self, _report: &JobReport) {}
    }

    fn config() -> Config {
        Config {
            listener_uri: "http://127.0.0.1:0".to_owned(),
            tick_interval_ms: 1,
            ..Config::default()
        }
    }

    #[test]
    fn frames_stop_once_shutdown_is_raised() {
        let (_sender, mut pump) = job_queue(ReflectionTable::new());
        let mut scene = Scene::default();
        let shutdown = ShutdownFlag::new();
        shutdown.raise();
        let frames = run_frames(&mut scene, &mut pump, Duration::from_millis(1), &shutdown);
        assert_eq!(frames, 0);
        assert!(scene.roots().is_empty());
    }

    #[test]
    fn serves_requests_until_shutdown() {
        let (addresses, started) = mpsc::channel();
        let shutdown = ShutdownFlag::new();
        let plan = LaunchPlan {
            services: ServiceDeps {
                loader: StaticConfigLoader::new(config()),
                reporter: Arc::new(AddressReporter(std::sync::Mutex::new(addresses))),
            },
            shutdown: ManualShutdown(shutdown.clone()),
        };
        let runtime = thread::spawn(move || run_bridge_with(plan));

        let address = started
            .recv_timeout(Duration::from_secs(10))
            .expect("listener address");
        let mut stream = TcpStream::connect(address).expect("connect");
        stream
            .write_all(post_action(r#"{"cmd":"action","action":"source"}"#).as_bytes())
            .expect("write");
        let mut response = Vec::new();
        stream.read_to_end(&mut response).expect("read");
        assert_eq!(parse_status(&response), 200);
        assert!(decode_chunked_body(&response).contains("hierarchy"));

        shutdown.raise();
        runtime.join().expect("join").expect("clean shutdown");
    }

    #[test]
    fn bootstrap_failures_abort_the_launch() {
        let plan = LaunchPlan {
            services: ServiceDeps {
                loader: StaticConfigLoader::new(Config {
                    listener_uri: "ftp://localhost:1".to_owned(),
                    ..Config::default()
                }),
                reporter: Arc::new(StructuredHealthReporter::new()),
            },
            shutdown: ManualShutdown(ShutdownFlag::new()),
        };
        let error = run_bridge_with(plan).expect_err("bootstrap fails");
        assert!(matches!(error, LaunchError::Bootstrap { .. }));
    }
}
