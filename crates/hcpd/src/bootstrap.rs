//! Bridge bootstrap orchestration.

use std::fs;
use std::io;
use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use hcp_config::{Config, EndpointParseError, ListenerEndpoint};
use hcp_scene::{Scene, SceneDescription, SceneError};
use ortho_config::OrthoError;
use thiserror::Error;

use crate::health::HealthReporter;
use crate::telemetry::{self, TelemetryError, TelemetryHandle};

/// Trait abstracting configuration loading for testability.
pub trait ConfigLoader: Send + Sync {
    /// Loads the bridge configuration.
    fn load(&self) -> Result<Config, Arc<OrthoError>>;
}

/// Loader that delegates to [`Config::load`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemConfigLoader;

impl ConfigLoader for SystemConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Config::load()
    }
}

/// Loader that returns a fixed configuration.
#[derive(Debug, Clone)]
pub struct StaticConfigLoader {
    config: Config,
}

impl StaticConfigLoader {
    /// Wraps an already-built configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self { config }
    }
}

impl ConfigLoader for StaticConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Ok(self.config.clone())
    }
}

/// Errors surfaced during bootstrap.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// Configuration failed to load.
    #[error("failed to load configuration: {source}")]
    Configuration {
        #[source]
        source: Arc<OrthoError>,
    },
    /// The listener URI could not be parsed.
    #[error("invalid listener endpoint: {source}")]
    Endpoint {
        #[source]
        source: EndpointParseError,
    },
    /// Telemetry initialisation failed.
    #[error("failed to initialise telemetry: {source}")]
    Telemetry {
        #[source]
        source: TelemetryError,
    },
    /// The scene description could not be read.
    #[error("failed to read scene '{path}': {source}")]
    SceneRead {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },
    /// The scene description was read but could not be built.
    #[error("failed to build scene '{path}': {source}")]
    SceneBuild {
        path: Utf8PathBuf,
        #[source]
        source: SceneError,
    },
}

/// Result of a successful bootstrap.
pub struct Bridge {
    config: Config,
    endpoint: ListenerEndpoint,
    scene: Scene,
    telemetry: TelemetryHandle,
    reporter: Arc<dyn HealthReporter>,
}

impl Bridge {
    /// Effective configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Parsed listener endpoint.
    #[must_use]
    pub fn endpoint(&self) -> &ListenerEndpoint {
        &self.endpoint
    }

    /// Scene loaded at startup.
    #[must_use]
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Handle keeping the tracing subscriber installed.
    #[must_use]
    pub fn telemetry(&self) -> TelemetryHandle {
        self.telemetry
    }

    /// Observer shared with the rest of the runtime.
    #[must_use]
    pub fn reporter(&self) -> Arc<dyn HealthReporter> {
        Arc::clone(&self.reporter)
    }

    /// Splits the bridge into the parts the frame loop owns.
    #[must_use]
    pub fn into_parts(self) -> (Config, ListenerEndpoint, Scene, Arc<dyn HealthReporter>) {
        (self.config, self.endpoint, self.scene, self.reporter)
    }
}

/// Bootstraps the bridge using the supplied collaborators.
///
/// Loads configuration, validates the listener endpoint, installs telemetry
/// and builds the scene (empty when no scene path is configured). Every
/// failure is reported to `reporter` before it is returned.
///
/// # Errors
///
/// Returns the first [`BootstrapError`] encountered.
pub fn bootstrap_with(
    loader: &dyn ConfigLoader,
    reporter: Arc<dyn HealthReporter>,
) -> Result<Bridge, BootstrapError> {
    reporter.bootstrap_starting();
    match assemble(loader) {
        Ok((config, endpoint, scene, telemetry)) => {
            reporter.bootstrap_succeeded(&config);
            Ok(Bridge {
                config,
                endpoint,
                scene,
                telemetry,
                reporter,
            })
        }
        Err(error) => {
            reporter.bootstrap_failed(&error);
            Err(error)
        }
    }
}

fn assemble(
    loader: &dyn ConfigLoader,
) -> Result<(Config, ListenerEndpoint, Scene, TelemetryHandle), BootstrapError> {
    let config = loader
        .load()
        .map_err(|source| BootstrapError::Configuration { source })?;
    let endpoint = config
        .listener_endpoint()
        .map_err(|source| BootstrapError::Endpoint { source })?;
    let telemetry =
        telemetry::initialise(&config).map_err(|source| BootstrapError::Telemetry { source })?;
    let scene = match config.scene_path() {
        Some(path) => load_scene(path)?,
        None => Scene::default(),
    };
    Ok((config, endpoint, scene, telemetry))
}

/// Reads and builds a JSON scene description.
///
/// # Errors
///
/// Returns [`BootstrapError::SceneRead`] or [`BootstrapError::SceneBuild`].
pub fn load_scene(path: &Utf8Path) -> Result<Scene, BootstrapError> {
    let text = fs::read_to_string(path).map_err(|source| BootstrapError::SceneRead {
        path: path.to_owned(),
        source,
    })?;
    let build_error = |source| BootstrapError::SceneBuild {
        path: path.to_owned(),
        source,
    };
    SceneDescription::from_json(&text)
        .and_then(|description| description.build())
        .map_err(build_error)
}
