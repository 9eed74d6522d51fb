//! Docker Engine API client backed by `bollard`.
//!
//! bollard is asynchronous; the CLI is not. Each call is driven to completion on a
//! private current-thread runtime, and a pull is polled one record per iterator step.

use super::types::{
    ContainerSummary, CreatedContainer, ImageSummary, PullProgress, RemoveContainerFlags,
    RemoveImageFlags,
};
use super::{CreateContainerConfig, EngineClient, PullStream};
use crate::config::EngineConfig;
use crate::error::{DkrError, EngineError};
use bollard::container::{
    Config, CreateContainerOptions, InspectContainerOptions, ListContainersOptions,
    RemoveContainerOptions, StartContainerOptions, StopContainerOptions,
};
use bollard::image::{CreateImageOptions, ListImagesOptions, RemoveImageOptions};
use bollard::{Docker, API_DEFAULT_VERSION};
use futures::{Stream, StreamExt};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::pin::Pin;
use std::time::Duration;
use tokio::runtime::Runtime;
use tracing::debug;

pub struct DockerEngine {
    docker: Docker,
    runtime: Runtime,
}

impl DockerEngine {
    /// Connect using an explicit host, else the engine's local defaults (`DOCKER_HOST` or
    /// the platform socket). No request is made until the first call.
    pub fn connect(config: &EngineConfig) -> Result<Self, DkrError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| EngineError::Unavailable(format!("Failed to start runtime: {}", e)))?;

        let timeout = config.timeout_secs;
        let docker = match config.host.as_deref() {
            Some(host) => connect_host(host, timeout)?,
            None => Docker::connect_with_local_defaults()
                .map_err(map_engine_error)?
                .with_timeout(Duration::from_secs(timeout)),
        };
        debug!(host = ?config.host, timeout, "Engine client configured");

        Ok(Self { docker, runtime })
    }
}

fn connect_host(host: &str, timeout: u64) -> Result<Docker, EngineError> {
    if let Some(path) = host.strip_prefix("unix://") {
        #[cfg(unix)]
        return Docker::connect_with_unix(path, timeout, API_DEFAULT_VERSION)
            .map_err(map_engine_error);
        #[cfg(not(unix))]
        return Err(EngineError::Unavailable(format!(
            "Unix sockets are not supported on this platform: {}",
            path
        )));
    }

    let address = match host.strip_prefix("tcp://") {
        Some(rest) => format!("http://{}", rest),
        None => host.to_string(),
    };
    Docker::connect_with_http(&address, timeout, API_DEFAULT_VERSION).map_err(map_engine_error)
}

/// Engine responses carry a status; everything else is a transport-level failure.
fn map_engine_error(error: bollard::errors::Error) -> EngineError {
    match error {
        bollard::errors::Error::DockerResponseServerError {
            status_code,
            message,
        } => EngineError::from_status(status_code, message),
        other => EngineError::Unavailable(other.to_string()),
    }
}

/// Re-shape a bollard model into our record type through its JSON form.
fn convert<S: Serialize, D: DeserializeOwned>(value: S) -> Result<D, EngineError> {
    let json = serde_json::to_value(value)
        .map_err(|e| EngineError::Unavailable(format!("Unexpected engine record: {}", e)))?;
    serde_json::from_value(json)
        .map_err(|e| EngineError::Unavailable(format!("Unexpected engine record: {}", e)))
}

impl EngineClient for DockerEngine {
    fn list_containers(&self, all: bool) -> Result<Vec<ContainerSummary>, EngineError> {
        debug!(all, "Listing containers");
        let options = ListContainersOptions::<String> {
            all,
            ..Default::default()
        };
        let containers = self
            .runtime
            .block_on(self.docker.list_containers(Some(options)))
            .map_err(map_engine_error)?;
        containers.into_iter().map(convert).collect()
    }

    fn inspect_container(&self, id: &str) -> Result<Value, EngineError> {
        debug!(id, "Inspecting container");
        let detail = self
            .runtime
            .block_on(
                self.docker
                    .inspect_container(id, None::<InspectContainerOptions>),
            )
            .map_err(map_engine_error)?;
        convert(detail)
    }

    fn create_container(
        &self,
        config: &CreateContainerConfig,
    ) -> Result<CreatedContainer, EngineError> {
        let body = Value::Object(config.to_engine_body());
        debug!(image = %config.image, name = ?config.name, "Creating container");
        let engine_config: Config<String> = serde_json::from_value(body).map_err(|e| {
            EngineError::Client {
                status: 400,
                message: format!("Invalid create option: {}", e),
            }
        })?;
        let options = config.name.as_ref().map(|name| CreateContainerOptions {
            name: name.clone(),
            ..Default::default()
        });

        let response = self
            .runtime
            .block_on(self.docker.create_container(options, engine_config))
            .map_err(map_engine_error)?;
        Ok(CreatedContainer {
            id: response.id,
            warnings: response.warnings,
        })
    }

    fn start_container(&self, id: &str) -> Result<(), EngineError> {
        debug!(id, "Starting container");
        self.runtime
            .block_on(
                self.docker
                    .start_container(id, None::<StartContainerOptions<String>>),
            )
            .map_err(map_engine_error)
    }

    fn stop_container(&self, id: &str, timeout_secs: u64) -> Result<(), EngineError> {
        debug!(id, timeout_secs, "Stopping container");
        let options = StopContainerOptions {
            t: i64::try_from(timeout_secs).unwrap_or(i64::MAX),
        };
        self.runtime
            .block_on(self.docker.stop_container(id, Some(options)))
            .map_err(map_engine_error)
    }

    fn remove_container(&self, id: &str, flags: RemoveContainerFlags) -> Result<(), EngineError> {
        debug!(id, ?flags, "Removing container");
        let options = RemoveContainerOptions {
            v: flags.volumes,
            force: flags.force,
            link: flags.link,
        };
        self.runtime
            .block_on(self.docker.remove_container(id, Some(options)))
            .map_err(map_engine_error)
    }

    fn list_images(&self, all: bool) -> Result<Vec<ImageSummary>, EngineError> {
        debug!(all, "Listing images");
        let options = ListImagesOptions::<String> {
            all,
            ..Default::default()
        };
        let images = self
            .runtime
            .block_on(self.docker.list_images(Some(options)))
            .map_err(map_engine_error)?;
        images.into_iter().map(convert).collect()
    }

    fn inspect_image(&self, id: &str) -> Result<Value, EngineError> {
        debug!(id, "Inspecting image");
        let detail = self
            .runtime
            .block_on(self.docker.inspect_image(id))
            .map_err(map_engine_error)?;
        convert(detail)
    }

    fn pull_image<'a>(&'a self, reference: &str) -> Result<PullStream<'a>, EngineError> {
        debug!(reference, "Pulling image");
        let options = CreateImageOptions::<String> {
            from_image: reference.to_string(),
            ..Default::default()
        };
        let stream = self.docker.create_image(Some(options), None, None);
        Ok(Box::new(BlockingPull {
            runtime: &self.runtime,
            stream: Box::pin(stream),
        }))
    }

    fn remove_image(&self, reference: &str, flags: RemoveImageFlags) -> Result<(), EngineError> {
        debug!(reference, ?flags, "Removing image");
        let options = RemoveImageOptions {
            force: flags.force,
            noprune: flags.no_prune,
        };
        self.runtime
            .block_on(self.docker.remove_image(reference, Some(options), None))
            .map(|_| ())
            .map_err(map_engine_error)
    }
}

/// Iterator over a pull stream; each `next` blocks until the engine sends a record.
struct BlockingPull<'a, T> {
    runtime: &'a Runtime,
    stream: Pin<Box<dyn Stream<Item = Result<T, bollard::errors::Error>> + 'a>>,
}

impl<T: Serialize> Iterator for BlockingPull<'_, T> {
    type Item = Result<PullProgress, EngineError>;

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.runtime.block_on(self.stream.next())?;
        match item {
            // An error record is progress like any other; the engine keeps streaming.
            Err(bollard::errors::Error::DockerStreamError { error }) => Some(Ok(PullProgress {
                error: Some(error),
                ..Default::default()
            })),
            other => Some(other.map_err(map_engine_error).and_then(convert)),
        }
    }
}
