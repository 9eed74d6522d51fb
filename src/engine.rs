//! Container Engine Client
//!
//! The command handlers talk to the engine only through [`EngineClient`]. Calls are
//! synchronous and issued one at a time; a pull is consumed record by record until the
//! engine closes the stream.

use crate::error::EngineError;
use serde_json::Value;

pub mod create;
pub mod docker;
pub mod types;

pub use create::CreateContainerConfig;
pub use docker::DockerEngine;
pub use types::{
    ContainerSummary, CreatedContainer, ImageSummary, PortSummary, PullProgress,
    RemoveContainerFlags, RemoveImageFlags,
};

/// Lazily produced pull progress records.
pub type PullStream<'a> = Box<dyn Iterator<Item = Result<PullProgress, EngineError>> + 'a>;

/// Engine operations the command modules rely on.
pub trait EngineClient {
    /// List containers; `all` includes stopped ones.
    fn list_containers(&self, all: bool) -> Result<Vec<ContainerSummary>, EngineError>;

    /// Full engine detail for one container.
    fn inspect_container(&self, id: &str) -> Result<Value, EngineError>;

    fn create_container(
        &self,
        config: &CreateContainerConfig,
    ) -> Result<CreatedContainer, EngineError>;

    fn start_container(&self, id: &str) -> Result<(), EngineError>;

    /// Stop, waiting `timeout_secs` before the engine kills the container.
    fn stop_container(&self, id: &str, timeout_secs: u64) -> Result<(), EngineError>;

    fn remove_container(&self, id: &str, flags: RemoveContainerFlags) -> Result<(), EngineError>;

    /// List images; `all` includes intermediate layers.
    fn list_images(&self, all: bool) -> Result<Vec<ImageSummary>, EngineError>;

    fn inspect_image(&self, id: &str) -> Result<Value, EngineError>;

    fn pull_image<'a>(&'a self, reference: &str) -> Result<PullStream<'a>, EngineError>;

    fn remove_image(&self, reference: &str, flags: RemoveImageFlags) -> Result<(), EngineError>;
}
