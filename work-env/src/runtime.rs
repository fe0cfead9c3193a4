//! The container runtime seam.
//!
//! Every component talks to the runtime through [`ContainerRuntime`], handed
//! in explicitly as `&dyn ContainerRuntime`. The production implementation
//! shells out to the `docker`/`podman` binary (see [`crate::container`]);
//! tests substitute an in-memory fake.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

/// Failures raised by the runtime client itself
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Neither docker nor podman could be found
    #[error("No container runtime available. Please install Docker or Podman.")]
    NoRuntimeAvailable,

    /// The runtime binary could not be executed
    #[error("Failed to execute '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The runtime ran and reported a failure
    #[error("'{command}' failed: {stderr}")]
    CommandFailed { command: String, stderr: String },

    /// The runtime could not start the command inside the container
    #[error("'{command}' could not start the session (exit code {code})")]
    ExecFailed { command: String, code: i32 },

    /// The runtime's output could not be understood
    #[error("Failed to parse runtime output: {0}")]
    Parse(String),

    /// Image build failed
    #[error(transparent)]
    Build(#[from] image_builder::ImageBuilderError),
}

pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// Label selector passed to list calls (`label=<key>=<value>`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelFilter {
    pub key: String,
    pub value: String,
}

impl LabelFilter {
    /// Render as a runtime `--filter` argument value
    pub fn to_filter_arg(&self) -> String {
        format!("label={}={}", self.key, self.value)
    }

    /// Whether a label set satisfies this filter
    pub fn matches(&self, labels: &BTreeMap<String, String>) -> bool {
        labels.get(&self.key) == Some(&self.value)
    }
}

/// A bind mount from the host into a container
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindMount {
    pub source: String,
    pub target: String,
}

impl BindMount {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }
}

/// Network mode of a created container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NetworkMode {
    /// Share the host's network namespace
    Host,
    /// The runtime's default isolated bridge
    Bridge,
}

impl NetworkMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            NetworkMode::Host => "host",
            NetworkMode::Bridge => "bridge",
        }
    }
}

/// Everything needed to create a container
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerSpec {
    /// Container name, unique within the runtime
    pub name: String,
    pub image: String,
    pub hostname: String,
    pub working_dir: String,
    pub attach_stdin: bool,
    pub attach_stdout: bool,
    pub attach_stderr: bool,
    pub tty: bool,
    pub open_stdin: bool,
    pub mounts: Vec<BindMount>,
    pub network_mode: NetworkMode,
    /// Environment variables, in the order they are passed to the runtime
    pub env: Vec<(String, String)>,
    pub labels: BTreeMap<String, String>,
}

/// Result of inspecting a container
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerDetails {
    pub id: String,
    /// Name as reported by the runtime, which may carry a leading `/`
    pub name: String,
    pub image: String,
    pub running: bool,
    /// Entry path the container was started with
    pub path: String,
    /// Arguments the entry path was started with
    pub args: Vec<String>,
    pub labels: BTreeMap<String, String>,
}

impl ContainerDetails {
    /// The recorded entrypoint followed by its arguments
    pub fn command(&self) -> Vec<String> {
        std::iter::once(self.path.clone())
            .chain(self.args.iter().cloned())
            .collect()
    }
}

/// Result of inspecting an image
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageDetails {
    pub id: String,
    pub repo_tags: Vec<String>,
    pub labels: BTreeMap<String, String>,
}

/// One row of a container listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerSummary {
    pub id: String,
    /// Names as reported by the runtime, first one is the primary name
    pub names: Vec<String>,
    pub image: String,
}

/// One row of an image listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSummary {
    pub id: String,
    pub repo_tags: Vec<String>,
}

/// Blocking client for a container runtime.
///
/// `inspect_*` calls return `Ok(None)` when the runtime has no such
/// resource; `Err` is reserved for the runtime call itself failing.
pub trait ContainerRuntime {
    /// Binary name or other identifier, for diagnostics
    fn name(&self) -> &str;

    /// Build `context` into an image tagged `tag`, streaming output through
    fn build_image(
        &self,
        context: &Path,
        tag: &str,
        labels: &BTreeMap<String, String>,
    ) -> RuntimeResult<()>;

    fn list_images(&self, filter: &LabelFilter) -> RuntimeResult<Vec<ImageSummary>>;

    fn inspect_image(&self, name: &str) -> RuntimeResult<Option<ImageDetails>>;

    fn remove_image(&self, name: &str, force: bool) -> RuntimeResult<()>;

    /// Create a container from `spec`, returning its id
    fn create_container(&self, spec: &ContainerSpec) -> RuntimeResult<String>;

    fn start_container(&self, name: &str) -> RuntimeResult<()>;

    fn inspect_container(&self, name: &str) -> RuntimeResult<Option<ContainerDetails>>;

    fn list_containers(&self, filter: &LabelFilter) -> RuntimeResult<Vec<ContainerSummary>>;

    fn remove_container(&self, name: &str, force: bool) -> RuntimeResult<()>;

    /// Run `command` inside `name` with this process's stdio attached,
    /// blocking until it exits. Returns the session's exit code.
    fn exec_interactive(&self, name: &str, command: &[String]) -> RuntimeResult<i32>;
}
