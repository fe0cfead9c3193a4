//! work-env: disposable, labeled developer environment containers.
//!
//! Images are built from a local build context and every image and container
//! work-env creates carries the label `app=work-env`. Everything else this
//! crate does is scoped to resources carrying that label.
//!
//! All components take the runtime client explicitly as
//! `&dyn ContainerRuntime`; [`CliRuntime`] drives the docker or podman binary.

pub mod builder;
pub mod config;
pub mod container;
pub mod error;
pub mod instantiate;
pub mod inventory;
pub mod lifecycle;
pub mod names;
pub mod ownership;
pub mod removal;
pub mod runtime;
pub mod session;

pub use config::{RuntimeChoice, WorkEnvConfig};
pub use container::{detect_runtime, CliRuntime, RuntimeKind};
pub use error::{ResourceKind, WorkEnvError, WorkEnvResult};
pub use instantiate::HostContext;
pub use lifecycle::{LifecycleManager, RunOptions, RunPhase};
pub use runtime::{
    BindMount, ContainerDetails, ContainerRuntime, ContainerSpec, ContainerSummary, ImageDetails,
    ImageSummary, LabelFilter, NetworkMode, RuntimeError, RuntimeResult,
};
