//! The `run` operation: replace-or-reject, create, attach, optional teardown.
//!
//! ```text
//! CHECK_EXISTING --exists, !overwrite--> AlreadyExists
//!       |  exists, overwrite: remove
//!       v
//!    CREATE --fail--> abort
//!       |
//!       v
//!    ATTACH --(remove_after)--> REMOVE
//! ```

use std::path::PathBuf;
use tracing::{error, info, warn};

use crate::error::{WorkEnvError, WorkEnvResult};
use crate::instantiate::{self, HostContext};
use crate::ownership;
use crate::removal;
use crate::runtime::ContainerRuntime;
use crate::session;

/// Options for a single `run`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    pub image: String,
    pub name: String,
    /// Replace an existing environment of the same name
    pub overwrite: bool,
    /// Remove the environment once the session ends
    pub remove_after: bool,
    pub resolv_conf: PathBuf,
}

/// Phases of a run, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    CheckExisting,
    Create,
    Attach,
    Remove,
}

impl std::fmt::Display for RunPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunPhase::CheckExisting => write!(f, "check-existing"),
            RunPhase::Create => write!(f, "create"),
            RunPhase::Attach => write!(f, "attach"),
            RunPhase::Remove => write!(f, "remove"),
        }
    }
}

/// Drives one environment through its lifecycle
pub struct LifecycleManager<'a> {
    runtime: &'a dyn ContainerRuntime,
    host: HostContext,
}

impl<'a> LifecycleManager<'a> {
    pub fn new(runtime: &'a dyn ContainerRuntime, host: HostContext) -> Self {
        Self { runtime, host }
    }

    /// Does an environment named `name` exist?
    ///
    /// A same-named container not owned by work-env is an error, never
    /// "absent": it must not be adopted or replaced.
    fn exists(&self, name: &str) -> WorkEnvResult<bool> {
        match ownership::verify_container(self.runtime, name) {
            Ok(_) => Ok(true),
            Err(WorkEnvError::NotFound { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Create environment `options.name` from `options.image` and attach to it.
    ///
    /// Returns the session's exit code. A failed attach leaves the container
    /// in place unless `remove_after` is set. A removal failure after the
    /// session is reported; it is returned only when the session itself
    /// succeeded.
    pub fn run(&self, options: &RunOptions) -> WorkEnvResult<i32> {
        let name = options.name.as_str();

        info!("[{}] {}", RunPhase::CheckExisting, name);
        if self.exists(name)? {
            if !options.overwrite {
                return Err(WorkEnvError::AlreadyExists {
                    name: name.to_string(),
                });
            }
            warn!("Replacing existing environment '{}'", name);
            removal::remove_containers(self.runtime, &[name])?;
        }

        info!("[{}] {} from {}", RunPhase::Create, name, options.image);
        instantiate::create(
            self.runtime,
            &options.image,
            name,
            &self.host,
            &options.resolv_conf,
        )?;

        info!("[{}] {}", RunPhase::Attach, name);
        let outcome = session::enter(self.runtime, name);

        if options.remove_after {
            info!("[{}] {}", RunPhase::Remove, name);
            if let Err(e) = removal::remove_containers(self.runtime, &[name]) {
                if outcome.is_ok() {
                    return Err(e);
                }
                error!("Failed to remove container '{}': {}", name, e);
            }
        }

        outcome
    }
}
