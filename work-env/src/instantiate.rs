//! Creating environment containers.
//!
//! The container specification is a pure function of the image, the
//! environment name and a [`HostContext`] snapshot, so the same inputs
//! always produce the same container.

use std::path::Path;
use tracing::info;

use crate::config::WorkEnvConfig;
use crate::error::{WorkEnvError, WorkEnvResult};
use crate::ownership;
use crate::runtime::{BindMount, ContainerRuntime, ContainerSpec, NetworkMode};

/// Resolver config path inside the container
pub const CONTAINER_RESOLV_CONF: &str = "/etc/resolv.conf";

/// Host directories shared 1:1 with every environment
pub const SHARED_DIRS: [&str; 4] = ["/home", "/dev", "/sys", "/tmp"];

/// Facts about the invoking host process captured at creation time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostContext {
    pub working_dir: String,
    pub shell: String,
    pub uid: u32,
    pub username: String,
    /// Extra host variables copied verbatim, in configured order
    pub passthrough_env: Vec<(String, String)>,
}

impl HostContext {
    /// Snapshot the current process
    pub fn capture(config: &WorkEnvConfig) -> WorkEnvResult<Self> {
        let working_dir = std::env::current_dir()
            .map_err(|e| {
                WorkEnvError::Config(format!("Cannot determine working directory: {}", e))
            })?
            .display()
            .to_string();

        // SAFETY: geteuid() is a simple POSIX getter that always succeeds and has no side effects.
        let uid = unsafe { libc::geteuid() };

        let username = std::env::var("USER")
            .or_else(|_| std::env::var("LOGNAME"))
            .unwrap_or_else(|_| uid.to_string());

        let passthrough_env = config
            .extra_env
            .iter()
            .map(|var| (var.clone(), std::env::var(var).unwrap_or_default()))
            .collect();

        Ok(Self {
            working_dir,
            shell: std::env::var("SHELL").unwrap_or_default(),
            uid,
            username,
            passthrough_env,
        })
    }
}

/// Host bind mounts shared with every environment
pub fn mounts(resolv_conf: &Path) -> Vec<BindMount> {
    let mut mounts: Vec<BindMount> = SHARED_DIRS
        .iter()
        .map(|dir| BindMount::new(*dir, *dir))
        .collect();
    mounts.push(BindMount::new(
        resolv_conf.display().to_string(),
        CONTAINER_RESOLV_CONF,
    ));
    mounts
}

/// Variables describing the environment to its entrypoint
pub fn env_vars(image: &str, name: &str, host: &HostContext) -> Vec<(String, String)> {
    let mut env = vec![
        ("WORK_ENV_IMAGE".to_string(), image.to_string()),
        ("WORK_ENV_NAME".to_string(), name.to_string()),
        ("WORK_ENV_USER_SHELL".to_string(), host.shell.clone()),
        ("WORK_ENV_USER_ID".to_string(), host.uid.to_string()),
        ("WORK_ENV_USER_NAME".to_string(), host.username.clone()),
    ];
    env.extend(host.passthrough_env.iter().cloned());
    env
}

/// Container specification for environment `name` running `image`
pub fn container_spec(
    image: &str,
    name: &str,
    host: &HostContext,
    resolv_conf: &Path,
) -> ContainerSpec {
    ContainerSpec {
        name: name.to_string(),
        image: image.to_string(),
        hostname: name.to_string(),
        working_dir: host.working_dir.clone(),
        attach_stdin: true,
        attach_stdout: true,
        attach_stderr: true,
        tty: true,
        open_stdin: true,
        mounts: mounts(resolv_conf),
        network_mode: NetworkMode::Host,
        env: env_vars(image, name, host),
        labels: ownership::labels(),
    }
}

/// Create and start environment `name` from `image`.
///
/// A container whose create succeeded but whose start failed is left in
/// place; it is owned, so `ps` shows it and `rm` can remove it.
pub fn create(
    runtime: &dyn ContainerRuntime,
    image: &str,
    name: &str,
    host: &HostContext,
    resolv_conf: &Path,
) -> WorkEnvResult<String> {
    let spec = container_spec(image, name, host, resolv_conf);

    let id = runtime
        .create_container(&spec)
        .map_err(|e| WorkEnvError::runtime(format!("create container '{}'", name), e))?;
    info!("Created container '{}' ({}) from image '{}'", name, id, image);

    runtime
        .start_container(name)
        .map_err(|e| WorkEnvError::runtime(format!("start container '{}'", name), e))?;

    Ok(id)
}
