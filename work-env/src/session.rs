//! Attaching interactive sessions to environments.

use tracing::{debug, info};

use crate::error::{WorkEnvError, WorkEnvResult};
use crate::ownership;
use crate::runtime::{ContainerRuntime, RuntimeError};

/// Exit codes `docker exec`/`podman exec` use for their own failures:
/// runtime error, command not executable, command not found.
pub const EXEC_FAILURE_CODES: [i32; 3] = [125, 126, 127];

/// Enter environment `name`, starting it first if it is stopped.
///
/// The session replays the container's recorded entrypoint and arguments and
/// blocks until it ends. The returned exit code belongs to the session; a
/// non-zero value is not treated as a failure, except for the codes in
/// [`EXEC_FAILURE_CODES`] which mean the session never started.
pub fn enter(runtime: &dyn ContainerRuntime, name: &str) -> WorkEnvResult<i32> {
    let details = ownership::verify_container(runtime, name)?;

    if !details.running {
        info!("Starting stopped container '{}'", name);
        runtime
            .start_container(name)
            .map_err(|e| WorkEnvError::runtime(format!("start container '{}'", name), e))?;
    }

    let command = details.command();
    debug!("Attaching to '{}' with {:?}", name, command);

    let operation = || format!("attach to container '{}'", name);
    let code = runtime
        .exec_interactive(name, &command)
        .map_err(|e| match e {
            RuntimeError::Spawn { source, .. } => WorkEnvError::Process {
                name: name.to_string(),
                source,
            },
            other => WorkEnvError::runtime(operation(), other),
        })?;

    if EXEC_FAILURE_CODES.contains(&code) {
        return Err(WorkEnvError::runtime(
            operation(),
            RuntimeError::ExecFailed {
                command: format!("exec {} {}", name, command.join(" ")),
                code,
            },
        ));
    }

    debug!("Session in '{}' ended with exit code {}", name, code);
    Ok(code)
}
