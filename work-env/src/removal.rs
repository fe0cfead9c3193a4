//! Batch removal of environments and images.
//!
//! Both operations verify every target before removing any. A removal
//! failure part-way stops the batch; targets removed before it stay removed.
//! Repeated targets are removed once.

use tracing::info;

use crate::error::{WorkEnvError, WorkEnvResult};
use crate::ownership;
use crate::runtime::ContainerRuntime;

/// Targets in first-seen order with repeats dropped
fn unique<S: AsRef<str>>(names: &[S]) -> Vec<&str> {
    let mut seen: Vec<&str> = Vec::with_capacity(names.len());
    for name in names.iter().map(|n| n.as_ref()) {
        if !seen.contains(&name) {
            seen.push(name);
        }
    }
    seen
}

pub fn remove_containers<S: AsRef<str>>(
    runtime: &dyn ContainerRuntime,
    names: &[S],
) -> WorkEnvResult<()> {
    let names = unique(names);
    for name in &names {
        ownership::verify_container(runtime, name)?;
    }

    for name in names {
        runtime
            .remove_container(name, true)
            .map_err(|e| WorkEnvError::runtime(format!("remove container '{}'", name), e))?;
        info!("Removed container '{}'", name);
    }

    Ok(())
}

pub fn remove_images<S: AsRef<str>>(
    runtime: &dyn ContainerRuntime,
    names: &[S],
) -> WorkEnvResult<()> {
    let names = unique(names);
    for name in &names {
        ownership::verify_image(runtime, name)?;
    }

    for name in names {
        runtime
            .remove_image(name, true)
            .map_err(|e| WorkEnvError::runtime(format!("remove image '{}'", name), e))?;
        info!("Removed image '{}'", name);
    }

    Ok(())
}
