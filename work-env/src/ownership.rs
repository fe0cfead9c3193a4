//! Ownership labelling and verification.
//!
//! Every image and container work-env creates carries the label
//! `app=work-env`. Listing is scoped with [`filter`], and every destructive or
//! entering operation first passes through [`verify_container`] or
//! [`verify_image`]. A resource without the exact label is never touched.

use std::collections::BTreeMap;

use crate::error::{ResourceKind, WorkEnvError, WorkEnvResult};
use crate::runtime::{ContainerDetails, ContainerRuntime, ImageDetails, LabelFilter};

/// Ownership label key
pub const OWNER_LABEL_KEY: &str = "app";
/// Ownership label value
pub const OWNER_LABEL_VALUE: &str = "work-env";

/// The label pair stamped onto every created image and container
pub fn label() -> (String, String) {
    (OWNER_LABEL_KEY.to_string(), OWNER_LABEL_VALUE.to_string())
}

/// The ownership label as a label map, ready for create/build calls
pub fn labels() -> BTreeMap<String, String> {
    BTreeMap::from([label()])
}

/// Runtime list filter selecting only work-env resources
pub fn filter() -> LabelFilter {
    LabelFilter {
        key: OWNER_LABEL_KEY.to_string(),
        value: OWNER_LABEL_VALUE.to_string(),
    }
}

/// Check a label set for the ownership label
pub fn check_labels(
    kind: ResourceKind,
    name: &str,
    labels: &BTreeMap<String, String>,
) -> WorkEnvResult<()> {
    match labels.get(OWNER_LABEL_KEY) {
        Some(value) if value == OWNER_LABEL_VALUE => Ok(()),
        found => Err(WorkEnvError::NotOwned {
            kind,
            name: name.to_string(),
            found: found.cloned(),
        }),
    }
}

/// Look up container `name` and confirm work-env owns it.
///
/// Returns the container's metadata on success: run state and the
/// entrypoint/arguments it was created with.
pub fn verify_container(
    runtime: &dyn ContainerRuntime,
    name: &str,
) -> WorkEnvResult<ContainerDetails> {
    let details = runtime
        .inspect_container(name)
        .map_err(|e| WorkEnvError::runtime(format!("inspect container '{}'", name), e))?
        .ok_or_else(|| WorkEnvError::NotFound {
            kind: ResourceKind::Container,
            name: name.to_string(),
        })?;

    check_labels(ResourceKind::Container, name, &details.labels)?;
    Ok(details)
}

/// Look up image `name` and confirm work-env built it
pub fn verify_image(runtime: &dyn ContainerRuntime, name: &str) -> WorkEnvResult<ImageDetails> {
    let details = runtime
        .inspect_image(name)
        .map_err(|e| WorkEnvError::runtime(format!("inspect image '{}'", name), e))?
        .ok_or_else(|| WorkEnvError::NotFound {
            kind: ResourceKind::Image,
            name: name.to_string(),
        })?;

    check_labels(ResourceKind::Image, name, &details.labels)?;
    Ok(details)
}
