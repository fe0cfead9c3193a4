//! Name validation for images and containers.
//!
//! Image references follow the distribution reference grammar
//! (`[domain[:port]/]path[:tag][@digest]`); container names follow the
//! runtime's restricted name pattern. Both checks run before any name is
//! handed to the runtime.

use regex::Regex;
use std::sync::LazyLock;

use crate::error::{ResourceKind, WorkEnvError, WorkEnvResult};

/// Longest image name (without tag or digest) the runtime accepts
pub const MAX_IMAGE_NAME_LEN: usize = 255;

static IMAGE_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    let alphanumeric = "[a-z0-9]+";
    let separator = "(?:[._]|__|[-]+)";
    let path_component = format!("{alphanumeric}(?:{separator}{alphanumeric})*");
    let domain_component = "(?:[a-zA-Z0-9]|[a-zA-Z0-9][a-zA-Z0-9-]*[a-zA-Z0-9])";
    let domain = format!(r"{domain_component}(?:\.{domain_component})*(?::[0-9]+)?");
    let name = format!("(?:{domain}/)?{path_component}(?:/{path_component})*");
    let tag = "[A-Za-z0-9_][A-Za-z0-9_.-]{0,127}";
    let digest = "[A-Za-z][A-Za-z0-9]*(?:[-_+.][A-Za-z][A-Za-z0-9]*)*:[0-9A-Fa-f]{32,}";

    Regex::new(&format!("^(?P<name>{name})(?::{tag})?(?:@{digest})?$"))
        .expect("image reference pattern is valid")
});

static CONTAINER_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new("^[a-zA-Z0-9][a-zA-Z0-9_.-]+$").expect("container name pattern is valid")
});

pub fn is_valid_image_name(name: &str) -> bool {
    IMAGE_REFERENCE
        .captures(name)
        .and_then(|caps| caps.name("name"))
        .is_some_and(|n| n.as_str().len() <= MAX_IMAGE_NAME_LEN)
}

pub fn is_valid_container_name(name: &str) -> bool {
    CONTAINER_NAME.is_match(name)
}

/// Reject `name` unless it is a valid image reference
pub fn validate_image_name(name: &str) -> WorkEnvResult<()> {
    if !is_valid_image_name(name) {
        return Err(WorkEnvError::InvalidName {
            kind: ResourceKind::Image,
            name: name.to_string(),
        });
    }
    Ok(())
}

/// Reject `name` unless it is a valid container name
pub fn validate_container_name(name: &str) -> WorkEnvResult<()> {
    if !is_valid_container_name(name) {
        return Err(WorkEnvError::InvalidName {
            kind: ResourceKind::Container,
            name: name.to_string(),
        });
    }
    Ok(())
}
