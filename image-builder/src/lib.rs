//! Container image building utilities for work-env
//!
//! Environment images are built by the container runtime itself from a
//! user-supplied build context. This crate assembles the runtime's `build`
//! invocation, stamps the requested labels onto the result and streams the
//! build output straight through to the invoking terminal.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use thiserror::Error;
use tracing::debug;

/// Errors related to image building
#[derive(Error, Debug)]
pub enum ImageBuilderError {
    #[error("Build failed: {0}")]
    BuildFailed(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Failed to execute '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
}

pub type ImageBuilderResult<T> = Result<T, ImageBuilderError>;

/// Configuration for building a container image
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageBuildConfig {
    /// Runtime binary that performs the build (`docker`, `podman`)
    pub runtime: String,
    /// Build context directory
    pub context: PathBuf,
    /// Tag applied to the resulting image
    pub tag: String,
    /// Labels stamped onto the resulting image
    pub labels: BTreeMap<String, String>,
}

impl ImageBuildConfig {
    /// Create a build configuration for `context`, tagging the output `tag`
    pub fn new(
        runtime: impl Into<String>,
        context: impl Into<PathBuf>,
        tag: impl Into<String>,
    ) -> Self {
        Self {
            runtime: runtime.into(),
            context: context.into(),
            tag: tag.into(),
            labels: BTreeMap::new(),
        }
    }

    /// Add a label to stamp onto the image
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    pub fn validate(&self) -> ImageBuilderResult<()> {
        if self.runtime.is_empty() {
            return Err(ImageBuilderError::InvalidConfig(
                "No container runtime configured".to_string(),
            ));
        }

        if self.tag.is_empty() {
            return Err(ImageBuilderError::InvalidConfig(
                "Image tag cannot be empty".to_string(),
            ));
        }

        if !self.context.is_dir() {
            return Err(ImageBuilderError::InvalidConfig(format!(
                "Build context '{}' is not a directory",
                self.context.display()
            )));
        }

        Ok(())
    }

    /// Arguments passed to the runtime binary, without the binary itself
    pub fn build_args(&self) -> Vec<String> {
        let mut args = vec![
            "build".to_string(),
            self.context.display().to_string(),
            "--tag".to_string(),
            self.tag.clone(),
        ];

        for (key, value) in &self.labels {
            args.push("--label".to_string());
            args.push(format!("{}={}", key, value));
        }

        args
    }
}

/// Build a container image, streaming the runtime's output to this process's
/// stdout/stderr unmodified.
///
/// The build is run once; a non-zero exit of the runtime is reported as
/// [`ImageBuilderError::BuildFailed`]. The runtime has already printed its
/// own diagnostics by then.
pub fn build_image(config: &ImageBuildConfig) -> ImageBuilderResult<()> {
    config.validate()?;

    let args = config.build_args();
    let command_line = format!("{} {}", config.runtime, args.join(" "));
    debug!("Running image build: {}", command_line);

    let status = Command::new(&config.runtime)
        .args(&args)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .map_err(|source| ImageBuilderError::Spawn {
            command: command_line.clone(),
            source,
        })?;

    if !status.success() {
        return Err(ImageBuilderError::BuildFailed(format!(
            "'{}' exited with {}",
            command_line, status
        )));
    }

    Ok(())
}
