//! Error types for work-env

use crate::runtime::RuntimeError;
use thiserror::Error;

/// Kind of runtime object an error refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Container,
    Image,
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceKind::Container => write!(f, "container"),
            ResourceKind::Image => write!(f, "image"),
        }
    }
}

#[derive(Error, Debug)]
pub enum WorkEnvError {
    /// A user-supplied name failed the runtime's name grammar
    #[error("Incorrect docker {kind} name '{name}'")]
    InvalidName { kind: ResourceKind, name: String },

    /// The resource exists but was not created by work-env
    #[error("{}", not_owned_message(*kind, name, found.as_deref()))]
    NotOwned {
        kind: ResourceKind,
        name: String,
        /// Observed ownership label value, if the label was present
        found: Option<String>,
    },

    #[error("No such {kind}: {name}")]
    NotFound { kind: ResourceKind, name: String },

    #[error("Environment '{name}' already exists. Use --overwrite to replace it")]
    AlreadyExists { name: String },

    /// The underlying runtime call failed
    #[error("{operation}: {source}")]
    Runtime {
        operation: String,
        #[source]
        source: RuntimeError,
    },

    /// The interactive session process could not be started
    #[error("Failed to start interactive session in '{name}': {source}")]
    Process {
        name: String,
        #[source]
        source: std::io::Error,
    },

    /// Writing listing output failed (e.g. a closed pipe)
    #[error("Failed to write output: {0}")]
    Output(#[source] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

fn not_owned_message(kind: ResourceKind, name: &str, found: Option<&str>) -> String {
    match found {
        Some(value) => format!(
            "{} '{}' is not managed by work-env (label app={})",
            kind, name, value
        ),
        None => format!("{} '{}' is not managed by work-env", kind, name),
    }
}

impl WorkEnvError {
    /// Wrap a runtime failure with the operation that was attempted
    pub fn runtime(operation: impl Into<String>, source: RuntimeError) -> Self {
        WorkEnvError::Runtime {
            operation: operation.into(),
            source,
        }
    }
}

pub type WorkEnvResult<T> = std::result::Result<T, WorkEnvError>;
