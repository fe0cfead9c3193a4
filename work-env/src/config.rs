use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{WorkEnvError, WorkEnvResult};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV: &str = "WORK_ENV_CONFIG";
/// Environment variable overriding the runtime choice
pub const RUNTIME_ENV: &str = "WORK_ENV_RUNTIME";

/// Which container runtime binary to drive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeChoice {
    /// Docker if installed, otherwise Podman
    #[default]
    Auto,
    Docker,
    Podman,
}

impl std::str::FromStr for RuntimeChoice {
    type Err = WorkEnvError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Ok(RuntimeChoice::Auto),
            "docker" => Ok(RuntimeChoice::Docker),
            "podman" => Ok(RuntimeChoice::Podman),
            other => Err(WorkEnvError::Config(format!(
                "Unknown container runtime '{}' (expected auto, docker or podman)",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkEnvConfig {
    pub runtime: RuntimeChoice,
    /// Image used by `run` when none is given
    pub default_image: String,
    /// Environment name used by `run` and `enter` when none is given
    pub default_name: String,
    /// Host resolver config bind-mounted into every environment
    pub resolv_conf: PathBuf,
    /// Host variables copied verbatim into every new environment
    pub extra_env: Vec<String>,
}

impl Default for WorkEnvConfig {
    fn default() -> Self {
        Self {
            runtime: RuntimeChoice::Auto,
            default_image: "work-env".to_string(),
            default_name: "work-env".to_string(),
            resolv_conf: PathBuf::from("/etc/resolv.conf"),
            extra_env: vec!["DISPLAY".to_string()],
        }
    }
}

impl WorkEnvConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_runtime(mut self, runtime: RuntimeChoice) -> Self {
        self.runtime = runtime;
        self
    }

    pub fn with_default_image(mut self, image: impl Into<String>) -> Self {
        self.default_image = image.into();
        self
    }

    pub fn with_default_name(mut self, name: impl Into<String>) -> Self {
        self.default_name = name.into();
        self
    }

    pub fn with_resolv_conf(mut self, path: impl Into<PathBuf>) -> Self {
        self.resolv_conf = path.into();
        self
    }

    pub fn with_extra_env(mut self, vars: Vec<String>) -> Self {
        self.extra_env = vars;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.default_image.is_empty() {
            return Err("Default image cannot be empty".to_string());
        }

        if self.default_name.is_empty() {
            return Err("Default environment name cannot be empty".to_string());
        }

        if !self.resolv_conf.is_absolute() {
            return Err(format!(
                "Resolver config path must be absolute, got '{}'",
                self.resolv_conf.display()
            ));
        }

        if let Some(bad) = self
            .extra_env
            .iter()
            .find(|var| var.is_empty() || var.contains('='))
        {
            return Err(format!("Invalid environment variable name '{}'", bad));
        }

        Ok(())
    }

    /// Parse a TOML document
    pub fn from_toml(raw: &str) -> WorkEnvResult<Self> {
        let config: Self = toml::from_str(raw)
            .map_err(|e| WorkEnvError::Config(format!("Invalid config file: {}", e)))?;
        config.validate().map_err(WorkEnvError::Config)?;
        Ok(config)
    }

    /// Load configuration from `path`
    pub fn from_file(path: &Path) -> WorkEnvResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            WorkEnvError::Config(format!("Failed to read '{}': {}", path.display(), e))
        })?;
        Self::from_toml(&raw)
    }

    /// Load configuration the way the CLI does.
    ///
    /// An explicit path must exist. Otherwise `$WORK_ENV_CONFIG` is used if
    /// set, then the per-user default location if a file is there, then the
    /// built-in defaults. `$WORK_ENV_RUNTIME` overrides the runtime choice.
    pub fn load(explicit: Option<&Path>) -> WorkEnvResult<Self> {
        let mut config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => match std::env::var_os(CONFIG_ENV) {
                Some(path) => Self::from_file(Path::new(&path))?,
                None => match default_config_path().filter(|p| p.is_file()) {
                    Some(path) => Self::from_file(&path)?,
                    None => Self::default(),
                },
            },
        };

        if let Ok(runtime) = std::env::var(RUNTIME_ENV) {
            config.runtime = runtime.parse()?;
        }

        Ok(config)
    }
}

/// `$XDG_CONFIG_HOME/work-env/config.toml`, falling back to `~/.config`
pub fn default_config_path() -> Option<PathBuf> {
    let base = std::env::var_os("XDG_CONFIG_HOME")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))?;
    Some(base.join("work-env").join("config.toml"))
}
