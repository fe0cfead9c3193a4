//! Command-line backed [`ContainerRuntime`].
//!
//! Drives the `docker` or `podman` binary with [`std::process::Command`].
//! Listings go through `ps -q`/`images -q` followed by one batched
//! `inspect`, so names and tags come back exactly as the runtime stores them.

use crate::config::RuntimeChoice;
use crate::runtime::{
    ContainerDetails, ContainerRuntime, ContainerSpec, ContainerSummary, ImageDetails,
    ImageSummary, LabelFilter, RuntimeError, RuntimeResult,
};
use image_builder::ImageBuildConfig;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::io::IsTerminal;
use std::path::Path;
use std::process::{Command, Stdio};
use tracing::debug;

/// Container runtime types supported
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeKind {
    /// Podman container runtime
    Podman,
    /// Docker container runtime
    Docker,
    /// No container runtime available
    None,
}

impl RuntimeKind {
    /// Get the command name for this runtime
    pub fn command(&self) -> &'static str {
        match self {
            RuntimeKind::Podman => "podman",
            RuntimeKind::Docker => "docker",
            RuntimeKind::None => "",
        }
    }

    /// Check if this runtime is available
    pub fn is_available(&self) -> bool {
        matches!(self, RuntimeKind::Podman | RuntimeKind::Docker)
    }

    fn probe(&self) -> bool {
        self.is_available()
            && Command::new(self.command())
                .arg("--version")
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status()
                .is_ok_and(|status| status.success())
    }
}

/// Detect an available container runtime honoring the configured choice.
///
/// An explicit choice is returned as-is when its binary answers
/// `--version`. `Auto` tries Docker first, then Podman.
pub fn detect_runtime(choice: RuntimeChoice) -> RuntimeKind {
    let candidates: &[RuntimeKind] = match choice {
        RuntimeChoice::Docker => &[RuntimeKind::Docker],
        RuntimeChoice::Podman => &[RuntimeKind::Podman],
        RuntimeChoice::Auto => &[RuntimeKind::Docker, RuntimeKind::Podman],
    };

    candidates
        .iter()
        .find(|kind| kind.probe())
        .cloned()
        .unwrap_or(RuntimeKind::None)
}

/// Runtime client that shells out to the runtime binary
#[derive(Debug, Clone)]
pub struct CliRuntime {
    binary: String,
}

impl CliRuntime {
    /// Create a client for an available runtime
    pub fn new(kind: RuntimeKind) -> RuntimeResult<Self> {
        if !kind.is_available() {
            return Err(RuntimeError::NoRuntimeAvailable);
        }
        Ok(Self {
            binary: kind.command().to_string(),
        })
    }

    fn command_line(&self, args: &[String]) -> String {
        format!("{} {}", self.binary, args.join(" "))
    }

    /// Run the binary with captured output and return its stdout
    fn run(&self, args: &[String]) -> RuntimeResult<String> {
        let command = self.command_line(args);
        debug!("Running: {}", command);

        let output = Command::new(&self.binary)
            .args(args)
            .output()
            .map_err(|source| RuntimeError::Spawn {
                command: command.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(RuntimeError::CommandFailed {
                command,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        String::from_utf8(output.stdout)
            .map_err(|e| RuntimeError::Parse(format!("Invalid UTF-8 in runtime output: {}", e)))
    }

    /// Like [`Self::run`], but a "no such object" failure becomes `Ok(None)`
    fn run_inspect(&self, args: &[String]) -> RuntimeResult<Option<String>> {
        match self.run(args) {
            Ok(stdout) => Ok(Some(stdout)),
            Err(RuntimeError::CommandFailed { stderr, .. }) if is_not_found(&stderr) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Ids printed one per line by `ps -q` / `images -q`, deduplicated
    fn list_ids(&self, args: &[String]) -> RuntimeResult<Vec<String>> {
        let stdout = self.run(args)?;
        let mut ids: Vec<String> = Vec::new();
        for id in stdout.lines().map(str::trim).filter(|l| !l.is_empty()) {
            if !ids.iter().any(|seen| seen == id) {
                ids.push(id.to_string());
            }
        }
        Ok(ids)
    }
}

fn strings<const N: usize>(args: [&str; N]) -> Vec<String> {
    args.iter().map(|s| s.to_string()).collect()
}

fn is_not_found(stderr: &str) -> bool {
    let stderr = stderr.to_lowercase();
    stderr.contains("no such") || stderr.contains("not known") || stderr.contains("not found")
}

/// Arguments for `<runtime> create` reproducing `spec`
pub fn create_args(spec: &ContainerSpec) -> Vec<String> {
    let mut args = strings(["create", "--name"]);
    args.push(spec.name.clone());
    args.push("--hostname".to_string());
    args.push(spec.hostname.clone());
    args.push("--workdir".to_string());
    args.push(spec.working_dir.clone());

    for (enabled, stream) in [
        (spec.attach_stdin, "stdin"),
        (spec.attach_stdout, "stdout"),
        (spec.attach_stderr, "stderr"),
    ] {
        if enabled {
            args.push("--attach".to_string());
            args.push(stream.to_string());
        }
    }
    if spec.open_stdin {
        args.push("--interactive".to_string());
    }
    if spec.tty {
        args.push("--tty".to_string());
    }

    args.push("--network".to_string());
    args.push(spec.network_mode.as_str().to_string());

    for mount in &spec.mounts {
        args.push("--mount".to_string());
        args.push(format!(
            "type=bind,source={},target={}",
            mount.source, mount.target
        ));
    }

    for (key, value) in &spec.env {
        args.push("--env".to_string());
        args.push(format!("{}={}", key, value));
    }

    for (key, value) in &spec.labels {
        args.push("--label".to_string());
        args.push(format!("{}={}", key, value));
    }

    args.push(spec.image.clone());
    args
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawContainer {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    path: String,
    #[serde(default)]
    args: Option<Vec<String>>,
    #[serde(default)]
    state: Option<RawState>,
    #[serde(default)]
    config: Option<RawConfig>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawState {
    #[serde(default)]
    running: bool,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "PascalCase")]
struct RawConfig {
    #[serde(default)]
    image: String,
    #[serde(default)]
    labels: Option<BTreeMap<String, String>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawImage {
    id: String,
    #[serde(default)]
    repo_tags: Option<Vec<String>>,
    #[serde(default)]
    config: Option<RawConfig>,
    /// Podman also reports labels at the top level
    #[serde(default)]
    labels: Option<BTreeMap<String, String>>,
}

/// Parse the JSON array printed by `<runtime> container inspect`
pub fn parse_container_inspect(json: &str) -> RuntimeResult<Vec<ContainerDetails>> {
    if json.trim().is_empty() {
        return Ok(Vec::new());
    }

    let raw: Vec<RawContainer> = serde_json::from_str(json)
        .map_err(|e| RuntimeError::Parse(format!("Failed to parse inspect JSON: {}", e)))?;

    Ok(raw
        .into_iter()
        .map(|c| {
            let config = c.config.unwrap_or_default();
            ContainerDetails {
                id: c.id,
                name: c.name,
                image: config.image,
                running: c.state.is_some_and(|s| s.running),
                path: c.path,
                args: c.args.unwrap_or_default(),
                labels: config.labels.unwrap_or_default(),
            }
        })
        .collect())
}

/// Parse the JSON array printed by `<runtime> image inspect`
pub fn parse_image_inspect(json: &str) -> RuntimeResult<Vec<ImageDetails>> {
    if json.trim().is_empty() {
        return Ok(Vec::new());
    }

    let raw: Vec<RawImage> = serde_json::from_str(json)
        .map_err(|e| RuntimeError::Parse(format!("Failed to parse image inspect JSON: {}", e)))?;

    Ok(raw
        .into_iter()
        .map(|i| {
            let labels = i
                .config
                .and_then(|config| config.labels)
                .or(i.labels)
                .unwrap_or_default();
            ImageDetails {
                id: i.id,
                repo_tags: i.repo_tags.unwrap_or_default(),
                labels,
            }
        })
        .collect())
}

impl ContainerRuntime for CliRuntime {
    fn name(&self) -> &str {
        &self.binary
    }

    fn build_image(
        &self,
        context: &Path,
        tag: &str,
        labels: &BTreeMap<String, String>,
    ) -> RuntimeResult<()> {
        let mut config = ImageBuildConfig::new(self.binary.clone(), context, tag);
        for (key, value) in labels {
            config = config.with_label(key.clone(), value.clone());
        }
        image_builder::build_image(&config)?;
        Ok(())
    }

    fn list_images(&self, filter: &LabelFilter) -> RuntimeResult<Vec<ImageSummary>> {
        let mut args = strings(["images", "--quiet", "--no-trunc", "--filter"]);
        args.push(filter.to_filter_arg());
        let ids = self.list_ids(&args)?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut args = strings(["image", "inspect"]);
        args.extend(ids);
        let images = parse_image_inspect(&self.run(&args)?)?;

        Ok(images
            .into_iter()
            .map(|image| ImageSummary {
                id: image.id,
                repo_tags: image.repo_tags,
            })
            .collect())
    }

    fn inspect_image(&self, name: &str) -> RuntimeResult<Option<ImageDetails>> {
        let Some(stdout) = self.run_inspect(&strings(["image", "inspect", name]))? else {
            return Ok(None);
        };
        Ok(parse_image_inspect(&stdout)?.into_iter().next())
    }

    fn remove_image(&self, name: &str, force: bool) -> RuntimeResult<()> {
        let mut args = strings(["rmi"]);
        if force {
            args.push("--force".to_string());
        }
        args.push(name.to_string());
        self.run(&args)?;
        Ok(())
    }

    fn create_container(&self, spec: &ContainerSpec) -> RuntimeResult<String> {
        let stdout = self.run(&create_args(spec))?;
        Ok(stdout.trim().to_string())
    }

    fn start_container(&self, name: &str) -> RuntimeResult<()> {
        self.run(&strings(["start", name]))?;
        Ok(())
    }

    fn inspect_container(&self, name: &str) -> RuntimeResult<Option<ContainerDetails>> {
        let Some(stdout) = self.run_inspect(&strings(["container", "inspect", name]))? else {
            return Ok(None);
        };
        Ok(parse_container_inspect(&stdout)?.into_iter().next())
    }

    fn list_containers(&self, filter: &LabelFilter) -> RuntimeResult<Vec<ContainerSummary>> {
        let mut args = strings(["ps", "--all", "--quiet", "--no-trunc", "--filter"]);
        args.push(filter.to_filter_arg());
        let ids = self.list_ids(&args)?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut args = strings(["container", "inspect"]);
        args.extend(ids);
        let containers = parse_container_inspect(&self.run(&args)?)?;

        Ok(containers
            .into_iter()
            .map(|c| ContainerSummary {
                id: c.id,
                names: vec![c.name],
                image: c.image,
            })
            .collect())
    }

    fn remove_container(&self, name: &str, force: bool) -> RuntimeResult<()> {
        let mut args = strings(["rm"]);
        if force {
            args.push("--force".to_string());
        }
        args.push(name.to_string());
        self.run(&args)?;
        Ok(())
    }

    fn exec_interactive(&self, name: &str, command: &[String]) -> RuntimeResult<i32> {
        let mut args = strings(["exec", "--interactive"]);
        if std::io::stdin().is_terminal() {
            args.push("--tty".to_string());
        }
        args.push(name.to_string());
        args.extend(command.iter().cloned());

        let command_line = self.command_line(&args);
        debug!("Running interactive session: {}", command_line);

        let status = Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map_err(|source| RuntimeError::Spawn {
                command: command_line,
                source,
            })?;

        Ok(status.code().unwrap_or(-1))
    }
}
