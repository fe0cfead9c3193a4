//! In-memory container runtime used by the integration tests.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use work_env::{
    ContainerDetails, ContainerRuntime, ContainerSpec, ContainerSummary, HostContext,
    ImageDetails, ImageSummary, LabelFilter, RunOptions, RuntimeError, RuntimeResult,
};

#[derive(Default)]
struct State {
    containers: BTreeMap<String, ContainerDetails>,
    specs: BTreeMap<String, ContainerSpec>,
    images: BTreeMap<String, ImageDetails>,
    calls: Vec<String>,
    failures: HashSet<String>,
    next_id: usize,
    exit_code: i32,
}

/// Fake runtime that records every call.
///
/// Calls are recorded as `"<operation> <target>"`, e.g. `"create work"`.
/// Registering the same string with [`FakeRuntime::fail_on`] makes that call
/// fail; `"spawn <name>"` makes the interactive exec fail to start.
#[derive(Default)]
pub struct FakeRuntime {
    state: RefCell<State>,
}

pub fn owned_labels() -> BTreeMap<String, String> {
    BTreeMap::from([("app".to_string(), "work-env".to_string())])
}

pub fn labels(key: &str, value: &str) -> BTreeMap<String, String> {
    BTreeMap::from([(key.to_string(), value.to_string())])
}

fn image_key(name: &str) -> String {
    match name.rsplit_once(':') {
        Some((_, tag)) if !tag.contains('/') => name.to_string(),
        _ => format!("{}:latest", name),
    }
}

fn failed(call: &str) -> RuntimeError {
    RuntimeError::CommandFailed {
        command: call.to_string(),
        stderr: "injected failure".to_string(),
    }
}

impl FakeRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an existing, stopped container
    pub fn with_container(
        self,
        name: &str,
        image: &str,
        labels: BTreeMap<String, String>,
    ) -> Self {
        {
            let mut state = self.state.borrow_mut();
            state.next_id += 1;
            let id = format!("id-{}", state.next_id);
            state.containers.insert(
                name.to_string(),
                ContainerDetails {
                    id,
                    name: format!("/{}", name),
                    image: image.to_string(),
                    running: false,
                    path: "/usr/local/bin/entrypoint.sh".to_string(),
                    args: vec!["zsh".to_string()],
                    labels,
                },
            );
        }
        self
    }

    pub fn with_owned_container(self, name: &str, image: &str) -> Self {
        self.with_container(name, image, owned_labels())
    }

    pub fn with_image(self, name: &str, labels: BTreeMap<String, String>) -> Self {
        {
            let mut state = self.state.borrow_mut();
            let key = image_key(name);
            state.images.insert(
                key.clone(),
                ImageDetails {
                    id: format!("sha256:{}", key),
                    repo_tags: vec![key],
                    labels,
                },
            );
        }
        self
    }

    pub fn with_exit_code(self, code: i32) -> Self {
        self.state.borrow_mut().exit_code = code;
        self
    }

    pub fn fail_on(&self, call: &str) {
        self.state.borrow_mut().failures.insert(call.to_string());
    }

    pub fn set_running(&self, name: &str, running: bool) {
        if let Some(c) = self.state.borrow_mut().containers.get_mut(name) {
            c.running = running;
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.borrow().calls.clone()
    }

    /// Recorded calls that change runtime state or start a session
    pub fn mutations(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| !c.starts_with("inspect") && !c.starts_with("list"))
            .collect()
    }

    pub fn container(&self, name: &str) -> Option<ContainerDetails> {
        self.state.borrow().containers.get(name).cloned()
    }

    pub fn spec(&self, name: &str) -> Option<ContainerSpec> {
        self.state.borrow().specs.get(name).cloned()
    }

    pub fn has_image(&self, name: &str) -> bool {
        self.state.borrow().images.contains_key(&image_key(name))
    }

    pub fn container_names(&self) -> Vec<String> {
        self.state.borrow().containers.keys().cloned().collect()
    }

    fn record(&self, call: String) -> RuntimeResult<()> {
        let mut state = self.state.borrow_mut();
        state.calls.push(call.clone());
        if state.failures.contains(&call) {
            return Err(failed(&call));
        }
        Ok(())
    }
}

impl ContainerRuntime for FakeRuntime {
    fn name(&self) -> &str {
        "fake"
    }

    fn build_image(
        &self,
        _context: &Path,
        tag: &str,
        labels: &BTreeMap<String, String>,
    ) -> RuntimeResult<()> {
        self.record(format!("build {}", tag))?;
        let key = image_key(tag);
        self.state.borrow_mut().images.insert(
            key.clone(),
            ImageDetails {
                id: format!("sha256:{}", key),
                repo_tags: vec![key],
                labels: labels.clone(),
            },
        );
        Ok(())
    }

    fn list_images(&self, filter: &LabelFilter) -> RuntimeResult<Vec<ImageSummary>> {
        self.record("list images".to_string())?;
        Ok(self
            .state
            .borrow()
            .images
            .values()
            .filter(|i| filter.matches(&i.labels))
            .map(|i| ImageSummary {
                id: i.id.clone(),
                repo_tags: i.repo_tags.clone(),
            })
            .collect())
    }

    fn inspect_image(&self, name: &str) -> RuntimeResult<Option<ImageDetails>> {
        self.record(format!("inspect_image {}", name))?;
        Ok(self.state.borrow().images.get(&image_key(name)).cloned())
    }

    fn remove_image(&self, name: &str, _force: bool) -> RuntimeResult<()> {
        self.record(format!("remove_image {}", name))?;
        self.state.borrow_mut().images.remove(&image_key(name));
        Ok(())
    }

    fn create_container(&self, spec: &ContainerSpec) -> RuntimeResult<String> {
        self.record(format!("create {}", spec.name))?;
        let mut state = self.state.borrow_mut();
        if state.containers.contains_key(&spec.name) {
            return Err(RuntimeError::CommandFailed {
                command: format!("create {}", spec.name),
                stderr: format!(
                    "Conflict. The container name \"/{}\" is already in use",
                    spec.name
                ),
            });
        }
        state.next_id += 1;
        let id = format!("id-{}", state.next_id);
        state.containers.insert(
            spec.name.clone(),
            ContainerDetails {
                id: id.clone(),
                name: format!("/{}", spec.name),
                image: spec.image.clone(),
                running: false,
                path: "/usr/local/bin/entrypoint.sh".to_string(),
                args: vec!["zsh".to_string()],
                labels: spec.labels.clone(),
            },
        );
        state.specs.insert(spec.name.clone(), spec.clone());
        Ok(id)
    }

    fn start_container(&self, name: &str) -> RuntimeResult<()> {
        self.record(format!("start {}", name))?;
        match self.state.borrow_mut().containers.get_mut(name) {
            Some(c) => {
                c.running = true;
                Ok(())
            }
            None => Err(failed(&format!("start {}", name))),
        }
    }

    fn inspect_container(&self, name: &str) -> RuntimeResult<Option<ContainerDetails>> {
        self.record(format!("inspect_container {}", name))?;
        Ok(self.state.borrow().containers.get(name).cloned())
    }

    fn list_containers(&self, filter: &LabelFilter) -> RuntimeResult<Vec<ContainerSummary>> {
        self.record("list containers".to_string())?;
        Ok(self
            .state
            .borrow()
            .containers
            .values()
            .filter(|c| filter.matches(&c.labels))
            .map(|c| ContainerSummary {
                id: c.id.clone(),
                names: vec![c.name.clone()],
                image: c.image.clone(),
            })
            .collect())
    }

    fn remove_container(&self, name: &str, _force: bool) -> RuntimeResult<()> {
        self.record(format!("remove_container {}", name))?;
        self.state.borrow_mut().containers.remove(name);
        Ok(())
    }

    fn exec_interactive(&self, name: &str, command: &[String]) -> RuntimeResult<i32> {
        let spawn_key = format!("spawn {}", name);
        if self.state.borrow().failures.contains(&spawn_key) {
            self.state.borrow_mut().calls.push(spawn_key.clone());
            return Err(RuntimeError::Spawn {
                command: spawn_key,
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such binary"),
            });
        }
        self.record(format!("exec {} {}", name, command.join(" ")))?;
        Ok(self.state.borrow().exit_code)
    }
}

pub fn host() -> HostContext {
    HostContext {
        working_dir: "/home/dev/project".to_string(),
        shell: "/bin/zsh".to_string(),
        uid: 1000,
        username: "dev".to_string(),
        passthrough_env: vec![("DISPLAY".to_string(), ":0".to_string())],
    }
}

pub fn run_options(image: &str, name: &str, overwrite: bool, remove_after: bool) -> RunOptions {
    RunOptions {
        image: image.to_string(),
        name: name.to_string(),
        overwrite,
        remove_after,
        resolv_conf: PathBuf::from("/etc/resolv.conf"),
    }
}
