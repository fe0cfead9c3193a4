//! Listing work-env images and environments.

use std::io::Write;

use crate::error::{WorkEnvError, WorkEnvResult};
use crate::ownership;
use crate::runtime::{ContainerRuntime, ContainerSummary, ImageSummary};

/// Narrowest the environment name column is ever rendered
pub const MIN_NAME_WIDTH: usize = 19;

/// Repository the runtime reports for untagged images
const NO_NAME: &str = "<none>";

/// Display form of a `repo:tag` pair; `None` for the runtime's no-name sentinel
pub fn format_repo_tag(repo_tag: &str) -> Option<String> {
    // A ':' before the last '/' belongs to a registry port, not a tag
    let (repo, tag) = match repo_tag.rsplit_once(':') {
        Some((repo, tag)) if !tag.contains('/') => (repo, Some(tag)),
        _ => (repo_tag, None),
    };

    if repo == NO_NAME {
        return None;
    }

    match tag {
        None | Some("latest") => Some(repo.to_string()),
        Some(tag) => Some(format!("{}:{}", repo, tag)),
    }
}

/// One output line per displayable image name
pub fn image_lines(images: &[ImageSummary]) -> Vec<String> {
    let mut lines = Vec::new();
    for image in images {
        if image.repo_tags.is_empty() {
            lines.push(image.id.clone());
            continue;
        }
        lines.extend(image.repo_tags.iter().filter_map(|t| format_repo_tag(t)));
    }
    lines
}

/// Environment name as shown to users: one leading `/` removed, no more
pub fn display_name(raw: &str) -> &str {
    raw.strip_prefix('/').unwrap_or(raw)
}

/// Column-aligned `name  image` rows, empty when there are no containers
pub fn container_lines(containers: &[ContainerSummary]) -> Vec<String> {
    let rows: Vec<(&str, &str)> = containers
        .iter()
        .map(|c| {
            let name = c
                .names
                .first()
                .map(|n| display_name(n))
                .unwrap_or(c.id.as_str());
            (name, c.image.as_str())
        })
        .collect();

    let width = rows
        .iter()
        .map(|(name, _)| name.len())
        .max()
        .unwrap_or(0)
        .max(MIN_NAME_WIDTH);

    rows.into_iter()
        .map(|(name, image)| format!("{:<width$}  {}", name, image, width = width))
        .collect()
}

/// Print every work-env image
pub fn list_images(runtime: &dyn ContainerRuntime, out: &mut dyn Write) -> WorkEnvResult<()> {
    let images = runtime
        .list_images(&ownership::filter())
        .map_err(|e| WorkEnvError::runtime("list images", e))?;
    write_lines(out, &image_lines(&images))
}

/// Print every work-env environment with its source image
pub fn list_containers(
    runtime: &dyn ContainerRuntime,
    out: &mut dyn Write,
) -> WorkEnvResult<()> {
    let containers = runtime
        .list_containers(&ownership::filter())
        .map_err(|e| WorkEnvError::runtime("list containers", e))?;
    write_lines(out, &container_lines(&containers))
}

fn write_lines(out: &mut dyn Write, lines: &[String]) -> WorkEnvResult<()> {
    for line in lines {
        writeln!(out, "{}", line).map_err(WorkEnvError::Output)?;
    }
    out.flush().map_err(WorkEnvError::Output)
}
