//! Building environment images.

use std::path::Path;
use tracing::info;

use crate::error::{WorkEnvError, WorkEnvResult};
use crate::ownership;
use crate::runtime::ContainerRuntime;

/// Build the image `image` from build context `path`, stamped with the
/// ownership label. Build output goes straight to the terminal.
pub fn build(runtime: &dyn ContainerRuntime, path: &Path, image: &str) -> WorkEnvResult<()> {
    info!("Building image '{}' from {}", image, path.display());

    runtime
        .build_image(path, image, &ownership::labels())
        .map_err(|e| WorkEnvError::runtime(format!("build image '{}'", image), e))
}
