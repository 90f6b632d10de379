use anyhow::Result;
use std::path::Path;

use crate::{
    dist::{Platform, collect_outputs},
    runtime::Runtime,
};

/// Copy bundler outputs for `target` into `<project>/dist`
#[tracing::instrument(skip(runtime))]
pub fn dist<R: Runtime>(
    runtime: R,
    project: &Path,
    target: &str,
    app_name: &str,
    platform: Option<Platform>,
) -> Result<()> {
    let platform = platform.unwrap_or_else(Platform::current);
    let written = collect_outputs(&runtime, project, target, app_name, platform)?;
    if written.is_empty() {
        println!("No bundle outputs for {}.", platform);
    }
    for path in written {
        println!("{}", path.display());
    }
    Ok(())
}
