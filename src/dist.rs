//! Collects bundler outputs into `dist/` under release-friendly names.

use anyhow::{Result, bail};
use log::{debug, warn};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::runtime::Runtime;

const DIST_DIR: &str = "dist";

type Outputs = &'static [(&'static str, &'static [&'static str])];

const MACOS_OUTPUTS: Outputs = &[("dmg", &[".dmg"])];
const WINDOWS_OUTPUTS: Outputs = &[("nsis", &[".exe"])];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    MacOs,
    Windows,
    Linux,
}

impl Platform {
    pub fn current() -> Platform {
        if cfg!(target_os = "macos") {
            Platform::MacOs
        } else if cfg!(target_os = "windows") {
            Platform::Windows
        } else {
            Platform::Linux
        }
    }

    /// Bundle sub-directories and the file suffixes collected from each.
    pub fn outputs(&self) -> Outputs {
        match self {
            Platform::MacOs => MACOS_OUTPUTS,
            Platform::Windows => WINDOWS_OUTPUTS,
            Platform::Linux => &[],
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::MacOs => write!(f, "macos"),
            Platform::Windows => write!(f, "windows"),
            Platform::Linux => write!(f, "linux"),
        }
    }
}

impl FromStr for Platform {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "macos" | "darwin" => Ok(Platform::MacOs),
            "windows" | "win32" => Ok(Platform::Windows),
            "linux" => Ok(Platform::Linux),
            _ => bail!("Unknown platform: {}. Expected macos, windows or linux.", s),
        }
    }
}

/// Bundle directory produced for `target` inside `project`.
pub fn bundle_dir(project: &Path, target: &str) -> PathBuf {
    project
        .join("src-tauri")
        .join("target")
        .join(target)
        .join("release")
        .join("bundle")
}

/// Copies every bundle output of `platform` to `dist/<app_name><suffix>`.
///
/// Returns the written paths. Missing bundle directories are skipped.
#[tracing::instrument(skip(runtime))]
pub fn collect_outputs<R: Runtime>(
    runtime: &R,
    project: &Path,
    target: &str,
    app_name: &str,
    platform: Platform,
) -> Result<Vec<PathBuf>> {
    if app_name.is_empty() || app_name.contains(['/', '\\']) {
        bail!("Invalid application name: {:?}", app_name);
    }

    let bundle = bundle_dir(project, target);
    let dist = project.join(DIST_DIR);
    let mut written = Vec::new();

    for (dir, suffixes) in platform.outputs() {
        let source_dir = bundle.join(dir);
        if !runtime.is_dir(&source_dir) {
            warn!("Bundle directory {:?} does not exist, skipping", source_dir);
            continue;
        }

        for file in runtime.read_dir(&source_dir)? {
            let Some(file_name) = file.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let Some(suffix) = suffixes.iter().find(|s| file_name.ends_with(*s)) else {
                debug!("Ignoring bundle output {:?}", file);
                continue;
            };

            if !runtime.exists(&dist) {
                runtime.create_dir_all(&dist)?;
            }
            let dest = dist.join(format!("{}{}", app_name, suffix));
            runtime.copy(&file, &dest)?;
            written.push(dest);
        }
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{MockRuntime, RealRuntime};
    use mockall::predicate::eq;

    #[test]
    fn test_bundle_dir() {
        assert_eq!(
            bundle_dir(Path::new("/p"), "aarch64-apple-darwin"),
            PathBuf::from("/p/src-tauri/target/aarch64-apple-darwin/release/bundle")
        );
    }

    #[test]
    fn test_platform_parse() {
        assert_eq!("darwin".parse::<Platform>().unwrap(), Platform::MacOs);
        assert_eq!("win32".parse::<Platform>().unwrap(), Platform::Windows);
        assert!("beos".parse::<Platform>().is_err());
    }

    #[test]
    fn test_collect_macos_outputs() {
        let project = tempfile::tempdir().unwrap();
        let dmg_dir = bundle_dir(project.path(), "universal-apple-darwin").join("dmg");
        std::fs::create_dir_all(&dmg_dir).unwrap();
        std::fs::write(dmg_dir.join("Imagenie_0.1.0_universal.dmg"), b"dmg").unwrap();
        std::fs::write(dmg_dir.join("bundle_dmg.sh"), b"#!/bin/sh").unwrap();

        let written = collect_outputs(
            &RealRuntime,
            project.path(),
            "universal-apple-darwin",
            "Imagenie_macos_universal",
            Platform::MacOs,
        )
        .unwrap();

        let expected = project.path().join("dist/Imagenie_macos_universal.dmg");
        assert_eq!(written, vec![expected.clone()]);
        assert_eq!(std::fs::read(expected).unwrap(), b"dmg");
    }

    #[test]
    fn test_missing_bundle_dir_is_skipped() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_is_dir()
            .with(eq(PathBuf::from(
                "/p/src-tauri/target/x86_64-pc-windows-msvc/release/bundle/nsis",
            )))
            .returning(|_| false);

        let written = collect_outputs(
            &runtime,
            Path::new("/p"),
            "x86_64-pc-windows-msvc",
            "Imagenie",
            Platform::Windows,
        )
        .unwrap();
        assert!(written.is_empty());
    }

    #[test]
    fn test_linux_collects_nothing() {
        // No expectations: no file system access at all
        let runtime = MockRuntime::new();
        let written = collect_outputs(
            &runtime,
            Path::new("/p"),
            "x86_64-unknown-linux-gnu",
            "Imagenie",
            Platform::Linux,
        )
        .unwrap();
        assert!(written.is_empty());
    }

    #[test]
    fn test_invalid_app_name() {
        let runtime = MockRuntime::new();
        assert!(collect_outputs(&runtime, Path::new("/p"), "t", "../x", Platform::MacOs).is_err());
        assert!(collect_outputs(&runtime, Path::new("/p"), "t", "", Platform::MacOs).is_err());
    }
}
