//! Persisted front-end state: the active function, selected input files
//! and per-function settings.
//!
//! The state is a plain value owned by the caller and saved explicitly;
//! nothing here is global.

use anyhow::{Context, Result, bail};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::runtime::Runtime;

/// Image function a view is dedicated to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Function {
    #[default]
    #[serde(rename = "compress")]
    Compress,
    #[serde(rename = "repair")]
    Repair,
    #[serde(rename = "removebg")]
    RemoveBg,
}

impl Function {
    pub const ALL: [Function; 3] = [Function::Compress, Function::Repair, Function::RemoveBg];

    pub fn route(&self) -> &'static str {
        match self {
            Function::Compress => "/compress",
            Function::Repair => "/repair",
            Function::RemoveBg => "/remove-bg",
        }
    }

    /// Maps a view route to its function; `/` lands on compression.
    pub fn from_route(route: &str) -> Option<Function> {
        match route.trim_end_matches('/') {
            "" => Some(Function::default()),
            route => Function::ALL.into_iter().find(|f| f.route() == route),
        }
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Function::Compress => write!(f, "compress"),
            Function::Repair => write!(f, "repair"),
            Function::RemoveBg => write!(f, "removebg"),
        }
    }
}

impl FromStr for Function {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "compress" => Ok(Function::Compress),
            "repair" => Ok(Function::Repair),
            "removebg" | "remove-bg" => Ok(Function::RemoveBg),
            _ => bail!(
                "Unknown function: {}. Expected compress, repair or remove-bg.",
                s
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompressSettings {
    pub quality: u8,
}

impl Default for CompressSettings {
    fn default() -> Self {
        Self { quality: 80 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepairSettings {
    pub intensity: u8,
}

impl Default for RepairSettings {
    fn default() -> Self {
        Self { intensity: 5 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveBgSettings {
    pub preserve_details: bool,
}

impl Default for RemoveBgSettings {
    fn default() -> Self {
        Self {
            preserve_details: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FunctionSettings {
    pub compress: CompressSettings,
    pub repair: RepairSettings,
    #[serde(rename = "removebg")]
    pub remove_bg: RemoveBgSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AppState {
    pub active_function: Function,
    pub files: Vec<PathBuf>,
    pub function_settings: FunctionSettings,
}

impl AppState {
    /// Loads the state, starting fresh when no state was saved yet.
    #[tracing::instrument(skip(runtime))]
    pub fn load<R: Runtime>(runtime: &R, path: &Path) -> Result<Self> {
        if !runtime.exists(path) {
            debug!("No saved state at {:?}", path);
            return Ok(AppState::default());
        }
        let content = runtime.read_to_string(path)?;
        serde_json::from_str(&content).with_context(|| format!("Failed to parse state file {:?}", path))
    }

    #[tracing::instrument(skip(self, runtime))]
    pub fn save<R: Runtime>(&self, runtime: &R, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            runtime.create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        runtime
            .write(path, json.as_bytes())
            .with_context(|| format!("Failed to write state file {:?}", path))
    }

    pub fn set_active_function(&mut self, function: Function) {
        self.active_function = function;
    }

    /// Appends files after the ones already selected.
    pub fn add_files<I: IntoIterator<Item = PathBuf>>(&mut self, files: I) {
        self.files.extend(files);
    }

    pub fn clear_files(&mut self) {
        self.files.clear();
    }

    /// Updates one setting addressed as `<function>.<name>`.
    pub fn set_setting(&mut self, key: &str, value: &str) -> Result<()> {
        let settings = &mut self.function_settings;
        match key {
            "compress.quality" => settings.compress.quality = parse_in_range(key, value, 1, 100)?,
            "repair.intensity" => settings.repair.intensity = parse_in_range(key, value, 1, 10)?,
            "removebg.preserveDetails" | "remove-bg.preserve-details" => {
                settings.remove_bg.preserve_details = value
                    .parse()
                    .with_context(|| format!("{} expects true or false, got {}", key, value))?
            }
            _ => bail!(
                "Unknown setting: {}. Expected compress.quality, repair.intensity or removebg.preserveDetails.",
                key
            ),
        }
        Ok(())
    }
}

fn parse_in_range(key: &str, value: &str, min: u8, max: u8) -> Result<u8> {
    let parsed: u8 = value
        .parse()
        .with_context(|| format!("{} expects a number, got {}", key, value))?;
    if !(min..=max).contains(&parsed) {
        bail!("{} must be between {} and {}, got {}", key, min, max, parsed);
    }
    Ok(parsed)
}
