use anyhow::{Context, Result};
use log::debug;
use std::path::{Path, PathBuf};

use crate::runtime::Runtime;

const APP_DIR: &str = ".imagenie";
const CONFIG_DIR: &str = "config";
const MODELS_DIR: &str = "models";
const SETTINGS_FILE: &str = "settings.json";
const STATE_FILE: &str = "state.json";

/// Environment variable overriding the application directory.
pub const HOME_ENV: &str = "IMAGENIE_HOME";

/// Layout of the application directory (`~/.imagenie` by default).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    root: PathBuf,
}

impl AppPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Picks the application directory: explicit override, then
    /// `IMAGENIE_HOME`, then `~/.imagenie`.
    #[tracing::instrument(skip(runtime))]
    pub fn resolve<R: Runtime>(runtime: &R, home_override: Option<PathBuf>) -> Result<Self> {
        let root = match home_override {
            Some(path) => path,
            None => match runtime.env_var(HOME_ENV) {
                Ok(path) if !path.is_empty() => PathBuf::from(path),
                _ => runtime
                    .home_dir()
                    .context("Could not find home directory")?
                    .join(APP_DIR),
            },
        };
        debug!("Using application directory {:?}", root);
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_dir(&self) -> PathBuf {
        self.root.join(CONFIG_DIR)
    }

    pub fn models_dir(&self) -> PathBuf {
        self.root.join(MODELS_DIR)
    }

    pub fn settings_file(&self) -> PathBuf {
        self.config_dir().join(SETTINGS_FILE)
    }

    pub fn state_file(&self) -> PathBuf {
        self.config_dir().join(STATE_FILE)
    }
}
