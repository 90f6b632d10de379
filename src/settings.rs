//! User settings: release source, network behavior and model location.
//!
//! Settings are layered: built-in defaults, then `config/settings.json`
//! under the application directory, then `IMAGENIE_*` environment
//! variables. Command-line flags are applied last by the caller.

use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::http::RetryPolicy;
use crate::paths::AppPaths;
use crate::release::{
    DEFAULT_API_URL, DEFAULT_OWNER, DEFAULT_RELEASE_TAG, DEFAULT_REPO, ReleaseSource, RepoId,
};
use crate::runtime::Runtime;

pub const API_URL_ENV: &str = "IMAGENIE_API_URL";
pub const MODELS_REPO_ENV: &str = "IMAGENIE_MODELS_REPO";
pub const RELEASE_TAG_ENV: &str = "IMAGENIE_RELEASE_TAG";
pub const TIMEOUT_ENV: &str = "IMAGENIE_TIMEOUT_SECS";
pub const LANG_ENV: &str = "IMAGENIE_LANG";

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub api_url: String,
    pub owner: String,
    pub repo: String,
    pub release_tag: String,
    /// Request timeout, 0 disables it.
    pub timeout_secs: u64,
    /// Extra attempts when resolving a release. 0 means a single request.
    pub retries: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub models_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            owner: DEFAULT_OWNER.to_string(),
            repo: DEFAULT_REPO.to_string(),
            release_tag: DEFAULT_RELEASE_TAG.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            retries: 0,
            models_dir: None,
            locale: None,
        }
    }
}

impl Settings {
    /// Loads settings from the settings file (if any) and the environment.
    #[tracing::instrument(skip(runtime, paths))]
    pub fn load<R: Runtime>(runtime: &R, paths: &AppPaths) -> Result<Self> {
        let path = paths.settings_file();
        let mut settings = if runtime.exists(&path) {
            debug!("Loading settings from {:?}", path);
            let content = runtime.read_to_string(&path)?;
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse settings file {:?}", path))?
        } else {
            Settings::default()
        };
        settings.apply_env(runtime)?;
        Ok(settings)
    }

    fn apply_env<R: Runtime>(&mut self, runtime: &R) -> Result<()> {
        let var = |key: &str| runtime.env_var(key).ok().filter(|v| !v.is_empty());

        if let Some(url) = var(API_URL_ENV) {
            self.api_url = url;
        }
        if let Some(repo_str) = var(MODELS_REPO_ENV) {
            let repo: RepoId = repo_str
                .parse()
                .with_context(|| format!("Invalid {} value: {}", MODELS_REPO_ENV, repo_str))?;
            self.owner = repo.owner;
            self.repo = repo.repo;
        }
        if let Some(tag) = var(RELEASE_TAG_ENV) {
            self.release_tag = tag;
        }
        if let Some(secs) = var(TIMEOUT_ENV) {
            self.timeout_secs = secs
                .parse()
                .with_context(|| format!("Invalid {} value: {}", TIMEOUT_ENV, secs))?;
        }
        if let Some(lang) = var(LANG_ENV) {
            self.locale = Some(lang);
        }
        Ok(())
    }

    pub fn release_source(&self) -> Result<ReleaseSource> {
        if self.owner.is_empty() || self.repo.is_empty() || self.release_tag.is_empty() {
            anyhow::bail!("Release owner, repository and tag must not be empty");
        }
        Ok(ReleaseSource {
            api_url: self.api_url.clone(),
            repo: RepoId {
                owner: self.owner.clone(),
                repo: self.repo.clone(),
            },
            tag: self.release_tag.clone(),
        })
    }

    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }

    /// Retry policy for release lookups.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::with_retries(self.retries)
    }

    pub fn models_dir(&self, paths: &AppPaths) -> PathBuf {
        self.models_dir
            .clone()
            .unwrap_or_else(|| paths.models_dir())
    }
}
