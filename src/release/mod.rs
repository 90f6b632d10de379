//! Model release resolution against a GitHub-style release feed.
//!
//! A [`ReleaseResolver`] is bound to one repository and one release tag
//! (a [`ReleaseSource`]). Resolving a model name fetches that release once
//! and picks the first asset whose name contains the requested name.

mod api;

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use log::debug;
use thiserror::Error;

use crate::http::HttpClient;
use crate::models::ModelRelease;

pub use api::{Asset, Release};

pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const DEFAULT_OWNER: &str = "zhongweili";
pub const DEFAULT_REPO: &str = "imagenie";
pub const DEFAULT_RELEASE_TAG: &str = "models-v0.1.0";

/// Failure to resolve a model to a downloadable asset.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// Network failure, non-success status or a body that is not a release.
    #[error("Failed to fetch release info from {url}")]
    ReleaseFetch {
        url: String,
        #[source]
        source: anyhow::Error,
    },
    /// The release was fetched but none of its assets matched.
    #[error("Model {model} not found in release {tag}")]
    ModelNotFound { model: String, tag: String },
}

/// Repository identifier (owner/repo format).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoId {
    pub owner: String,
    pub repo: String,
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

impl FromStr for RepoId {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('/') {
            Some((owner, repo)) if !owner.is_empty() && !repo.is_empty() && !repo.contains('/') => {
                Ok(RepoId {
                    owner: owner.to_string(),
                    repo: repo.to_string(),
                })
            }
            _ => anyhow::bail!("Invalid repository format. Expected 'owner/repo'."),
        }
    }
}

/// Where models are published: API host, repository and release tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseSource {
    pub api_url: String,
    pub repo: RepoId,
    pub tag: String,
}

impl Default for ReleaseSource {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            repo: RepoId {
                owner: DEFAULT_OWNER.to_string(),
                repo: DEFAULT_REPO.to_string(),
            },
            tag: DEFAULT_RELEASE_TAG.to_string(),
        }
    }
}

impl ReleaseSource {
    /// Metadata endpoint of the configured release.
    pub fn release_url(&self) -> String {
        format!(
            "{}/repos/{}/{}/releases/tags/{}",
            self.api_url.trim_end_matches('/'),
            self.repo.owner,
            self.repo.repo,
            self.tag
        )
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ResolveModel: Send + Sync {
    /// Resolves `model_name` to the first asset of the configured release
    /// whose name contains it.
    async fn resolve_model_release(&self, model_name: &str) -> Result<ModelRelease, ResolveError>;
}

pub struct ReleaseResolver {
    http_client: HttpClient,
    source: ReleaseSource,
}

impl ReleaseResolver {
    pub fn new(http_client: HttpClient, source: ReleaseSource) -> Self {
        Self {
            http_client,
            source,
        }
    }

    pub fn source(&self) -> &ReleaseSource {
        &self.source
    }

    /// Fetches and decodes the configured release.
    #[tracing::instrument(skip(self))]
    pub async fn fetch_release(&self) -> Result<Release, ResolveError> {
        let url = self.source.release_url();
        debug!("Fetching release {} from {}...", self.source.tag, url);

        self.http_client
            .get_json::<Release>(&url)
            .await
            .map_err(|source| ResolveError::ReleaseFetch { url, source })
    }
}

#[async_trait]
impl ResolveModel for ReleaseResolver {
    #[tracing::instrument(skip(self))]
    async fn resolve_model_release(&self, model_name: &str) -> Result<ModelRelease, ResolveError> {
        let release = self.fetch_release().await?;
        let model = release.select_model(model_name, &self.source.release_url())?;
        debug!(
            "Resolved {} to {} ({})",
            model_name, model.file_name, model.version
        );
        Ok(model)
    }
}
