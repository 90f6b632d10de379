//! Release feed response types and asset selection.

use serde::Deserialize;

use super::ResolveError;
use crate::models::ModelRelease;

/// A release as returned by `GET /repos/{owner}/{repo}/releases/tags/{tag}`.
/// Does not contain all fields.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Release {
    pub tag_name: String,
    pub assets: Vec<Asset>,
}

/// A release's asset. Does not contain all fields.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Asset {
    pub name: String,
    pub browser_download_url: String,
}

impl Release {
    /// First asset, in published order, whose name contains `model_name`.
    pub fn find_asset(&self, model_name: &str) -> Option<&Asset> {
        if model_name.is_empty() {
            return None;
        }
        self.assets.iter().find(|asset| asset.name.contains(model_name))
    }

    /// Builds the descriptor for `model_name` out of this release.
    ///
    /// `release_url` is only used to label errors.
    pub fn select_model(
        &self,
        model_name: &str,
        release_url: &str,
    ) -> Result<ModelRelease, ResolveError> {
        let asset = self
            .find_asset(model_name)
            .ok_or_else(|| ResolveError::ModelNotFound {
                model: model_name.to_string(),
                tag: self.tag_name.clone(),
            })?;

        if asset.browser_download_url.is_empty() {
            return Err(ResolveError::ReleaseFetch {
                url: release_url.to_string(),
                source: anyhow::anyhow!("Asset {} has an empty download URL", asset.name),
            });
        }

        Ok(ModelRelease {
            version: self.tag_name.clone(),
            url: asset.browser_download_url.clone(),
            file_name: asset.name.clone(),
        })
    }
}
