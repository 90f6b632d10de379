//! Concurrent model downloads into the [`ModelStore`].

use anyhow::{Context, Result};
use chrono::Utc;
use futures_util::future::join_all;
use log::{info, warn};
use serde::Serialize;
use std::path::PathBuf;

use crate::http::HttpClient;
use crate::models::ModelRelease;
use crate::runtime::Runtime;
use crate::store::ModelStore;

/// Progress of one model within a batch download.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadProgress {
    pub model_name: String,
    pub downloaded: u64,
    pub total: Option<u64>,
    /// Percentage of this model, 0 when the size is unknown.
    pub progress: f64,
    /// Percentage of the whole batch.
    pub total_progress: f64,
}

impl DownloadProgress {
    fn new(model_name: &str, index: usize, count: usize, downloaded: u64, total: Option<u64>) -> Self {
        let progress = match total {
            Some(total) if total > 0 => (downloaded as f64 / total as f64 * 100.0).min(100.0),
            _ => 0.0,
        };
        let total_progress = (index as f64 * 100.0 + progress) / count.max(1) as f64;
        Self {
            model_name: model_name.to_string(),
            downloaded,
            total,
            progress,
            total_progress,
        }
    }
}

pub struct ModelDownloader<'a, R: Runtime> {
    store: ModelStore<'a, R>,
    http_client: HttpClient,
}

impl<'a, R: Runtime> ModelDownloader<'a, R> {
    pub fn new(store: ModelStore<'a, R>, http_client: HttpClient) -> Self {
        Self { store, http_client }
    }

    pub fn store(&self) -> &ModelStore<'a, R> {
        &self.store
    }

    /// Downloads every release concurrently, then records the finished ones
    /// in the manifest.
    ///
    /// Returns the installed paths in input order. Every download runs to
    /// completion; models that finished stay installed even when another one
    /// fails, and the first failure is returned.
    #[tracing::instrument(skip(self, releases, on_progress))]
    pub async fn download_models(
        &self,
        releases: &[ModelRelease],
        on_progress: &(dyn Fn(&DownloadProgress) + Send + Sync),
    ) -> Result<Vec<PathBuf>> {
        if releases.is_empty() {
            return Ok(Vec::new());
        }

        self.store.ensure_dir()?;

        let count = releases.len();
        let results = join_all(
            releases
                .iter()
                .enumerate()
                .map(|(index, release)| self.download_one(release, index, count, on_progress)),
        )
        .await;

        let mut installed = Vec::with_capacity(count);
        let mut first_error = None;
        for (release, result) in releases.iter().zip(results) {
            match result {
                Ok(path) => installed.push((release, path)),
                Err(e) => {
                    warn!("{:#}", e);
                    first_error.get_or_insert(e);
                }
            }
        }

        if !installed.is_empty() {
            let mut manifest = self.store.load_manifest();
            let now = Utc::now();
            for (release, _) in &installed {
                manifest.record(release, now);
            }
            manifest.save(self.store.runtime(), &self.store.manifest_path())?;
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(installed.into_iter().map(|(_, path)| path).collect()),
        }
    }

    async fn download_one(
        &self,
        release: &ModelRelease,
        index: usize,
        count: usize,
        on_progress: &(dyn Fn(&DownloadProgress) + Send + Sync),
    ) -> Result<PathBuf> {
        let runtime = self.store.runtime();
        let target = self.store.path_of(&release.file_name)?;
        let part = self.store.path_of(&format!("{}.part", release.file_name))?;

        info!("Downloading {} from {}...", release.file_name, release.url);

        let result = self
            .http_client
            .download_file(
                &release.url,
                || runtime.create_file(&part),
                |downloaded, total| {
                    on_progress(&DownloadProgress::new(
                        &release.file_name,
                        index,
                        count,
                        downloaded,
                        total,
                    ))
                },
            )
            .await
            .and_then(|_| runtime.rename(&part, &target));

        if let Err(e) = result {
            if runtime.exists(&part) {
                if let Err(cleanup) = runtime.remove_file(&part) {
                    warn!("Failed to remove partial download {:?}: {}", part, cleanup);
                }
            }
            return Err(e).with_context(|| format!("Failed to download {}", release.file_name));
        }

        info!("Download completed for model: {}", release.file_name);
        Ok(target)
    }
}
