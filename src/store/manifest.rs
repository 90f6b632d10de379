//! `version.json`: which release each installed model came from.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::models::ModelRelease;
use crate::runtime::Runtime;

pub const MANIFEST_FILE: &str = "version.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestEntry {
    pub version: String,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ModelManifest {
    #[serde(default)]
    pub models: BTreeMap<String, ManifestEntry>,
}

impl ModelManifest {
    /// Loads the manifest. A missing or unreadable manifest is treated as empty.
    #[tracing::instrument(skip(runtime))]
    pub fn load<R: Runtime>(runtime: &R, path: &Path) -> ModelManifest {
        if !runtime.exists(path) {
            return ModelManifest::default();
        }
        let parsed = runtime
            .read_to_string(path)
            .and_then(|content| serde_json::from_str(&content).map_err(anyhow::Error::from));
        match parsed {
            Ok(manifest) => manifest,
            Err(e) => {
                warn!("Ignoring unreadable model manifest {:?}: {}", path, e);
                ModelManifest::default()
            }
        }
    }

    #[tracing::instrument(skip(self, runtime))]
    pub fn save<R: Runtime>(&self, runtime: &R, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        runtime
            .write(path, json.as_bytes())
            .with_context(|| format!("Failed to write model manifest {:?}", path))
    }

    pub fn record(&mut self, release: &ModelRelease, at: DateTime<Utc>) {
        self.models.insert(
            release.file_name.clone(),
            ManifestEntry {
                version: release.version.clone(),
                last_updated: at,
            },
        );
    }

    pub fn version_of(&self, file_name: &str) -> Option<&str> {
        self.models.get(file_name).map(|e| e.version.as_str())
    }
}
