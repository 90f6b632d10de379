//! Local model directory.

mod manifest;

use anyhow::{Result, bail};
use std::path::{Component, Path, PathBuf};

use crate::runtime::Runtime;

pub use manifest::{MANIFEST_FILE, ManifestEntry, ModelManifest};

/// Models stored as plain files in one directory, next to a manifest.
pub struct ModelStore<'a, R: Runtime> {
    runtime: &'a R,
    dir: PathBuf,
}

impl<'a, R: Runtime> ModelStore<'a, R> {
    pub fn new(runtime: &'a R, dir: PathBuf) -> Self {
        Self { runtime, dir }
    }

    pub fn runtime(&self) -> &'a R {
        self.runtime
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path a model with the given published name is stored at.
    ///
    /// Rejects names that would escape the models directory.
    pub fn path_of(&self, file_name: &str) -> Result<PathBuf> {
        let mut components = Path::new(file_name).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => Ok(self.dir.join(file_name)),
            _ => bail!("Invalid model file name: {:?}", file_name),
        }
    }

    pub fn is_installed(&self, file_name: &str) -> bool {
        match self.path_of(file_name) {
            Ok(path) => self.runtime.exists(&path) && !self.runtime.is_dir(&path),
            Err(_) => false,
        }
    }

    /// Names from `file_names` that are not installed, in input order.
    pub fn missing<'n>(&self, file_names: &[&'n str]) -> Vec<&'n str> {
        file_names
            .iter()
            .copied()
            .filter(|name| !self.is_installed(name))
            .collect()
    }

    pub fn ensure_dir(&self) -> Result<()> {
        if !self.runtime.exists(&self.dir) {
            self.runtime.create_dir_all(&self.dir)?;
        }
        Ok(())
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.dir.join(MANIFEST_FILE)
    }

    pub fn load_manifest(&self) -> ModelManifest {
        ModelManifest::load(self.runtime, &self.manifest_path())
    }
}
