//! Model catalog and the resolved release descriptor.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub const FACE_RESTORATION_MODEL: &str = "face_restoration.onnx";
pub const IMAGE_UPSCALING_MODEL: &str = "image_upscaling.onnx";
pub const BACKGROUND_REMOVAL_MODEL: &str = "background_removal.onnx";

/// A downloadable model asset resolved from a release.
///
/// Only ever constructed from a matched asset, so `url` and `file_name`
/// are non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelRelease {
    /// Tag of the release the asset was published under.
    pub version: String,
    /// Absolute download URL of the asset.
    pub url: String,
    /// Asset file name as published.
    pub file_name: String,
}

/// Models consumed by the native processing engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModelKind {
    FaceRestoration,
    Upscaling,
    BackgroundRemoval,
}

impl ModelKind {
    pub const ALL: [ModelKind; 3] = [
        ModelKind::FaceRestoration,
        ModelKind::Upscaling,
        ModelKind::BackgroundRemoval,
    ];

    /// Asset name the model is published under.
    pub fn asset_name(&self) -> &'static str {
        match self {
            ModelKind::FaceRestoration => FACE_RESTORATION_MODEL,
            ModelKind::Upscaling => IMAGE_UPSCALING_MODEL,
            ModelKind::BackgroundRemoval => BACKGROUND_REMOVAL_MODEL,
        }
    }

    pub fn slug(&self) -> &'static str {
        match self {
            ModelKind::FaceRestoration => "face-restoration",
            ModelKind::Upscaling => "upscaling",
            ModelKind::BackgroundRemoval => "background-removal",
        }
    }

    /// Key of the localized display name.
    pub fn message_key(&self) -> &'static str {
        match self {
            ModelKind::FaceRestoration => "function.restoration",
            ModelKind::Upscaling => "function.upscaling",
            ModelKind::BackgroundRemoval => "function.removeBackground",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for ModelKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        ModelKind::ALL
            .into_iter()
            .find(|kind| kind.slug() == s || kind.asset_name() == s)
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "Unknown model: {}. Expected one of: face-restoration, upscaling, background-removal.",
                    s
                )
            })
    }
}

/// Maps a command-line model argument to the name searched for in the
/// release: known kinds become their asset name, anything else is passed
/// through verbatim.
pub fn asset_query(arg: &str) -> String {
    match arg.parse::<ModelKind>() {
        Ok(kind) => kind.asset_name().to_string(),
        Err(_) => arg.to_string(),
    }
}
