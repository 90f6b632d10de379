//! Localized user-facing strings.
//!
//! Keys are dotted paths (`notification.success`). Lookups fall back to
//! English, then to the key itself.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Zh,
}

impl Locale {
    /// Derives a locale from a POSIX `LANG` value such as `zh_CN.UTF-8`.
    pub fn from_lang(lang: &str) -> Locale {
        if lang.to_lowercase().starts_with("zh") {
            Locale::Zh
        } else {
            Locale::En
        }
    }

    fn messages(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            Locale::En => EN,
            Locale::Zh => ZH,
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locale::En => write!(f, "en"),
            Locale::Zh => write!(f, "zh"),
        }
    }
}

impl FromStr for Locale {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "en" => Ok(Locale::En),
            "zh" => Ok(Locale::Zh),
            _ => anyhow::bail!("Unsupported language: {}. Expected en or zh.", s),
        }
    }
}

/// Looks up `key` for `locale`.
pub fn translate<'a>(locale: Locale, key: &'a str) -> &'a str {
    lookup(locale.messages(), key)
        .or_else(|| lookup(EN, key))
        .unwrap_or(key)
}

fn lookup(messages: &'static [(&'static str, &'static str)], key: &str) -> Option<&'static str> {
    messages
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, v)| *v)
}

const EN: &[(&str, &str)] = &[
    ("common.upload", "Upload Image"),
    ("common.process", "Process"),
    ("common.download", "Download"),
    ("common.settings", "Settings"),
    ("common.cancel", "Cancel"),
    ("common.confirm", "Confirm"),
    ("nav.removeBackground", "Background Removal"),
    ("nav.upscaling", "Image Upscaling"),
    ("nav.resizing", "Image Resizing"),
    ("settings.modelPath", "Model Path"),
    ("settings.selectModel", "Select Model"),
    ("settings.processingMode", "Processing Mode"),
    ("settings.quality", "Quality"),
    ("settings.speed", "Speed"),
    ("notification.success", "Success"),
    ("notification.error", "Error"),
    ("notification.processing", "Processing"),
    ("function.scale", "Scale"),
    ("function.strength", "Strength"),
    ("function.removeBackground", "Background Removal"),
    ("function.upscaling", "Image Upscaling"),
    ("function.restoration", "Face Restoration"),
    ("function.resizing", "Image Resizing"),
    ("imageProcessor.dropHint", "Click to select"),
    ("imageProcessor.selectInput", "Select Input Image"),
    ("imageProcessor.selectOutput", "Select Output Path"),
    ("imageProcessor.startProcess", "Start Processing"),
    ("imageProcessor.processing", "Processing..."),
    ("imageProcessor.processingStatus", "Processing image, please wait..."),
    ("imageProcessor.processingCompleted", "Processing Completed"),
    (
        "imageProcessor.processingCompletedDesc",
        "Processing completed, please compare the results",
    ),
    ("sidebar.title", "Imagenie"),
    ("sidebar.menu.upscaling", "Image Upscaling"),
    ("sidebar.menu.resizing", "Image Resizing"),
    ("sidebar.menu.restoration", "Face Restoration"),
    ("sidebar.menu.removeBackground", "Background Removal"),
    ("models.installed", "installed"),
    ("models.missing", "not installed"),
    ("models.downloaded", "Model downloaded"),
    ("models.upToDate", "All models are already installed"),
    ("models.downloadFailed", "Model download failed"),
];

const ZH: &[(&str, &str)] = &[
    ("common.upload", "上传图片"),
    ("common.process", "处理"),
    ("common.download", "下载"),
    ("common.settings", "设置"),
    ("common.cancel", "取消"),
    ("common.confirm", "确认"),
    ("nav.removeBackground", "移除背景"),
    ("nav.upscaling", "图片放大"),
    ("nav.resizing", "调整尺寸"),
    ("settings.modelPath", "模型路径"),
    ("settings.selectModel", "选择模型"),
    ("settings.processingMode", "处理模式"),
    ("settings.quality", "质量优先"),
    ("settings.speed", "速度优先"),
    ("notification.success", "成功"),
    ("notification.error", "错误"),
    ("notification.processing", "处理中"),
    ("function.scale", "放大倍数"),
    ("function.strength", "修复强度"),
    ("function.removeBackground", "移除背景"),
    ("function.upscaling", "图片放大"),
    ("function.restoration", "图片修复"),
    ("function.resizing", "调整尺寸"),
    ("imageProcessor.dropHint", "点击选择"),
    ("imageProcessor.selectInput", "选择输入图片"),
    ("imageProcessor.selectOutput", "选择输出路径"),
    ("imageProcessor.startProcess", "开始处理"),
    ("imageProcessor.processing", "处理中..."),
    ("imageProcessor.processingStatus", "正在处理图片，请稍候..."),
    ("imageProcessor.processingCompleted", "处理完成"),
    ("imageProcessor.processingCompletedDesc", "处理完成，请对比查看结果"),
    ("sidebar.title", "Imagenie"),
    ("sidebar.menu.upscaling", "图像放大"),
    ("sidebar.menu.resizing", "图像缩放"),
    ("sidebar.menu.restoration", "人像修复"),
    ("sidebar.menu.removeBackground", "背景移除"),
    ("models.installed", "已安装"),
    ("models.missing", "未安装"),
    ("models.downloaded", "模型下载完成"),
    ("models.upToDate", "所有模型均已安装"),
];
