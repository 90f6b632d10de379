use anyhow::Result;
use log::{debug, info};
use std::path::PathBuf;

use crate::{
    download::{DownloadProgress, ModelDownloader},
    i18n::{Locale, translate},
    models::{ModelKind, ModelRelease},
    notify::{ConsoleNotifier, Notifier},
    release::ResolveModel,
    runtime::Runtime,
};

use super::config::{Config, GlobalOptions};
use super::resolve::resolve_one;

/// Download the given models, or every catalog model when none are given
#[tracing::instrument(skip(runtime, options))]
pub async fn fetch<R: Runtime>(
    runtime: R,
    options: GlobalOptions,
    models: &[String],
    force: bool,
) -> Result<()> {
    let config = Config::new(runtime, options)?;
    let resolver = config.resolver()?;
    let downloader = config.downloader();
    let notifier = ConsoleNotifier::stdout();

    let paths = run(
        &resolver,
        &downloader,
        &notifier,
        config.locale,
        models,
        force,
    )
    .await?;
    for path in paths {
        println!("{}", path.display());
    }
    Ok(())
}

pub(crate) async fn run<M: ResolveModel, R: Runtime, N: Notifier>(
    resolver: &M,
    downloader: &ModelDownloader<'_, R>,
    notifier: &N,
    locale: Locale,
    models: &[String],
    force: bool,
) -> Result<Vec<PathBuf>> {
    let requested: Vec<String> = if models.is_empty() {
        ModelKind::ALL
            .iter()
            .map(|kind| kind.asset_name().to_string())
            .collect()
    } else {
        models.to_vec()
    };

    let store = downloader.store();
    let mut releases: Vec<ModelRelease> = Vec::new();
    for model in &requested {
        let release = resolve_one(resolver, model).await?;
        if releases.iter().any(|r| r.file_name == release.file_name) {
            debug!("{} requested more than once", release.file_name);
            continue;
        }
        if !force && store.is_installed(&release.file_name) {
            info!("{} is already installed, skipping", release.file_name);
            continue;
        }
        releases.push(release);
    }

    let success = translate(locale, "notification.success");
    if releases.is_empty() {
        notifier.notify(success, translate(locale, "models.upToDate"));
        return Ok(Vec::new());
    }

    let report = |p: &DownloadProgress| {
        debug!(
            "{}: {:.0}% ({:.0}% overall)",
            p.model_name, p.progress, p.total_progress
        )
    };

    match downloader.download_models(&releases, &report).await {
        Ok(paths) => {
            for release in &releases {
                notifier.notify(
                    success,
                    &format!(
                        "{}: {} ({})",
                        translate(locale, "models.downloaded"),
                        release.file_name,
                        release.version
                    ),
                );
            }
            Ok(paths)
        }
        Err(e) => {
            notifier.notify(
                translate(locale, "notification.error"),
                &format!("{}: {:#}", translate(locale, "models.downloadFailed"), e),
            );
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::HttpClient;
    use crate::notify::MockNotifier;
    use crate::release::{MockResolveModel, ResolveError};
    use crate::runtime::RealRuntime;
    use crate::store::ModelStore;
    use mockall::predicate::eq;
    use reqwest::Client;

    fn release_at(url: &str, name: &str) -> ModelRelease {
        ModelRelease {
            version: "models-v0.1.0".to_string(),
            url: format!("{}/download/{}", url, name),
            file_name: name.to_string(),
        }
    }

    fn resolver_for(url: String) -> MockResolveModel {
        let mut resolver = MockResolveModel::new();
        resolver
            .expect_resolve_model_release()
            .returning(move |name| Ok(release_at(&url, name)));
        resolver
    }

    #[test_log::test(tokio::test)]
    async fn test_fetch_downloads_missing_models_only() {
        let mut server = mockito::Server::new_async().await;
        let upscaling = server
            .mock("GET", "/download/image_upscaling.onnx")
            .with_body("upscale")
            .expect(1)
            .create_async()
            .await;
        let removal = server
            .mock("GET", "/download/background_removal.onnx")
            .with_body("removal")
            .expect(1)
            .create_async()
            .await;
        let face = server
            .mock("GET", "/download/face_restoration.onnx")
            .expect(0)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("face_restoration.onnx"), b"face").unwrap();

        let runtime = RealRuntime;
        let downloader = ModelDownloader::new(
            ModelStore::new(&runtime, dir.path().to_path_buf()),
            HttpClient::new(Client::new()),
        );
        let mut notifier = MockNotifier::new();
        notifier
            .expect_notify()
            .withf(|title, body| title == "Success" && body.starts_with("Model downloaded"))
            .times(2)
            .return_const(());

        let paths = run(
            &resolver_for(server.url()),
            &downloader,
            &notifier,
            Locale::En,
            &[],
            false,
        )
        .await
        .unwrap();

        upscaling.assert_async().await;
        removal.assert_async().await;
        face.assert_async().await;
        assert_eq!(
            paths,
            vec![
                dir.path().join("image_upscaling.onnx"),
                dir.path().join("background_removal.onnx")
            ]
        );
    }

    #[tokio::test]
    async fn test_fetch_force_redownloads() {
        let mut server = mockito::Server::new_async().await;
        let face = server
            .mock("GET", "/download/face_restoration.onnx")
            .with_body("new-face")
            .expect(1)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("face_restoration.onnx"), b"old-face").unwrap();

        let runtime = RealRuntime;
        let downloader = ModelDownloader::new(
            ModelStore::new(&runtime, dir.path().to_path_buf()),
            HttpClient::new(Client::new()),
        );
        let mut notifier = MockNotifier::new();
        notifier.expect_notify().times(1).return_const(());

        run(
            &resolver_for(server.url()),
            &downloader,
            &notifier,
            Locale::En,
            &["face-restoration".to_string()],
            true,
        )
        .await
        .unwrap();

        face.assert_async().await;
        assert_eq!(
            std::fs::read_to_string(dir.path().join("face_restoration.onnx")).unwrap(),
            "new-face"
        );
    }

    #[tokio::test]
    async fn test_fetch_everything_installed() {
        let dir = tempfile::tempdir().unwrap();
        for kind in ModelKind::ALL {
            std::fs::write(dir.path().join(kind.asset_name()), b"x").unwrap();
        }

        let runtime = RealRuntime;
        let downloader = ModelDownloader::new(
            ModelStore::new(&runtime, dir.path().to_path_buf()),
            HttpClient::new(Client::new()),
        );
        let mut notifier = MockNotifier::new();
        notifier
            .expect_notify()
            .with(eq("成功"), eq("所有模型均已安装"))
            .times(1)
            .return_const(());

        let paths = run(
            &resolver_for("http://127.0.0.1:9".to_string()),
            &downloader,
            &notifier,
            Locale::Zh,
            &[],
            false,
        )
        .await
        .unwrap();
        assert!(paths.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_stops_on_resolve_error() {
        let mut resolver = MockResolveModel::new();
        resolver
            .expect_resolve_model_release()
            .with(eq("missing"))
            .returning(|name| {
                Err(ResolveError::ModelNotFound {
                    model: name.to_string(),
                    tag: "models-v0.1.0".to_string(),
                })
            });

        let dir = tempfile::tempdir().unwrap();
        let runtime = RealRuntime;
        let downloader = ModelDownloader::new(
            ModelStore::new(&runtime, dir.path().join("models")),
            HttpClient::new(Client::new()),
        );
        // No expectations: nothing is reported before a download starts
        let notifier = MockNotifier::new();

        let result = run(
            &resolver,
            &downloader,
            &notifier,
            Locale::En,
            &["missing".to_string()],
            false,
        )
        .await;
        assert!(result.is_err());
        assert!(!dir.path().join("models").exists());
    }

    #[tokio::test]
    async fn test_fetch_reports_download_failure() {
        let mut server = mockito::Server::new_async().await;
        let _missing = server
            .mock("GET", "/download/image_upscaling.onnx")
            .with_status(404)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let runtime = RealRuntime;
        let downloader = ModelDownloader::new(
            ModelStore::new(&runtime, dir.path().to_path_buf()),
            HttpClient::new(Client::new()),
        );
        let mut notifier = MockNotifier::new();
        notifier
            .expect_notify()
            .withf(|title, body| title == "Error" && body.contains("image_upscaling.onnx"))
            .times(1)
            .return_const(());

        let result = run(
            &resolver_for(server.url()),
            &downloader,
            &notifier,
            Locale::En,
            &["upscaling".to_string()],
            false,
        )
        .await;
        assert!(result.is_err());
    }
}
