use anyhow::{Context, Result};
use log::debug;
use reqwest::{
    Client,
    header::{AUTHORIZATION, HeaderMap, HeaderValue},
};

use std::path::PathBuf;

use crate::{
    download::ModelDownloader,
    http::HttpClient,
    i18n::Locale,
    paths::AppPaths,
    release::ReleaseResolver,
    runtime::Runtime,
    settings::Settings,
    store::ModelStore,
};

const USER_AGENT: &str = concat!("imagenie/", env!("IMAGENIE_VERSION"));

/// Flags shared by every command.
#[derive(Debug, Clone, Default)]
pub struct GlobalOptions {
    pub home: Option<PathBuf>,
    pub api_url: Option<String>,
    pub lang: Option<String>,
}

pub struct Config<R: Runtime> {
    pub runtime: R,
    pub paths: AppPaths,
    pub settings: Settings,
    pub locale: Locale,
    client: Client,
}

impl<R: Runtime> Config<R> {
    pub fn new(runtime: R, options: GlobalOptions) -> Result<Self> {
        let paths = AppPaths::resolve(&runtime, options.home)?;
        let mut settings = Settings::load(&runtime, &paths)?;
        if let Some(api_url) = options.api_url {
            settings.api_url = api_url;
        }
        if let Some(lang) = options.lang {
            settings.locale = Some(lang);
        }

        let locale = match &settings.locale {
            Some(lang) => lang.parse::<Locale>()?,
            None => runtime
                .env_var("LANG")
                .map(|lang| Locale::from_lang(&lang))
                .unwrap_or_default(),
        };

        let mut headers = HeaderMap::new();
        if let Ok(token) = runtime.env_var("GITHUB_TOKEN") {
            let mut auth_value = HeaderValue::from_str(&format!("Bearer {}", token))
                .context("GITHUB_TOKEN is not a valid header value")?;
            auth_value.set_sensitive(true);
            headers.insert(AUTHORIZATION, auth_value);
            debug!(
                "Using GITHUB_TOKEN for authentication: {}",
                mask_token(&token)
            );
        }

        let mut builder = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers);
        if let Some(timeout) = settings.timeout() {
            builder = builder.connect_timeout(timeout);
        }
        let client = builder.build()?;

        Ok(Self {
            runtime,
            paths,
            settings,
            locale,
            client,
        })
    }

    /// Resolver for the configured release, with the settings' retry and
    /// timeout behavior.
    pub fn resolver(&self) -> Result<ReleaseResolver> {
        let http_client = HttpClient::new(self.client.clone())
            .with_policy(self.settings.retry_policy())
            .with_json_timeout(self.settings.timeout());
        Ok(ReleaseResolver::new(
            http_client,
            self.settings.release_source()?,
        ))
    }

    pub fn store(&self) -> ModelStore<'_, R> {
        ModelStore::new(&self.runtime, self.settings.models_dir(&self.paths))
    }

    pub fn downloader(&self) -> ModelDownloader<'_, R> {
        ModelDownloader::new(self.store(), HttpClient::new(self.client.clone()))
    }
}

fn mask_token(token: &str) -> String {
    match (token.get(..8), token.get(token.len().saturating_sub(4)..)) {
        (Some(head), Some(tail)) if token.len() > 12 => format!("{}*********{}", head, tail),
        _ => "*********".to_string(),
    }
}
