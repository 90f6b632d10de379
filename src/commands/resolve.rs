use anyhow::Result;
use log::debug;
use std::io::Write;

use crate::{
    models::{ModelRelease, asset_query},
    release::ResolveModel,
    runtime::Runtime,
};

use super::config::{Config, GlobalOptions};

/// Resolve one model against the configured release and print it
#[tracing::instrument(skip(runtime, options))]
pub async fn resolve<R: Runtime>(
    runtime: R,
    options: GlobalOptions,
    model: &str,
    json: bool,
) -> Result<()> {
    let config = Config::new(runtime, options)?;
    let resolver = config.resolver()?;
    let release = resolve_one(&resolver, model).await?;

    let mut out = std::io::stdout().lock();
    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(&release)?)?;
    } else {
        print_release(&mut out, &release)?;
    }
    Ok(())
}

pub(crate) async fn resolve_one<M: ResolveModel>(resolver: &M, model: &str) -> Result<ModelRelease> {
    let query = asset_query(model);
    debug!("Resolving {} as {}", model, query);
    Ok(resolver.resolve_model_release(&query).await?)
}

fn print_release<W: Write>(out: &mut W, release: &ModelRelease) -> std::io::Result<()> {
    writeln!(out, "version: {}", release.version)?;
    writeln!(out, "url: {}", release.url)?;
    writeln!(out, "file_name: {}", release.file_name)
}
