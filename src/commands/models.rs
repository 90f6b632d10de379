use anyhow::Result;
use log::debug;
use std::io::Write;

use crate::{
    i18n::{Locale, translate},
    models::ModelKind,
    runtime::Runtime,
    store::ModelStore,
};

use super::config::{Config, GlobalOptions};

/// List catalog models with their local status
#[tracing::instrument(skip(runtime, options))]
pub fn models<R: Runtime>(runtime: R, options: GlobalOptions) -> Result<()> {
    let config = Config::new(runtime, options)?;
    let store = config.store();
    debug!("Listing models in {:?}", store.dir());
    print_models(&mut std::io::stdout().lock(), &store, config.locale)?;
    Ok(())
}

fn print_models<W: Write, R: Runtime>(
    out: &mut W,
    store: &ModelStore<'_, R>,
    locale: Locale,
) -> std::io::Result<()> {
    let manifest = store.load_manifest();
    for kind in ModelKind::ALL {
        let name = kind.asset_name();
        let status = if store.is_installed(name) {
            translate(locale, "models.installed")
        } else {
            translate(locale, "models.missing")
        };
        write!(
            out,
            "{:<20} {:<26} {}",
            kind.slug(),
            translate(locale, kind.message_key()),
            status
        )?;
        match manifest.version_of(name) {
            Some(version) => writeln!(out, " ({})", version)?,
            None => writeln!(out)?,
        }
    }
    Ok(())
}
