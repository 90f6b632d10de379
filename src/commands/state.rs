use anyhow::Result;
use log::info;
use std::path::PathBuf;

use crate::{
    paths::AppPaths,
    runtime::Runtime,
    state::{AppState, Function},
};

/// Change applied to the persisted state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateAction {
    Show,
    Function(Function),
    Add(Vec<PathBuf>),
    Clear,
    Set { key: String, value: String },
}

/// Show or update the persisted front-end state
#[tracing::instrument(skip(runtime))]
pub fn state<R: Runtime>(runtime: R, home: Option<PathBuf>, action: StateAction) -> Result<()> {
    let paths = AppPaths::resolve(&runtime, home)?;
    let state = apply(&runtime, &paths, action)?;
    println!("{}", serde_json::to_string_pretty(&state)?);
    Ok(())
}

fn apply<R: Runtime>(runtime: &R, paths: &AppPaths, action: StateAction) -> Result<AppState> {
    let path = paths.state_file();
    let mut state = AppState::load(runtime, &path)?;

    match action {
        StateAction::Show => return Ok(state),
        StateAction::Function(function) => {
            info!("Switching to {} ({})", function, function.route());
            state.set_active_function(function);
        }
        StateAction::Add(files) => state.add_files(files),
        StateAction::Clear => state.clear_files(),
        StateAction::Set { key, value } => state.set_setting(&key, &value)?,
    }

    state.save(runtime, &path)?;
    Ok(state)
}
