//! Subcommand implementations

pub mod eval;
pub mod run;
pub mod types;

use std::path::Path;

use tether_core::{BridgeError, BridgeOptions, ScriptState};

use crate::host::{self, HOST_NAMESPACE};

/// Create a script state with the host namespace imported.
///
/// Options come from `config` when given, defaults otherwise.
pub fn open_state(config: Option<&Path>, args: Vec<String>) -> anyhow::Result<ScriptState> {
    let options = match config {
        Some(path) => BridgeOptions::load(path)
            .map_err(|e| anyhow::anyhow!("{}: {}", path.display(), e))?,
        None => BridgeOptions::default(),
    };
    let state = ScriptState::with_options(host::registry(args), options).map_err(report)?;
    state.import_namespace(HOST_NAMESPACE).map_err(report)?;
    Ok(state)
}

/// Turn a bridge error into a report showing the innermost failure
pub(crate) fn report(err: BridgeError) -> anyhow::Error {
    anyhow::anyhow!("{}", err.root())
}
