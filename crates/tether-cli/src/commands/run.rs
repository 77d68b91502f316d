//! `tether run` - execute a script file

use std::path::Path;

use tether_core::sdk::HostValue;

use super::{open_state, report};

/// Run `file`, returning the process exit code.
///
/// An integer returned by the script becomes the exit code; `false` maps
/// to 1, anything else to 0.
pub fn execute(file: &Path, args: Vec<String>, config: Option<&Path>) -> anyhow::Result<i32> {
    if !file.exists() {
        anyhow::bail!("File not found: {}", file.display());
    }
    let state = open_state(config, args)?;
    let results = state.do_file(file).map_err(report)?;
    tracing::debug!(file = %file.display(), results = results.len(), "script finished");
    Ok(exit_code(results.first()))
}

fn exit_code(value: Option<&HostValue>) -> i32 {
    match value {
        Some(HostValue::Integer(code)) => i32::try_from(*code).unwrap_or(1),
        Some(HostValue::Bool(false)) => 1,
        _ => 0,
    }
}
