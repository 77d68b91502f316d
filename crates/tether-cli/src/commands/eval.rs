//! `tether eval` - evaluate an inline chunk

use std::path::Path;

use super::{open_state, report};

/// Evaluate `code` and format its results, tab separated.
///
/// The code is tried as an expression first, then as a statement block.
pub fn execute(code: &str, config: Option<&Path>) -> anyhow::Result<String> {
    let state = open_state(config, Vec::new())?;
    let function = match state.load_string(&format!("return {}", code), "=eval") {
        Ok(function) => function,
        Err(_) => state.load_string(code, "=eval").map_err(report)?,
    };
    let results = state.call_function(&function, Vec::new()).map_err(report)?;
    Ok(results
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("\t"))
}
