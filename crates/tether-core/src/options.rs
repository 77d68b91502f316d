//! Bridge configuration

use std::path::Path;

use serde::Deserialize;

use crate::error::{BridgeError, BridgeResult};

/// Options controlling a `ScriptState`.
///
/// Loadable from TOML; missing keys keep their defaults:
///
/// ```toml
/// max_transfer_values = 8000
/// max_coercion_depth = 32
/// strip_self_argument = true
/// open_std_libs = true
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BridgeOptions {
    /// Maximum number of values moved across the boundary in one transfer
    pub max_transfer_values: usize,

    /// Maximum nesting of table → array coercion
    pub max_coercion_depth: usize,

    /// Drop a leading argument identical to the bound target (colon calls)
    pub strip_self_argument: bool,

    /// Open the Lua standard libraries (otherwise only the base library)
    pub open_std_libs: bool,
}

impl Default for BridgeOptions {
    fn default() -> Self {
        Self {
            max_transfer_values: 8000,
            max_coercion_depth: 32,
            strip_self_argument: true,
            open_std_libs: true,
        }
    }
}

impl BridgeOptions {
    /// Parse options from TOML text
    pub fn from_toml_str(text: &str) -> BridgeResult<Self> {
        let options: BridgeOptions =
            toml::from_str(text).map_err(|e| BridgeError::Config(e.to_string()))?;
        options.validate()?;
        Ok(options)
    }

    /// Load options from a TOML file
    pub fn load(path: impl AsRef<Path>) -> BridgeResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Set the transfer limit
    pub fn with_max_transfer_values(mut self, limit: usize) -> Self {
        self.max_transfer_values = limit;
        self
    }

    /// Set the coercion nesting limit
    pub fn with_max_coercion_depth(mut self, depth: usize) -> Self {
        self.max_coercion_depth = depth;
        self
    }

    fn validate(&self) -> BridgeResult<()> {
        if self.max_transfer_values == 0 {
            return Err(BridgeError::Config(
                "max_transfer_values must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
