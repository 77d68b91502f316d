//! `tether types` - list the host types available to scripts

use crate::host;

/// Full names of the registered host types, sorted.
///
/// Primitive descriptors are left out unless `namespace` asks for them.
pub fn execute(namespace: Option<&str>) -> Vec<String> {
    let registry = host::registry(Vec::new());
    let mut names: Vec<String> = match namespace {
        Some(ns) => registry.namespace(ns).iter().map(|t| t.full_name()).collect(),
        None => registry
            .types()
            .filter(|t| t.namespace() != Some(tether_core::types::PRIMITIVE_NAMESPACE))
            .map(|t| t.full_name())
            .collect(),
    };
    names.sort();
    names
}
