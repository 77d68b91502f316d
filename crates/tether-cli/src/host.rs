//! Host types exposed to scripts run from the command line

use std::sync::Arc;

use tether_core::sdk::{ClassBuilder, HostKind, HostValue, MethodBuilder, TypeDescriptor};
use tether_core::TypeRegistry;

/// Namespace imported into every script state
pub const HOST_NAMESPACE: &str = "host";

/// `host.Env`: process environment and script arguments
pub fn env_type(args: Vec<String>) -> TypeDescriptor {
    ClassBuilder::new("Env")
        .namespace(HOST_NAMESPACE)
        .method(
            MethodBuilder::new("var")
                .as_static()
                .param("name", HostKind::Str)
                .returns(HostKind::Str)
                .invoke(|inv| {
                    let name: String = inv.get(0)?;
                    Ok(std::env::var(name).map(HostValue::from).unwrap_or_default())
                }),
        )
        .method(
            MethodBuilder::new("args")
                .as_static()
                .returns(HostKind::array(HostKind::Str))
                .invoke(move |_| {
                    let values: Vec<HostValue> =
                        args.iter().cloned().map(HostValue::from).collect();
                    Ok(values.into())
                }),
        )
        .build()
}

fn log_method(name: &str) -> MethodBuilder {
    MethodBuilder::new(name)
        .as_static()
        .param("message", HostKind::Any)
}

/// `host.Log`: forwards script messages to `tracing`
pub fn log_type() -> TypeDescriptor {
    ClassBuilder::new("Log")
        .namespace(HOST_NAMESPACE)
        .method(log_method("info").invoke(|inv| {
            let message = inv.arg(0).cloned().unwrap_or_default();
            tracing::info!(target: "script", "{}", message);
            Ok(HostValue::Nil)
        }))
        .method(log_method("warn").invoke(|inv| {
            let message = inv.arg(0).cloned().unwrap_or_default();
            tracing::warn!(target: "script", "{}", message);
            Ok(HostValue::Nil)
        }))
        .method(log_method("debug").invoke(|inv| {
            let message = inv.arg(0).cloned().unwrap_or_default();
            tracing::debug!(target: "script", "{}", message);
            Ok(HostValue::Nil)
        }))
        .build()
}

/// Registry holding the host namespace; `args` are the script arguments
pub fn registry(args: Vec<String>) -> Arc<TypeRegistry> {
    let registry = TypeRegistry::builder()
        .register(&env_type(args))
        .register(&log_type())
        .build();
    Arc::new(registry)
}
