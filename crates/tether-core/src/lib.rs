//! Tether core - object translation and dispatch between Rust hosts and Lua
//!
//! This crate embeds a Lua 5.4 VM (through `mlua`) and lets scripts use host
//! types registered with `tether_sdk::ClassBuilder`:
//!
//! - `marshal`: value conversion in both directions
//! - `handles`: generational table pinning host values held by Lua
//! - `types`: type registry and per-type metadata cache
//! - `dispatch`: member access, overload and generic resolution, operators
//! - `proxy`: the userdata types Lua sees
//! - `coroutine`: resuming Lua coroutines from the host
//! - `table_view`: host-side access to Lua tables
//! - `state`: `ScriptState`, the entry point tying it together
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use tether_core::{ScriptState, TypeRegistry};
//!
//! let registry = TypeRegistry::builder().register(&counter_type()).build();
//! let state = ScriptState::new(Arc::new(registry))?;
//! state.import_type("demo.Counter")?;
//! let results = state.do_string("local c = Counter(2) c:increment() return c.count", "=demo")?;
//! ```

#![warn(missing_docs)]

pub mod context;
pub mod coroutine;
pub mod dispatch;
pub mod error;
pub mod handles;
pub mod hooks;
pub mod marshal;
pub mod options;
pub mod proxy;
pub mod state;
pub mod table_view;
pub mod types;

pub use tether_sdk as sdk;

pub use context::BridgeContext;
pub use coroutine::{Coroutine, CoroutineStatus, ResumeOutcome};
pub use dispatch::Target;
pub use error::{BridgeError, BridgeResult, ErrorCategory};
pub use handles::{Handle, HandleTable, PinnedRef};
pub use hooks::{HookEvent, HookKind, HookMask};
pub use options::BridgeOptions;
pub use proxy::{ClassProxy, ObjectProxy};
pub use state::ScriptState;
pub use table_view::TableView;
pub use types::{MemberLookup, MethodGroup, TypeMetadata, TypeRegistry, TypeRegistryBuilder};
