//! Script state: one Lua VM wired to the bridge
//!
//! `ScriptState` owns the Lua VM and the bridge context shared by every
//! proxy, coroutine and table view created from it.

use std::path::Path;
use std::rc::Rc;
use std::sync::Arc;

use mlua::{Function, Lua, LuaOptions, MultiValue, StdLib, Table, Value};
use tether_sdk::{HostKind, HostValue, TypeDescriptor};

use crate::context::BridgeContext;
use crate::coroutine::Coroutine;
use crate::dispatch::{self, members, Target};
use crate::error::{BridgeError, BridgeResult};
use crate::hooks::{self, HookEvent, HookMask};
use crate::marshal;
use crate::options::BridgeOptions;
use crate::proxy::{self, MethodProxy};
use crate::table_view::TableView;
use crate::types::TypeRegistry;

/// Wraps any callable in a Lua function, so it can start a thread and yield
const TRAMPOLINE: &str = "local f = ... return function(...) return f(...) end";

/// A Lua VM bridged to a type registry
pub struct ScriptState {
    lua: Rc<Lua>,
    ctx: Rc<BridgeContext>,
}

impl ScriptState {
    /// Create a state with default options
    pub fn new(registry: Arc<TypeRegistry>) -> BridgeResult<Self> {
        Self::with_options(registry, BridgeOptions::default())
    }

    /// Create a state with explicit options
    pub fn with_options(
        registry: Arc<TypeRegistry>,
        options: BridgeOptions,
    ) -> BridgeResult<Self> {
        let lua = if options.open_std_libs {
            Lua::new()
        } else {
            Lua::new_with(StdLib::NONE, LuaOptions::default())?
        };
        tracing::debug!(
            types = registry.len(),
            std_libs = options.open_std_libs,
            "created script state"
        );
        Ok(Self {
            lua: Rc::new(lua),
            ctx: Rc::new(BridgeContext::new(registry, options)),
        })
    }

    /// The underlying Lua VM
    pub fn lua(&self) -> &Lua {
        &self.lua
    }

    /// Bridge context shared with proxies
    pub fn context(&self) -> &BridgeContext {
        &self.ctx
    }

    /// Type registry of this state
    pub fn registry(&self) -> &Arc<TypeRegistry> {
        &self.ctx.registry
    }

    // ========================================================================
    // Globals
    // ========================================================================

    /// Read a global by dotted path, e.g. `config.window.width`.
    ///
    /// Missing intermediate values yield `Nil`. Segments may walk through
    /// object and class proxies.
    pub fn get_global(&self, path: &str) -> BridgeResult<HostValue> {
        let mut current = Value::Table(self.lua.globals());
        for segment in path.split('.') {
            current = match current {
                Value::Table(table) => table.get::<Value>(segment)?,
                Value::UserData(ud) => match proxy::get_member(&self.lua, &ud, segment)? {
                    Some(value) => value,
                    None => return Ok(HostValue::Nil),
                },
                _ => return Ok(HostValue::Nil),
            };
        }
        Ok(marshal::pull(current))
    }

    /// Assign a global by dotted path, creating missing intermediate tables
    pub fn set_global(&self, path: &str, value: impl Into<HostValue>) -> BridgeResult<()> {
        let value = value.into();
        let (parents, name) = match path.rsplit_once('.') {
            Some((parents, name)) => (Some(parents), name),
            None => (None, path),
        };

        let mut current = Value::Table(self.lua.globals());
        for segment in parents.into_iter().flat_map(|p| p.split('.')) {
            current = match current {
                Value::Table(table) => match table.get::<Value>(segment)? {
                    Value::Nil => {
                        let created = self.lua.create_table()?;
                        table.set(segment, created.clone())?;
                        Value::Table(created)
                    }
                    other => other,
                },
                Value::UserData(ud) => proxy::get_member(&self.lua, &ud, segment)?
                    .ok_or_else(|| not_a_table(path, segment))?,
                _ => return Err(not_a_table(path, segment)),
            };
        }

        match current {
            Value::Table(table) => {
                table.set(name, marshal::push(&self.lua, &self.ctx, value)?)?;
                Ok(())
            }
            Value::UserData(ud) => {
                if proxy::set_member(&ud, name, value)? {
                    Ok(())
                } else {
                    Err(not_a_table(path, name))
                }
            }
            _ => Err(not_a_table(path, name)),
        }
    }

    // ========================================================================
    // Running code
    // ========================================================================

    /// Run a chunk, returning its results
    pub fn do_string(&self, chunk: &str, name: &str) -> BridgeResult<Vec<HostValue>> {
        let values = self.lua.load(chunk).set_name(name).eval::<MultiValue>()?;
        marshal::pull_many(&self.ctx, values)
    }

    /// Run a script file, returning its results
    pub fn do_file(&self, path: impl AsRef<Path>) -> BridgeResult<Vec<HostValue>> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)?;
        tracing::debug!(path = %path.display(), "running script file");
        self.do_string(&source, &format!("@{}", path.display()))
    }

    /// Compile a chunk without running it
    pub fn load_string(&self, chunk: &str, name: &str) -> BridgeResult<Function> {
        Ok(self.lua.load(chunk).set_name(name).into_function()?)
    }

    /// Call a Lua function
    pub fn call_function(
        &self,
        function: &Function,
        args: Vec<HostValue>,
    ) -> BridgeResult<Vec<HostValue>> {
        let args = marshal::push_many(&self.lua, &self.ctx, args)?;
        let values = function.call::<MultiValue>(args)?;
        marshal::pull_many(&self.ctx, values)
    }

    // ========================================================================
    // Exposing host types
    // ========================================================================

    /// Install the class proxy of a registered type under its short name
    pub fn import_type(&self, full_name: &str) -> BridgeResult<TypeDescriptor> {
        let ty = self
            .ctx
            .registry
            .descriptor(full_name)
            .ok_or_else(|| BridgeError::UnknownMember {
                type_name: "type registry".to_string(),
                member: full_name.to_string(),
            })?;
        self.install_type(&ty)?;
        Ok(ty)
    }

    /// Install every type of a namespace; returns how many were installed
    pub fn import_namespace(&self, namespace: &str) -> BridgeResult<usize> {
        let types = self.ctx.registry.namespace(namespace);
        for ty in &types {
            self.install_type(ty)?;
        }
        tracing::debug!(namespace, count = types.len(), "imported namespace");
        Ok(types.len())
    }

    fn install_type(&self, ty: &TypeDescriptor) -> BridgeResult<()> {
        let proxy = marshal::push(&self.lua, &self.ctx, HostValue::Type(ty.clone()))?;
        self.lua.globals().set(ty.name(), proxy)?;
        tracing::debug!(type_name = %ty.full_name(), "imported type");
        Ok(())
    }

    /// Expose the static method group `method` of `type_name` as a global
    /// function at `path`
    pub fn register_function(
        &self,
        path: &str,
        type_name: &str,
        method: &str,
    ) -> BridgeResult<()> {
        let ty = self
            .ctx
            .registry
            .descriptor(type_name)
            .ok_or_else(|| BridgeError::UnknownMember {
                type_name: "type registry".to_string(),
                member: type_name.to_string(),
            })?;
        let group = members::method_group(&self.ctx, &ty, method, true).ok_or_else(|| {
            BridgeError::UnknownMember {
                type_name: ty.full_name(),
                member: method.to_string(),
            }
        })?;

        let proxy = MethodProxy::new(Target::Static(ty), group, self.ctx.clone());
        let function = self.lua.create_userdata(proxy)?;
        let (parents, name) = match path.rsplit_once('.') {
            Some((parents, name)) => (Some(parents), name),
            None => (None, path),
        };
        let table = match parents {
            Some(parents) => self.ensure_table(parents)?,
            None => self.lua.globals(),
        };
        table.set(name, function)?;
        Ok(())
    }

    fn ensure_table(&self, path: &str) -> BridgeResult<Table> {
        let mut table = self.lua.globals();
        for segment in path.split('.') {
            table = match table.get::<Value>(segment)? {
                Value::Table(next) => next,
                Value::Nil => {
                    let created = self.lua.create_table()?;
                    table.set(segment, created.clone())?;
                    created
                }
                _ => return Err(not_a_table(path, segment)),
            };
        }
        Ok(table)
    }

    // ========================================================================
    // Coroutines and tables
    // ========================================================================

    /// Create a coroutine running `callable`.
    ///
    /// Accepts a Lua function, or any value Lua can call (a callable table,
    /// a class proxy).
    pub fn create_coroutine(&self, callable: HostValue) -> BridgeResult<Coroutine> {
        let function = match callable {
            HostValue::Function(f) => f,
            other @ (HostValue::Table(_) | HostValue::Type(_)) => {
                let value = marshal::push(&self.lua, &self.ctx, other)?;
                self.lua
                    .load(TRAMPOLINE)
                    .set_name("=coroutine")
                    .call::<Function>(value)?
            }
            other => return Err(BridgeError::mismatch("function", other.describe())),
        };
        let thread = self.lua.create_thread(function)?;
        tracing::debug!("created coroutine");
        Ok(Coroutine::new(thread, self.lua.clone(), self.ctx.clone()))
    }

    /// Create an empty table
    pub fn create_table(&self) -> BridgeResult<TableView> {
        let table = self.lua.create_table()?;
        Ok(self.table_view(table))
    }

    /// View an existing table
    pub fn table_view(&self, table: Table) -> TableView {
        TableView::new(table, self.lua.clone(), self.ctx.clone())
    }

    // ========================================================================
    // Hooks and diagnostics
    // ========================================================================

    /// Install a debug hook; an error from `callback` aborts the script
    pub fn set_hook<F>(&self, mask: HookMask, callback: F)
    where
        F: Fn(HookEvent) -> BridgeResult<()> + 'static,
    {
        hooks::install(&self.lua, mask, callback);
    }

    /// Remove the debug hook
    pub fn remove_hook(&self) {
        self.lua.remove_hook();
    }

    /// Run a full garbage collection cycle.
    ///
    /// Runs twice so that proxies finalized in the first cycle have their
    /// handles released.
    pub fn collect_garbage(&self) -> BridgeResult<()> {
        self.lua.gc_collect()?;
        self.lua.gc_collect()?;
        Ok(())
    }

    /// Number of host references currently pinned by Lua
    pub fn pinned_handles(&self) -> usize {
        self.ctx.handles.len()
    }

    /// Coerce a value to a declared kind, as argument binding does
    pub fn coerce(&self, value: &HostValue, kind: &HostKind) -> BridgeResult<HostValue> {
        dispatch::coerce(&self.ctx, value, kind)
    }

    /// Convert a host value to a Lua value
    pub fn to_lua(&self, value: HostValue) -> BridgeResult<Value> {
        marshal::push(&self.lua, &self.ctx, value)
    }

    /// Convert a Lua value to a host value
    pub fn from_lua(&self, value: Value) -> HostValue {
        marshal::pull(value)
    }
}

impl std::fmt::Debug for ScriptState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptState").field("context", &self.ctx).finish()
    }
}

fn not_a_table(path: &str, segment: &str) -> BridgeError {
    BridgeError::mismatch("table", format!("non-table at '{}' in '{}'", segment, path))
}
