//! Shared bridge state
//!
//! One `BridgeContext` exists per script state. Every proxy userdata keeps an
//! `Rc` to it, so the handle table outlives the last proxy even while the Lua
//! state is being torn down.

use std::cell::RefCell;
use std::ffi::c_void;
use std::sync::Arc;

use crate::handles::HandleTable;
use crate::options::BridgeOptions;
use crate::types::TypeRegistry;

/// State shared by the script state, its proxies, coroutines and views
pub struct BridgeContext {
    pub(crate) handles: HandleTable,
    pub(crate) registry: Arc<TypeRegistry>,
    pub(crate) options: BridgeOptions,
    /// Threads currently being resumed through the bridge, innermost last
    active: RefCell<Vec<*const c_void>>,
}

impl BridgeContext {
    pub(crate) fn new(registry: Arc<TypeRegistry>, options: BridgeOptions) -> Self {
        Self {
            handles: HandleTable::new(),
            registry,
            options,
            active: RefCell::new(Vec::new()),
        }
    }

    /// Registry of exposed types
    pub fn registry(&self) -> &Arc<TypeRegistry> {
        &self.registry
    }

    /// Options in effect
    pub fn options(&self) -> &BridgeOptions {
        &self.options
    }

    /// Handle table of pinned host references
    pub fn handles(&self) -> &HandleTable {
        &self.handles
    }

    /// Mark a thread as being resumed until the guard drops
    pub(crate) fn enter(&self, thread: *const c_void) -> ActiveGuard<'_> {
        self.active.borrow_mut().push(thread);
        ActiveGuard { ctx: self, thread }
    }

    /// Position of a thread among the active resumes: `Some(true)` when it is
    /// the innermost one, `Some(false)` when it resumed another
    pub(crate) fn active_position(&self, thread: *const c_void) -> Option<bool> {
        let active = self.active.borrow();
        let pos = active.iter().rposition(|t| *t == thread)?;
        Some(pos + 1 == active.len())
    }
}

impl std::fmt::Debug for BridgeContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BridgeContext")
            .field("handles", &self.handles)
            .field("options", &self.options)
            .field("active_resumes", &self.active.borrow().len())
            .finish()
    }
}

/// Pops the active-resume entry on drop, including during unwinding
pub(crate) struct ActiveGuard<'a> {
    ctx: &'a BridgeContext,
    thread: *const c_void,
}

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        let mut active = self.ctx.active.borrow_mut();
        if let Some(pos) = active.iter().rposition(|t| *t == self.thread) {
            active.remove(pos);
        }
    }
}
