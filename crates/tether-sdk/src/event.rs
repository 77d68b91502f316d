//! Handler list backing a host event

use std::cell::RefCell;

use crate::error::HostResult;

/// Ordered list of script handlers subscribed to an event.
///
/// Host types embed an `EventSource` per event and wire it to an `EventDef`
/// through its add/remove accessors.
#[derive(Default)]
pub struct EventSource {
    handlers: RefCell<Vec<mlua::Function>>,
}

impl EventSource {
    /// Create an empty event source
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe a handler
    pub fn add(&self, handler: mlua::Function) {
        self.handlers.borrow_mut().push(handler);
    }

    /// Unsubscribe the first registration of `handler`.
    ///
    /// Returns whether the handler was registered.
    pub fn remove(&self, handler: &mlua::Function) -> bool {
        let mut handlers = self.handlers.borrow_mut();
        match handlers
            .iter()
            .position(|h| h.to_pointer() == handler.to_pointer())
        {
            Some(pos) => {
                handlers.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Number of subscribed handlers
    pub fn len(&self) -> usize {
        self.handlers.borrow().len()
    }

    /// Whether no handler is subscribed
    pub fn is_empty(&self) -> bool {
        self.handlers.borrow().is_empty()
    }

    /// Call every handler in subscription order.
    ///
    /// The handler list is snapshotted first, so handlers may subscribe or
    /// unsubscribe while the event is being raised.
    pub fn emit<A>(&self, args: A) -> HostResult<()>
    where
        A: mlua::IntoLuaMulti + Clone,
    {
        let handlers = self.handlers.borrow().clone();
        for handler in handlers {
            handler.call::<()>(args.clone())?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for EventSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventSource")
            .field("handlers", &self.len())
            .finish()
    }
}
