//! Handle table for host references held by the Lua heap
//!
//! Every proxy userdata the bridge hands to Lua carries a `Handle` instead of
//! the host value itself. The table pins the value until the proxy is
//! finalized by the Lua collector, at which point the proxy's `Drop` unpins
//! it. Handles are generational: a stale handle (its slot was freed and
//! possibly reused) resolves to nothing instead of to the new occupant.
//!
//! Finalizers run inside Lua GC steps, which may be interleaved with any
//! bridge operation. An unpin that finds the arena borrowed is queued and
//! applied on the next access.

use std::cell::RefCell;
use std::fmt;

use tether_sdk::{HostObject, TypeDescriptor};

/// Opaque reference to a pinned host value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle {
    index: u32,
    generation: u32,
}

impl Handle {
    /// Pack into a single integer
    pub fn to_bits(self) -> u64 {
        ((self.generation as u64) << 32) | self.index as u64
    }

    /// Unpack from `to_bits`
    pub fn from_bits(bits: u64) -> Self {
        Handle {
            index: bits as u32,
            generation: (bits >> 32) as u32,
        }
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index, self.generation)
    }
}

/// Host value anchored by a handle
#[derive(Debug, Clone)]
pub enum PinnedRef {
    /// Host object (instance proxy)
    Object(HostObject),
    /// Type descriptor (class proxy)
    Type(TypeDescriptor),
}

struct Slot {
    generation: u32,
    value: Option<PinnedRef>,
}

#[derive(Default)]
struct Arena {
    slots: Vec<Slot>,
    free: Vec<u32>,
    live: usize,
}

impl Arena {
    fn remove(&mut self, handle: Handle) -> Option<PinnedRef> {
        let slot = self.slots.get_mut(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        let value = slot.value.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index);
        self.live -= 1;
        Some(value)
    }
}

/// Generational arena of pinned host references
#[derive(Default)]
pub struct HandleTable {
    arena: RefCell<Arena>,
    deferred: RefCell<Vec<Handle>>,
}

impl HandleTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Pin a value, returning a fresh handle.
    ///
    /// Pinning the same value twice yields two independent handles.
    pub fn pin(&self, value: PinnedRef) -> Handle {
        self.apply_deferred();
        let mut arena = self.arena.borrow_mut();
        arena.live += 1;
        let handle = match arena.free.pop() {
            Some(index) => {
                let slot = &mut arena.slots[index as usize];
                slot.value = Some(value);
                Handle {
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                let index = arena.slots.len() as u32;
                arena.slots.push(Slot {
                    generation: 0,
                    value: Some(value),
                });
                Handle {
                    index,
                    generation: 0,
                }
            }
        };
        tracing::trace!(%handle, "pinned host reference");
        handle
    }

    /// Look up a pinned value; `None` for stale or released handles
    pub fn resolve(&self, handle: Handle) -> Option<PinnedRef> {
        self.apply_deferred();
        let arena = self.arena.try_borrow().ok()?;
        let slot = arena.slots.get(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.value.clone()
    }

    /// Release a handle. Releasing a stale handle is a no-op.
    pub fn unpin(&self, handle: Handle) {
        let released = match self.arena.try_borrow_mut() {
            Ok(mut arena) => arena.remove(handle),
            Err(_) => {
                self.deferred.borrow_mut().push(handle);
                return;
            }
        };
        if released.is_some() {
            tracing::trace!(%handle, "unpinned host reference");
        }
        // The released value drops here, after the arena borrow has ended
        drop(released);
    }

    /// Number of live handles
    pub fn len(&self) -> usize {
        self.apply_deferred();
        self.arena.try_borrow().map(|a| a.live).unwrap_or(0)
    }

    /// Whether no handle is live
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn apply_deferred(&self) {
        let pending: Vec<Handle> = match self.deferred.try_borrow_mut() {
            Ok(mut deferred) if !deferred.is_empty() => std::mem::take(&mut *deferred),
            _ => return,
        };
        for handle in pending {
            self.unpin(handle);
        }
    }
}

impl fmt::Debug for HandleTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandleTable")
            .field("live", &self.len())
            .finish()
    }
}
