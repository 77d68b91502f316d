//! Host objects exposed to scripts
//!
//! A `HostObject` pairs a shared Rust value with the type descriptor that
//! describes its members. Cloning a `HostObject` clones the reference, not
//! the value: every clone (and every script-side proxy) sees the same data.

use std::any::Any;
use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::rc::Rc;

use crate::class::TypeDescriptor;
use crate::error::{HostError, HostResult};

/// Reference-counted host value with its type descriptor.
#[derive(Clone)]
pub struct HostObject {
    class: TypeDescriptor,
    data: Rc<dyn Any>,
}

impl HostObject {
    /// Wrap a Rust value as an instance of `class`
    pub fn new<T: 'static>(class: &TypeDescriptor, value: T) -> Self {
        Self {
            class: class.clone(),
            data: Rc::new(RefCell::new(value)),
        }
    }

    /// Type descriptor of this object
    pub fn class(&self) -> &TypeDescriptor {
        &self.class
    }

    /// Whether the wrapped value is a `T`
    pub fn is<T: 'static>(&self) -> bool {
        self.data.downcast_ref::<RefCell<T>>().is_some()
    }

    /// Borrow the wrapped value.
    ///
    /// Fails if the value is not a `T` or is currently mutably borrowed.
    pub fn borrow<T: 'static>(&self) -> HostResult<Ref<'_, T>> {
        self.cell::<T>()?
            .try_borrow()
            .map_err(|_| HostError::new(format!("{} is already mutably borrowed", self.class.name())))
    }

    /// Mutably borrow the wrapped value.
    ///
    /// Fails if the value is not a `T` or is currently borrowed.
    pub fn borrow_mut<T: 'static>(&self) -> HostResult<RefMut<'_, T>> {
        self.cell::<T>()?
            .try_borrow_mut()
            .map_err(|_| HostError::new(format!("{} is already borrowed", self.class.name())))
    }

    /// Check whether two handles refer to the same host value
    pub fn ptr_eq(&self, other: &HostObject) -> bool {
        Rc::ptr_eq(&self.data, &other.data)
    }

    /// Address of the shared value, for identity display
    pub fn addr(&self) -> usize {
        Rc::as_ptr(&self.data) as *const () as usize
    }

    fn cell<T: 'static>(&self) -> HostResult<&RefCell<T>> {
        self.data.downcast_ref::<RefCell<T>>().ok_or_else(|| {
            HostError::type_mismatch(std::any::type_name::<T>(), self.class.name())
        })
    }
}

impl fmt::Debug for HostObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostObject")
            .field("class", &self.class.name())
            .field("addr", &format_args!("{:#x}", self.addr()))
            .finish()
    }
}

impl fmt::Display for HostObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.class.def().display {
            Some(display) => f.write_str(&display(self)),
            None => write!(f, "{}: {:#x}", self.class.name(), self.addr()),
        }
    }
}
