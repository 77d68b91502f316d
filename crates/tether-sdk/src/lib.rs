//! Tether SDK - host object model for the Tether Lua bridge
//!
//! This crate provides the types host code programs against when exposing
//! Rust types to Lua scripts, without depending on the bridge itself:
//!
//! - `HostValue` / `HostKind`: values crossing the bridge and declared kinds
//! - `HostObject`: a shared Rust value tagged with its type descriptor
//! - `ClassBuilder` / `MethodBuilder`: the per-type registration table
//! - `Invocation`: arguments and target seen by a member body
//! - `EventSource`: handler list backing an exposed event
//! - `FromHost` / `IntoHost`: conversions between `HostValue` and Rust types
//!
//! # Example
//!
//! ```ignore
//! use tether_sdk::{ClassBuilder, HostKind, MethodBuilder};
//!
//! struct Greeter { name: String }
//!
//! let greeter = ClassBuilder::new("Greeter")
//!     .constructor(
//!         MethodBuilder::new("new")
//!             .param("name", HostKind::Str)
//!             .invoke(|inv| Ok(inv.construct(Greeter { name: inv.get(0)? }))),
//!     )
//!     .method(
//!         MethodBuilder::new("greet")
//!             .returns(HostKind::Str)
//!             .invoke(|inv| Ok(format!("hello, {}", inv.this::<Greeter>()?.name).into())),
//!     )
//!     .build();
//! ```

#![warn(missing_docs)]

pub mod class;
pub mod convert;
pub mod error;
pub mod event;
pub mod invoke;
pub mod object;
pub mod value;

pub use class::{
    ClassBuilder, ClassDef, DefaultValue, EventDef, FieldDef, GenericTypeDef, MethodBuilder,
    MethodDef, Operator, ParamInfo, ParamMode, PropertyDef, TypeDescriptor,
};
pub use convert::{FromHost, IntoHost};
pub use error::{HostError, HostResult};
pub use event::EventSource;
pub use invoke::Invocation;
pub use object::HostObject;
pub use value::{HostKind, HostValue};
