//! Type registration and metadata
//!
//! - `TypeRegistry`: every host type scripts can reach, plus the extension
//!   function index and the closed generic type cache
//! - `TypeMetadata`: memoized per-type member snapshot used by dispatch

pub mod metadata;
pub mod registry;

pub use metadata::{MemberLookup, MemberTable, MethodGroup, TypeMetadata, DENY_LIST};
pub use registry::{TypeRegistry, TypeRegistryBuilder, PRIMITIVE_NAMESPACE};
