//! Type registry: the registration table of every host type scripts can see
//!
//! The registry is built once, up front, and is immutable afterwards apart
//! from two memo caches (type metadata and closed generic types). It is
//! `Send + Sync` and may be shared by several script states through `Arc`.

use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use tether_sdk::{ClassBuilder, HostKind, MethodDef, TypeDescriptor};

use super::metadata::TypeMetadata;
use crate::error::{BridgeError, BridgeResult};

/// Namespace holding the built-in primitive type descriptors
pub const PRIMITIVE_NAMESPACE: &str = "prim";

/// Registry of host types exposed to scripts
pub struct TypeRegistry {
    types: Vec<TypeDescriptor>,
    by_name: FxHashMap<String, usize>,
    extensions: FxHashMap<String, Vec<Arc<MethodDef>>>,
    /// Keyed by descriptor identity; the descriptor is kept alive next to its
    /// snapshot so the address is never reused for another definition
    metadata: RwLock<FxHashMap<usize, (TypeDescriptor, Arc<TypeMetadata>)>>,
    closed: RwLock<FxHashMap<String, TypeDescriptor>>,
}

impl TypeRegistry {
    /// Create a registry holding only the primitive descriptors
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Create a registry builder
    pub fn builder() -> TypeRegistryBuilder {
        TypeRegistryBuilder { types: Vec::new() }
    }

    /// Look up a type by full name (`namespace.Name`, or `Name`)
    pub fn descriptor(&self, name: &str) -> Option<TypeDescriptor> {
        self.by_name.get(name).map(|&i| self.types[i].clone())
    }

    /// Check if a type is registered
    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// All types of a namespace, in registration order
    pub fn namespace(&self, namespace: &str) -> Vec<TypeDescriptor> {
        self.types
            .iter()
            .filter(|t| t.namespace() == Some(namespace))
            .cloned()
            .collect()
    }

    /// All registered types, in registration order
    pub fn types(&self) -> impl Iterator<Item = &TypeDescriptor> {
        self.types.iter()
    }

    /// Extension functions targeting the named type
    pub fn extensions_for(&self, type_name: &str) -> &[Arc<MethodDef>] {
        self.extensions
            .get(type_name)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Member snapshot of a type, built on first use and cached.
    ///
    /// Repeated calls for the same descriptor return the same `Arc`. Distinct
    /// definitions that happen to share a name get separate snapshots.
    pub fn metadata_for(&self, ty: &TypeDescriptor) -> Arc<TypeMetadata> {
        let key = ty.identity();
        if let Some((_, meta)) = self.metadata.read().get(&key) {
            return meta.clone();
        }

        let built = Arc::new(TypeMetadata::build(ty, |name| self.extensions_for(name)));
        self.metadata
            .write()
            .entry(key)
            .or_insert_with(|| (ty.clone(), built))
            .1
            .clone()
    }

    /// Close an open generic type over `args`.
    ///
    /// Closing the same type over the same arguments again returns the cached
    /// descriptor.
    pub fn close_generic(
        &self,
        open: &TypeDescriptor,
        args: &[TypeDescriptor],
    ) -> BridgeResult<TypeDescriptor> {
        let generic = open.def().generic.as_ref().ok_or_else(|| BridgeError::InvalidTypeArgument {
            type_name: open.full_name(),
            reason: "type is not generic".to_string(),
        })?;
        if args.len() != generic.params.len() {
            return Err(BridgeError::InvalidTypeArgument {
                type_name: open.full_name(),
                reason: format!(
                    "expected {} type argument(s), got {}",
                    generic.params.len(),
                    args.len()
                ),
            });
        }
        if let Some(arg) = args.iter().find(|a| a.is_open_generic()) {
            return Err(BridgeError::InvalidTypeArgument {
                type_name: open.full_name(),
                reason: format!("{} is an open generic type", arg.full_name()),
            });
        }

        let key = format!(
            "{}<{}>",
            open.full_name(),
            args.iter().map(|a| a.full_name()).collect::<Vec<_>>().join(",")
        );
        if let Some(closed) = self.closed.read().get(&key) {
            return Ok(closed.clone());
        }

        let name = format!(
            "{}<{}>",
            open.name(),
            args.iter().map(|a| a.name().to_string()).collect::<Vec<_>>().join(", ")
        );
        let mut builder = ClassBuilder::new(name).type_args(args);
        if let Some(ns) = open.namespace() {
            builder = builder.namespace(ns);
        }
        if let Some(base) = open.base() {
            builder = builder.extends(base);
        }
        let closed = (generic.close)(builder, args).build();
        tracing::debug!(type_name = %closed.full_name(), "closed generic type");

        Ok(self.closed.write().entry(key).or_insert(closed).clone())
    }

    /// Number of registered types (primitives included)
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("types", &self.types.len())
            .field("extensions", &self.extensions.len())
            .field("cached_metadata", &self.metadata.read().len())
            .finish()
    }
}

/// Builder for TypeRegistry
pub struct TypeRegistryBuilder {
    types: Vec<TypeDescriptor>,
}

impl TypeRegistryBuilder {
    /// Register a type. Nested types are registered along with it.
    pub fn register(mut self, ty: &TypeDescriptor) -> Self {
        self.types.push(ty.clone());
        self
    }

    /// Build the registry.
    ///
    /// Extension functions are collected here, before any metadata exists,
    /// so every type's metadata sees all of them.
    pub fn build(self) -> TypeRegistry {
        let mut types = primitive_types();
        let mut pending = self.types;
        pending.reverse();
        while let Some(ty) = pending.pop() {
            for nested in ty.def().nested.iter().rev() {
                pending.push(nested.clone());
            }
            types.push(ty);
        }

        // Later registrations of a name replace earlier ones in place
        let mut unique: Vec<TypeDescriptor> = Vec::with_capacity(types.len());
        let mut by_name: FxHashMap<String, usize> = FxHashMap::default();
        for ty in types {
            match by_name.get(&ty.full_name()) {
                Some(&i) => unique[i] = ty,
                None => {
                    by_name.insert(ty.full_name(), unique.len());
                    unique.push(ty);
                }
            }
        }

        let mut extensions: FxHashMap<String, Vec<Arc<MethodDef>>> = FxHashMap::default();
        for ty in &unique {
            for method in ty.def().methods.iter().filter(|m| m.extension) {
                match method.params.first().map(|p| &p.kind) {
                    Some(HostKind::Object(target)) => {
                        extensions.entry(target.clone()).or_default().push(method.clone());
                    }
                    _ => tracing::warn!(
                        type_name = %ty.full_name(),
                        method = %method.name,
                        "extension function without an object first parameter ignored"
                    ),
                }
            }
        }

        tracing::debug!(
            types = unique.len(),
            extended = extensions.len(),
            "built type registry"
        );

        TypeRegistry {
            types: unique,
            by_name,
            extensions,
            metadata: RwLock::new(FxHashMap::default()),
            closed: RwLock::new(FxHashMap::default()),
        }
    }
}

fn primitive_types() -> Vec<TypeDescriptor> {
    [
        ("any", HostKind::Any),
        ("bool", HostKind::Bool),
        ("i8", HostKind::I8),
        ("i16", HostKind::I16),
        ("i32", HostKind::I32),
        ("i64", HostKind::I64),
        ("u8", HostKind::U8),
        ("u16", HostKind::U16),
        ("u32", HostKind::U32),
        ("u64", HostKind::U64),
        ("f32", HostKind::F32),
        ("f64", HostKind::F64),
        ("bigint", HostKind::BigInt),
        ("str", HostKind::Str),
        ("table", HostKind::Table),
        ("function", HostKind::Function),
    ]
    .into_iter()
    .map(|(name, kind)| {
        ClassBuilder::new(name)
            .namespace(PRIMITIVE_NAMESPACE)
            .primitive(kind)
            .build()
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tether_sdk::{HostValue, MethodBuilder};

    fn list_type() -> TypeDescriptor {
        ClassBuilder::new("List")
            .namespace("collections")
            .generic(&["T"], |builder, args| {
                let element = args[0].kind();
                builder.method(
                    MethodBuilder::new("push")
                        .param("item", element)
                        .invoke(|_| Ok(HostValue::Nil)),
                )
            })
            .build()
    }

    #[test]
    fn test_primitives_registered() {
        let registry = TypeRegistry::new();
        let i64_ty = registry.descriptor("prim.i64").unwrap();
        assert_eq!(i64_ty.kind(), HostKind::I64);
        assert!(registry.namespace(PRIMITIVE_NAMESPACE).len() >= 14);
    }

    #[test]
    fn test_register_and_lookup() {
        let registry = TypeRegistry::builder().register(&list_type()).build();
        assert!(registry.contains("collections.List"));
        assert!(registry.descriptor("List").is_none());
        assert_eq!(registry.namespace("collections").len(), 1);
    }

    #[test]
    fn test_nested_types_registered() {
        let inner = ClassBuilder::new("Entry").namespace("db").build();
        let outer = ClassBuilder::new("Table").namespace("db").nested(&inner).build();
        let registry = TypeRegistry::builder().register(&outer).build();
        assert!(registry.contains("db.Entry"));
        let names: Vec<String> = registry.namespace("db").iter().map(|t| t.name().to_string()).collect();
        assert_eq!(names, vec!["Table", "Entry"]);
    }

    #[test]
    fn test_metadata_is_cached() {
        let ty = ClassBuilder::new("Point").build();
        let registry = TypeRegistry::builder().register(&ty).build();
        let a = registry.metadata_for(&ty);
        let b = registry.metadata_for(&ty);
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_same_named_definitions_get_own_metadata() {
        let registry = TypeRegistry::new();
        let first = ClassBuilder::new("Temp")
            .method(MethodBuilder::new("ping").invoke(|_| Ok(HostValue::Nil)))
            .build();
        let second = ClassBuilder::new("Temp")
            .method(MethodBuilder::new("pong").invoke(|_| Ok(HostValue::Nil)))
            .build();

        let a = registry.metadata_for(&first);
        let b = registry.metadata_for(&second);
        assert!(!Arc::ptr_eq(&a, &b));
        assert!(a.instance().method_group("ping").is_some());
        assert!(a.instance().method_group("pong").is_none());
        assert!(b.instance().method_group("pong").is_some());
        assert!(Arc::ptr_eq(&b, &registry.metadata_for(&second.clone())));
    }

    #[test]
    fn test_extension_scan() {
        let text = ClassBuilder::new("Text").build();
        let helpers = ClassBuilder::new("TextExt")
            .method(
                MethodBuilder::new("shout")
                    .extension()
                    .param("text", HostKind::object("Text"))
                    .invoke(|_| Ok(HostValue::Nil)),
            )
            .build();
        let registry = TypeRegistry::builder().register(&text).register(&helpers).build();
        assert_eq!(registry.extensions_for("Text").len(), 1);

        let meta = registry.metadata_for(&text);
        assert!(meta.instance().method_group("shout").is_some());
    }

    #[test]
    fn test_close_generic_cached() {
        let registry = TypeRegistry::builder().register(&list_type()).build();
        let list = registry.descriptor("collections.List").unwrap();
        let int = registry.descriptor("prim.i64").unwrap();

        let a = registry.close_generic(&list, &[int.clone()]).unwrap();
        let b = registry.close_generic(&list, &[int]).unwrap();
        assert!(a.ptr_eq(&b));
        assert_eq!(a.full_name(), "collections.List<i64>");
        assert!(!a.is_open_generic());
        assert_eq!(a.def().methods[0].params[0].kind, HostKind::I64);
    }

    #[test]
    fn test_close_generic_arity() {
        let registry = TypeRegistry::builder().register(&list_type()).build();
        let list = registry.descriptor("collections.List").unwrap();
        let err = registry.close_generic(&list, &[]).unwrap_err();
        assert!(matches!(err, BridgeError::InvalidTypeArgument { .. }));

        let int = registry.descriptor("prim.i64").unwrap();
        let err = registry.close_generic(&int, &[]).unwrap_err();
        assert!(matches!(err, BridgeError::InvalidTypeArgument { .. }));
    }
}
