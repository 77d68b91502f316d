//! Per-type member snapshot used by dispatch
//!
//! `TypeMetadata` is derived once from a class's registration (and its base
//! chain) and never changes afterwards. Members are split into an instance
//! and a static `MemberTable`; methods are grouped by name in declaration
//! order, which is also the tie-break order of overload resolution.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use tether_sdk::{EventDef, FieldDef, MethodDef, Operator, PropertyDef, TypeDescriptor};

/// Infrastructure members never exposed to scripts
pub const DENY_LIST: &[&str] = &[
    "clone",
    "clone_from",
    "drop",
    "dispose",
    "eq",
    "ne",
    "fmt",
    "hash",
    "type_id",
    "iter",
    "into_iter",
    "to_owned",
];

/// Whether a member with this name is on the deny-list
pub fn is_denied(name: &str) -> bool {
    DENY_LIST.contains(&name)
}

/// Same-named overloads, in resolution order
#[derive(Debug, Clone)]
pub struct MethodGroup {
    /// Group name
    pub name: String,
    /// Own overloads, then inherited ones, then extension functions
    pub overloads: Vec<Arc<MethodDef>>,
}

/// Result of a member name lookup
#[derive(Clone)]
pub enum MemberLookup {
    /// Event
    Event(Arc<EventDef>),
    /// Field
    Field(Arc<FieldDef>),
    /// Method group
    Methods(Arc<MethodGroup>),
    /// Property (plain or indexed)
    Property(Arc<PropertyDef>),
    /// Nested type
    Nested(TypeDescriptor),
}

impl MemberLookup {
    /// Short description of the member kind
    pub fn kind_name(&self) -> &'static str {
        match self {
            MemberLookup::Event(_) => "event",
            MemberLookup::Field(_) => "field",
            MemberLookup::Methods(_) => "method",
            MemberLookup::Property(_) => "property",
            MemberLookup::Nested(_) => "nested type",
        }
    }
}

/// Members of one partition (instance or static)
#[derive(Default)]
pub struct MemberTable {
    methods: FxHashMap<String, Arc<MethodGroup>>,
    fields: FxHashMap<String, Arc<FieldDef>>,
    properties: FxHashMap<String, Arc<PropertyDef>>,
    events: FxHashMap<String, Arc<EventDef>>,
    nested: FxHashMap<String, TypeDescriptor>,
}

impl MemberTable {
    /// Resolve a member name.
    ///
    /// Names shared by several member kinds resolve in the order event,
    /// field, method, property, nested type.
    pub fn lookup(&self, name: &str) -> Option<MemberLookup> {
        if let Some(event) = self.events.get(name) {
            return Some(MemberLookup::Event(event.clone()));
        }
        if let Some(field) = self.fields.get(name) {
            return Some(MemberLookup::Field(field.clone()));
        }
        if let Some(group) = self.methods.get(name) {
            return Some(MemberLookup::Methods(group.clone()));
        }
        if let Some(property) = self.properties.get(name) {
            return Some(MemberLookup::Property(property.clone()));
        }
        self.nested
            .get(name)
            .map(|ty| MemberLookup::Nested(ty.clone()))
    }

    /// Method group by name
    pub fn method_group(&self, name: &str) -> Option<&Arc<MethodGroup>> {
        self.methods.get(name)
    }

    /// All exposed member names, sorted
    pub fn member_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .methods
            .keys()
            .chain(self.fields.keys())
            .chain(self.properties.keys())
            .chain(self.events.keys())
            .chain(self.nested.keys())
            .cloned()
            .collect();
        names.sort();
        names.dedup();
        names
    }

    /// Whether the partition exposes nothing
    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
            && self.fields.is_empty()
            && self.properties.is_empty()
            && self.events.is_empty()
            && self.nested.is_empty()
    }

    fn add_method(&mut self, method: &Arc<MethodDef>) {
        let group = self
            .methods
            .entry(method.name.clone())
            .or_insert_with(|| {
                Arc::new(MethodGroup {
                    name: method.name.clone(),
                    overloads: Vec::new(),
                })
            });
        Arc::make_mut(group).overloads.push(method.clone());
    }
}

/// Immutable member snapshot of one type
pub struct TypeMetadata {
    ty: TypeDescriptor,
    constructors: Vec<Arc<MethodDef>>,
    instance: MemberTable,
    statics: MemberTable,
    operators: FxHashMap<Operator, Vec<Arc<MethodDef>>>,
}

impl TypeMetadata {
    /// Build the snapshot for `ty`.
    ///
    /// `extensions` yields the extension functions targeting a type name;
    /// they join the instance method groups after every declared overload.
    pub(crate) fn build<'a, F>(ty: &TypeDescriptor, extensions: F) -> Self
    where
        F: Fn(&str) -> &'a [Arc<MethodDef>],
    {
        let mut meta = TypeMetadata {
            ty: ty.clone(),
            constructors: ty
                .def()
                .constructors
                .iter()
                .filter(|c| !c.hidden)
                .cloned()
                .collect(),
            instance: MemberTable::default(),
            statics: MemberTable::default(),
            operators: FxHashMap::default(),
        };

        let chain: Vec<&TypeDescriptor> =
            std::iter::successors(Some(ty), |t| t.base()).collect();

        for current in &chain {
            meta.add_members(current);
        }
        for current in &chain {
            for ext in extensions(&current.full_name()) {
                if exposed(&ext.name, ext.hidden) {
                    meta.instance.add_method(ext);
                }
            }
        }

        tracing::debug!(
            type_name = %ty.full_name(),
            instance = meta.instance.member_names().len(),
            statics = meta.statics.member_names().len(),
            "built type metadata"
        );
        meta
    }

    fn add_members(&mut self, ty: &TypeDescriptor) {
        let def = ty.def();

        for method in &def.methods {
            if !exposed(&method.name, method.hidden) {
                continue;
            }
            self.partition_mut(method.is_static).add_method(method);
        }

        // Derived fields, properties and events shadow inherited ones
        for field in &def.fields {
            if exposed(&field.name, field.hidden) {
                self.partition_mut(field.is_static)
                    .fields
                    .entry(field.name.clone())
                    .or_insert_with(|| field.clone());
            }
        }
        for property in &def.properties {
            if exposed(&property.name, property.hidden) {
                self.partition_mut(property.is_static)
                    .properties
                    .entry(property.name.clone())
                    .or_insert_with(|| property.clone());
            }
        }
        for event in &def.events {
            if exposed(&event.name, event.hidden) {
                self.partition_mut(event.is_static)
                    .events
                    .entry(event.name.clone())
                    .or_insert_with(|| event.clone());
            }
        }
        for nested in &def.nested {
            self.statics
                .nested
                .entry(nested.name().to_string())
                .or_insert_with(|| nested.clone());
        }
        for (op, method) in &def.operators {
            self.operators.entry(*op).or_default().push(method.clone());
        }
    }

    fn partition_mut(&mut self, is_static: bool) -> &mut MemberTable {
        if is_static {
            &mut self.statics
        } else {
            &mut self.instance
        }
    }

    /// Type this snapshot describes
    pub fn type_descriptor(&self) -> &TypeDescriptor {
        &self.ty
    }

    /// Exposed constructors, in declaration order
    pub fn constructors(&self) -> &[Arc<MethodDef>] {
        &self.constructors
    }

    /// Instance members
    pub fn instance(&self) -> &MemberTable {
        &self.instance
    }

    /// Static members
    pub fn statics(&self) -> &MemberTable {
        &self.statics
    }

    /// Instance or static partition
    pub fn members(&self, is_static: bool) -> &MemberTable {
        if is_static {
            &self.statics
        } else {
            &self.instance
        }
    }

    /// Overloads of an operator (own first, then inherited)
    pub fn operator(&self, op: Operator) -> &[Arc<MethodDef>] {
        self.operators.get(&op).map(Vec::as_slice).unwrap_or(&[])
    }
}

impl std::fmt::Debug for TypeMetadata {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeMetadata")
            .field("type", &self.ty.full_name())
            .field("constructors", &self.constructors.len())
            .field("instance", &self.instance.member_names())
            .field("statics", &self.statics.member_names())
            .finish()
    }
}

fn exposed(name: &str, hidden: bool) -> bool {
    !hidden && !is_denied(name)
}
