//! Class definitions - the registration table that replaces reflection
//!
//! Every host type exposed to scripts is described once, at startup, by a
//! `ClassDef` built through `ClassBuilder`. The bridge derives all member
//! lookup tables (constructors, overload groups, fields, properties, events,
//! nested types, operators) from these definitions; nothing is discovered by
//! runtime introspection.
//!
//! # Example
//!
//! ```ignore
//! let counter = ClassBuilder::new("Counter")
//!     .constructor(
//!         MethodBuilder::new("new")
//!             .optional("start", HostKind::I64, DefaultValue::Integer(0))
//!             .invoke(|inv| {
//!                 let start: i64 = inv.get(0)?;
//!                 Ok(inv.construct(Counter { count: start }))
//!             }),
//!     )
//!     .method(
//!         MethodBuilder::new("increment")
//!             .returns(HostKind::I64)
//!             .invoke(|inv| {
//!                 let mut this = inv.this_mut::<Counter>()?;
//!                 this.count += 1;
//!                 Ok(this.count.into())
//!             }),
//!     )
//!     .build();
//! ```

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::error::HostResult;
use crate::invoke::Invocation;
use crate::object::HostObject;
use crate::value::{HostKind, HostValue};

// ============================================================================
// Callback types
// ============================================================================

/// Method / constructor / operator body
pub type InvokeFn = Arc<dyn Fn(&mut Invocation<'_>) -> HostResult<HostValue> + Send + Sync>;

/// Field getter; the target is `None` for static fields
pub type GetterFn = Arc<dyn Fn(Option<&HostObject>) -> HostResult<HostValue> + Send + Sync>;

/// Field setter; the target is `None` for static fields
pub type SetterFn = Arc<dyn Fn(Option<&HostObject>, HostValue) -> HostResult<()> + Send + Sync>;

/// Property getter, receiving the index arguments of indexed properties
pub type IndexGetFn =
    Arc<dyn Fn(Option<&HostObject>, &[HostValue]) -> HostResult<HostValue> + Send + Sync>;

/// Property setter, receiving the index arguments of indexed properties
pub type IndexSetFn =
    Arc<dyn Fn(Option<&HostObject>, &[HostValue], HostValue) -> HostResult<()> + Send + Sync>;

/// Event subscription
pub type EventAddFn =
    Arc<dyn Fn(Option<&HostObject>, mlua::Function) -> HostResult<()> + Send + Sync>;

/// Event unsubscription; returns whether the handler was registered
pub type EventRemoveFn =
    Arc<dyn Fn(Option<&HostObject>, &mlua::Function) -> HostResult<bool> + Send + Sync>;

/// Custom `tostring` for instances
pub type DisplayFn = Arc<dyn Fn(&HostObject) -> String + Send + Sync>;

/// Populates the closed form of a generic type from its type arguments
pub type CloseFn = Arc<dyn Fn(ClassBuilder, &[TypeDescriptor]) -> ClassBuilder + Send + Sync>;

// ============================================================================
// Parameters
// ============================================================================

/// How an argument is passed to a parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamMode {
    /// Passed by value
    In,
    /// Passed in, and its final value is returned after the call
    Ref,
    /// Not passed by the script; its final value is returned after the call
    Out,
    /// Absorbs all remaining arguments into an array (last parameter only)
    Variadic,
}

/// Default value of an optional parameter
#[derive(Debug, Clone, PartialEq)]
pub enum DefaultValue {
    /// `nil`
    Nil,
    /// Boolean default
    Bool(bool),
    /// Integer default
    Integer(i64),
    /// Float default
    Float(f64),
    /// String default
    Str(String),
}

impl DefaultValue {
    /// Materialize as a host value
    pub fn to_value(&self) -> HostValue {
        match self {
            DefaultValue::Nil => HostValue::Nil,
            DefaultValue::Bool(b) => HostValue::Bool(*b),
            DefaultValue::Integer(i) => HostValue::Integer(*i),
            DefaultValue::Float(f) => HostValue::Float(*f),
            DefaultValue::Str(s) => HostValue::Str(s.clone()),
        }
    }
}

/// A declared parameter of a method or constructor
#[derive(Debug, Clone, PartialEq)]
pub struct ParamInfo {
    /// Parameter name
    pub name: String,
    /// Declared kind
    pub kind: HostKind,
    /// Passing mode
    pub mode: ParamMode,
    /// Default used when the argument is omitted
    pub default: Option<DefaultValue>,
}

impl ParamInfo {
    /// A by-value parameter
    pub fn new(name: impl Into<String>, kind: HostKind) -> Self {
        Self {
            name: name.into(),
            kind,
            mode: ParamMode::In,
            default: None,
        }
    }

    /// Set the passing mode
    pub fn with_mode(mut self, mode: ParamMode) -> Self {
        self.mode = mode;
        self
    }

    /// Make the parameter optional
    pub fn with_default(mut self, default: DefaultValue) -> Self {
        self.default = Some(default);
        self
    }

    /// Whether the script may omit the argument
    pub fn is_optional(&self) -> bool {
        self.default.is_some()
    }
}

impl fmt::Display for ParamInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.mode {
            ParamMode::In => {}
            ParamMode::Ref => write!(f, "ref ")?,
            ParamMode::Out => write!(f, "out ")?,
            ParamMode::Variadic => write!(f, "...")?,
        }
        write!(f, "{}: {}", self.name, self.kind)?;
        if self.default.is_some() {
            write!(f, "?")?;
        }
        Ok(())
    }
}

// ============================================================================
// Members
// ============================================================================

/// A method, constructor or operator overload
#[derive(Clone)]
pub struct MethodDef {
    /// Member name
    pub name: String,
    /// Declared parameters, in order
    pub params: Vec<ParamInfo>,
    /// Return kind; `None` for methods without a return value
    pub returns: Option<HostKind>,
    /// Whether the member belongs to the type rather than an instance
    pub is_static: bool,
    /// Excluded from script exposure
    pub hidden: bool,
    /// Static function whose first parameter is the extended type
    pub extension: bool,
    /// Number of generic type parameters (0 for ordinary methods)
    pub type_params: usize,
    /// Type arguments of an instantiated generic method
    pub type_args: Vec<TypeDescriptor>,
    /// Method body
    pub invoke: InvokeFn,
}

impl MethodDef {
    /// Whether the method still needs explicit type arguments
    pub fn is_generic(&self) -> bool {
        self.type_params > 0
    }

    /// Number of arguments a script must pass at minimum
    pub fn required_args(&self) -> usize {
        self.params
            .iter()
            .filter(|p| matches!(p.mode, ParamMode::In | ParamMode::Ref) && !p.is_optional())
            .count()
    }

    /// Close a generic method over concrete type arguments.
    ///
    /// Parameter and return kinds mentioning `TypeParam(n)` are replaced by
    /// the kind of the n-th argument. The caller checks the arity.
    pub fn instantiate(&self, type_args: &[TypeDescriptor]) -> MethodDef {
        let kinds: Vec<HostKind> = type_args.iter().map(|t| t.kind()).collect();
        MethodDef {
            name: self.name.clone(),
            params: self
                .params
                .iter()
                .map(|p| ParamInfo {
                    kind: p.kind.substitute(&kinds),
                    ..p.clone()
                })
                .collect(),
            returns: self.returns.as_ref().map(|r| r.substitute(&kinds)),
            is_static: self.is_static,
            hidden: self.hidden,
            extension: self.extension,
            type_params: 0,
            type_args: type_args.to_vec(),
            invoke: self.invoke.clone(),
        }
    }

    /// Human readable signature, e.g. `add(n: i64) -> i64`
    pub fn signature(&self) -> String {
        let params: Vec<String> = self.params.iter().map(|p| p.to_string()).collect();
        let generics = if self.type_params > 0 {
            let names: Vec<String> = (0..self.type_params).map(|n| format!("T{}", n)).collect();
            format!("<{}>", names.join(", "))
        } else {
            String::new()
        };
        match &self.returns {
            Some(ret) => format!("{}{}({}) -> {}", self.name, generics, params.join(", "), ret),
            None => format!("{}{}({})", self.name, generics, params.join(", ")),
        }
    }
}

impl fmt::Debug for MethodDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodDef")
            .field("signature", &self.signature())
            .field("is_static", &self.is_static)
            .field("extension", &self.extension)
            .finish()
    }
}

/// Builder for `MethodDef`
pub struct MethodBuilder {
    name: String,
    params: Vec<ParamInfo>,
    returns: Option<HostKind>,
    is_static: bool,
    hidden: bool,
    extension: bool,
    type_params: usize,
}

impl MethodBuilder {
    /// Start a method named `name`
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            returns: None,
            is_static: false,
            hidden: false,
            extension: false,
            type_params: 0,
        }
    }

    /// Add a by-value parameter
    pub fn param(mut self, name: &str, kind: HostKind) -> Self {
        self.params.push(ParamInfo::new(name, kind));
        self
    }

    /// Add an optional parameter
    pub fn optional(mut self, name: &str, kind: HostKind, default: DefaultValue) -> Self {
        self.params.push(ParamInfo::new(name, kind).with_default(default));
        self
    }

    /// Add a by-reference parameter
    pub fn by_ref(mut self, name: &str, kind: HostKind) -> Self {
        self.params.push(ParamInfo::new(name, kind).with_mode(ParamMode::Ref));
        self
    }

    /// Add an out parameter
    pub fn out(mut self, name: &str, kind: HostKind) -> Self {
        self.params.push(ParamInfo::new(name, kind).with_mode(ParamMode::Out));
        self
    }

    /// Add a trailing variadic parameter with the given element kind
    pub fn variadic(mut self, name: &str, element: HostKind) -> Self {
        self.params.push(ParamInfo::new(name, element).with_mode(ParamMode::Variadic));
        self
    }

    /// Declare the return kind
    pub fn returns(mut self, kind: HostKind) -> Self {
        self.returns = Some(kind);
        self
    }

    /// Mark as a static member
    pub fn as_static(mut self) -> Self {
        self.is_static = true;
        self
    }

    /// Exclude from script exposure
    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// Mark as an extension function of its first parameter's type
    pub fn extension(mut self) -> Self {
        self.extension = true;
        self.is_static = true;
        self
    }

    /// Declare `count` generic type parameters
    pub fn type_params(mut self, count: usize) -> Self {
        self.type_params = count;
        self
    }

    /// Finish the definition with its body
    pub fn invoke<F>(self, f: F) -> MethodDef
    where
        F: Fn(&mut Invocation<'_>) -> HostResult<HostValue> + Send + Sync + 'static,
    {
        MethodDef {
            name: self.name,
            params: self.params,
            returns: self.returns,
            is_static: self.is_static,
            hidden: self.hidden,
            extension: self.extension,
            type_params: self.type_params,
            type_args: Vec::new(),
            invoke: Arc::new(f),
        }
    }
}

/// A field: a named value read and written directly
#[derive(Clone)]
pub struct FieldDef {
    /// Field name
    pub name: String,
    /// Declared kind
    pub kind: HostKind,
    /// Static field
    pub is_static: bool,
    /// Immutable; writes always fail
    pub constant: bool,
    /// Excluded from script exposure
    pub hidden: bool,
    /// Reads the current value
    pub get: GetterFn,
    /// Writes a coerced value; `None` for read-only fields
    pub set: Option<SetterFn>,
}

impl FieldDef {
    /// A writable-if-given-a-setter field
    pub fn new<G>(name: impl Into<String>, kind: HostKind, get: G) -> Self
    where
        G: Fn(Option<&HostObject>) -> HostResult<HostValue> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            kind,
            is_static: false,
            constant: false,
            hidden: false,
            get: Arc::new(get),
            set: None,
        }
    }

    /// A static constant
    pub fn constant(name: impl Into<String>, kind: HostKind, value: DefaultValue) -> Self {
        Self {
            name: name.into(),
            kind,
            is_static: true,
            constant: true,
            hidden: false,
            get: Arc::new(move |_| Ok(value.to_value())),
            set: None,
        }
    }

    /// Attach a setter
    pub fn with_setter<S>(mut self, set: S) -> Self
    where
        S: Fn(Option<&HostObject>, HostValue) -> HostResult<()> + Send + Sync + 'static,
    {
        self.set = Some(Arc::new(set));
        self
    }

    /// Mark as static
    pub fn as_static(mut self) -> Self {
        self.is_static = true;
        self
    }

    /// Exclude from script exposure
    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }
}

/// A property: accessor-backed member, optionally indexed
#[derive(Clone)]
pub struct PropertyDef {
    /// Property name
    pub name: String,
    /// Declared kind of the value
    pub kind: HostKind,
    /// Static property
    pub is_static: bool,
    /// Excluded from script exposure
    pub hidden: bool,
    /// Index parameters; empty for plain properties
    pub index_params: Vec<ParamInfo>,
    /// Getter; `None` for write-only properties
    pub get: Option<IndexGetFn>,
    /// Setter; `None` for read-only properties
    pub set: Option<IndexSetFn>,
}

impl PropertyDef {
    /// Start a property with neither getter nor setter
    pub fn new(name: impl Into<String>, kind: HostKind) -> Self {
        Self {
            name: name.into(),
            kind,
            is_static: false,
            hidden: false,
            index_params: Vec::new(),
            get: None,
            set: None,
        }
    }

    /// Attach a getter
    pub fn getter<G>(mut self, get: G) -> Self
    where
        G: Fn(Option<&HostObject>, &[HostValue]) -> HostResult<HostValue> + Send + Sync + 'static,
    {
        self.get = Some(Arc::new(get));
        self
    }

    /// Attach a setter
    pub fn setter<S>(mut self, set: S) -> Self
    where
        S: Fn(Option<&HostObject>, &[HostValue], HostValue) -> HostResult<()>
            + Send
            + Sync
            + 'static,
    {
        self.set = Some(Arc::new(set));
        self
    }

    /// Declare index parameters, turning this into an indexer
    pub fn indexed(mut self, params: Vec<ParamInfo>) -> Self {
        self.index_params = params;
        self
    }

    /// Mark as static
    pub fn as_static(mut self) -> Self {
        self.is_static = true;
        self
    }

    /// Exclude from script exposure
    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// Whether reading requires index arguments
    pub fn is_indexed(&self) -> bool {
        !self.index_params.is_empty()
    }
}

/// An event scripts can subscribe handlers to
#[derive(Clone)]
pub struct EventDef {
    /// Event name
    pub name: String,
    /// Static event
    pub is_static: bool,
    /// Excluded from script exposure
    pub hidden: bool,
    /// Subscribe a handler
    pub add: EventAddFn,
    /// Unsubscribe a handler
    pub remove: EventRemoveFn,
}

impl EventDef {
    /// Define an event from its subscribe/unsubscribe accessors
    pub fn new<A, R>(name: impl Into<String>, add: A, remove: R) -> Self
    where
        A: Fn(Option<&HostObject>, mlua::Function) -> HostResult<()> + Send + Sync + 'static,
        R: Fn(Option<&HostObject>, &mlua::Function) -> HostResult<bool> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            is_static: false,
            hidden: false,
            add: Arc::new(add),
            remove: Arc::new(remove),
        }
    }

    /// Mark as static
    pub fn as_static(mut self) -> Self {
        self.is_static = true;
        self
    }
}

/// Arithmetic operators a type can overload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// `a + b`
    Add,
    /// `a - b`
    Sub,
    /// `a * b`
    Mul,
    /// `a / b`
    Div,
    /// `-a`
    Neg,
}

impl Operator {
    /// Lua metamethod implementing this operator
    pub fn metamethod(&self) -> &'static str {
        match self {
            Operator::Add => "__add",
            Operator::Sub => "__sub",
            Operator::Mul => "__mul",
            Operator::Div => "__div",
            Operator::Neg => "__unm",
        }
    }

    /// Number of operands
    pub fn arity(&self) -> usize {
        match self {
            Operator::Neg => 1,
            _ => 2,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            Operator::Add => "+",
            Operator::Sub => "-",
            Operator::Mul => "*",
            Operator::Div => "/",
            Operator::Neg => "unary -",
        };
        f.write_str(symbol)
    }
}

/// Open generic type definition
#[derive(Clone)]
pub struct GenericTypeDef {
    /// Type parameter names
    pub params: Vec<String>,
    /// Fills in the closed type's members
    pub close: CloseFn,
}

// ============================================================================
// ClassDef / TypeDescriptor
// ============================================================================

/// Complete registration of one host type
pub struct ClassDef {
    /// Type name (without namespace)
    pub name: String,
    /// Namespace the type is imported from, if any
    pub namespace: Option<String>,
    /// Base class; its members are inherited
    pub base: Option<TypeDescriptor>,
    /// Value kind for built-in primitive descriptors
    pub primitive: Option<HostKind>,
    /// Constructors, in declaration order
    pub constructors: Vec<Arc<MethodDef>>,
    /// Instance and static methods, in declaration order
    pub methods: Vec<Arc<MethodDef>>,
    /// Fields
    pub fields: Vec<Arc<FieldDef>>,
    /// Properties
    pub properties: Vec<Arc<PropertyDef>>,
    /// Events
    pub events: Vec<Arc<EventDef>>,
    /// Nested types
    pub nested: Vec<TypeDescriptor>,
    /// Operator overloads
    pub operators: Vec<(Operator, Arc<MethodDef>)>,
    /// Present on open generic types
    pub generic: Option<GenericTypeDef>,
    /// Type arguments of a closed generic type
    pub type_args: Vec<TypeDescriptor>,
    /// Custom `tostring`
    pub display: Option<DisplayFn>,
}

/// Shared handle to a registered type.
///
/// Descriptors compare equal by full name; the registry guarantees names are
/// unique.
#[derive(Clone)]
pub struct TypeDescriptor(Arc<ClassDef>);

impl TypeDescriptor {
    /// Wrap a finished definition
    pub fn new(def: ClassDef) -> Self {
        TypeDescriptor(Arc::new(def))
    }

    /// Built-in descriptor standing for a primitive kind
    pub fn primitive(name: &str, kind: HostKind) -> Self {
        ClassBuilder::new(name).primitive(kind).build()
    }

    /// The underlying definition
    pub fn def(&self) -> &ClassDef {
        &self.0
    }

    /// Type name without namespace
    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Namespace, if any
    pub fn namespace(&self) -> Option<&str> {
        self.0.namespace.as_deref()
    }

    /// `namespace.Name`, or just the name
    pub fn full_name(&self) -> String {
        match &self.0.namespace {
            Some(ns) => format!("{}.{}", ns, self.0.name),
            None => self.0.name.clone(),
        }
    }

    /// Kind of values of this type, used for explicit type arguments
    pub fn kind(&self) -> HostKind {
        match &self.0.primitive {
            Some(kind) => kind.clone(),
            None => HostKind::Object(self.full_name()),
        }
    }

    /// Whether this is an open generic type
    pub fn is_open_generic(&self) -> bool {
        self.0.generic.is_some()
    }

    /// Number of type parameters of an open generic type
    pub fn generic_arity(&self) -> usize {
        self.0.generic.as_ref().map_or(0, |g| g.params.len())
    }

    /// Base class, if any
    pub fn base(&self) -> Option<&TypeDescriptor> {
        self.0.base.as_ref()
    }

    /// Whether this type is `class_name` or derives from it
    pub fn is_subtype_of(&self, class_name: &str) -> bool {
        let mut current = Some(self);
        while let Some(ty) = current {
            if ty.full_name() == class_name {
                return true;
            }
            current = ty.base();
        }
        false
    }

    /// Check whether two descriptors share the same definition
    pub fn ptr_eq(&self, other: &TypeDescriptor) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Address of the shared definition; equal exactly when `ptr_eq` holds
    pub fn identity(&self) -> usize {
        Arc::as_ptr(&self.0) as usize
    }
}

impl PartialEq for TypeDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || self.full_name() == other.full_name()
    }
}

impl Eq for TypeDescriptor {}

impl Hash for TypeDescriptor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.full_name().hash(state);
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeDescriptor({})", self.full_name())
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_name())
    }
}

/// Builder for `ClassDef`
pub struct ClassBuilder {
    name: String,
    namespace: Option<String>,
    base: Option<TypeDescriptor>,
    primitive: Option<HostKind>,
    constructors: Vec<Arc<MethodDef>>,
    methods: Vec<Arc<MethodDef>>,
    fields: Vec<Arc<FieldDef>>,
    properties: Vec<Arc<PropertyDef>>,
    events: Vec<Arc<EventDef>>,
    nested: Vec<TypeDescriptor>,
    operators: Vec<(Operator, Arc<MethodDef>)>,
    generic: Option<GenericTypeDef>,
    type_args: Vec<TypeDescriptor>,
    display: Option<DisplayFn>,
}

impl ClassBuilder {
    /// Start a class named `name`
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: None,
            base: None,
            primitive: None,
            constructors: Vec::new(),
            methods: Vec::new(),
            fields: Vec::new(),
            properties: Vec::new(),
            events: Vec::new(),
            nested: Vec::new(),
            operators: Vec::new(),
            generic: None,
            type_args: Vec::new(),
            display: None,
        }
    }

    /// Place the class in a namespace
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Inherit members from `base`
    pub fn extends(mut self, base: &TypeDescriptor) -> Self {
        self.base = Some(base.clone());
        self
    }

    /// Add a constructor overload
    pub fn constructor(mut self, def: MethodDef) -> Self {
        self.constructors.push(Arc::new(def));
        self
    }

    /// Add a method (instance or static, per the definition)
    pub fn method(mut self, def: MethodDef) -> Self {
        self.methods.push(Arc::new(def));
        self
    }

    /// Add a field
    pub fn field(mut self, def: FieldDef) -> Self {
        self.fields.push(Arc::new(def));
        self
    }

    /// Add a property
    pub fn property(mut self, def: PropertyDef) -> Self {
        self.properties.push(Arc::new(def));
        self
    }

    /// Add an event
    pub fn event(mut self, def: EventDef) -> Self {
        self.events.push(Arc::new(def));
        self
    }

    /// Add a nested type
    pub fn nested(mut self, ty: &TypeDescriptor) -> Self {
        self.nested.push(ty.clone());
        self
    }

    /// Overload an arithmetic operator
    pub fn operator(mut self, op: Operator, def: MethodDef) -> Self {
        self.operators.push((op, Arc::new(def)));
        self
    }

    /// Make this an open generic type; `close` fills in each closed form
    pub fn generic<F>(mut self, params: &[&str], close: F) -> Self
    where
        F: Fn(ClassBuilder, &[TypeDescriptor]) -> ClassBuilder + Send + Sync + 'static,
    {
        self.generic = Some(GenericTypeDef {
            params: params.iter().map(|p| p.to_string()).collect(),
            close: Arc::new(close),
        });
        self
    }

    /// Stand for a primitive kind instead of a class
    pub fn primitive(mut self, kind: HostKind) -> Self {
        self.primitive = Some(kind);
        self
    }

    /// Record the type arguments of a closed generic type
    pub fn type_args(mut self, args: &[TypeDescriptor]) -> Self {
        self.type_args = args.to_vec();
        self
    }

    /// Custom `tostring` for instances
    pub fn display<F>(mut self, f: F) -> Self
    where
        F: Fn(&HostObject) -> String + Send + Sync + 'static,
    {
        self.display = Some(Arc::new(f));
        self
    }

    /// Finish the definition
    pub fn build(self) -> TypeDescriptor {
        TypeDescriptor::new(ClassDef {
            name: self.name,
            namespace: self.namespace,
            base: self.base,
            primitive: self.primitive,
            constructors: self.constructors,
            methods: self.methods,
            fields: self.fields,
            properties: self.properties,
            events: self.events,
            nested: self.nested,
            operators: self.operators,
            generic: self.generic,
            type_args: self.type_args,
            display: self.display,
        })
    }
}
