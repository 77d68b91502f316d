//! HostValue - host-side representation of values crossing the bridge
//!
//! Primitive values are stored inline. Lua composites (tables, functions,
//! threads) are kept as references into the Lua heap: the Lua collector stays
//! the sole owner of their reachability, a `HostValue` only refers to them.
//! Host objects and type descriptors are reference-counted on the host side.

use std::fmt;

use num_bigint::BigInt;

use crate::class::TypeDescriptor;
use crate::object::HostObject;

// ============================================================================
// HostKind
// ============================================================================

/// Declared kind of a parameter, field or property.
///
/// This is the target of argument coercion: a script value is accepted for a
/// parameter when it can be converted into a value of the parameter's kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HostKind {
    /// Any value, passed through unchanged
    Any,
    /// Boolean
    Bool,
    /// 8-bit signed integer
    I8,
    /// 16-bit signed integer
    I16,
    /// 32-bit signed integer
    I32,
    /// 64-bit signed integer
    I64,
    /// 8-bit unsigned integer
    U8,
    /// 16-bit unsigned integer
    U16,
    /// 32-bit unsigned integer
    U32,
    /// 64-bit unsigned integer
    U64,
    /// Single precision float
    F32,
    /// Double precision float
    F64,
    /// Arbitrary precision integer
    BigInt,
    /// UTF-8 string
    Str,
    /// Host array with the given element kind
    Array(Box<HostKind>),
    /// Lua table reference
    Table,
    /// Lua function reference
    Function,
    /// Lua thread reference
    Thread,
    /// Type descriptor
    Type,
    /// Instance of the named class (or of a subclass)
    Object(String),
    /// Placeholder for the n-th type parameter of a generic method
    TypeParam(usize),
}

impl HostKind {
    /// Shorthand for `HostKind::Object(name)`
    pub fn object(name: impl Into<String>) -> Self {
        HostKind::Object(name.into())
    }

    /// Shorthand for `HostKind::Array(Box::new(element))`
    pub fn array(element: HostKind) -> Self {
        HostKind::Array(Box::new(element))
    }

    /// Whether this is a fixed-width integer kind
    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            HostKind::I8
                | HostKind::I16
                | HostKind::I32
                | HostKind::I64
                | HostKind::U8
                | HostKind::U16
                | HostKind::U32
                | HostKind::U64
        )
    }

    /// Whether this is a floating point kind
    pub fn is_float(&self) -> bool {
        matches!(self, HostKind::F32 | HostKind::F64)
    }

    /// Whether this is any numeric kind (integer, float or big integer)
    pub fn is_numeric(&self) -> bool {
        self.is_integer() || self.is_float() || matches!(self, HostKind::BigInt)
    }

    /// Whether `nil` is an acceptable value for this kind
    pub fn accepts_nil(&self) -> bool {
        matches!(
            self,
            HostKind::Any
                | HostKind::Object(_)
                | HostKind::Type
                | HostKind::Table
                | HostKind::Function
                | HostKind::Thread
        )
    }

    /// Inclusive range of a fixed-width integer kind, as `i128` bounds
    pub fn integer_range(&self) -> Option<(i128, i128)> {
        let range = match self {
            HostKind::I8 => (i8::MIN as i128, i8::MAX as i128),
            HostKind::I16 => (i16::MIN as i128, i16::MAX as i128),
            HostKind::I32 => (i32::MIN as i128, i32::MAX as i128),
            HostKind::I64 => (i64::MIN as i128, i64::MAX as i128),
            HostKind::U8 => (0, u8::MAX as i128),
            HostKind::U16 => (0, u16::MAX as i128),
            HostKind::U32 => (0, u32::MAX as i128),
            HostKind::U64 => (0, u64::MAX as i128),
            _ => return None,
        };
        Some(range)
    }

    /// Replace `TypeParam(n)` placeholders with the given concrete kinds.
    ///
    /// Placeholders without a matching argument are left untouched.
    pub fn substitute(&self, args: &[HostKind]) -> HostKind {
        match self {
            HostKind::TypeParam(n) => args.get(*n).cloned().unwrap_or_else(|| self.clone()),
            HostKind::Array(element) => HostKind::Array(Box::new(element.substitute(args))),
            other => other.clone(),
        }
    }

    /// Whether this kind still mentions a generic placeholder
    pub fn is_open(&self) -> bool {
        match self {
            HostKind::TypeParam(_) => true,
            HostKind::Array(element) => element.is_open(),
            _ => false,
        }
    }
}

impl fmt::Display for HostKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostKind::Any => write!(f, "any"),
            HostKind::Bool => write!(f, "bool"),
            HostKind::I8 => write!(f, "i8"),
            HostKind::I16 => write!(f, "i16"),
            HostKind::I32 => write!(f, "i32"),
            HostKind::I64 => write!(f, "i64"),
            HostKind::U8 => write!(f, "u8"),
            HostKind::U16 => write!(f, "u16"),
            HostKind::U32 => write!(f, "u32"),
            HostKind::U64 => write!(f, "u64"),
            HostKind::F32 => write!(f, "f32"),
            HostKind::F64 => write!(f, "f64"),
            HostKind::BigInt => write!(f, "bigint"),
            HostKind::Str => write!(f, "string"),
            HostKind::Array(element) => write!(f, "{}[]", element),
            HostKind::Table => write!(f, "table"),
            HostKind::Function => write!(f, "function"),
            HostKind::Thread => write!(f, "thread"),
            HostKind::Type => write!(f, "type"),
            HostKind::Object(name) => write!(f, "{}", name),
            HostKind::TypeParam(n) => write!(f, "T{}", n),
        }
    }
}

// ============================================================================
// HostValue
// ============================================================================

/// A value on the host side of the bridge.
#[derive(Debug, Clone, Default)]
pub enum HostValue {
    /// Absence of a value (Lua `nil`)
    #[default]
    Nil,
    /// Boolean
    Bool(bool),
    /// Signed integer (the Lua integer subtype)
    Integer(i64),
    /// Unsigned integer that may not fit a Lua integer
    Unsigned(u64),
    /// Double precision float (the Lua float subtype)
    Float(f64),
    /// Arbitrary precision integer; has no Lua representation
    BigInt(BigInt),
    /// String
    Str(String),
    /// Host array, copied into a fresh Lua sequence when pushed
    Array(Vec<HostValue>),
    /// Reference to a Lua table
    Table(mlua::Table),
    /// Reference to a Lua function
    Function(mlua::Function),
    /// Reference to a Lua thread
    Thread(mlua::Thread),
    /// Host object
    Object(HostObject),
    /// Host type descriptor
    Type(TypeDescriptor),
}

impl HostValue {
    /// Short name of the value's kind, as shown in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            HostValue::Nil => "nil",
            HostValue::Bool(_) => "boolean",
            HostValue::Integer(_) => "integer",
            HostValue::Unsigned(_) => "unsigned",
            HostValue::Float(_) => "number",
            HostValue::BigInt(_) => "bigint",
            HostValue::Str(_) => "string",
            HostValue::Array(_) => "array",
            HostValue::Table(_) => "table",
            HostValue::Function(_) => "function",
            HostValue::Thread(_) => "thread",
            HostValue::Object(_) => "object",
            HostValue::Type(_) => "type",
        }
    }

    /// Descriptive name: the class name for objects, the kind otherwise
    pub fn describe(&self) -> String {
        match self {
            HostValue::Object(obj) => obj.class().name().to_string(),
            HostValue::Type(ty) => format!("type {}", ty.name()),
            other => other.type_name().to_string(),
        }
    }

    /// Check if this value is nil
    pub fn is_nil(&self) -> bool {
        matches!(self, HostValue::Nil)
    }

    /// Get as boolean if this is a bool
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            HostValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get as i64 if this is an integer that fits
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            HostValue::Integer(i) => Some(*i),
            HostValue::Unsigned(u) => i64::try_from(*u).ok(),
            _ => None,
        }
    }

    /// Get as f64 if this is any fixed-width number
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            HostValue::Float(f) => Some(*f),
            HostValue::Integer(i) => Some(*i as f64),
            HostValue::Unsigned(u) => Some(*u as f64),
            _ => None,
        }
    }

    /// Get as string slice if this is a string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            HostValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Get the host object if this is one
    pub fn as_object(&self) -> Option<&HostObject> {
        match self {
            HostValue::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Get the type descriptor if this is one
    pub fn as_type(&self) -> Option<&TypeDescriptor> {
        match self {
            HostValue::Type(ty) => Some(ty),
            _ => None,
        }
    }

    /// Get the Lua function if this is one
    pub fn as_function(&self) -> Option<&mlua::Function> {
        match self {
            HostValue::Function(f) => Some(f),
            _ => None,
        }
    }

    /// Get the Lua table if this is one
    pub fn as_table(&self) -> Option<&mlua::Table> {
        match self {
            HostValue::Table(t) => Some(t),
            _ => None,
        }
    }

    /// Lua truthiness: everything except `nil` and `false`
    pub fn is_truthy(&self) -> bool {
        !matches!(self, HostValue::Nil | HostValue::Bool(false))
    }
}

impl PartialEq for HostValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (HostValue::Nil, HostValue::Nil) => true,
            (HostValue::Bool(a), HostValue::Bool(b)) => a == b,
            (HostValue::Integer(a), HostValue::Integer(b)) => a == b,
            (HostValue::Unsigned(a), HostValue::Unsigned(b)) => a == b,
            (HostValue::Integer(a), HostValue::Unsigned(b))
            | (HostValue::Unsigned(b), HostValue::Integer(a)) => {
                u64::try_from(*a).map_or(false, |a| a == *b)
            }
            (HostValue::Float(a), HostValue::Float(b)) => a == b,
            (HostValue::BigInt(a), HostValue::BigInt(b)) => a == b,
            (HostValue::Str(a), HostValue::Str(b)) => a == b,
            (HostValue::Array(a), HostValue::Array(b)) => a == b,
            (HostValue::Table(a), HostValue::Table(b)) => a.to_pointer() == b.to_pointer(),
            (HostValue::Function(a), HostValue::Function(b)) => a.to_pointer() == b.to_pointer(),
            (HostValue::Thread(a), HostValue::Thread(b)) => a.to_pointer() == b.to_pointer(),
            (HostValue::Object(a), HostValue::Object(b)) => a.ptr_eq(b),
            (HostValue::Type(a), HostValue::Type(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for HostValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostValue::Nil => write!(f, "nil"),
            HostValue::Bool(b) => write!(f, "{}", b),
            HostValue::Integer(i) => write!(f, "{}", i),
            HostValue::Unsigned(u) => write!(f, "{}", u),
            HostValue::Float(fl) => write!(f, "{}", fl),
            HostValue::BigInt(b) => write!(f, "{}", b),
            HostValue::Str(s) => write!(f, "{}", s),
            HostValue::Array(items) => {
                write!(f, "[")?;
                for (i, v) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", v)?;
                }
                write!(f, "]")
            }
            HostValue::Table(t) => write!(f, "table: {:p}", t.to_pointer()),
            HostValue::Function(func) => write!(f, "function: {:p}", func.to_pointer()),
            HostValue::Thread(th) => write!(f, "thread: {:p}", th.to_pointer()),
            HostValue::Object(obj) => write!(f, "{}", obj),
            HostValue::Type(ty) => write!(f, "type: {}", ty.name()),
        }
    }
}

impl From<bool> for HostValue {
    fn from(b: bool) -> Self {
        HostValue::Bool(b)
    }
}

impl From<i32> for HostValue {
    fn from(i: i32) -> Self {
        HostValue::Integer(i as i64)
    }
}

impl From<i64> for HostValue {
    fn from(i: i64) -> Self {
        HostValue::Integer(i)
    }
}

impl From<u64> for HostValue {
    fn from(u: u64) -> Self {
        HostValue::Unsigned(u)
    }
}

impl From<f64> for HostValue {
    fn from(f: f64) -> Self {
        HostValue::Float(f)
    }
}

impl From<&str> for HostValue {
    fn from(s: &str) -> Self {
        HostValue::Str(s.to_string())
    }
}

impl From<String> for HostValue {
    fn from(s: String) -> Self {
        HostValue::Str(s)
    }
}

impl From<BigInt> for HostValue {
    fn from(b: BigInt) -> Self {
        HostValue::BigInt(b)
    }
}

impl From<HostObject> for HostValue {
    fn from(obj: HostObject) -> Self {
        HostValue::Object(obj)
    }
}

impl From<TypeDescriptor> for HostValue {
    fn from(ty: TypeDescriptor) -> Self {
        HostValue::Type(ty)
    }
}

impl From<Vec<HostValue>> for HostValue {
    fn from(items: Vec<HostValue>) -> Self {
        HostValue::Array(items)
    }
}
