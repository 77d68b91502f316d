//! Conversion traits between `HostValue` and Rust types
//!
//! Arguments reaching a host member have already been coerced to the
//! declared parameter kind, so these conversions only unwrap the matching
//! `HostValue` variant. They still check ranges, since a member may read an
//! `Any` parameter with a narrower Rust type.

use num_bigint::BigInt;
use num_traits::FromPrimitive;

use crate::class::TypeDescriptor;
use crate::error::{HostError, HostResult};
use crate::object::HostObject;
use crate::value::HostValue;

/// Convert from `HostValue` to a Rust type.
///
/// Implement this trait to receive your type as a member argument.
pub trait FromHost: Sized {
    /// Convert, returning an error if the value does not have a matching kind
    fn from_host(value: &HostValue) -> HostResult<Self>;
}

/// Convert from a Rust type to `HostValue`.
///
/// Implement this trait to return your type from a member.
pub trait IntoHost {
    /// Convert into a host value
    fn into_host(self) -> HostValue;
}

fn mismatch(expected: &str, value: &HostValue) -> HostError {
    HostError::type_mismatch(expected, &value.describe())
}

// ============================================================================
// Primitive Type Implementations
// ============================================================================

impl FromHost for HostValue {
    fn from_host(value: &HostValue) -> HostResult<Self> {
        Ok(value.clone())
    }
}

impl IntoHost for HostValue {
    fn into_host(self) -> HostValue {
        self
    }
}

impl FromHost for bool {
    fn from_host(value: &HostValue) -> HostResult<Self> {
        value.as_bool().ok_or_else(|| mismatch("bool", value))
    }
}

impl IntoHost for bool {
    fn into_host(self) -> HostValue {
        HostValue::Bool(self)
    }
}

macro_rules! impl_integer {
    ($($ty:ty => $name:literal),* $(,)?) => {
        $(
            impl FromHost for $ty {
                fn from_host(value: &HostValue) -> HostResult<Self> {
                    let converted = match value {
                        HostValue::Integer(i) => <$ty>::try_from(*i).ok(),
                        HostValue::Unsigned(u) => <$ty>::try_from(*u).ok(),
                        _ => return Err(mismatch($name, value)),
                    };
                    converted.ok_or_else(|| {
                        HostError::argument(format!("{} is out of range for {}", value, $name))
                    })
                }
            }
        )*
    };
}

impl_integer! {
    i8 => "i8",
    i16 => "i16",
    i32 => "i32",
    i64 => "i64",
    u8 => "u8",
    u16 => "u16",
    u32 => "u32",
    u64 => "u64",
    usize => "usize",
}

macro_rules! impl_into_signed {
    ($($ty:ty),*) => {
        $(
            impl IntoHost for $ty {
                fn into_host(self) -> HostValue {
                    HostValue::Integer(self as i64)
                }
            }
        )*
    };
}

impl_into_signed!(i8, i16, i32, i64, u8, u16, u32);

impl IntoHost for u64 {
    fn into_host(self) -> HostValue {
        match i64::try_from(self) {
            Ok(i) => HostValue::Integer(i),
            Err(_) => HostValue::Unsigned(self),
        }
    }
}

impl IntoHost for usize {
    fn into_host(self) -> HostValue {
        (self as u64).into_host()
    }
}

impl FromHost for f64 {
    fn from_host(value: &HostValue) -> HostResult<Self> {
        value.as_f64().ok_or_else(|| mismatch("f64", value))
    }
}

impl IntoHost for f64 {
    fn into_host(self) -> HostValue {
        HostValue::Float(self)
    }
}

impl FromHost for f32 {
    fn from_host(value: &HostValue) -> HostResult<Self> {
        value
            .as_f64()
            .map(|f| f as f32)
            .ok_or_else(|| mismatch("f32", value))
    }
}

impl IntoHost for f32 {
    fn into_host(self) -> HostValue {
        HostValue::Float(self as f64)
    }
}

impl FromHost for BigInt {
    fn from_host(value: &HostValue) -> HostResult<Self> {
        match value {
            HostValue::BigInt(b) => Ok(b.clone()),
            HostValue::Integer(i) => Ok(BigInt::from(*i)),
            HostValue::Unsigned(u) => Ok(BigInt::from(*u)),
            HostValue::Float(f) => BigInt::from_f64(f.trunc())
                .ok_or_else(|| HostError::argument(format!("{} has no integer value", f))),
            other => Err(mismatch("bigint", other)),
        }
    }
}

impl IntoHost for BigInt {
    fn into_host(self) -> HostValue {
        HostValue::BigInt(self)
    }
}

impl FromHost for String {
    fn from_host(value: &HostValue) -> HostResult<Self> {
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| mismatch("string", value))
    }
}

impl IntoHost for String {
    fn into_host(self) -> HostValue {
        HostValue::Str(self)
    }
}

impl IntoHost for &str {
    fn into_host(self) -> HostValue {
        HostValue::Str(self.to_string())
    }
}

// Unit type (for members without a return value)
impl IntoHost for () {
    fn into_host(self) -> HostValue {
        HostValue::Nil
    }
}

// ============================================================================
// Reference Type Implementations
// ============================================================================

impl FromHost for HostObject {
    fn from_host(value: &HostValue) -> HostResult<Self> {
        value.as_object().cloned().ok_or_else(|| mismatch("object", value))
    }
}

impl IntoHost for HostObject {
    fn into_host(self) -> HostValue {
        HostValue::Object(self)
    }
}

impl FromHost for TypeDescriptor {
    fn from_host(value: &HostValue) -> HostResult<Self> {
        value.as_type().cloned().ok_or_else(|| mismatch("type", value))
    }
}

impl IntoHost for TypeDescriptor {
    fn into_host(self) -> HostValue {
        HostValue::Type(self)
    }
}

impl FromHost for mlua::Function {
    fn from_host(value: &HostValue) -> HostResult<Self> {
        value.as_function().cloned().ok_or_else(|| mismatch("function", value))
    }
}

impl IntoHost for mlua::Function {
    fn into_host(self) -> HostValue {
        HostValue::Function(self)
    }
}

impl FromHost for mlua::Table {
    fn from_host(value: &HostValue) -> HostResult<Self> {
        value.as_table().cloned().ok_or_else(|| mismatch("table", value))
    }
}

impl IntoHost for mlua::Table {
    fn into_host(self) -> HostValue {
        HostValue::Table(self)
    }
}

impl FromHost for mlua::Thread {
    fn from_host(value: &HostValue) -> HostResult<Self> {
        match value {
            HostValue::Thread(t) => Ok(t.clone()),
            other => Err(mismatch("thread", other)),
        }
    }
}

impl IntoHost for mlua::Thread {
    fn into_host(self) -> HostValue {
        HostValue::Thread(self)
    }
}

// ============================================================================
// Container Implementations
// ============================================================================

impl<T: FromHost> FromHost for Vec<T> {
    fn from_host(value: &HostValue) -> HostResult<Self> {
        match value {
            HostValue::Array(items) => items.iter().map(T::from_host).collect(),
            other => Err(mismatch("array", other)),
        }
    }
}

impl<T: IntoHost> IntoHost for Vec<T> {
    fn into_host(self) -> HostValue {
        HostValue::Array(self.into_iter().map(IntoHost::into_host).collect())
    }
}

impl<T: FromHost> FromHost for Option<T> {
    fn from_host(value: &HostValue) -> HostResult<Self> {
        match value {
            HostValue::Nil => Ok(None),
            other => T::from_host(other).map(Some),
        }
    }
}

impl<T: IntoHost> IntoHost for Option<T> {
    fn into_host(self) -> HostValue {
        match self {
            Some(value) => value.into_host(),
            None => HostValue::Nil,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_conversions() {
        assert_eq!(i32::from_host(&HostValue::Integer(42)).unwrap(), 42);
        assert_eq!(u64::from_host(&HostValue::Unsigned(u64::MAX)).unwrap(), u64::MAX);
        assert!(u8::from_host(&HostValue::Integer(300)).is_err());
        assert!(u32::from_host(&HostValue::Integer(-1)).is_err());
        assert!(i64::from_host(&HostValue::Str("1".into())).is_err());
    }

    #[test]
    fn test_unsigned_into_host() {
        assert_eq!(5u64.into_host(), HostValue::Integer(5));
        assert_eq!(u64::MAX.into_host(), HostValue::Unsigned(u64::MAX));
    }

    #[test]
    fn test_float_and_bigint() {
        assert_eq!(f64::from_host(&HostValue::Integer(2)).unwrap(), 2.0);
        assert_eq!(
            BigInt::from_host(&HostValue::Float(7.9)).unwrap(),
            BigInt::from(7)
        );
        assert!(BigInt::from_host(&HostValue::Float(f64::NAN)).is_err());
    }

    #[test]
    fn test_containers() {
        let arr = HostValue::Array(vec![1i64.into(), 2i64.into()]);
        assert_eq!(Vec::<i64>::from_host(&arr).unwrap(), vec![1, 2]);
        assert_eq!(Option::<String>::from_host(&HostValue::Nil).unwrap(), None);
        assert_eq!(
            vec!["a", "b"].into_host(),
            HostValue::Array(vec!["a".into(), "b".into()])
        );
        assert!(().into_host().is_nil());
    }

    #[test]
    fn test_mismatch_message() {
        let err = bool::from_host(&HostValue::Integer(1)).unwrap_err();
        assert_eq!(err.message(), "Type mismatch: expected bool, got integer");
    }
}
