//! Argument coercion
//!
//! Converts a pulled script value into a value of a declared `HostKind`.
//! Used by overload resolution (a failed coercion rejects the candidate) and
//! by member writes (a failed coercion is a `TypeMismatch`).

use num_bigint::BigInt;
use num_traits::{FromPrimitive, ToPrimitive};
use tether_sdk::{HostKind, HostValue};

use crate::context::BridgeContext;
use crate::error::{BridgeError, BridgeResult};
use crate::marshal;

/// Coerce `value` to `kind`.
///
/// - floats convert to `f32`/`f64`/`bigint` (truncating), and to integer
///   kinds when integral and in range
/// - integers convert to any integer kind they fit, and to float/`bigint`
/// - strings convert to a numeric kind only when they parse as it
/// - Lua sequences convert to arrays element by element
/// - everything else must already satisfy the kind (objects by subtype)
pub fn coerce(ctx: &BridgeContext, value: &HostValue, kind: &HostKind) -> BridgeResult<HostValue> {
    coerce_at(ctx, value, kind, 0)
}

fn coerce_at(
    ctx: &BridgeContext,
    value: &HostValue,
    kind: &HostKind,
    depth: usize,
) -> BridgeResult<HostValue> {
    let mismatch = || BridgeError::mismatch(kind, value.describe());

    match (kind, value) {
        (HostKind::Any, v) | (HostKind::TypeParam(_), v) => Ok(v.clone()),
        (k, HostValue::Nil) => {
            if k.accepts_nil() {
                Ok(HostValue::Nil)
            } else {
                Err(mismatch())
            }
        }
        (k, v) if k.is_numeric() => coerce_numeric(k, v).ok_or_else(mismatch),
        (HostKind::Bool, HostValue::Bool(_))
        | (HostKind::Str, HostValue::Str(_))
        | (HostKind::Table, HostValue::Table(_))
        | (HostKind::Function, HostValue::Function(_))
        | (HostKind::Thread, HostValue::Thread(_))
        | (HostKind::Type, HostValue::Type(_)) => Ok(value.clone()),
        (HostKind::Object(name), HostValue::Object(obj)) if obj.class().is_subtype_of(name) => {
            Ok(value.clone())
        }
        (HostKind::Array(element), HostValue::Array(items)) => {
            check_depth(ctx, depth)?;
            items
                .iter()
                .map(|item| coerce_at(ctx, item, element, depth + 1))
                .collect::<BridgeResult<Vec<_>>>()
                .map(HostValue::Array)
        }
        (HostKind::Array(element), HostValue::Table(table)) => {
            check_depth(ctx, depth)?;
            let mut items = Vec::new();
            for i in 1..=table.raw_len() {
                let item = marshal::pull(table.raw_get::<mlua::Value>(i)?);
                items.push(coerce_at(ctx, &item, element, depth + 1)?);
            }
            Ok(HostValue::Array(items))
        }
        _ => Err(mismatch()),
    }
}

fn check_depth(ctx: &BridgeContext, depth: usize) -> BridgeResult<()> {
    let limit = ctx.options.max_coercion_depth;
    if depth >= limit {
        return Err(BridgeError::mismatch(
            "array",
            format!("table nested deeper than {}", limit),
        ));
    }
    Ok(())
}

fn coerce_numeric(kind: &HostKind, value: &HostValue) -> Option<HostValue> {
    match value {
        HostValue::Integer(i) => from_integer(kind, *i as i128),
        HostValue::Unsigned(u) => from_integer(kind, *u as i128),
        HostValue::Float(f) => from_float(kind, *f),
        HostValue::BigInt(b) => match kind {
            HostKind::BigInt => Some(HostValue::BigInt(b.clone())),
            HostKind::F32 | HostKind::F64 => b.to_f64().and_then(|f| from_float(kind, f)),
            _ => b.to_i128().and_then(|i| from_integer(kind, i)),
        },
        HostValue::Str(s) => parse_numeric(kind, s.trim()),
        _ => None,
    }
}

fn from_integer(kind: &HostKind, i: i128) -> Option<HostValue> {
    match kind {
        HostKind::F32 => Some(HostValue::Float(i as f32 as f64)),
        HostKind::F64 => Some(HostValue::Float(i as f64)),
        HostKind::BigInt => Some(HostValue::BigInt(BigInt::from(i))),
        k => {
            let (lo, hi) = k.integer_range()?;
            if i < lo || i > hi {
                return None;
            }
            Some(match i64::try_from(i) {
                Ok(v) => HostValue::Integer(v),
                Err(_) => HostValue::Unsigned(i as u64),
            })
        }
    }
}

fn from_float(kind: &HostKind, f: f64) -> Option<HostValue> {
    match kind {
        HostKind::F32 => Some(HostValue::Float(f as f32 as f64)),
        HostKind::F64 => Some(HostValue::Float(f)),
        HostKind::BigInt => BigInt::from_f64(f.trunc()).map(HostValue::BigInt),
        k if k.is_integer() => {
            if !f.is_finite() || f.fract() != 0.0 {
                return None;
            }
            from_integer(k, f as i128)
        }
        _ => None,
    }
}

fn parse_numeric(kind: &HostKind, s: &str) -> Option<HostValue> {
    match kind {
        HostKind::F32 | HostKind::F64 => s.parse::<f64>().ok().and_then(|f| from_float(kind, f)),
        HostKind::BigInt => s.parse::<BigInt>().ok().map(HostValue::BigInt),
        k => s.parse::<i128>().ok().and_then(|i| from_integer(k, i)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use tether_sdk::{ClassBuilder, HostObject};

    use crate::options::BridgeOptions;
    use crate::types::TypeRegistry;

    fn ctx() -> BridgeContext {
        BridgeContext::new(Arc::new(TypeRegistry::new()), BridgeOptions::default())
    }

    #[test]
    fn test_integer_ranges() {
        let ctx = ctx();
        assert_eq!(
            coerce(&ctx, &HostValue::Integer(200), &HostKind::U8).unwrap(),
            HostValue::Integer(200)
        );
        assert!(coerce(&ctx, &HostValue::Integer(300), &HostKind::U8).is_err());
        assert!(coerce(&ctx, &HostValue::Integer(-1), &HostKind::U32).is_err());
        assert_eq!(
            coerce(&ctx, &HostValue::Integer(3), &HostKind::F64).unwrap(),
            HostValue::Float(3.0)
        );
    }

    #[test]
    fn test_float_rules() {
        let ctx = ctx();
        assert_eq!(
            coerce(&ctx, &HostValue::Float(4.0), &HostKind::I32).unwrap(),
            HostValue::Integer(4)
        );
        assert!(coerce(&ctx, &HostValue::Float(4.5), &HostKind::I32).is_err());
        assert_eq!(
            coerce(&ctx, &HostValue::Float(0.1), &HostKind::F32).unwrap(),
            HostValue::Float(0.1f32 as f64)
        );
        assert_eq!(
            coerce(&ctx, &HostValue::Float(9.99), &HostKind::BigInt).unwrap(),
            HostValue::BigInt(BigInt::from(9))
        );
    }

    #[test]
    fn test_string_parsing() {
        let ctx = ctx();
        assert_eq!(
            coerce(&ctx, &HostValue::from("42"), &HostKind::I64).unwrap(),
            HostValue::Integer(42)
        );
        assert_eq!(
            coerce(&ctx, &HostValue::from(" 1.5 "), &HostKind::F64).unwrap(),
            HostValue::Float(1.5)
        );
        assert!(coerce(&ctx, &HostValue::from("1.5"), &HostKind::I64).is_err());
        assert!(coerce(&ctx, &HostValue::from("abc"), &HostKind::F64).is_err());
        // Numbers never become strings
        assert!(coerce(&ctx, &HostValue::Integer(1), &HostKind::Str).is_err());
    }

    #[test]
    fn test_table_to_array() {
        let ctx = ctx();
        let lua = mlua::Lua::new();
        let good: mlua::Table = lua.load("return {1, 2, 3}").eval().unwrap();
        let coerced = coerce(
            &ctx,
            &HostValue::Table(good),
            &HostKind::array(HostKind::I64),
        )
        .unwrap();
        assert_eq!(
            coerced,
            HostValue::Array(vec![1i64.into(), 2i64.into(), 3i64.into()])
        );

        let bad: mlua::Table = lua.load("return {1, 'x', 3}").eval().unwrap();
        let err = coerce(&ctx, &HostValue::Table(bad), &HostKind::array(HostKind::I64)).unwrap_err();
        assert!(matches!(err, BridgeError::TypeMismatch { .. }));
    }

    #[test]
    fn test_nested_depth_limit() {
        let ctx = BridgeContext::new(
            Arc::new(TypeRegistry::new()),
            BridgeOptions::default().with_max_coercion_depth(1),
        );
        let lua = mlua::Lua::new();
        let nested: mlua::Table = lua.load("return {{1}, {2}}").eval().unwrap();
        let kind = HostKind::array(HostKind::array(HostKind::I64));
        assert!(coerce(&ctx, &HostValue::Table(nested), &kind).is_err());
    }

    #[test]
    fn test_nil_and_objects() {
        let ctx = ctx();
        assert!(coerce(&ctx, &HostValue::Nil, &HostKind::I64).is_err());
        assert!(coerce(&ctx, &HostValue::Nil, &HostKind::object("Shape")).is_ok());

        let shape = ClassBuilder::new("Shape").build();
        let circle = ClassBuilder::new("Circle").extends(&shape).build();
        let obj = HostValue::Object(HostObject::new(&circle, ()));
        assert!(coerce(&ctx, &obj, &HostKind::object("Shape")).is_ok());
        assert!(coerce(&ctx, &obj, &HostKind::object("Square")).is_err());
    }
}
