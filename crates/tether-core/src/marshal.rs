//! Value marshaling between Lua and the host
//!
//! `pull` turns one Lua value into a `HostValue`, `push` does the reverse.
//! Primitives are copied. Tables, functions and threads stay in the Lua heap
//! and cross the boundary as references. Host objects and type descriptors
//! cross as proxy userdata pinned in the handle table.

use std::rc::Rc;

use mlua::{Lua, MultiValue, Value};
use tether_sdk::HostValue;

use crate::context::BridgeContext;
use crate::error::{BridgeError, BridgeResult};
use crate::proxy::{ClassProxy, ObjectProxy};

/// Convert a Lua value to a host value.
///
/// Userdata that is not an object or class proxy of this bridge (including
/// proxies whose handle has been released) pulls as `Nil`.
pub fn pull(value: Value) -> HostValue {
    match value {
        Value::Nil => HostValue::Nil,
        Value::Boolean(b) => HostValue::Bool(b),
        Value::Integer(i) => HostValue::Integer(i),
        Value::Number(n) => HostValue::Float(n),
        Value::String(s) => HostValue::Str(s.to_string_lossy().to_string()),
        Value::Table(t) => HostValue::Table(t),
        Value::Function(f) => HostValue::Function(f),
        Value::Thread(t) => HostValue::Thread(t),
        Value::UserData(ud) => pull_userdata(&ud),
        _ => HostValue::Nil,
    }
}

fn pull_userdata(ud: &mlua::AnyUserData) -> HostValue {
    if let Ok(proxy) = ud.borrow::<ObjectProxy>() {
        return proxy.object().map(HostValue::Object).unwrap_or_default();
    }
    if let Ok(proxy) = ud.borrow::<ClassProxy>() {
        return proxy.class().map(HostValue::Type).unwrap_or_default();
    }
    HostValue::Nil
}

/// Convert a host value to a Lua value.
///
/// Fails with `UnsupportedValueKind` for big integers and for unsigned
/// integers beyond the Lua integer range.
pub fn push(lua: &Lua, ctx: &Rc<BridgeContext>, value: HostValue) -> BridgeResult<Value> {
    let value = match value {
        HostValue::Nil => Value::Nil,
        HostValue::Bool(b) => Value::Boolean(b),
        HostValue::Integer(i) => Value::Integer(i),
        HostValue::Unsigned(u) => match i64::try_from(u) {
            Ok(i) => Value::Integer(i),
            Err(_) => {
                return Err(BridgeError::UnsupportedValueKind(format!(
                    "unsigned integer {} exceeds the Lua integer range",
                    u
                )))
            }
        },
        HostValue::Float(f) => Value::Number(f),
        HostValue::BigInt(b) => {
            return Err(BridgeError::UnsupportedValueKind(format!(
                "bigint {} has no Lua representation",
                b
            )))
        }
        HostValue::Str(s) => Value::String(lua.create_string(&s)?),
        HostValue::Array(items) => {
            let table = lua.create_table()?;
            for (i, item) in items.into_iter().enumerate() {
                table.raw_set(i + 1, push(lua, ctx, item)?)?;
            }
            Value::Table(table)
        }
        HostValue::Table(t) => Value::Table(t),
        HostValue::Function(f) => Value::Function(f),
        HostValue::Thread(t) => Value::Thread(t),
        HostValue::Object(obj) => Value::UserData(ObjectProxy::create(lua, ctx, obj)?),
        HostValue::Type(ty) => Value::UserData(ClassProxy::create(lua, ctx, ty)?),
    };
    Ok(value)
}

/// Push a sequence of values, enforcing the transfer limit
pub fn push_many(
    lua: &Lua,
    ctx: &Rc<BridgeContext>,
    values: Vec<HostValue>,
) -> BridgeResult<MultiValue> {
    check_transfer(ctx, values.len())?;
    let mut out = Vec::with_capacity(values.len());
    for value in values {
        out.push(push(lua, ctx, value)?);
    }
    Ok(MultiValue::from_vec(out))
}

/// Pull a sequence of values, enforcing the transfer limit
pub fn pull_many(ctx: &BridgeContext, values: MultiValue) -> BridgeResult<Vec<HostValue>> {
    check_transfer(ctx, values.len())?;
    Ok(values.into_iter().map(pull).collect())
}

fn check_transfer(ctx: &BridgeContext, needed: usize) -> BridgeResult<()> {
    let limit = ctx.options.max_transfer_values;
    if needed > limit {
        return Err(BridgeError::InsufficientStackSpace { needed, limit });
    }
    Ok(())
}
