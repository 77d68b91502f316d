//! Member reads, writes, calls and construction

use std::rc::Rc;
use std::sync::Arc;

use mlua::{Lua, Value};
use tether_sdk::{HostValue, PropertyDef, TypeDescriptor};

use super::coerce::coerce;
use super::overload;
use super::{describe_args, guard, invoke, Target};
use crate::context::BridgeContext;
use crate::error::{BridgeError, BridgeResult};
use crate::marshal;
use crate::proxy::{EventProxy, IndexerProxy, MethodProxy};
use crate::types::{MemberLookup, MethodGroup};

/// Read member `name` of `target`
pub fn index(
    lua: &Lua,
    ctx: &Rc<BridgeContext>,
    target: &Target,
    name: &str,
) -> BridgeResult<Value> {
    let meta = ctx.registry.metadata_for(target.class());
    let member = meta
        .members(target.is_static())
        .lookup(name)
        .ok_or_else(|| unknown(target, name))?;
    tracing::trace!(
        type_name = %target.class().full_name(),
        member = name,
        kind = member.kind_name(),
        "read member"
    );

    match member {
        MemberLookup::Event(event) => {
            let proxy = EventProxy::new(target.clone(), event);
            Ok(Value::UserData(lua.create_userdata(proxy)?))
        }
        MemberLookup::Field(field) => {
            let value = guard(|| target.member_context(name), || (field.get)(target.object()))?;
            marshal::push(lua, ctx, value)
        }
        MemberLookup::Methods(group) => {
            let proxy = MethodProxy::new(target.clone(), group, ctx.clone());
            Ok(Value::UserData(lua.create_userdata(proxy)?))
        }
        MemberLookup::Property(property) if property.is_indexed() => {
            let proxy = IndexerProxy::new(target.clone(), property, ctx.clone());
            Ok(Value::UserData(lua.create_userdata(proxy)?))
        }
        MemberLookup::Property(property) => {
            let get = property.get.as_ref().ok_or_else(|| unknown(target, name))?;
            let value = guard(|| target.member_context(name), || get(target.object(), &[]))?;
            marshal::push(lua, ctx, value)
        }
        MemberLookup::Nested(ty) => marshal::push(lua, ctx, HostValue::Type(ty)),
    }
}

/// Write `value` to member `name` of `target`
pub fn newindex(
    ctx: &BridgeContext,
    target: &Target,
    name: &str,
    value: HostValue,
) -> BridgeResult<()> {
    let meta = ctx.registry.metadata_for(target.class());
    let member = meta
        .members(target.is_static())
        .lookup(name)
        .ok_or_else(|| unknown(target, name))?;
    tracing::trace!(
        type_name = %target.class().full_name(),
        member = name,
        kind = member.kind_name(),
        "write member"
    );

    match member {
        MemberLookup::Field(field) => {
            let set = match (&field.set, field.constant) {
                (Some(set), false) => set,
                _ => return Err(read_only(target, name)),
            };
            let value = coerce(ctx, &value, &field.kind)?;
            guard(|| target.member_context(name), || set(target.object(), value))
        }
        MemberLookup::Property(property) if !property.is_indexed() => {
            let set = property.set.as_ref().ok_or_else(|| read_only(target, name))?;
            let value = coerce(ctx, &value, &property.kind)?;
            guard(|| target.member_context(name), || set(target.object(), &[], value))
        }
        _ => Err(read_only(target, name)),
    }
}

/// Call a bound method group.
///
/// A leading argument that is the bound target itself (a colon call) is
/// dropped first. When the remaining arguments match no overload, the call is
/// resolved again with the receiver kept as an ordinary argument.
pub fn call_method(
    lua: &Lua,
    ctx: &BridgeContext,
    target: &Target,
    group: &MethodGroup,
    args: Vec<HostValue>,
) -> BridgeResult<Vec<HostValue>> {
    let receiver = target.object();
    let resolve = |args: &[HostValue]| {
        overload::resolve(ctx, &group.overloads, args, receiver)
            .or_else(|| overload::resolve_generic(ctx, &group.overloads, args, receiver))
    };

    let self_passed =
        ctx.options.strip_self_argument && args.first().is_some_and(|a| target.is_same(a));
    let resolved = self_passed
        .then(|| resolve(&args[1..]))
        .flatten()
        .or_else(|| resolve(&args))
        .ok_or_else(|| BridgeError::NoMatchingOverload {
            type_name: target.class().full_name(),
            member: group.name.clone(),
            args: describe_args(if self_passed { &args[1..] } else { &args }),
        })?;

    let with_value = resolved.method.returns.is_some();
    tracing::trace!(
        type_name = %target.class().full_name(),
        method = %resolved.method.signature(),
        "call method"
    );
    let invoked = invoke(lua, target.class(), &group.name, resolved, receiver.cloned())?;
    Ok(invoked.into_results(with_value))
}

/// Construct an instance of `ty`, or close it when it is an open generic.
///
/// Returns the instance followed by any ref/out constructor parameters.
pub fn construct(
    lua: &Lua,
    ctx: &BridgeContext,
    ty: &TypeDescriptor,
    args: Vec<HostValue>,
) -> BridgeResult<Vec<HostValue>> {
    if ty.is_open_generic() {
        let type_args = args
            .iter()
            .map(|a| {
                a.as_type().cloned().ok_or_else(|| BridgeError::InvalidTypeArgument {
                    type_name: ty.full_name(),
                    reason: format!("expected a type, got {}", a.describe()),
                })
            })
            .collect::<BridgeResult<Vec<_>>>()?;
        let closed = ctx.registry.close_generic(ty, &type_args)?;
        return Ok(vec![HostValue::Type(closed)]);
    }

    let meta = ctx.registry.metadata_for(ty);
    let resolved = overload::resolve(ctx, meta.constructors(), &args, None).ok_or_else(|| {
        BridgeError::NoMatchingOverload {
            type_name: ty.full_name(),
            member: "new".to_string(),
            args: describe_args(&args),
        }
    })?;
    let invoked = invoke(lua, ty, "new", resolved, None)?;
    Ok(invoked.into_results(true))
}

/// Read an indexed property
pub fn index_get(
    ctx: &BridgeContext,
    target: &Target,
    property: &PropertyDef,
    args: Vec<HostValue>,
) -> BridgeResult<HostValue> {
    let get = property
        .get
        .as_ref()
        .ok_or_else(|| unknown(target, &property.name))?;
    let index = coerce_index(ctx, target, property, args)?;
    guard(|| target.member_context(&property.name), || get(target.object(), &index))
}

/// Write an indexed property
pub fn index_set(
    ctx: &BridgeContext,
    target: &Target,
    property: &PropertyDef,
    args: Vec<HostValue>,
    value: HostValue,
) -> BridgeResult<()> {
    let set = property
        .set
        .as_ref()
        .ok_or_else(|| read_only(target, &property.name))?;
    let index = coerce_index(ctx, target, property, args)?;
    let value = coerce(ctx, &value, &property.kind)?;
    guard(|| target.member_context(&property.name), || set(target.object(), &index, value))
}

fn coerce_index(
    ctx: &BridgeContext,
    target: &Target,
    property: &PropertyDef,
    args: Vec<HostValue>,
) -> BridgeResult<Vec<HostValue>> {
    if args.len() != property.index_params.len() {
        return Err(BridgeError::NoMatchingOverload {
            type_name: target.class().full_name(),
            member: property.name.clone(),
            args: describe_args(&args),
        });
    }
    property
        .index_params
        .iter()
        .zip(&args)
        .map(|(param, arg)| coerce(ctx, arg, &param.kind))
        .collect()
}

/// Look up a method group without going through a proxy
pub(crate) fn method_group(
    ctx: &BridgeContext,
    ty: &TypeDescriptor,
    name: &str,
    is_static: bool,
) -> Option<Arc<MethodGroup>> {
    ctx.registry
        .metadata_for(ty)
        .members(is_static)
        .method_group(name)
        .cloned()
}

fn unknown(target: &Target, name: &str) -> BridgeError {
    BridgeError::UnknownMember {
        type_name: target.class().full_name(),
        member: name.to_string(),
    }
}

fn read_only(target: &Target, name: &str) -> BridgeError {
    BridgeError::ReadOnlyMember {
        type_name: target.class().full_name(),
        member: name.to_string(),
    }
}
