//! Arithmetic operator dispatch
//!
//! Candidates are the overloads registered on the left operand's type, then
//! those on the right operand's type. Overloads are static members whose
//! parameters are the operands, so they resolve like any other call.

use std::sync::Arc;

use mlua::Lua;
use tether_sdk::{HostValue, MethodDef, Operator};

use super::{describe_args, invoke, overload};
use crate::context::BridgeContext;
use crate::error::{BridgeError, BridgeResult};

/// Apply `op` to pulled operands.
///
/// Lua passes unary minus its operand twice; only the first is used.
pub fn apply(
    lua: &Lua,
    ctx: &BridgeContext,
    op: Operator,
    mut operands: Vec<HostValue>,
) -> BridgeResult<HostValue> {
    operands.truncate(op.arity());

    let mut candidates: Vec<Arc<MethodDef>> = Vec::new();
    let mut owner = None;
    for operand in &operands {
        let HostValue::Object(obj) = operand else {
            continue;
        };
        let meta = ctx.registry.metadata_for(obj.class());
        for method in meta.operator(op) {
            if !candidates.iter().any(|c| Arc::ptr_eq(c, method)) {
                candidates.push(method.clone());
                owner.get_or_insert_with(|| obj.class().clone());
            }
        }
    }

    let Some(owner) = owner else {
        return Err(not_supported(op, &operands));
    };

    let resolved = overload::resolve(ctx, &candidates, &operands, None).ok_or_else(|| {
        BridgeError::NoMatchingOverload {
            type_name: owner.full_name(),
            member: op.metamethod().to_string(),
            args: describe_args(&operands),
        }
    })?;
    tracing::trace!(
        operator = %op,
        method = %resolved.method.signature(),
        "apply operator"
    );
    let invoked = invoke(lua, &owner, op.metamethod(), resolved, None)?;
    Ok(invoked.value)
}

fn not_supported(op: Operator, operands: &[HostValue]) -> BridgeError {
    let describe = |i: usize| operands.get(i).map_or_else(|| "-".to_string(), |v| v.describe());
    BridgeError::OperatorNotSupported {
        operator: op.to_string(),
        left: describe(0),
        right: describe(1),
    }
}
