//! Overload and generic method resolution
//!
//! Every candidate is scored against the supplied arguments. Each declared
//! parameter contributes:
//!
//! | parameter / argument                         | score          |
//! |----------------------------------------------|----------------|
//! | `Out`                                        | 0, no argument |
//! | argument present and coercible               | +2             |
//! | argument absent or `nil`, parameter optional | +1             |
//! | trailing variadic that absorbed arguments    | +2             |
//! | trailing variadic left empty                 | +1             |
//!
//! Anything else, or surplus arguments, rejects the candidate. The strictly
//! highest score wins; on a tie the earlier candidate is kept.

use std::sync::Arc;

use tether_sdk::{HostObject, HostValue, MethodDef, ParamMode, TypeDescriptor};

use super::coerce::coerce;
use crate::context::BridgeContext;

/// A candidate that accepted the arguments
#[derive(Debug, Clone)]
pub struct Resolved {
    /// Selected overload (instantiated, for generic methods)
    pub method: Arc<MethodDef>,
    /// One coerced slot per declared parameter
    pub args: Vec<HostValue>,
    /// Winning score
    pub score: u32,
}

/// Select the best non-generic candidate for `args`.
///
/// `receiver` is the instance a method was called on. Extension functions
/// take it as their first parameter; that parameter is filled with the
/// receiver and not scored.
pub fn resolve(
    ctx: &BridgeContext,
    candidates: &[Arc<MethodDef>],
    args: &[HostValue],
    receiver: Option<&HostObject>,
) -> Option<Resolved> {
    let mut best: Option<Resolved> = None;
    for method in candidates.iter().filter(|m| !m.is_generic()) {
        let Some((score, slots)) = score(ctx, method, args, receiver) else {
            continue;
        };
        if best.as_ref().map_or(true, |b| score > b.score) {
            best = Some(Resolved {
                method: method.clone(),
                args: slots,
                score,
            });
        }
    }
    if let Some(found) = &best {
        tracing::trace!(
            method = %found.method.signature(),
            score = found.score,
            "selected overload"
        );
    }
    best
}

/// Select a generic candidate, taking leading type descriptor arguments as
/// its explicit type arguments.
///
/// A candidate with `n` type parameters is tried when at least `n` leading
/// arguments are types; it is instantiated over the first `n` and scored
/// against the rest.
pub fn resolve_generic(
    ctx: &BridgeContext,
    candidates: &[Arc<MethodDef>],
    args: &[HostValue],
    receiver: Option<&HostObject>,
) -> Option<Resolved> {
    let type_args: Vec<TypeDescriptor> = args
        .iter()
        .map_while(|a| a.as_type().cloned())
        .collect();
    if type_args.is_empty() {
        return None;
    }

    let mut best: Option<Resolved> = None;
    for method in candidates.iter().filter(|m| m.is_generic()) {
        let arity = method.type_params;
        if arity > type_args.len() || type_args[..arity].iter().any(|t| t.is_open_generic()) {
            continue;
        }
        let closed = method.instantiate(&type_args[..arity]);
        let Some((score, slots)) = score(ctx, &closed, &args[arity..], receiver) else {
            continue;
        };
        if best.as_ref().map_or(true, |b| score > b.score) {
            best = Some(Resolved {
                method: Arc::new(closed),
                args: slots,
                score,
            });
        }
    }
    if let Some(found) = &best {
        tracing::trace!(
            method = %found.method.signature(),
            score = found.score,
            "selected generic overload"
        );
    }
    best
}

/// Score one candidate; `None` when it rejects the arguments
pub fn score(
    ctx: &BridgeContext,
    method: &MethodDef,
    args: &[HostValue],
    receiver: Option<&HostObject>,
) -> Option<(u32, Vec<HostValue>)> {
    let mut slots = Vec::with_capacity(method.params.len());
    let mut score = 0u32;
    let mut next = 0usize;

    for (i, param) in method.params.iter().enumerate() {
        if i == 0 && method.extension {
            if let Some(receiver) = receiver {
                slots.push(HostValue::Object(receiver.clone()));
                continue;
            }
        }

        match param.mode {
            ParamMode::Out => slots.push(HostValue::Nil),
            ParamMode::Variadic => {
                let rest = args.get(next..).unwrap_or(&[]);
                let items = rest
                    .iter()
                    .map(|a| coerce(ctx, a, &param.kind).ok())
                    .collect::<Option<Vec<_>>>()?;
                score += if items.is_empty() { 1 } else { 2 };
                next = args.len();
                slots.push(HostValue::Array(items));
            }
            ParamMode::In | ParamMode::Ref => {
                let arg = args.get(next);
                next += 1;
                match (arg, &param.default) {
                    (None, Some(default)) | (Some(HostValue::Nil), Some(default)) => {
                        score += 1;
                        slots.push(default.to_value());
                    }
                    (Some(value), _) => {
                        slots.push(coerce(ctx, value, &param.kind).ok()?);
                        score += 2;
                    }
                    (None, None) => return None,
                }
            }
        }
    }

    if next < args.len() {
        return None;
    }
    Some((score, slots))
}

#[cfg(test)]
mod tests {
    use super::*;

    use tether_sdk::{DefaultValue, HostKind, MethodBuilder};

    use crate::options::BridgeOptions;
    use crate::types::TypeRegistry;

    fn ctx() -> BridgeContext {
        BridgeContext::new(Arc::new(TypeRegistry::new()), BridgeOptions::default())
    }

    fn tagged(name: &'static str, builder: MethodBuilder) -> Arc<MethodDef> {
        Arc::new(builder.invoke(move |_| Ok(name.into())))
    }

    #[test]
    fn test_exact_beats_defaulted() {
        let ctx = ctx();
        let candidates = vec![
            tagged("one", MethodBuilder::new("f").param("a", HostKind::I64).optional(
                "b",
                HostKind::I64,
                DefaultValue::Integer(0),
            )),
            tagged(
                "two",
                MethodBuilder::new("f")
                    .param("a", HostKind::I64)
                    .param("b", HostKind::I64),
            ),
        ];
        let found = resolve(&ctx, &candidates, &[1i64.into(), 2i64.into()], None).unwrap();
        assert_eq!(found.score, 4);
        // Both score 4; the first declared keeps the tie
        assert!(Arc::ptr_eq(&found.method, &candidates[0]));

        let found = resolve(&ctx, &candidates, &[1i64.into()], None).unwrap();
        assert_eq!(found.score, 3);
        assert_eq!(found.args, vec![HostValue::Integer(1), HostValue::Integer(0)]);
    }

    #[test]
    fn test_tie_keeps_declaration_order() {
        let ctx = ctx();
        let int_first = vec![
            tagged("int", MethodBuilder::new("f").param("x", HostKind::I64)),
            tagged("str", MethodBuilder::new("f").param("x", HostKind::Str)),
        ];
        let found = resolve(&ctx, &int_first, &["5".into()], None).unwrap();
        assert_eq!(found.method.params[0].kind, HostKind::I64);
        assert_eq!(found.args[0], HostValue::Integer(5));

        let str_first: Vec<_> = int_first.iter().rev().cloned().collect();
        let found = resolve(&ctx, &str_first, &["5".into()], None).unwrap();
        assert_eq!(found.method.params[0].kind, HostKind::Str);
    }

    #[test]
    fn test_surplus_and_missing_reject() {
        let ctx = ctx();
        let method = MethodBuilder::new("f")
            .param("x", HostKind::I64)
            .invoke(|_| Ok(HostValue::Nil));
        assert!(score(&ctx, &method, &[], None).is_none());
        assert!(score(&ctx, &method, &[1i64.into(), 2i64.into()], None).is_none());
        assert!(score(&ctx, &method, &[true.into()], None).is_none());
    }

    #[test]
    fn test_out_and_variadic_slots() {
        let ctx = ctx();
        let method = MethodBuilder::new("f")
            .param("x", HostKind::I64)
            .out("result", HostKind::Str)
            .variadic("rest", HostKind::F64)
            .invoke(|_| Ok(HostValue::Nil));

        let (score_empty, slots) = score(&ctx, &method, &[1i64.into()], None).unwrap();
        assert_eq!(score_empty, 3);
        assert_eq!(slots.len(), 3);
        assert_eq!(slots[1], HostValue::Nil);
        assert_eq!(slots[2], HostValue::Array(vec![]));

        let (score_full, slots) =
            score(&ctx, &method, &[1i64.into(), 2i64.into(), 3.5.into()], None).unwrap();
        assert_eq!(score_full, 4);
        assert_eq!(
            slots[2],
            HostValue::Array(vec![HostValue::Float(2.0), HostValue::Float(3.5)])
        );
    }

    #[test]
    fn test_nil_takes_default() {
        let ctx = ctx();
        let method = MethodBuilder::new("f")
            .optional("x", HostKind::Str, DefaultValue::Str("dflt".into()))
            .invoke(|_| Ok(HostValue::Nil));
        let (s, slots) = score(&ctx, &method, &[HostValue::Nil], None).unwrap();
        assert_eq!(s, 1);
        assert_eq!(slots[0], HostValue::from("dflt"));
    }

    #[test]
    fn test_generic_resolution() {
        let ctx = ctx();
        let registry = TypeRegistry::new();
        let int = registry.descriptor("prim.i64").unwrap();
        let candidates = vec![tagged(
            "cast",
            MethodBuilder::new("cast")
                .type_params(1)
                .param("value", HostKind::TypeParam(0))
                .returns(HostKind::TypeParam(0)),
        )];

        assert!(resolve(&ctx, &candidates, &["7".into()], None).is_none());
        assert!(resolve_generic(&ctx, &candidates, &["7".into()], None).is_none());

        let found =
            resolve_generic(&ctx, &candidates, &[int.clone().into(), "7".into()], None).unwrap();
        assert_eq!(found.method.type_args, vec![int]);
        assert_eq!(found.args, vec![HostValue::Integer(7)]);
    }
}
