//! Dispatch engine
//!
//! Turns proxy metamethod calls into host member accesses: member reads and
//! writes, method calls with overload resolution, construction, and
//! operators. All host code runs through [`guard`], so a failing or
//! panicking member surfaces as a `HostInvocation` error instead of
//! unwinding through Lua.

pub mod coerce;
pub mod members;
pub mod operators;
pub mod overload;

use std::backtrace::Backtrace;
use std::cell::{Cell, RefCell};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Once;

use mlua::Lua;
use tether_sdk::{HostObject, HostResult, HostValue, Invocation, ParamMode, TypeDescriptor};

use crate::error::{BridgeError, BridgeResult};

pub use coerce::coerce;
pub use overload::Resolved;

/// What a member access is aimed at
#[derive(Debug, Clone)]
pub enum Target {
    /// Instance members of an object
    Instance(HostObject),
    /// Static members of a type
    Static(TypeDescriptor),
}

impl Target {
    /// Type whose members are looked up
    pub fn class(&self) -> &TypeDescriptor {
        match self {
            Target::Instance(obj) => obj.class(),
            Target::Static(ty) => ty,
        }
    }

    /// Whether static members are addressed
    pub fn is_static(&self) -> bool {
        matches!(self, Target::Static(_))
    }

    /// The instance, for instance targets
    pub fn object(&self) -> Option<&HostObject> {
        match self {
            Target::Instance(obj) => Some(obj),
            Target::Static(_) => None,
        }
    }

    /// Whether `value` is this very target (a colon-call receiver)
    pub fn is_same(&self, value: &HostValue) -> bool {
        match (self, value) {
            (Target::Instance(obj), HostValue::Object(other)) => obj.ptr_eq(other),
            (Target::Static(ty), HostValue::Type(other)) => ty == other,
            _ => false,
        }
    }

    pub(crate) fn member_context(&self, member: &str) -> String {
        format!("{}.{}", self.class().name(), member)
    }
}

thread_local! {
    /// Number of `guard` frames on this thread's stack
    static GUARD_DEPTH: Cell<usize> = const { Cell::new(0) };
    /// Trace of the last panic raised under a guard
    static PANIC_TRACE: RefCell<Option<String>> = const { RefCell::new(None) };
}

/// Chain a panic hook that records the host stack of guarded panics.
///
/// Panics outside any guard go to the previously installed hook unchanged.
fn install_panic_hook() {
    static INSTALL: Once = Once::new();
    INSTALL.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if GUARD_DEPTH.with(Cell::get) == 0 {
                return previous(info);
            }
            let trace = Backtrace::force_capture().to_string();
            PANIC_TRACE.with(|slot| *slot.borrow_mut() = Some(trace));
        }));
    });
}

/// Run host code, converting host errors and panics into `HostInvocation`
pub(crate) fn guard<T, F>(context: impl FnOnce() -> String, f: F) -> BridgeResult<T>
where
    F: FnOnce() -> HostResult<T>,
{
    install_panic_hook();
    GUARD_DEPTH.with(|depth| depth.set(depth.get() + 1));
    let result = panic::catch_unwind(AssertUnwindSafe(f));
    GUARD_DEPTH.with(|depth| depth.set(depth.get() - 1));

    match result {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(BridgeError::host(context(), &err)),
        Err(payload) => {
            let trace = PANIC_TRACE.with(|slot| slot.borrow_mut().take());
            Err(BridgeError::panic(context(), payload, trace))
        }
    }
}

/// Return value and ref/out parameters of one invocation
#[derive(Debug)]
pub(crate) struct Invoked {
    pub value: HostValue,
    pub outs: Vec<HostValue>,
}

impl Invoked {
    /// Values handed back to the script: the return value (when `with_value`
    /// is set) followed by ref/out params in declaration order
    pub fn into_results(self, with_value: bool) -> Vec<HostValue> {
        let mut results = Vec::with_capacity(self.outs.len() + 1);
        if with_value {
            results.push(self.value);
        }
        results.extend(self.outs);
        results
    }
}

/// Invoke a resolved overload
pub(crate) fn invoke(
    lua: &Lua,
    class: &TypeDescriptor,
    member: &str,
    resolved: Resolved,
    target: Option<HostObject>,
) -> BridgeResult<Invoked> {
    let method = resolved.method;
    let mut invocation = Invocation::new(lua, class, target, resolved.args, &method.type_args);
    let (value, slots) = guard(
        || format!("{}.{}", class.name(), member),
        || {
            let value = (method.invoke)(&mut invocation)?;
            Ok((value, invocation.into_args()))
        },
    )?;

    let outs = method
        .params
        .iter()
        .enumerate()
        .filter(|(_, p)| matches!(p.mode, ParamMode::Ref | ParamMode::Out))
        .map(|(i, _)| slots.get(i).cloned().unwrap_or_default())
        .collect();
    Ok(Invoked { value, outs })
}

/// Comma separated kinds of call arguments, for error messages
pub(crate) fn describe_args(args: &[HostValue]) -> String {
    args.iter()
        .map(|a| a.describe())
        .collect::<Vec<_>>()
        .join(", ")
}
