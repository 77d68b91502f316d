//! Proxy userdata handed to Lua
//!
//! - `ObjectProxy`: a host instance, pinned in the handle table
//! - `ClassProxy`: a host type, pinned in the handle table; calling it
//!   constructs an instance
//! - `MethodProxy`: a method group bound to its target
//! - `EventProxy`: an event bound to its target (`add` / `remove`)
//! - `IndexerProxy`: an indexed property bound to its target
//!
//! Each proxy's metatable routes into the dispatch engine. Object and class
//! proxies release their handle when Lua finalizes them.

use std::rc::Rc;
use std::sync::Arc;

use mlua::{
    AnyUserData, Function, Lua, MetaMethod, MultiValue, UserData, UserDataMethods, Value,
};
use tether_sdk::{EventDef, HostObject, HostValue, Operator, PropertyDef, TypeDescriptor};

use crate::context::BridgeContext;
use crate::dispatch::{guard, members, operators, Target};
use crate::handles::{Handle, PinnedRef};
use crate::marshal;
use crate::types::MethodGroup;

// ============================================================================
// ObjectProxy
// ============================================================================

/// Userdata standing for a host object
pub struct ObjectProxy {
    handle: Handle,
    ctx: Rc<BridgeContext>,
}

impl ObjectProxy {
    /// Pin `obj` and wrap the handle in a new userdata
    pub fn create(
        lua: &Lua,
        ctx: &Rc<BridgeContext>,
        obj: HostObject,
    ) -> mlua::Result<AnyUserData> {
        let handle = ctx.handles.pin(PinnedRef::Object(obj));
        lua.create_userdata(ObjectProxy {
            handle,
            ctx: ctx.clone(),
        })
    }

    /// The pinned object; `None` once the handle has been released
    pub fn object(&self) -> Option<HostObject> {
        match self.ctx.handles.resolve(self.handle)? {
            PinnedRef::Object(obj) => Some(obj),
            PinnedRef::Type(_) => None,
        }
    }

    /// Handle the proxy holds
    pub fn handle(&self) -> Handle {
        self.handle
    }

    fn target(&self) -> mlua::Result<Target> {
        self.object()
            .map(Target::Instance)
            .ok_or(mlua::Error::UserDataDestructed)
    }

    fn display(&self) -> String {
        match self.object() {
            Some(obj) => match &obj.class().def().display {
                Some(display) => display(&obj),
                None => format!("{}: {}", obj.class().name(), self.handle),
            },
            None => format!("released: {}", self.handle),
        }
    }
}

impl Drop for ObjectProxy {
    fn drop(&mut self) {
        self.ctx.handles.unpin(self.handle);
    }
}

impl UserData for ObjectProxy {
    fn add_methods<M: UserDataMethods<Self>>(methods: &mut M) {
        methods.add_meta_method(MetaMethod::Index, |lua, this, key: String| {
            let target = this.target()?;
            Ok(members::index(lua, &this.ctx, &target, &key)?)
        });
        methods.add_meta_method(MetaMethod::NewIndex, |_, this, (key, value): (String, Value)| {
            let target = this.target()?;
            Ok(members::newindex(&this.ctx, &target, &key, marshal::pull(value))?)
        });
        methods.add_meta_method(MetaMethod::ToString, |_, this, ()| Ok(this.display()));
        methods.add_meta_function(MetaMethod::Eq, |_, (a, b): (Value, Value)| {
            Ok(marshal::pull(a) == marshal::pull(b))
        });

        add_operator(methods, MetaMethod::Add, Operator::Add);
        add_operator(methods, MetaMethod::Sub, Operator::Sub);
        add_operator(methods, MetaMethod::Mul, Operator::Mul);
        add_operator(methods, MetaMethod::Div, Operator::Div);
        add_operator(methods, MetaMethod::Unm, Operator::Neg);
    }
}

fn add_operator<M: UserDataMethods<ObjectProxy>>(methods: &mut M, meta: MetaMethod, op: Operator) {
    methods.add_meta_function(meta, move |lua, operands: MultiValue| {
        let ctx = operands
            .iter()
            .find_map(|v| match v {
                Value::UserData(ud) => ud.borrow::<ObjectProxy>().ok().map(|p| p.ctx.clone()),
                _ => None,
            })
            .ok_or(mlua::Error::UserDataTypeMismatch)?;
        let operands = marshal::pull_many(&ctx, operands)?;
        let result = operators::apply(lua, &ctx, op, operands)?;
        Ok(marshal::push(lua, &ctx, result)?)
    });
}

// ============================================================================
// ClassProxy
// ============================================================================

/// Userdata standing for a host type
pub struct ClassProxy {
    handle: Handle,
    ctx: Rc<BridgeContext>,
}

impl ClassProxy {
    /// Pin `ty` and wrap the handle in a new userdata
    pub fn create(
        lua: &Lua,
        ctx: &Rc<BridgeContext>,
        ty: TypeDescriptor,
    ) -> mlua::Result<AnyUserData> {
        let handle = ctx.handles.pin(PinnedRef::Type(ty));
        lua.create_userdata(ClassProxy {
            handle,
            ctx: ctx.clone(),
        })
    }

    /// The pinned type; `None` once the handle has been released
    pub fn class(&self) -> Option<TypeDescriptor> {
        match self.ctx.handles.resolve(self.handle)? {
            PinnedRef::Type(ty) => Some(ty),
            PinnedRef::Object(_) => None,
        }
    }

    fn target(&self) -> mlua::Result<TypeDescriptor> {
        self.class().ok_or(mlua::Error::UserDataDestructed)
    }
}

impl Drop for ClassProxy {
    fn drop(&mut self) {
        self.ctx.handles.unpin(self.handle);
    }
}

impl UserData for ClassProxy {
    fn add_methods<M: UserDataMethods<Self>>(methods: &mut M) {
        methods.add_meta_method(MetaMethod::Index, |lua, this, key: String| {
            let target = Target::Static(this.target()?);
            Ok(members::index(lua, &this.ctx, &target, &key)?)
        });
        methods.add_meta_method(MetaMethod::NewIndex, |_, this, (key, value): (String, Value)| {
            let target = Target::Static(this.target()?);
            Ok(members::newindex(&this.ctx, &target, &key, marshal::pull(value))?)
        });
        methods.add_meta_method(MetaMethod::Call, |lua, this, args: MultiValue| {
            let ty = this.target()?;
            let args = marshal::pull_many(&this.ctx, args)?;
            let results = members::construct(lua, &this.ctx, &ty, args)?;
            Ok(marshal::push_many(lua, &this.ctx, results)?)
        });
        methods.add_meta_method(MetaMethod::ToString, |_, this, ()| {
            Ok(match this.class() {
                Some(ty) => format!("class: {}", ty.full_name()),
                None => format!("released: {}", this.handle),
            })
        });
        methods.add_meta_function(MetaMethod::Eq, |_, (a, b): (Value, Value)| {
            Ok(marshal::pull(a) == marshal::pull(b))
        });
    }
}

// ============================================================================
// Bound member proxies
// ============================================================================

/// A method group bound to its instance or type
pub struct MethodProxy {
    target: Target,
    group: Arc<MethodGroup>,
    ctx: Rc<BridgeContext>,
}

impl MethodProxy {
    pub(crate) fn new(target: Target, group: Arc<MethodGroup>, ctx: Rc<BridgeContext>) -> Self {
        Self { target, group, ctx }
    }
}

impl UserData for MethodProxy {
    fn add_methods<M: UserDataMethods<Self>>(methods: &mut M) {
        methods.add_meta_method(MetaMethod::Call, |lua, this, args: MultiValue| {
            let args = marshal::pull_many(&this.ctx, args)?;
            let results = members::call_method(lua, &this.ctx, &this.target, &this.group, args)?;
            Ok(marshal::push_many(lua, &this.ctx, results)?)
        });
        methods.add_meta_method(MetaMethod::ToString, |_, this, ()| {
            Ok(format!(
                "method: {}.{}",
                this.target.class().name(),
                this.group.name
            ))
        });
    }
}

/// An event bound to its instance or type
pub struct EventProxy {
    target: Target,
    event: Arc<EventDef>,
}

impl EventProxy {
    pub(crate) fn new(target: Target, event: Arc<EventDef>) -> Self {
        Self { target, event }
    }

    fn context(&self) -> String {
        self.target.member_context(&self.event.name)
    }
}

impl UserData for EventProxy {
    fn add_methods<M: UserDataMethods<Self>>(methods: &mut M) {
        methods.add_method("add", |_, this, handler: Function| {
            tracing::trace!(event = %this.context(), "subscribe handler");
            Ok(guard(
                || this.context(),
                || (this.event.add)(this.target.object(), handler),
            )?)
        });
        methods.add_method("remove", |_, this, handler: Function| {
            tracing::trace!(event = %this.context(), "unsubscribe handler");
            Ok(guard(
                || this.context(),
                || (this.event.remove)(this.target.object(), &handler),
            )?)
        });
        methods.add_meta_method(MetaMethod::ToString, |_, this, ()| {
            Ok(format!("event: {}", this.context()))
        });
    }
}

/// An indexed property bound to its instance or type
pub struct IndexerProxy {
    target: Target,
    property: Arc<PropertyDef>,
    ctx: Rc<BridgeContext>,
}

impl IndexerProxy {
    pub(crate) fn new(target: Target, property: Arc<PropertyDef>, ctx: Rc<BridgeContext>) -> Self {
        Self {
            target,
            property,
            ctx,
        }
    }
}

impl UserData for IndexerProxy {
    fn add_methods<M: UserDataMethods<Self>>(methods: &mut M) {
        methods.add_method("get", |lua, this, args: MultiValue| {
            let args = marshal::pull_many(&this.ctx, args)?;
            let value = members::index_get(&this.ctx, &this.target, &this.property, args)?;
            Ok(marshal::push(lua, &this.ctx, value)?)
        });
        methods.add_method("set", |_, this, args: MultiValue| {
            let mut args = marshal::pull_many(&this.ctx, args)?;
            let value = args.pop().unwrap_or_default();
            Ok(members::index_set(&this.ctx, &this.target, &this.property, args, value)?)
        });
        methods.add_meta_method(MetaMethod::Index, |lua, this, key: Value| {
            let args = vec![marshal::pull(key)];
            let value = members::index_get(&this.ctx, &this.target, &this.property, args)?;
            Ok(marshal::push(lua, &this.ctx, value)?)
        });
        methods.add_meta_method(MetaMethod::NewIndex, |_, this, (key, value): (Value, Value)| {
            let args = vec![marshal::pull(key)];
            Ok(members::index_set(
                &this.ctx,
                &this.target,
                &this.property,
                args,
                marshal::pull(value),
            )?)
        });
        methods.add_meta_method(MetaMethod::ToString, |_, this, ()| {
            Ok(format!(
                "indexer: {}",
                this.target.member_context(&this.property.name)
            ))
        });
    }
}

/// Read a member through an object or class proxy
pub(crate) fn get_member(lua: &Lua, ud: &AnyUserData, name: &str) -> mlua::Result<Option<Value>> {
    let (ctx, target) = match proxy_target(ud)? {
        Some(found) => found,
        None => return Ok(None),
    };
    Ok(Some(members::index(lua, &ctx, &target, name)?))
}

/// Write a member through an object or class proxy
pub(crate) fn set_member(ud: &AnyUserData, name: &str, value: HostValue) -> mlua::Result<bool> {
    let (ctx, target) = match proxy_target(ud)? {
        Some(found) => found,
        None => return Ok(false),
    };
    members::newindex(&ctx, &target, name, value)?;
    Ok(true)
}

fn proxy_target(ud: &AnyUserData) -> mlua::Result<Option<(Rc<BridgeContext>, Target)>> {
    if let Ok(proxy) = ud.borrow::<ObjectProxy>() {
        return Ok(Some((proxy.ctx.clone(), proxy.target()?)));
    }
    if let Ok(proxy) = ud.borrow::<ClassProxy>() {
        return Ok(Some((proxy.ctx.clone(), Target::Static(proxy.target()?))));
    }
    Ok(None)
}
