//! Invocation context handed to member bodies

use std::cell::{Ref, RefMut};

use crate::class::TypeDescriptor;
use crate::convert::FromHost;
use crate::error::{HostError, HostResult};
use crate::object::HostObject;
use crate::value::HostValue;

/// Arguments and target of one call into a host member.
///
/// Argument `i` always corresponds to declared parameter `i`: omitted
/// optional arguments hold their default, out parameters hold `Nil` until the
/// body assigns them with `set`, and a variadic parameter holds an `Array` of
/// everything it absorbed. After the body returns, the bridge reads ref/out
/// parameters back from these slots.
pub struct Invocation<'a> {
    lua: &'a mlua::Lua,
    class: &'a TypeDescriptor,
    target: Option<HostObject>,
    args: Vec<HostValue>,
    type_args: &'a [TypeDescriptor],
}

impl<'a> Invocation<'a> {
    /// Create an invocation context
    pub fn new(
        lua: &'a mlua::Lua,
        class: &'a TypeDescriptor,
        target: Option<HostObject>,
        args: Vec<HostValue>,
        type_args: &'a [TypeDescriptor],
    ) -> Self {
        Self {
            lua,
            class,
            target,
            args,
            type_args,
        }
    }

    /// Lua state the call originates from
    pub fn lua(&self) -> &'a mlua::Lua {
        self.lua
    }

    /// Type the member was resolved on
    pub fn class(&self) -> &TypeDescriptor {
        self.class
    }

    /// Wrap `value` as a new instance of the invoked type (for constructors)
    pub fn construct<T: 'static>(&self, value: T) -> HostValue {
        HostValue::Object(HostObject::new(self.class, value))
    }

    /// Instance the member was invoked on
    pub fn target(&self) -> HostResult<&HostObject> {
        self.target
            .as_ref()
            .ok_or_else(|| HostError::argument(format!("{} requires an instance", self.class.name())))
    }

    /// Borrow the target's value
    pub fn this<T: 'static>(&self) -> HostResult<Ref<'_, T>> {
        self.target()?.borrow::<T>()
    }

    /// Mutably borrow the target's value
    pub fn this_mut<T: 'static>(&self) -> HostResult<RefMut<'_, T>> {
        self.target()?.borrow_mut::<T>()
    }

    /// Raw argument slot, if present
    pub fn arg(&self, index: usize) -> Option<&HostValue> {
        self.args.get(index)
    }

    /// Convert argument `index`; a missing slot converts from `Nil`
    pub fn get<T: FromHost>(&self, index: usize) -> HostResult<T> {
        match self.args.get(index) {
            Some(value) => T::from_host(value),
            None => T::from_host(&HostValue::Nil),
        }
    }

    /// Assign a ref/out parameter slot
    pub fn set(&mut self, index: usize, value: impl Into<HostValue>) {
        if index >= self.args.len() {
            self.args.resize(index + 1, HostValue::Nil);
        }
        self.args[index] = value.into();
    }

    /// All argument slots
    pub fn args(&self) -> &[HostValue] {
        &self.args
    }

    /// Number of argument slots
    pub fn len(&self) -> usize {
        self.args.len()
    }

    /// Whether there are no argument slots
    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    /// Consume the context, returning the final argument slots
    pub fn into_args(self) -> Vec<HostValue> {
        self.args
    }

    /// Explicit type arguments of a generic method
    pub fn type_args(&self) -> &[TypeDescriptor] {
        self.type_args
    }

    /// Explicit type argument `index`
    pub fn type_arg(&self, index: usize) -> HostResult<&TypeDescriptor> {
        self.type_args
            .get(index)
            .ok_or_else(|| HostError::argument(format!("missing type argument {}", index)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class::ClassBuilder;

    struct Point {
        x: i64,
    }

    #[test]
    fn test_get_and_set_slots() {
        let lua = mlua::Lua::new();
        let class = ClassBuilder::new("Point").build();
        let mut inv = Invocation::new(&lua, &class, None, vec![HostValue::Integer(3)], &[]);

        assert_eq!(inv.get::<i64>(0).unwrap(), 3);
        assert_eq!(inv.get::<Option<i64>>(1).unwrap(), None);

        inv.set(2, 9i64);
        assert_eq!(inv.len(), 3);
        assert_eq!(inv.into_args()[2], HostValue::Integer(9));
    }

    #[test]
    fn test_construct_and_this() {
        let lua = mlua::Lua::new();
        let class = ClassBuilder::new("Point").build();
        let inv = Invocation::new(&lua, &class, None, Vec::new(), &[]);
        assert!(inv.target().is_err());

        let made = inv.construct(Point { x: 4 });
        let obj = made.as_object().unwrap().clone();
        assert_eq!(obj.class().name(), "Point");

        let inv = Invocation::new(&lua, &class, Some(obj), Vec::new(), &[]);
        inv.this_mut::<Point>().unwrap().x += 1;
        assert_eq!(inv.this::<Point>().unwrap().x, 5);
    }
}
