//! Host-side view of a Lua table
//!
//! All accesses are raw: metamethods of the viewed table are not invoked.

use std::rc::Rc;

use mlua::{Lua, Table, Value};
use tether_sdk::HostValue;

use crate::context::BridgeContext;
use crate::error::BridgeResult;
use crate::marshal;

/// Marshaling view over an `mlua::Table`
pub struct TableView {
    table: Table,
    lua: Rc<Lua>,
    ctx: Rc<BridgeContext>,
}

impl TableView {
    pub(crate) fn new(table: Table, lua: Rc<Lua>, ctx: Rc<BridgeContext>) -> Self {
        Self { table, lua, ctx }
    }

    /// Number of entries (all keys, not only the sequence part)
    pub fn len(&self) -> BridgeResult<usize> {
        let mut count = 0;
        self.table.for_each::<Value, Value>(|_, _| {
            count += 1;
            Ok(())
        })?;
        Ok(count)
    }

    /// Whether the table has no entries
    pub fn is_empty(&self) -> BridgeResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Length of the sequence part (the `#` border)
    pub fn sequence_len(&self) -> usize {
        self.table.raw_len()
    }

    /// Value under `key`; `Nil` when absent
    pub fn get(&self, key: impl Into<HostValue>) -> BridgeResult<HostValue> {
        let key = marshal::push(&self.lua, &self.ctx, key.into())?;
        Ok(marshal::pull(self.table.raw_get::<Value>(key)?))
    }

    /// Store `value` under `key`; storing `Nil` removes the entry
    pub fn set(&self, key: impl Into<HostValue>, value: impl Into<HostValue>) -> BridgeResult<()> {
        let key = marshal::push(&self.lua, &self.ctx, key.into())?;
        let value = marshal::push(&self.lua, &self.ctx, value.into())?;
        self.table.raw_set(key, value)?;
        Ok(())
    }

    /// Remove `key`, returning its previous value
    pub fn remove(&self, key: impl Into<HostValue>) -> BridgeResult<HostValue> {
        let key = marshal::push(&self.lua, &self.ctx, key.into())?;
        let previous = marshal::pull(self.table.raw_get::<Value>(key.clone())?);
        self.table.raw_set(key, Value::Nil)?;
        Ok(previous)
    }

    /// Whether `key` has a non-nil value
    pub fn contains_key(&self, key: impl Into<HostValue>) -> BridgeResult<bool> {
        Ok(!self.get(key)?.is_nil())
    }

    /// All keys, in table iteration order
    pub fn keys(&self) -> BridgeResult<Vec<HostValue>> {
        Ok(self.pairs()?.into_iter().map(|(k, _)| k).collect())
    }

    /// All values, in table iteration order
    pub fn values(&self) -> BridgeResult<Vec<HostValue>> {
        Ok(self.pairs()?.into_iter().map(|(_, v)| v).collect())
    }

    /// All key/value pairs, in table iteration order
    pub fn pairs(&self) -> BridgeResult<Vec<(HostValue, HostValue)>> {
        let mut pairs = Vec::new();
        self.table.for_each::<Value, Value>(|k, v| {
            pairs.push((marshal::pull(k), marshal::pull(v)));
            Ok(())
        })?;
        Ok(pairs)
    }

    /// Elements `1..=n` of the sequence part
    pub fn to_vec(&self) -> BridgeResult<Vec<HostValue>> {
        (1..=self.table.raw_len())
            .map(|i| Ok(marshal::pull(self.table.raw_get::<Value>(i)?)))
            .collect()
    }

    /// Remove every entry
    pub fn clear(&self) -> BridgeResult<()> {
        let mut keys = Vec::new();
        self.table.for_each::<Value, Value>(|k, _| {
            keys.push(k);
            Ok(())
        })?;
        for key in keys {
            self.table.raw_set(key, Value::Nil)?;
        }
        Ok(())
    }

    /// The viewed table
    pub fn table(&self) -> &Table {
        &self.table
    }
}

impl std::fmt::Debug for TableView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableView")
            .field("sequence_len", &self.sequence_len())
            .finish()
    }
}
