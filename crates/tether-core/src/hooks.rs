//! Debug hooks

use mlua::{DebugEvent, HookTriggers, Lua, VmState};

use crate::error::BridgeResult;

/// Which VM events trigger the hook
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HookMask {
    /// Function calls (including tail calls)
    pub call: bool,
    /// Function returns
    pub ret: bool,
    /// Each new line of code
    pub line: bool,
    /// Every `n` VM instructions
    pub count: Option<u32>,
}

impl HookMask {
    /// A mask with no events
    pub fn new() -> Self {
        Self::default()
    }

    /// Trigger on calls
    pub fn calls(mut self) -> Self {
        self.call = true;
        self
    }

    /// Trigger on returns
    pub fn returns(mut self) -> Self {
        self.ret = true;
        self
    }

    /// Trigger on every line
    pub fn lines(mut self) -> Self {
        self.line = true;
        self
    }

    /// Trigger every `n` instructions
    pub fn every(mut self, n: u32) -> Self {
        self.count = Some(n.max(1));
        self
    }
}

/// Kind of a hook event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookKind {
    /// A function was called
    Call,
    /// A function is returning
    Return,
    /// A new line is about to run
    Line,
    /// The instruction count elapsed
    Count,
}

/// One hook invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HookEvent {
    /// Event kind
    pub kind: HookKind,
    /// Current line, when known
    pub line: Option<u32>,
}

/// Install `callback` as the hook of `lua`, replacing any previous one.
///
/// An error returned by the callback aborts the running script.
pub(crate) fn install<F>(lua: &Lua, mask: HookMask, callback: F)
where
    F: Fn(HookEvent) -> BridgeResult<()> + 'static,
{
    let triggers = HookTriggers {
        on_calls: mask.call,
        on_returns: mask.ret,
        every_line: mask.line,
        every_nth_instruction: mask.count,
    };
    lua.set_hook(triggers, move |_lua, debug| {
        let kind = match debug.event() {
            DebugEvent::Call | DebugEvent::TailCall => HookKind::Call,
            DebugEvent::Ret => HookKind::Return,
            DebugEvent::Line => HookKind::Line,
            DebugEvent::Count => HookKind::Count,
            _ => return Ok(VmState::Continue),
        };
        let line = u32::try_from(debug.curr_line()).ok();
        callback(HookEvent { kind, line })?;
        Ok(VmState::Continue)
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_builders() {
        let mask = HookMask::new().calls().lines().every(0);
        assert!(mask.call);
        assert!(!mask.ret);
        assert!(mask.line);
        assert_eq!(mask.count, Some(1));
    }
}
