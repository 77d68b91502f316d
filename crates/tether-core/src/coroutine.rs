//! Coroutine bridge
//!
//! A `Coroutine` wraps a Lua thread created from a callable. Resuming
//! marshals arguments in and results out and classifies the outcome.

use std::fmt;
use std::rc::Rc;

use mlua::{Lua, MultiValue, Thread, ThreadStatus};
use tether_sdk::HostValue;

use crate::context::BridgeContext;
use crate::error::{BridgeError, BridgeResult};
use crate::marshal;

/// Lifecycle state of a coroutine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoroutineStatus {
    /// Being resumed and currently executing
    Running,
    /// Created or yielded; can be resumed
    Suspended,
    /// Being resumed, but it has itself resumed another coroutine
    Normal,
    /// Finished or failed; cannot be resumed
    Dead,
}

impl fmt::Display for CoroutineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CoroutineStatus::Running => "running",
            CoroutineStatus::Suspended => "suspended",
            CoroutineStatus::Normal => "normal",
            CoroutineStatus::Dead => "dead",
        };
        f.write_str(name)
    }
}

/// Result of one resume
#[derive(Debug, Clone, PartialEq)]
pub enum ResumeOutcome {
    /// The coroutine yielded these values
    Yielded(Vec<HostValue>),
    /// The coroutine finished, returning these values
    Returned(Vec<HostValue>),
    /// The coroutine raised an error and is now dead
    Errored(String),
}

impl ResumeOutcome {
    /// Values carried by the outcome (the message, for errors)
    pub fn into_values(self) -> Vec<HostValue> {
        match self {
            ResumeOutcome::Yielded(values) | ResumeOutcome::Returned(values) => values,
            ResumeOutcome::Errored(message) => vec![HostValue::Str(message)],
        }
    }
}

/// A Lua coroutine driven from the host
pub struct Coroutine {
    thread: Thread,
    lua: Rc<Lua>,
    ctx: Rc<BridgeContext>,
}

impl Coroutine {
    pub(crate) fn new(thread: Thread, lua: Rc<Lua>, ctx: Rc<BridgeContext>) -> Self {
        Self { thread, lua, ctx }
    }

    /// Current status
    pub fn status(&self) -> CoroutineStatus {
        match self.ctx.active_position(self.thread.to_pointer()) {
            Some(true) => return CoroutineStatus::Running,
            Some(false) => return CoroutineStatus::Normal,
            None => {}
        }
        match self.thread.status() {
            ThreadStatus::Resumable => CoroutineStatus::Suspended,
            ThreadStatus::Running => CoroutineStatus::Running,
            _ => CoroutineStatus::Dead,
        }
    }

    /// Resume with `args`.
    ///
    /// Fails with `DeadCoroutine` once the coroutine has finished or failed,
    /// and with `CoroutineNotSuspended` while it is running or has resumed
    /// another coroutine. An error raised inside the coroutine is reported as
    /// `ResumeOutcome::Errored`, not as an `Err`.
    pub fn resume(&self, args: Vec<HostValue>) -> BridgeResult<ResumeOutcome> {
        match self.status() {
            CoroutineStatus::Suspended => {}
            CoroutineStatus::Dead => return Err(BridgeError::DeadCoroutine),
            status => return Err(BridgeError::CoroutineNotSuspended { status }),
        }
        let args = marshal::push_many(&self.lua, &self.ctx, args)?;

        let result = {
            let _active = self.ctx.enter(self.thread.to_pointer());
            self.thread.resume::<MultiValue>(args)
        };

        let outcome = match result {
            Ok(values) => {
                let values = marshal::pull_many(&self.ctx, values)?;
                match self.thread.status() {
                    ThreadStatus::Resumable => ResumeOutcome::Yielded(values),
                    _ => ResumeOutcome::Returned(values),
                }
            }
            Err(err) => match self.thread.status() {
                ThreadStatus::Finished | ThreadStatus::Error => {
                    ResumeOutcome::Errored(error_message(err))
                }
                _ => return Err(BridgeError::Script(err)),
            },
        };
        tracing::debug!(
            outcome = outcome_name(&outcome),
            status = %self.status(),
            "resumed coroutine"
        );
        Ok(outcome)
    }

    /// The underlying Lua thread
    pub fn thread(&self) -> &Thread {
        &self.thread
    }
}

impl fmt::Debug for Coroutine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Coroutine")
            .field("status", &self.status())
            .finish()
    }
}

fn outcome_name(outcome: &ResumeOutcome) -> &'static str {
    match outcome {
        ResumeOutcome::Yielded(_) => "yielded",
        ResumeOutcome::Returned(_) => "returned",
        ResumeOutcome::Errored(_) => "errored",
    }
}

/// Message of an error raised inside a coroutine, without mlua's wrappers
fn error_message(err: mlua::Error) -> String {
    let wrapped = BridgeError::Script(err);
    match wrapped.root() {
        BridgeError::Script(mlua::Error::RuntimeError(message)) => message.clone(),
        BridgeError::Script(inner) => inner.to_string(),
        bridge => bridge.to_string(),
    }
}
