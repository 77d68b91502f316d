//! Tether command-line runner
//!
//! Runs Lua scripts in a `ScriptState` with the `host` namespace imported.
//! The binary in `main.rs` is a thin clap front end over `commands`.

pub mod commands;
pub mod host;
