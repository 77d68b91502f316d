//! Integration tests for state lifecycle
//!
//! Tests cover:
//! - Handle release when proxies are collected
//! - Debug hooks, including aborting a runaway script
//! - Table views
//! - Loading chunks and files, options from TOML

mod common;

use std::cell::Cell;
use std::io::Write;
use std::rc::Rc;
use std::sync::Arc;

use common::{eval, registry, state};
use tether_core::sdk::HostValue;
use tether_core::{BridgeError, BridgeOptions, HookKind, HookMask, ScriptState};

// ────────────────────────────────────────────────────────────────────────────
// Handles
// ────────────────────────────────────────────────────────────────────────────

#[test]
fn test_collected_proxies_release_handles() {
    let state = state();
    let baseline = state.pinned_handles();

    eval(&state, "keep = Counter(1) do local a, b = Counter(), Counter() end");
    assert!(state.pinned_handles() >= baseline + 1);

    state.collect_garbage().unwrap();
    assert_eq!(state.pinned_handles(), baseline + 1);

    eval(&state, "keep = nil");
    state.collect_garbage().unwrap();
    assert_eq!(state.pinned_handles(), baseline);
}

#[test]
fn test_imported_classes_stay_pinned() {
    let state = ScriptState::new(registry()).unwrap();
    assert_eq!(state.pinned_handles(), 0);
    state.import_type("demo.Counter").unwrap();
    state.collect_garbage().unwrap();
    assert_eq!(state.pinned_handles(), 1);
}

#[test]
fn test_metadata_built_once_per_type() {
    let state = state();
    let ty = state.registry().descriptor("demo.Counter").unwrap();
    let first = state.registry().metadata_for(&ty);
    eval(&state, "Counter(1):increment()");
    let second = state.registry().metadata_for(&ty);
    assert!(Arc::ptr_eq(&first, &second));
}

// ────────────────────────────────────────────────────────────────────────────
// Hooks
// ────────────────────────────────────────────────────────────────────────────

#[test]
fn test_line_hook_and_removal() {
    let state = state();
    let lines = Rc::new(Cell::new(0u32));
    let seen = lines.clone();
    state.set_hook(HookMask::new().lines(), move |event| {
        if event.kind == HookKind::Line {
            seen.set(seen.get() + 1);
        }
        Ok(())
    });

    state
        .do_string("local a = 1\nlocal b = 2\nlocal c = a + b", "=lines")
        .unwrap();
    let counted = lines.get();
    assert!(counted >= 3, "saw {} line events", counted);

    state.remove_hook();
    state.do_string("local d = 4", "=lines").unwrap();
    assert_eq!(lines.get(), counted);
}

#[test]
fn test_count_hook_aborts_runaway_script() {
    let state = state();
    let ticks = Rc::new(Cell::new(0u32));
    let seen = ticks.clone();
    state.set_hook(HookMask::new().every(100), move |_| {
        seen.set(seen.get() + 1);
        if seen.get() > 50 {
            return Err(BridgeError::HostInvocation {
                context: "hook".to_string(),
                message: "budget exhausted".to_string(),
                trace: None,
            });
        }
        Ok(())
    });

    let err = state.do_string("while true do end", "=spin").unwrap_err();
    assert!(matches!(
        err.root(),
        BridgeError::HostInvocation { message, .. } if message == "budget exhausted"
    ));
    assert!(ticks.get() > 50);

    state.remove_hook();
    assert_eq!(eval(&state, "return 1 + 1"), vec![HostValue::Integer(2)]);
}

// ────────────────────────────────────────────────────────────────────────────
// Table views
// ────────────────────────────────────────────────────────────────────────────

#[test]
fn test_table_view_operations() {
    let state = state();
    let view = state.create_table().unwrap();
    view.set("name", "tether").unwrap();
    view.set(1i64, "x").unwrap();
    view.set(2i64, "y").unwrap();

    assert_eq!(view.len().unwrap(), 3);
    assert_eq!(view.sequence_len(), 2);
    assert_eq!(view.get("name").unwrap(), HostValue::from("tether"));
    assert!(view.contains_key(2i64).unwrap());
    assert!(!view.contains_key("missing").unwrap());
    assert_eq!(view.to_vec().unwrap(), vec![HostValue::from("x"), "y".into()]);

    assert_eq!(view.remove("name").unwrap(), HostValue::from("tether"));
    assert_eq!(view.len().unwrap(), 2);

    view.clear().unwrap();
    assert!(view.is_empty().unwrap());
}

#[test]
fn test_table_view_shares_with_lua() {
    let state = state();
    let results = eval(&state, "config = { retries = 3, 'a' } return config");
    let view = state.table_view(results[0].as_table().cloned().unwrap());

    assert_eq!(view.get("retries").unwrap(), HostValue::Integer(3));
    let counter = state.registry().descriptor("demo.Counter").unwrap();
    view.set("counter_class", HostValue::Type(counter)).unwrap();
    view.set("retries", 5i64).unwrap();

    assert_eq!(
        eval(&state, "return config.retries, config.counter_class(2).count"),
        vec![HostValue::Integer(5), HostValue::Integer(2)]
    );
    let mut keys: Vec<String> = view
        .keys()
        .unwrap()
        .iter()
        .map(|k| k.describe())
        .collect();
    keys.sort();
    assert_eq!(keys.len(), 3);
}

#[test]
fn test_table_view_reads_raw() {
    let state = state();
    let results = eval(
        &state,
        "return setmetatable({}, { __index = function() return 'fallback' end })",
    );
    let view = state.table_view(results[0].as_table().cloned().unwrap());
    assert!(view.get("anything").unwrap().is_nil());
}

// ────────────────────────────────────────────────────────────────────────────
// Loading code and options
// ────────────────────────────────────────────────────────────────────────────

#[test]
fn test_load_string_and_call() {
    let state = state();
    let chunk = state
        .load_string("local a, b = ... return a .. b", "=concat")
        .unwrap();
    let results = state
        .call_function(&chunk, vec!["teth".into(), "er".into()])
        .unwrap();
    assert_eq!(results, vec![HostValue::from("tether")]);
}

#[test]
fn test_syntax_error_is_script_error() {
    let state = state();
    let err = state.load_string("return +", "=broken").unwrap_err();
    assert!(matches!(err, BridgeError::Script(_)));
}

#[test]
fn test_do_file() {
    let state = state();
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "local c = Counter(40)").unwrap();
    writeln!(file, "c:add(2)").unwrap();
    writeln!(file, "return c.count").unwrap();

    let results = state.do_file(file.path()).unwrap();
    assert_eq!(results, vec![HostValue::Integer(42)]);

    let missing = state.do_file("/definitely/not/here.lua").unwrap_err();
    assert!(matches!(missing, BridgeError::Io(_)));
}

#[test]
fn test_options_from_toml() {
    let options = BridgeOptions::from_toml_str(
        "max_transfer_values = 4\nstrip_self_argument = false\n",
    )
    .unwrap();
    assert_eq!(options.max_transfer_values, 4);
    assert!(!options.strip_self_argument);
    assert_eq!(options.max_coercion_depth, 32);

    assert!(matches!(
        BridgeOptions::from_toml_str("max_transfer_values = 0"),
        Err(BridgeError::Config(_))
    ));
    assert!(matches!(
        BridgeOptions::from_toml_str("unknown_key = 1"),
        Err(BridgeError::Config(_))
    ));
}

#[test]
fn test_without_self_stripping_dot_calls_need_explicit_receiver() {
    let options = BridgeOptions {
        strip_self_argument: false,
        ..BridgeOptions::default()
    };
    let state = ScriptState::with_options(registry(), options).unwrap();
    state.import_type("demo.Counter").unwrap();

    let results = state
        .do_string("local c = Counter() c.add(4) return c.count", "=test")
        .unwrap();
    assert_eq!(results, vec![HostValue::Integer(4)]);

    // With stripping off, the receiver is bound as an extra argument
    let err = state
        .do_string("local c = Counter() c:add(4)", "=test")
        .unwrap_err();
    assert!(matches!(err.root(), BridgeError::NoMatchingOverload { .. }));
}
