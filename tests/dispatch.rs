//! Dispatch behavior tests.
//!
//! Covers filter threading, run counters, argument adaptation, removal
//! surfaces, the `"all"` meta-event, and the failure path.


use std::sync::{Arc, Mutex};

use serde_json::Value;
use tapline::{ALL_HOOK, Callback, DispatchKind, HookEngine};
use test_utils::{appending, call_log, recording, taken};

// ═══════════════════════════════════════════════════════════════════════════════
// FILTER THREADING
// ═══════════════════════════════════════════════════════════════════════════════

/// Verifies the canonical two-step chain: suffix appenders at priorities
/// 10 and 20 compose in order.
#[test]
fn filter_threads_value_through_the_chain() {
    let engine = HookEngine::new();

    engine.register_with("x", appending("_a"), 10, 1);
    engine.register_with("x", appending("_b"), 20, 1);

    let out = engine.apply_filter("x", Value::from("start"), &[]).unwrap();

    assert_eq!(out, Value::from("start_a_b"));
}

/// Verifies the identity law: filtering with no callbacks returns the
/// value unchanged.
#[test]
fn filter_with_no_callbacks_is_identity() {
    let engine = HookEngine::new();

    let out = engine
        .apply_filter("unregistered", Value::from("kept"), &[Value::from(1)])
        .unwrap();

    assert_eq!(out, Value::from("kept"));
}

/// Verifies a filter callback can replace the value type entirely.
#[test]
fn filter_may_change_value_type() {
    let engine = HookEngine::new();

    engine.register(
        "measure",
        Callback::anonymous(|args| {
            let len = args[0].as_str().map_or(0, str::len);
            Ok(Value::from(len as u64))
        }),
    );

    let out = engine
        .apply_filter("measure", Value::from("four"), &[])
        .unwrap();

    assert_eq!(out, Value::from(4_u64));
}

// ═══════════════════════════════════════════════════════════════════════════════
// RUN COUNTERS
// ═══════════════════════════════════════════════════════════════════════════════

/// Verifies each action trigger counts once, and filter triggers never
/// touch the action counter (or vice versa).
#[test]
fn counters_are_per_trigger_and_per_kind() {
    let engine = HookEngine::new();
    let log = call_log();

    // Two callbacks so a per-callback counter bug would show as 4.
    engine.register_with("ping", recording(&log, "a"), 10, 1);
    engine.register_with("ping", recording(&log, "b"), 20, 1);

    engine.dispatch_action("ping", &[]).unwrap();
    engine.dispatch_action("ping", &[]).unwrap();

    assert_eq!(engine.run_count("ping", DispatchKind::Action), 2);
    assert_eq!(engine.run_count("ping", DispatchKind::Filter), 0);

    engine.apply_filter("ping", Value::Null, &[]).unwrap();

    assert_eq!(engine.run_count("ping", DispatchKind::Action), 2);
    assert_eq!(engine.run_count("ping", DispatchKind::Filter), 1);
}

/// Verifies triggers count even when nothing is registered.
#[test]
fn counters_track_unregistered_events_too() {
    let engine = HookEngine::new();

    engine.dispatch_action("ghost", &[]).unwrap();

    assert_eq!(engine.run_count("ghost", DispatchKind::Action), 1);
    assert_eq!(engine.run_count("never", DispatchKind::Action), 0);
}

// ═══════════════════════════════════════════════════════════════════════════════
// ARGUMENT ADAPTATION
// ═══════════════════════════════════════════════════════════════════════════════

/// Verifies callbacks see exactly `accepted_args` arguments: truncated
/// when they declare fewer, padded with nulls when they declare more.
#[test]
fn action_arguments_are_sliced_and_padded() {
    let engine = HookEngine::new();
    let seen = Arc::new(Mutex::new(Vec::new()));

    for accepted in [1, 3] {
        let sink = Arc::clone(&seen);
        engine.register_with(
            "save",
            Callback::anonymous(move |args| {
                sink.lock().unwrap().push(args.to_vec());
                Ok(Value::Null)
            }),
            accepted as i32,
            accepted,
        );
    }

    engine
        .dispatch_action("save", &[Value::from("id"), Value::from(7)])
        .unwrap();

    let seen = seen.lock().unwrap();
    assert_eq!(seen[0], [Value::from("id")]);
    assert_eq!(seen[1], [Value::from("id"), Value::from(7), Value::Null]);
}

/// Verifies a filter with `accepted_args == 1` sees only the threaded
/// value, while larger arities also see the extra arguments.
#[test]
fn filter_arity_counts_the_value_first() {
    let engine = HookEngine::new();
    let seen = Arc::new(Mutex::new(Vec::new()));

    for accepted in [1, 2] {
        let sink = Arc::clone(&seen);
        engine.register_with(
            "render",
            Callback::anonymous(move |args| {
                sink.lock().unwrap().push(args.to_vec());
                Ok(args[0].clone())
            }),
            accepted as i32,
            accepted,
        );
    }

    engine
        .apply_filter("render", Value::from("body"), &[Value::from("ctx")])
        .unwrap();

    let seen = seen.lock().unwrap();
    assert_eq!(seen[0], [Value::from("body")]);
    assert_eq!(seen[1], [Value::from("body"), Value::from("ctx")]);
}

// ═══════════════════════════════════════════════════════════════════════════════
// REMOVAL SURFACES
// ═══════════════════════════════════════════════════════════════════════════════

/// Verifies `unregister_all` at one priority leaves the other buckets
/// running.
#[test]
fn unregister_all_at_priority_leaves_other_buckets_active() {
    let engine = HookEngine::new();

    engine.register_with("x", appending("_ten"), 10, 1);
    engine.register_with("x", appending("_twenty"), 20, 1);

    engine.unregister_all("x", Some(10));

    let out = engine.apply_filter("x", Value::from("v"), &[]).unwrap();
    assert_eq!(out, Value::from("v_twenty"));
}

/// Verifies unregistering requires the exact priority and reports back
/// whether anything was removed.
#[test]
fn unregister_is_exact_and_reports() {
    let engine = HookEngine::new();
    let cb = appending("_x");

    engine.register_with("x", cb.clone(), 10, 1);

    assert!(!engine.unregister("x", cb.id(), 20));
    assert!(engine.unregister("x", cb.id(), 10));
    assert!(!engine.unregister("x", cb.id(), 10));
    assert!(!engine.has_callbacks("x"));
}

// ═══════════════════════════════════════════════════════════════════════════════
// THE "all" META-EVENT
// ═══════════════════════════════════════════════════════════════════════════════

/// Verifies `"all"` observes both kinds of trigger, sees the event name
/// first, and runs before the event's own callbacks.
#[test]
fn all_hook_observes_every_dispatch() {
    let engine = HookEngine::new();
    let log = call_log();
    let seen = Arc::new(Mutex::new(Vec::new()));

    let sink = Arc::clone(&seen);
    engine.register(
        ALL_HOOK,
        Callback::anonymous(move |args| {
            sink.lock().unwrap().push(args.to_vec());
            Ok(Value::Null)
        }),
    );
    engine.register_with("save", recording(&log, "own"), 10, 1);

    engine.dispatch_action("save", &[Value::from(3)]).unwrap();
    engine
        .apply_filter("render", Value::from("v"), &[Value::from("extra")])
        .unwrap();

    let seen = seen.lock().unwrap();
    assert_eq!(seen[0], [Value::from("save"), Value::from(3)]);
    assert_eq!(
        seen[1],
        [Value::from("render"), Value::from("v"), Value::from("extra")]
    );
    assert_eq!(taken(&log), ["own"]);
}

// ═══════════════════════════════════════════════════════════════════════════════
// FAILURE PATH
// ═══════════════════════════════════════════════════════════════════════════════

/// Verifies a failing callback aborts the rest of the chain, reaches the
/// caller with event and callback named, and leaves no stale context.
#[test]
fn failing_callback_aborts_chain_and_unwinds_context() {
    let engine = HookEngine::new();
    let log = call_log();

    engine.register_with("save", recording(&log, "before"), 5, 1);
    engine.register_with(
        "save",
        Callback::named("validator", |_| Err("rejected".into())),
        10,
        1,
    );
    engine.register_with("save", recording(&log, "after"), 20, 1);

    let err = engine.dispatch_action("save", &[]).unwrap_err();

    assert_eq!(err.event(), "save");
    assert_eq!(err.callback().to_string(), "validator");
    assert_eq!(err.into_source().to_string(), "rejected");

    // The earlier callback ran; the later one never did.
    assert_eq!(taken(&log), ["before"]);

    // Bookkeeping unwound on the error path.
    assert!(!engine.is_dispatching());
    assert_eq!(engine.current_event(), None);
    assert_eq!(engine.current_callback("save"), None);

    // The trigger still counted.
    assert_eq!(engine.run_count("save", DispatchKind::Action), 1);
}

/// Verifies a failing filter callback surfaces the same way.
#[test]
fn failing_filter_callback_reports_and_unwinds() {
    let engine = HookEngine::new();

    engine.register_with("render", appending("_ok"), 5, 1);
    engine.register_with(
        "render",
        Callback::anonymous(|_| Err("template missing".into())),
        10,
        1,
    );

    let err = engine
        .apply_filter("render", Value::from("v"), &[])
        .unwrap_err();

    assert_eq!(err.event(), "render");
    assert!(!engine.is_dispatching());
    assert_eq!(engine.run_count("render", DispatchKind::Filter), 1);
}
