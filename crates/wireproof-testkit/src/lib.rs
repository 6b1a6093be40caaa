//! Test support for wireproof crates.
//!
//! Reusable proptest strategies for generating bounded JSON trees and
//! placeholder-free text, plus small fixture builders. Depended on from
//! `dev-dependencies` only.

use proptest::prelude::*;
use serde_json::Value;
use wireproof_context::ExchangeContext;

/// Strategy for scalar JSON values (null, bool, integer, short string).
pub fn strategy_scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(|n| Value::Number(n.into())),
        "[a-zA-Z0-9 ]{0,12}".prop_map(Value::String),
    ]
}

/// Strategy for JSON trees with bounded depth and size.
pub fn strategy_json_tree() -> impl Strategy<Value = Value> {
    strategy_scalar().prop_recursive(4, 64, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
            strategy_object_entries(inner),
        ]
    })
}

/// Strategy for JSON object trees (always an object at the top).
pub fn strategy_json_object() -> impl Strategy<Value = Value> {
    strategy_object_entries(strategy_json_tree().boxed())
}

fn strategy_object_entries(
    inner: impl Strategy<Value = Value> + Clone + 'static,
) -> impl Strategy<Value = Value> {
    prop::collection::vec(("[a-z][a-z0-9_]{0,7}", inner), 0..6).prop_map(|entries| {
        let mut object = serde_json::Map::new();
        for (key, value) in entries {
            object.insert(key, value);
        }
        Value::Object(object)
    })
}

/// Strategy for plain text free of placeholder and dynamic-content tokens.
pub fn strategy_plain_text() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 .,:!_-]{1,40}"
}

/// Strategy for short identifier-charset words (the `@variable@` capture
/// alphabet).
pub fn strategy_capture_word() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_.-]{1,16}"
}

/// Context pre-loaded with bindings.
pub fn context_with(vars: &[(&str, &str)]) -> ExchangeContext {
    let mut ctx = ExchangeContext::new();
    for (name, value) in vars {
        ctx.set_variable(*name, *value);
    }
    ctx
}
