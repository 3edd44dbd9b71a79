//! Helpers for walking untyped schema objects.
//!
//! Schemas stay plain [`serde_json::Value`]s; the validator reads keywords
//! through the accessors here instead of deserializing into structs, so a
//! malformed keyword simply fails its shape check and is skipped.
use std::sync::Mutex;

use ahash::AHashMap;
use fancy_regex::Regex;
use num_cmp::NumCmp;
use once_cell::sync::Lazy;
use serde_json::{json, Map, Number, Value};

static TRUE_SCHEMA: Lazy<Value> = Lazy::new(|| json!({}));
static FALSE_SCHEMA: Lazy<Value> = Lazy::new(|| json!({"not": {}}));

/// Normalize a schema reference: `true` is the empty (accept-all) schema,
/// `false` rejects everything via `{"not": {}}`. Anything that is neither a
/// boolean nor an object is not a schema.
pub(crate) fn normalize(reference: &Value) -> Option<&Value> {
    match reference {
        Value::Object(_) => Some(reference),
        Value::Bool(true) => Some(&TRUE_SCHEMA),
        Value::Bool(false) => Some(&FALSE_SCHEMA),
        _ => None,
    }
}

pub(crate) fn get_str<'s>(schema: &'s Map<String, Value>, key: &str) -> Option<&'s str> {
    schema.get(key).and_then(Value::as_str)
}

pub(crate) fn get_f64(schema: &Map<String, Value>, key: &str) -> Option<f64> {
    schema.get(key).and_then(Value::as_f64)
}

// Integral floats are accepted ("2.0" items is a valid bound in the wild).
pub(crate) fn get_usize(schema: &Map<String, Value>, key: &str) -> Option<usize> {
    let value = schema.get(key)?;
    if let Some(n) = value.as_u64() {
        return usize::try_from(n).ok();
    }
    let n = value.as_f64()?;
    if n >= 0.0 && n.fract() == 0.0 && n <= usize::MAX as f64 {
        Some(n as usize)
    } else {
        None
    }
}

pub(crate) fn get_array<'s>(schema: &'s Map<String, Value>, key: &str) -> Option<&'s Vec<Value>> {
    match schema.get(key) {
        Some(Value::Array(items)) => Some(items),
        _ => None,
    }
}

pub(crate) fn get_object<'s>(
    schema: &'s Map<String, Value>,
    key: &str,
) -> Option<&'s Map<String, Value>> {
    schema.get(key).and_then(Value::as_object)
}

/// Structural equality as required by `enum`, `const` and `uniqueItems`:
/// numbers compare by value across integer/float representations, objects by
/// key set, arrays pairwise.
pub(crate) fn equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(left), Value::Bool(right)) => left == right,
        (Value::String(left), Value::String(right)) => left == right,
        (Value::Number(left), Value::Number(right)) => number_eq(left, right),
        (Value::Array(left), Value::Array(right)) => {
            left.len() == right.len()
                && left.iter().zip(right).all(|(lhs, rhs)| equal(lhs, rhs))
        }
        (Value::Object(left), Value::Object(right)) => {
            left.len() == right.len()
                && left
                    .iter()
                    .all(|(key, lhs)| right.get(key).map_or(false, |rhs| equal(lhs, rhs)))
        }
        _ => false,
    }
}

fn number_eq(left: &Number, right: &Number) -> bool {
    fn against<T>(lhs: T, right: &Number) -> bool
    where
        T: Copy + NumCmp<u64> + NumCmp<i64> + NumCmp<f64>,
    {
        if let Some(rhs) = right.as_u64() {
            NumCmp::num_eq(lhs, rhs)
        } else if let Some(rhs) = right.as_i64() {
            NumCmp::num_eq(lhs, rhs)
        } else {
            right.as_f64().map_or(false, |rhs| NumCmp::num_eq(lhs, rhs))
        }
    }
    if let Some(lhs) = left.as_u64() {
        against(lhs, right)
    } else if let Some(lhs) = left.as_i64() {
        against(lhs, right)
    } else {
        left.as_f64().map_or(false, |lhs| against(lhs, right))
    }
}

// The validator walks schemas directly on every call, so compiled patterns
// are cached process-wide. Flushing wholesale at capacity keeps the bookkeeping
// trivial; schema sets small enough to validate interactively never hit it.
static REGEX_CACHE: Lazy<Mutex<AHashMap<String, Regex>>> =
    Lazy::new(|| Mutex::new(AHashMap::new()));

const REGEX_CACHE_CAPACITY: usize = 64;

/// Compile `pattern` for the `pattern` / `patternProperties` keywords.
///
/// The engine is `fancy-regex`, which covers the lookaround and
/// backreference constructs of the ECMA dialect these keywords are written
/// in. Patterns using JS-only syntax fail to compile and the keyword is
/// skipped, keeping keyword checks independent of each other.
pub(crate) fn compile_pattern(pattern: &str) -> Option<Regex> {
    let mut cache = REGEX_CACHE.lock().expect("Lock is poisoned");
    if let Some(regex) = cache.get(pattern) {
        return Some(regex.clone());
    }
    let regex = Regex::new(pattern).ok()?;
    if cache.len() >= REGEX_CACHE_CAPACITY {
        cache.clear();
    }
    cache.insert(pattern.to_string(), regex.clone());
    Some(regex)
}
