// src/feeds/providers/mod.rs
pub mod eonet;
pub mod firms;
pub mod nws;
pub mod usgs;

use serde_json::{Map, Value};

/// Non-empty string property, if present.
pub(crate) fn prop_str<'a>(props: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    props.get(key).and_then(Value::as_str).filter(|s| !s.is_empty())
}

/// First non-empty string among `keys`, in preference order.
pub(crate) fn first_prop_str<'a>(
    props: &'a Map<String, Value>,
    keys: &[&str],
) -> Option<&'a str> {
    keys.iter().find_map(|k| prop_str(props, k))
}
