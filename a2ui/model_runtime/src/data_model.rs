//! Per-surface data store.
//!
//! The model is a JSON object tree. Writes of a map onto an existing map
//! merge key by key; any other write replaces the value at that path.
//! Containers created on the way down are always maps, so numeric keys such
//! as timestamps never turn into list indices.

use log::{debug, warn};
use serde_json::{Map, Value};

use crate::path;
use crate::protocol::DataEntry;

pub fn empty_data_model() -> Value {
    Value::Object(Map::new())
}

/// Reads the value at `path`, or `None` if any segment is missing.
pub fn get_path<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = root;

    for token in path::segments(path) {
        current = descend_existing(current, &token)?;
    }

    Some(current)
}

/// Writes `value` at `path`. The root only accepts maps and is replaced
/// outright.
pub fn set_path(root: &mut Value, path: &str, value: Value) {
    let tokens = path::segments(path);

    let Some((last, parents)) = tokens.split_last() else {
        replace_root(root, value);
        return;
    };

    let mut current = root;

    for token in parents {
        match descend_or_create(current, token) {
            Some(next) => current = next,
            None => {
                warn!("cannot descend into non-container value at token {token} of path {path}");
                return;
            }
        }
    }

    write_slot(current, last, value, path);
}

/// Applies the `contents` of a `dataModelUpdate` at `base_path`.
///
/// An empty `contents` list still writes an empty map, which establishes the
/// path as map-typed for later additive updates.
pub fn apply_contents(root: &mut Value, base_path: &str, contents: &[DataEntry]) {
    if path::is_root(base_path) {
        if contents.is_empty() {
            debug!("ignoring empty contents at the data model root");
            return;
        }
        replace_root(root, entries_to_value(contents));
    } else {
        set_path(root, base_path, entries_to_value(contents));
    }
}

/// Converts a value written in the wire's `[{key, value*}, ...]` form into
/// the map it describes. Any other value is returned unchanged.
pub fn from_key_value_list(value: Value) -> Value {
    let looks_like_entries = value
        .as_array()
        .and_then(|items| items.first())
        .and_then(Value::as_object)
        .is_some_and(|first| first.contains_key("key"));
    if !looks_like_entries {
        return value;
    }

    match serde_json::from_value::<Vec<DataEntry>>(value.clone()) {
        Ok(entries) => entries_to_value(&entries),
        Err(err) => {
            debug!("value looks like a key/value list but is not one: {err}");
            value
        }
    }
}

/// Recursively merges `value` into `target`: maps merge per key, anything
/// else replaces.
pub fn merge_into(target: &mut Value, value: Value) {
    match (target, value) {
        (Value::Object(existing), Value::Object(update)) => {
            for (key, incoming) in update {
                match existing.get_mut(&key) {
                    Some(slot) => merge_into(slot, incoming),
                    None => {
                        existing.insert(key, incoming);
                    }
                }
            }
        }
        (target, value) => *target = value,
    }
}

/// Parses a `valueString`. Valid JSON is stored as parsed; anything else is
/// kept as the raw string. Integers too large for 64 bits stay strings so
/// long ids keep every digit.
pub fn parse_value_string(raw: &str) -> Value {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Number(number)) if number.is_f64() && is_integer_literal(raw) => {
            Value::String(raw.to_string())
        }
        Ok(value) => value,
        Err(err) => {
            let trimmed = raw.trim_start();
            if trimmed.starts_with('{') || trimmed.starts_with('[') {
                let preview: String = raw.chars().take(50).collect();
                debug!("failed to parse potential JSON string \"{preview}...\": {err}");
            }
            Value::String(raw.to_string())
        }
    }
}

fn is_integer_literal(raw: &str) -> bool {
    let digits = raw.trim();
    let digits = digits.strip_prefix('-').unwrap_or(digits);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

fn entries_to_value(entries: &[DataEntry]) -> Value {
    let mut pending = empty_data_model();

    for entry in entries {
        let Some(value) = entry_value(entry) else {
            debug!("skipping data entry without a value: {}", entry.key);
            continue;
        };

        if path::is_root(&entry.key) {
            merge_into(&mut pending, value);
        } else if pending.is_object() {
            set_path(&mut pending, &entry.key, value);
        } else {
            debug!(
                "skipping data entry {} after a non-map self value",
                entry.key
            );
        }
    }

    pending
}

fn entry_value(entry: &DataEntry) -> Option<Value> {
    if let Some(nested) = &entry.value_map {
        return Some(entries_to_value(nested));
    }

    if let Some(raw) = &entry.value_string {
        return Some(parse_value_string(raw));
    }

    if let Some(number) = &entry.value_number {
        return Some(Value::Number(number.clone()));
    }

    entry.value_boolean.map(Value::Bool)
}

fn replace_root(root: &mut Value, value: Value) {
    if value.is_object() {
        *root = value;
    } else {
        warn!("cannot set root of data model to a non-map value");
    }
}

fn write_slot(parent: &mut Value, key: &str, value: Value, path: &str) {
    match parent {
        Value::Object(map) => match map.get_mut(key) {
            Some(existing) => merge_into(existing, value),
            None => {
                map.insert(key.to_string(), value);
            }
        },
        Value::Array(items) => match key.parse::<usize>() {
            Ok(index) if index < items.len() => merge_into(&mut items[index], value),
            Ok(index) if index == items.len() => items.push(value),
            _ => warn!("list index out of bounds '{key}' at path {path}"),
        },
        _ => warn!("cannot set path on non-container parent: {path}"),
    }
}

fn descend_or_create<'a>(value: &'a mut Value, token: &str) -> Option<&'a mut Value> {
    let slot = match value {
        Value::Object(map) => map.entry(token.to_string()).or_insert_with(empty_data_model),
        Value::Array(items) => {
            let index = token.parse::<usize>().ok()?;
            if index == items.len() {
                items.push(empty_data_model());
            }
            items.get_mut(index)?
        }
        _ => return None,
    };

    if !slot.is_object() && !slot.is_array() {
        *slot = empty_data_model();
    }

    Some(slot)
}

fn descend_existing<'a>(value: &'a Value, token: &str) -> Option<&'a Value> {
    match value {
        Value::Object(map) => map.get(token),
        Value::Array(items) => token
            .parse::<usize>()
            .ok()
            .and_then(|index| items.get(index)),
        _ => None,
    }
}
