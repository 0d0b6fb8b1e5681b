//! 🔬 Structural diff over serialised entities, blind to audit noise.
//!
//! Every transform stamps fresh audit fields, so comparing raw documents would
//! call everything a change. Volatile keys are stripped at every depth (nested
//! endpoints included) before comparing. Output is the list of changed paths,
//! e.g. `healthcare_service.telecom.email`.
//!
//! 🔀 Arrays are bags, not sequences: the source hands back endpoints, opening
//! times and dispositions in whatever order the query felt like, and a reshuffle
//! is not a change. Elements carrying an `id` are paired up by it, so an edited
//! endpoint still reports its own field path.

use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::model::{MigrationState, TransformResult};

pub const VOLATILE_FIELDS: &[&str] = &["createdTime", "lastUpdated", "createdBy", "lastUpdatedBy"];

/// 🧽 Drop volatile keys everywhere in `value`.
pub fn strip_volatile(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(key, _)| !VOLATILE_FIELDS.contains(&key.as_str()))
                .map(|(key, value)| (key, strip_volatile(value)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(strip_volatile).collect()),
        other => other,
    }
}

/// 📋 Paths where `old` and `new` differ. Arrays are compared ignoring order.
/// Arrays whose elements can't be paired by `id` report the array path itself.
pub fn changed_paths(old: &Value, new: &Value) -> Vec<String> {
    let mut paths = Vec::new();
    walk(old, new, "", &mut paths);
    paths
}

fn join(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

fn walk(old: &Value, new: &Value, path: &str, out: &mut Vec<String>) {
    match (old, new) {
        (Value::Object(old_map), Value::Object(new_map)) => {
            let mut keys: Vec<&String> = old_map.keys().chain(new_map.keys()).collect();
            keys.sort();
            keys.dedup();
            for key in keys {
                let child = join(path, key);
                match (old_map.get(key), new_map.get(key)) {
                    (Some(a), Some(b)) => walk(a, b, &child, out),
                    _ => out.push(child),
                }
            }
        }
        (Value::Array(old_items), Value::Array(new_items)) => {
            if same_bag(old_items, new_items) {
                return;
            }
            match paired_by_id(old_items, new_items) {
                Some(pairs) => {
                    for (index, a, b) in pairs {
                        walk(a, b, &format!("{path}[{index}]"), out);
                    }
                }
                None => out.push(path.to_string()),
            }
        }
        (a, b) if a == b => {}
        _ => out.push(path.to_string()),
    }
}

/// 🧾 Order-free rendering: object fields and nested arrays sorted all the way down.
fn canonical(value: &Value) -> String {
    match value {
        Value::Array(items) => format!("[{}]", sorted_canonical(items).join(",")),
        Value::Object(map) => {
            let mut fields: Vec<String> = map
                .iter()
                .map(|(key, value)| format!("{}:{}", Value::String(key.clone()), canonical(value)))
                .collect();
            fields.sort_unstable();
            format!("{{{}}}", fields.join(","))
        }
        scalar => scalar.to_string(),
    }
}

fn sorted_canonical(items: &[Value]) -> Vec<String> {
    let mut canon: Vec<String> = items.iter().map(canonical).collect();
    canon.sort_unstable();
    canon
}

fn same_bag(old_items: &[Value], new_items: &[Value]) -> bool {
    old_items.len() == new_items.len() && sorted_canonical(old_items) == sorted_canonical(new_items)
}

/// 🪪 `(index in new, old, new)` when both sides hold the same set of unique ids.
fn paired_by_id<'a>(
    old_items: &'a [Value],
    new_items: &'a [Value],
) -> Option<Vec<(usize, &'a Value, &'a Value)>> {
    if old_items.len() != new_items.len() {
        return None;
    }
    let mut old_by_id: HashMap<String, &Value> = HashMap::with_capacity(old_items.len());
    for item in old_items {
        if old_by_id.insert(item.get("id")?.to_string(), item).is_some() {
            return None;
        }
    }
    let mut pairs = Vec::with_capacity(new_items.len());
    for (index, item) in new_items.iter().enumerate() {
        let old = old_by_id.remove(&item.get("id")?.to_string())?;
        pairs.push((index, old, item));
    }
    Some(pairs)
}

fn entities(
    organisation: &impl serde::Serialize,
    location: &impl serde::Serialize,
    healthcare_service: &impl serde::Serialize,
) -> serde_json::Result<Value> {
    let mut map = Map::new();
    map.insert("organisation".to_string(), serde_json::to_value(organisation)?);
    map.insert("location".to_string(), serde_json::to_value(location)?);
    map.insert(
        "healthcare_service".to_string(),
        serde_json::to_value(healthcare_service)?,
    );
    Ok(strip_volatile(Value::Object(map)))
}

/// 🎯 Material changes between what's stored and what was just computed.
pub fn entity_changes(
    previous: &MigrationState,
    result: &TransformResult,
) -> serde_json::Result<Vec<String>> {
    let old = entities(
        &previous.organisation,
        &previous.location,
        &previous.healthcare_service,
    )?;
    let new = entities(&result.organisation, &result.location, &result.healthcare_service)?;
    Ok(changed_paths(&old, &new))
}
