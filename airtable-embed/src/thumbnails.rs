//! Locating image thumbnails inside API responses.

use serde_json::Value as JsonValue;

/// The key under which Airtable lists the resized versions of an attachment.
pub const THUMBNAILS: &str = "thumbnails";

/// Finds the thumbnails of the first image attachment in a response.
pub fn find(response: &JsonValue) -> Option<&JsonValue> {
    locate(response, THUMBNAILS)
}

/// Searches `haystack` depth-first for an object that directly contains
/// `needle`, returning the value stored under it.
///
/// The children of each level are visited in order. A composite child is
/// checked for the key itself before its own children are searched, and the
/// first match wins, so a deep match on an early branch beats a shallow match
/// on a later one. The root itself is never checked.
pub fn locate<'a>(haystack: &'a JsonValue, needle: &str) -> Option<&'a JsonValue> {
    let children: Vec<&JsonValue> = match haystack {
        JsonValue::Array(items) => items.iter().collect(),
        JsonValue::Object(map) => map.values().collect(),
        _ => return None,
    };
    children.into_iter().find_map(|child| match child {
        JsonValue::Object(map) => map.get(needle).or_else(|| locate(child, needle)),
        JsonValue::Array(_) => locate(child, needle),
        _ => None,
    })
}
