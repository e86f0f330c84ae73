//! Lists arrive wrapped in whatever the endpoint felt like that day.

use log::warn;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Where a list may hide, in the order we look.
const PROBES: [&[&str]; 5] = [
    &["data", "colleges"],
    &["statusCode"],
    &["data"],
    &["ngos"],
    &[],
];

fn probe<'a>(body: &'a Value, path: &[&str]) -> Option<&'a Vec<Value>> {
    path.iter()
        .try_fold(body, |value, key| value.get(key))?
        .as_array()
}

/// Find the entity array in a response body.
///
/// The first probe that points at a json array wins, even an empty one. If
/// none does, the list is empty. Elements that don't decode as `T` are
/// skipped.
pub fn unwrap_list<T: DeserializeOwned>(body: &Value) -> Vec<T> {
    let Some(items) = PROBES.iter().find_map(|path| probe(body, path)) else {
        return vec![];
    };

    items
        .iter()
        .filter_map(|item| match serde_json::from_value(item.clone()) {
            Ok(item) => Some(item),
            Err(err) => {
                warn!("skipping list entry that failed to decode: {err}");
                None
            }
        })
        .collect()
}
