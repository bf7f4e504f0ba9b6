//! Walking nested JSON objects by key path.

use serde_json::Value;

use pd_core::error::{PdError, PdResult};

/// Follow `path` through nested JSON objects and return the value reached.
///
/// Fails with [`PdError::KeyNotFound`] naming the first key that is missing,
/// or that was applied to a value which is not an object. An empty path
/// returns `map` itself.
pub fn access_nested_map<'a, I, K>(map: &'a Value, path: I) -> PdResult<&'a Value>
where
    I: IntoIterator<Item = K>,
    K: AsRef<str>,
{
    let mut current = map;
    for key in path {
        let key = key.as_ref();
        current = current
            .as_object()
            .and_then(|obj| obj.get(key))
            .ok_or_else(|| PdError::KeyNotFound(key.to_string()))?;
    }
    Ok(current)
}
