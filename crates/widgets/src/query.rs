//! Query string helpers.

/// Value of `key` in a `k1=v1&k2=v2` query string. A leading `?` is ignored.
pub fn extract_from_query(key: &str, query: &str) -> Option<String> {
    query
        .trim_start_matches('?')
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(k, _)| *k == key)
        .map(|(_, v)| v.to_string())
}
