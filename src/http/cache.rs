//! HTTP cache validation module
//!
//! `ETag` generation for served assets and `If-None-Match` evaluation.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Strong `ETag` derived from the asset bytes, e.g. `"1f3a9c0e2b7d4410"`
pub fn generate_etag(content: &[u8]) -> String {
    let mut hasher = DefaultHasher::new();
    content.hash(&mut hasher);
    format!("\"{:016x}\"", hasher.finish())
}

/// Whether the client's cached copy is still current
///
/// Accepts a single tag, a comma-separated list, or `*`. Weak tags (`W/"..."`)
/// compare equal to their strong form, as `If-None-Match` uses weak comparison.
pub fn is_not_modified(if_none_match: Option<&str>, etag: &str) -> bool {
    if_none_match.is_some_and(|header| {
        header.split(',').map(str::trim).any(|candidate| {
            candidate == "*" || candidate.strip_prefix("W/").unwrap_or(candidate) == etag
        })
    })
}
