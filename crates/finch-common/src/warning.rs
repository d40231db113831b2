//! Parser warnings, reported through the [`log`] facade.
//!
//! Provides deduplication to avoid spamming the same warning multiple times
//! when a malformed document repeats the same construct. The tokenizer and
//! tree builder use this to report recoverable anomalies.

use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

/// Global set of warnings we've already emitted (to deduplicate)
static WARNED: Mutex<Option<HashSet<String>>> = Mutex::new(None);

/// Longest deduplication key kept in the warned set, in bytes.
///
/// Messages may quote document content, so keys are cut to this length.
/// Messages sharing a prefix of this length count as duplicates.
pub const MAX_KEY_LEN: usize = 160;

/// Warn about a recoverable problem (emitted once per unique message).
///
/// Returns `true` if the message was emitted, `false` if it was a duplicate.
///
/// # Example
/// ```ignore
/// warn_once("HTML Parser", "end tag </span> ignored");
/// ```
pub fn warn_once(component: &str, message: &str) -> bool {
    let key = dedup_key(component, message);
    let should_emit = WARNED
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .get_or_insert_with(HashSet::new)
        .insert(key);

    if should_emit {
        log::warn!(target: "finch", "[{component}] {message}");
    }
    should_emit
}

/// `[component] message`, cut to at most [`MAX_KEY_LEN`] bytes on a char
/// boundary.
fn dedup_key(component: &str, message: &str) -> String {
    let mut key = format!("[{component}] {message}");
    if key.len() > MAX_KEY_LEN {
        let mut end = MAX_KEY_LEN;
        while !key.is_char_boundary(end) {
            end -= 1;
        }
        key.truncate(end);
    }
    key
}

/// Clear all recorded warnings (call before parsing an unrelated document)
pub fn clear_warnings() {
    let mut guard = WARNED.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(set) = guard.as_mut() {
        set.clear();
    }
}
