//! Context naming.
//!
//! Asterisk context names may not contain whitespace, brackets, commas or
//! `;`. Ids are mapped character-by-character onto `[A-Za-z0-9_-]`, so a
//! given id always yields the same name and every reference to it agrees.

use crate::constants::{ANNOUNCEMENT_CONTEXT_PREFIX, IVR_CONTEXT_PREFIX};
use crate::model::EntityId;

fn sanitize(raw: &str) -> String {
    let cleaned: String = raw
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "_".to_string()
    } else {
        cleaned
    }
}

/// `<prefix><sanitized id>`
pub fn context_name(prefix: &str, id: &str) -> String {
    format!("{}{}", prefix, sanitize(id))
}

pub fn ivr_context(id: &EntityId) -> String {
    context_name(IVR_CONTEXT_PREFIX, id.as_str())
}

pub fn announcement_context(id: &EntityId) -> String {
    context_name(ANNOUNCEMENT_CONTEXT_PREFIX, id.as_str())
}

/// Whether `pattern` can stand as an `exten =>` pattern taken from entity
/// data: digits, letters, `*#+` and the `_ . ! - [ ]` pattern syntax. A comma,
/// `;` or whitespace would corrupt the line.
pub fn is_dial_pattern(pattern: &str) -> bool {
    !pattern.is_empty()
        && pattern
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "*#+_.!-[]".contains(c))
}

/// Per-IVR channel variable name, e.g. `IVR_ivr_X_INVALID`.
pub fn counter_var(context: &str, what: &str) -> String {
    format!("IVR_{}_{}", context.replace('-', "_"), what)
}
