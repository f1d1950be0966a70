//! Lifecycle of the transient `Calling <model>...` marker that shows a
//! request is in flight.
//!
//! The bounds are captured once at insertion time and never re-derived by
//! searching the document: streamed content and user edits make text search
//! pick the wrong occurrence. Removal verifies the text between the captured
//! bounds still is the placeholder before deleting anything.

use crate::document::Document;

/// Exact bounds (character offsets) of an inserted placeholder, including
/// any leading newline added to put it on its own line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlaceholderBounds {
    pub start: usize,
    pub end: usize,
}

pub fn placeholder_text(model: &str) -> String {
    format!("Calling {}...", model)
}

/// Insert the status placeholder at `at`, on its own line. Returns the
/// bounds of exactly what was inserted.
pub fn insert<D: Document + ?Sized>(doc: &mut D, at: usize, model: &str) -> PlaceholderBounds {
    let mut text = String::new();
    if at > 0 && doc.read(at - 1..at) != "\n" {
        text.push('\n');
    }
    text.push_str(&placeholder_text(model));
    text.push('\n');

    doc.insert(at, &text);

    PlaceholderBounds {
        start: at,
        end: at + text.chars().count(),
    }
}

/// Remove the placeholder if, and only if, the text between `bounds` still
/// matches it. A mismatch means the document diverged (usually the user
/// edited near the placeholder); that is an expected race, so it is logged
/// and the document is left untouched.
pub fn remove<D: Document + ?Sized>(doc: &mut D, bounds: PlaceholderBounds, model: &str) -> bool {
    if bounds.start > bounds.end || bounds.end > doc.len() {
        tracing::warn!(
            start = bounds.start,
            end = bounds.end,
            "placeholder bounds no longer fit the document; leaving it in place"
        );
        return false;
    }

    let current = doc.read(bounds.start..bounds.end);
    if current.trim() != placeholder_text(model) {
        tracing::warn!(
            found = %current.trim(),
            "placeholder text diverged; leaving the document untouched"
        );
        return false;
    }

    doc.replace(bounds.start..bounds.end, "");
    true
}
