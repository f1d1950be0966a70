//! Streams response fragments into the document.
//!
//! The writer owns a tiny state machine: nothing is touched until the first
//! non-empty fragment arrives, at which point the status placeholder is
//! swapped for a normalized separator block and fragments are appended at
//! the insertion cursor, strictly in arrival order. Cancellation is observed
//! here and only here; partial output is valid and is never rolled back.

use futures_util::StreamExt;
use tokio_util::sync::CancellationToken;

use super::error::ChatError;
use super::placeholder::{self, PlaceholderBounds};
use crate::completion::{CompletionError, FragmentStream};
use crate::document::{Document, InsertionCursor};

/// How a fully consumed stream ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Content was written; `end` is the offset just after the trailing
    /// separator block.
    Completed { end: usize },
    /// The stream ended without a single fragment. The placeholder is gone
    /// and `at` is its original start.
    Empty { at: usize },
}

enum WriterState {
    FirstFragmentPending,
    Streaming(InsertionCursor),
}

/// Replace the trailing run of blank lines (and one already-present
/// separator line) before `at` with the canonical separator block: one blank
/// line, the separator on its own line, one blank line. At document start
/// there is no leading blank line.
///
/// Consuming what is already there instead of blindly inserting makes this
/// idempotent, and it is the single routine used both when the placeholder
/// is replaced and when the response is terminated.
pub fn normalize_separator_block<D: Document + ?Sized>(
    doc: &mut D,
    at: usize,
    separator: &str,
) -> usize {
    let prefix = doc.read(0..at);
    let start = trailing_block_start(&prefix, separator);

    let block = if start == 0 {
        format!("{}\n\n", separator)
    } else {
        format!("\n\n{}\n\n", separator)
    };

    doc.replace(start..at, &block);
    start + block.chars().count()
}

/// Character offset where the existing trailing newline/separator run
/// begins: newlines, then at most one line equal to the separator token,
/// then newlines again.
fn trailing_block_start(prefix: &str, separator: &str) -> usize {
    let chars: Vec<char> = prefix.chars().collect();
    let mut i = chars.len();

    while i > 0 && chars[i - 1] == '\n' {
        i -= 1;
    }

    if !separator.is_empty() {
        let line_start = chars[..i]
            .iter()
            .rposition(|&c| c == '\n')
            .map(|p| p + 1)
            .unwrap_or(0);
        let line: String = chars[line_start..i].iter().collect();
        if line.trim() == separator {
            i = line_start;
            while i > 0 && chars[i - 1] == '\n' {
                i -= 1;
            }
        }
    }

    i
}

/// Consume `fragments` and write them into `doc` starting where the
/// placeholder was. Returns the terminal outcome, or `ChatError::Cancelled`
/// when the token fires (whatever was already written stays put).
pub async fn write<D: Document + ?Sized>(
    doc: &mut D,
    mut fragments: FragmentStream,
    bounds: PlaceholderBounds,
    separator: &str,
    model: &str,
    cancel: &CancellationToken,
) -> Result<WriteOutcome, ChatError> {
    let mut state = WriterState::FirstFragmentPending;

    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ChatError::Cancelled),
            next = fragments.next() => next,
        };

        match next {
            Some(Ok(fragment)) if fragment.is_empty() => continue,
            Some(Ok(fragment)) => match state {
                WriterState::FirstFragmentPending => {
                    if !placeholder::remove(doc, bounds, model) {
                        tracing::warn!(
                            "status placeholder diverged before streaming; \
                             writing the response at its captured start anyway"
                        );
                    }
                    let after = normalize_separator_block(doc, bounds.start, separator);
                    let mut cursor = InsertionCursor::new(after);
                    doc.insert(cursor.offset(), &fragment);
                    cursor.advance(fragment.chars().count());
                    state = WriterState::Streaming(cursor);
                }
                WriterState::Streaming(ref mut cursor) => {
                    doc.insert(cursor.offset(), &fragment);
                    cursor.advance(fragment.chars().count());
                }
            },
            Some(Err(CompletionError::Cancelled)) => return Err(ChatError::Cancelled),
            Some(Err(err)) => return Err(err.into()),
            None => {
                return Ok(match state {
                    WriterState::Streaming(cursor) => {
                        let end = normalize_separator_block(doc, cursor.offset(), separator);
                        WriteOutcome::Completed { end }
                    }
                    WriterState::FirstFragmentPending => {
                        placeholder::remove(doc, bounds, model);
                        WriteOutcome::Empty { at: bounds.start }
                    }
                });
            }
        }
    }
}
