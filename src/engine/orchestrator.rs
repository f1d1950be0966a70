//! The end-to-end "start chat" operation and its cancellation counterpart.
//!
//! One invocation moves through: insert placeholder → parse history →
//! validate → request completion → stream into the document. Every exit
//! path, success or not, releases the session registry entry; every failure
//! path removes the placeholder if it is verifiably still there.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use super::error::{ChatError, ValidationError};
use super::placeholder;
use super::registry::SessionRegistry;
use super::writer::{self, WriteOutcome};
use crate::completion::CompletionSource;
use crate::core::AppConfig;
use crate::document::Document;
use crate::transcript::{self, Message, Role};

#[derive(Clone, Debug)]
pub struct EngineSettings {
    pub separator: String,
    pub boundary_marker: String,
    pub system_message: String,
}

impl From<&AppConfig> for EngineSettings {
    fn from(config: &AppConfig) -> Self {
        EngineSettings {
            separator: config.separator.clone(),
            boundary_marker: config.boundary_marker.clone(),
            system_message: config.system_message.clone(),
        }
    }
}

/// Successful terminal states of one invocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChatOutcome {
    /// The response was streamed in; `end` is the offset after the trailing
    /// separator block, where the caret now sits.
    Completed { end: usize },
    /// The model returned nothing. The document is back to how it was and
    /// the caret is at `at`.
    Empty { at: usize },
}

pub struct ChatEngine {
    registry: Arc<SessionRegistry>,
    source: Arc<dyn CompletionSource>,
    settings: EngineSettings,
}

impl ChatEngine {
    pub fn new(source: Arc<dyn CompletionSource>, settings: EngineSettings) -> Self {
        ChatEngine {
            registry: Arc::new(SessionRegistry::new()),
            source,
            settings,
        }
    }

    /// Whether a session is currently streaming into the document with this
    /// id. A command detector uses this to suppress re-triggering.
    pub fn is_active(&self, doc_id: &str) -> bool {
        self.registry.is_active(doc_id)
    }

    /// Request cancellation of the in-flight session for `doc_id`, if any.
    /// Cancellation is cooperative: the streaming task observes the token at
    /// its next suspension point and cleans up on its own stack.
    pub fn cancel(&self, doc_id: &str) -> bool {
        let cancelled = self.registry.cancel(doc_id);
        if cancelled {
            tracing::info!(doc_id, "cancellation requested");
        }
        cancelled
    }

    /// Run one chat turn: read the conversation from `doc` (up to
    /// `insert_at`), send it to the completion source, and stream the reply
    /// back into the document at `insert_at`.
    pub async fn start<D: Document + ?Sized>(
        &self,
        doc: &mut D,
        doc_id: &str,
        insert_at: usize,
        model: &str,
    ) -> Result<ChatOutcome, ChatError> {
        let Some(cancel) = self.registry.try_acquire(doc_id) else {
            tracing::debug!(doc_id, "start rejected; a session is already streaming");
            return Err(ChatError::SessionActive);
        };

        let result = self.run(doc, doc_id, insert_at, model, cancel).await;

        // Unconditional on every exit path
        self.registry.release(doc_id);

        match &result {
            Ok(outcome) => tracing::debug!(doc_id, ?outcome, "chat turn finished"),
            Err(ChatError::Cancelled) => tracing::info!(doc_id, "chat turn cancelled"),
            Err(err) => tracing::error!(doc_id, %err, "chat turn failed"),
        }

        result
    }

    async fn run<D: Document + ?Sized>(
        &self,
        doc: &mut D,
        doc_id: &str,
        insert_at: usize,
        model: &str,
        cancel: CancellationToken,
    ) -> Result<ChatOutcome, ChatError> {
        let bounds = placeholder::insert(doc, insert_at, model);
        self.registry.set_placeholder(doc_id, bounds);

        // Parse strictly before the placeholder so it never becomes content
        let history = transcript::parse(
            &doc.text(),
            &self.settings.separator,
            &self.settings.boundary_marker,
            bounds.start,
        );

        if let Err(invalid) = validate(&history) {
            placeholder::remove(doc, bounds, model);
            doc.set_caret(insert_at);
            return Err(invalid.into());
        }

        let mut request = Vec::with_capacity(history.len() + 1);
        if !self.settings.system_message.is_empty() {
            request.push(Message::new(Role::System, &self.settings.system_message));
        }
        request.extend(history);

        tracing::info!(doc_id, model, messages = request.len(), "requesting completion");

        let fragments = match self.source.stream(&request, model, cancel.clone()).await {
            Ok(fragments) => fragments,
            Err(err) => {
                // Nothing was streamed yet, so the placeholder is still ours
                placeholder::remove(doc, bounds, model);
                doc.set_caret(insert_at);
                return Err(err.into());
            }
        };

        match writer::write(doc, fragments, bounds, &self.settings.separator, model, &cancel).await
        {
            Ok(WriteOutcome::Completed { end }) => {
                doc.set_caret(end);
                Ok(ChatOutcome::Completed { end })
            }
            Ok(WriteOutcome::Empty { at }) => {
                doc.set_caret(at);
                Ok(ChatOutcome::Empty { at })
            }
            Err(err) => {
                // Covers cancellation or failure before the first fragment,
                // while the placeholder is still in the document. Removal is
                // content-verified, so it is a no-op when the writer already
                // swapped the placeholder for response text.
                placeholder::remove(doc, bounds, model);
                Err(err)
            }
        }
    }
}

/// A transcript is only valid for submission when it ends with a `user`
/// message. The parser never synthesizes or drops messages to fix this.
fn validate(history: &[Message]) -> Result<(), ValidationError> {
    match history.last() {
        None => Err(ValidationError::EmptyTranscript),
        Some(last) if last.role != Role::User => Err(ValidationError::TrailingAssistant),
        Some(_) => Ok(()),
    }
}
