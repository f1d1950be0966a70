//! At-most-one streaming session per document.
//!
//! The registry is an explicit object owned by the engine's composition
//! root, not ambient global state. Acquisition happens under one lock, so
//! two `start` calls racing on the same document id can never both win.

use std::collections::HashMap;
use std::sync::Mutex;

use tokio_util::sync::CancellationToken;

use super::placeholder::PlaceholderBounds;

/// The live record of an in-flight streaming request.
struct StreamSession {
    cancel: CancellationToken,
    placeholder: Option<PlaceholderBounds>,
}

#[derive(Default)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<String, StreamSession>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session for `id` and return its cancellation token, or
    /// `None` when one is already live. Rejection has no side effects.
    pub fn try_acquire(&self, id: &str) -> Option<CancellationToken> {
        let mut sessions = self.sessions.lock().expect("session registry lock poisoned");
        if sessions.contains_key(id) {
            return None;
        }

        let token = CancellationToken::new();
        sessions.insert(
            id.to_string(),
            StreamSession {
                cancel: token.clone(),
                placeholder: None,
            },
        );
        Some(token)
    }

    /// Record the placeholder bounds for an active session.
    pub fn set_placeholder(&self, id: &str, bounds: PlaceholderBounds) {
        let mut sessions = self.sessions.lock().expect("session registry lock poisoned");
        if let Some(session) = sessions.get_mut(id) {
            session.placeholder = Some(bounds);
        }
    }

    pub fn placeholder(&self, id: &str) -> Option<PlaceholderBounds> {
        let sessions = self.sessions.lock().expect("session registry lock poisoned");
        sessions.get(id).and_then(|s| s.placeholder)
    }

    pub fn is_active(&self, id: &str) -> bool {
        let sessions = self.sessions.lock().expect("session registry lock poisoned");
        sessions.contains_key(id)
    }

    /// Fire the cancellation token for `id`. Returns whether a session was
    /// there to cancel. The entry itself is released by the owning `start`
    /// call as it unwinds.
    pub fn cancel(&self, id: &str) -> bool {
        let sessions = self.sessions.lock().expect("session registry lock poisoned");
        match sessions.get(id) {
            Some(session) => {
                session.cancel.cancel();
                true
            }
            None => false,
        }
    }

    pub fn release(&self, id: &str) {
        let mut sessions = self.sessions.lock().expect("session registry lock poisoned");
        sessions.remove(id);
    }
}
