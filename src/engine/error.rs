use thiserror::Error;

use crate::completion::CompletionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("the note has no messages to send")]
    EmptyTranscript,
    #[error("the conversation already ends with an assistant reply; add a new message first")]
    TrailingAssistant,
}

/// Terminal failure of one chat invocation. Every variant releases the
/// session registry entry before being surfaced, and each surfaces exactly
/// once to the user.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("nothing to send: {0}")]
    Validation(#[from] ValidationError),
    #[error("completion request failed: {0}")]
    Transport(String),
    #[error("authorization failed: {0}")]
    Authorization(String),
    #[error("chat cancelled")]
    Cancelled,
    #[error("a chat is already streaming into this document")]
    SessionActive,
}

impl From<CompletionError> for ChatError {
    fn from(err: CompletionError) -> Self {
        match err {
            CompletionError::Authorization(msg) => ChatError::Authorization(msg),
            CompletionError::Cancelled => ChatError::Cancelled,
            CompletionError::Transport(msg) => ChatError::Transport(msg),
            CompletionError::Protocol(msg) => ChatError::Transport(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completion_errors_map_to_chat_errors() {
        assert!(matches!(
            ChatError::from(CompletionError::Authorization("401".into())),
            ChatError::Authorization(_)
        ));
        assert!(matches!(
            ChatError::from(CompletionError::Cancelled),
            ChatError::Cancelled
        ));
        assert!(matches!(
            ChatError::from(CompletionError::Transport("timeout".into())),
            ChatError::Transport(_)
        ));
        assert!(matches!(
            ChatError::from(CompletionError::Protocol("bad json".into())),
            ChatError::Transport(_)
        ));
    }
}
