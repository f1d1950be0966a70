//! Parsing a note's raw text into an ordered chat transcript.
//!
//! The document itself is the only persisted form of the conversation:
//! messages are delimited by a separator token and roles are derived
//! positionally (segments alternate starting at `user`). Nothing here ever
//! mutates the document.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub enum Role {
    #[serde(rename = "system")]
    System,
    #[serde(rename = "assistant")]
    Assistant,
    #[serde(rename = "user")]
    User,
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: &str) -> Self {
        Message {
            role,
            content: content.to_string(),
        }
    }
}

/// Parse document text into an ordered message history.
///
/// Only the first `cutoff` characters are considered (the caller passes the
/// status placeholder's start so the placeholder itself is never parsed). If
/// `boundary_marker` occurs on a line of its own, everything above the last
/// such line is excluded. The remaining text is split on `separator`,
/// trimmed, empty segments dropped, and roles assigned by alternation
/// starting at `user`.
///
/// An empty result is not an error; deciding whether there is anything to
/// send belongs to the caller.
pub fn parse(text: &str, separator: &str, boundary_marker: &str, cutoff: usize) -> Vec<Message> {
    let prefix: String = text.chars().take(cutoff).collect();

    let scope = match after_last_boundary(&prefix, boundary_marker) {
        Some(at) => &prefix[at..],
        None => prefix.as_str(),
    };

    scope
        .split(separator)
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .enumerate()
        .map(|(i, segment)| {
            let role = if i % 2 == 0 { Role::User } else { Role::Assistant };
            Message::new(role, segment)
        })
        .collect()
}

/// Byte offset just past the last line consisting only of the boundary
/// marker, if any. Requiring the marker to occupy its own line means
/// accumulated history that merely mentions the marker doesn't count.
fn after_last_boundary(text: &str, marker: &str) -> Option<usize> {
    if marker.is_empty() {
        return None;
    }

    let mut found = None;
    let mut pos = 0;
    for line in text.split_inclusive('\n') {
        let end = pos + line.len();
        if line.trim() == marker {
            found = Some(end);
        }
        pos = end;
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full(text: &str) -> Vec<Message> {
        parse(text, "---", "^^^", text.chars().count())
    }

    #[test]
    fn test_role_serialization() {
        assert_eq!(serde_json::to_string(&Role::System).unwrap(), r#""system""#);
        assert_eq!(
            serde_json::to_string(&Role::Assistant).unwrap(),
            r#""assistant""#
        );
        assert_eq!(serde_json::to_string(&Role::User).unwrap(), r#""user""#);
    }

    #[test]
    fn test_message_serialization() {
        let msg = Message::new(Role::User, "Hello world");
        assert_eq!(
            serde_json::to_string(&msg).unwrap(),
            r#"{"role":"user","content":"Hello world"}"#
        );
    }

    #[test]
    fn test_parse_single_message() {
        let messages = full("Tell me a joke");
        assert_eq!(messages, vec![Message::new(Role::User, "Tell me a joke")]);
    }

    #[test]
    fn test_parse_alternating_roles() {
        let messages = full("one\n---\ntwo\n---\nthree\n---\nfour");
        let roles: Vec<Role> = messages.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::User, Role::Assistant, Role::User, Role::Assistant]);
        assert_eq!(messages[2].content, "three");
    }

    #[test]
    fn test_parse_trailing_separator_is_dropped() {
        let messages = full("Tell me a joke\n---\n");
        assert_eq!(messages, vec![Message::new(Role::User, "Tell me a joke")]);
    }

    #[test]
    fn test_parse_empty_text() {
        assert!(full("").is_empty());
        assert!(full("\n\n---\n\n").is_empty());
    }

    #[test]
    fn test_parse_respects_cutoff() {
        let text = "Hello\n---\nWorld";
        // Cut before the second segment begins
        let messages = parse(text, "---", "^^^", 5);
        assert_eq!(messages, vec![Message::new(Role::User, "Hello")]);
    }

    #[test]
    fn test_parse_cutoff_past_end_is_harmless() {
        let messages = parse("Hi", "---", "^^^", 1000);
        assert_eq!(messages, vec![Message::new(Role::User, "Hi")]);
    }

    #[test]
    fn test_boundary_marker_excludes_prior_text() {
        let text = "old conversation\n---\nall ignored\n^^^\nNew question";
        let messages = full(text);
        assert_eq!(messages, vec![Message::new(Role::User, "New question")]);
    }

    #[test]
    fn test_boundary_marker_last_occurrence_wins() {
        let text = "a\n^^^\nb\n^^^\nc\n---\nd";
        let messages = full(text);
        assert_eq!(
            messages,
            vec![
                Message::new(Role::User, "c"),
                Message::new(Role::Assistant, "d"),
            ]
        );
    }

    #[test]
    fn test_boundary_marker_must_be_standalone_line() {
        let text = "mentions ^^^ inline\n---\nreply";
        let messages = full(text);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].content, "mentions ^^^ inline");
    }

    // parse(A + "\n^^^\n" + B) == parse(B) when A has no standalone marker
    #[test]
    fn test_boundary_marker_idempotence() {
        let a = "anything above, even a --- separator";
        let b = "question\n---\nanswer\n---\nfollowup";
        let joined = format!("{}\n^^^\n{}", a, b);
        assert_eq!(full(&joined), full(b));
    }

    #[test]
    fn test_parse_unicode_cutoff_is_codepoints() {
        // 6 chars: "héllo" is 5 codepoints plus the newline
        let text = "héllo\nx";
        let messages = parse(text, "---", "^^^", 5);
        assert_eq!(messages, vec![Message::new(Role::User, "héllo")]);
    }
}
