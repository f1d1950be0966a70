use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::completion::OpenAiSource;
use crate::core::AppConfig;
use crate::document::{Document, TextDocument};
use crate::engine::{ChatEngine, ChatError, ChatOutcome, EngineSettings};

/// Lines an editor integration uses to trigger a chat. They are commands,
/// not content, so they are stripped before the engine parses the note.
const TRIGGER_LINES: [&str; 9] = ["cc", "c0", "c1", "c2", "c3", "c4", "c5", "c6", "c7"];

fn strip_trigger_lines(content: &str) -> String {
    let mut kept: Vec<&str> = content
        .lines()
        .filter(|line| !TRIGGER_LINES.contains(&line.trim()))
        .collect();
    // Preserve a single trailing newline if the file had one
    if content.ends_with('\n') {
        kept.push("");
    }
    kept.join("\n")
}

pub async fn run(path: &Path, model_override: Option<&str>) -> Result<()> {
    let config = AppConfig::default();
    let model = model_override.unwrap_or(&config.model);

    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read note {}", path.display()))?;

    let mut doc = TextDocument::new(strip_trigger_lines(&content));
    let insert_at = doc.len();

    let source = Arc::new(OpenAiSource::new(&config.api_hostname, &config.api_key));
    let engine = ChatEngine::new(source, EngineSettings::from(&config));

    let doc_id = path.display().to_string();
    let result = engine.start(&mut doc, &doc_id, insert_at, model).await;

    // Whatever the engine left in the document is what the file should say,
    // including partial output after a failure mid-stream
    tokio::fs::write(path, doc.text())
        .await
        .with_context(|| format!("Failed to write note {}", path.display()))?;

    match result {
        Ok(ChatOutcome::Completed { .. }) => {
            println!("Response added to {}", path.display());
            Ok(())
        }
        Ok(ChatOutcome::Empty { .. }) => {
            println!("The model returned an empty response.");
            Ok(())
        }
        Err(ChatError::Cancelled) => {
            println!("Chat cancelled.");
            Ok(())
        }
        Err(err) => Err(err.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_trigger_lines() {
        let content = "Tell me a joke\ncc\n";
        assert_eq!(strip_trigger_lines(content), "Tell me a joke\n");
    }

    #[test]
    fn test_strip_trigger_lines_with_whitespace() {
        let content = "question\n  c3  \nmore";
        assert_eq!(strip_trigger_lines(content), "question\nmore");
    }

    #[test]
    fn test_strip_keeps_trigger_text_inside_lines() {
        let content = "the cc command\n";
        assert_eq!(strip_trigger_lines(content), "the cc command\n");
    }
}
