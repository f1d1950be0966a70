//! Chat with an LLM from inside a plain-text note: the note itself is the
//! transcript, and responses stream into it in place.

pub mod cli;
pub mod completion;
pub mod core;
pub mod document;
pub mod engine;
pub mod transcript;
