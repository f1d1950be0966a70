//! The transcript engine: everything between "the user triggered a chat"
//! and "the streamed response is sitting in the document".

pub mod error;
pub mod orchestrator;
pub mod placeholder;
pub mod registry;
pub mod writer;

pub use error::{ChatError, ValidationError};
pub use orchestrator::{ChatEngine, ChatOutcome, EngineSettings};
pub use placeholder::PlaceholderBounds;
pub use registry::SessionRegistry;
