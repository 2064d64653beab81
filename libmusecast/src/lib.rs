//! Musecast - scheduled persona-driven content for the Fediverse
//!
//! Generates a post per topic with a text model, optionally illustrates it
//! with an image model, and publishes it to a Mastodon-compatible account,
//! one topic at a time with a pacing interval in between.

pub mod clock;
pub mod config;
pub mod error;
pub mod generation;
pub mod logging;
pub mod pipeline;
pub mod platforms;
pub mod prompt;
pub mod responder;
pub mod setup;
pub mod staging;
pub mod types;

// Re-export commonly used types
pub use config::{Config, Credentials};
pub use error::{MusecastError, Result};
pub use pipeline::{ContentPipeline, RunSummary, TopicOutcome};
pub use responder::{InteractiveResponder, FALLBACK_REPLY};
pub use types::{GeneratedContent, MediaHandle, Persona, PublishResult};
