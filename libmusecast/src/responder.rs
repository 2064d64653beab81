//! Replies to incoming messages in the persona's voice
//!
//! Independent of the scheduled pipeline. This path never surfaces an error:
//! any failure yields [`FALLBACK_REPLY`].

use tracing::warn;

use crate::generation::TextGenerator;
use crate::prompt::PromptBuilder;
use crate::types::Persona;

pub const FALLBACK_REPLY: &str =
    "Thanks for your message! I'm processing your query and will respond thoughtfully soon.";

pub struct InteractiveResponder {
    persona: Persona,
    text: Box<dyn TextGenerator>,
}

impl InteractiveResponder {
    /// # Arguments
    ///
    /// * `persona` - Voice the reply is written in
    /// * `text` - Provider for the reply; any failure becomes [`FALLBACK_REPLY`]
    pub fn new(persona: Persona, text: Box<dyn TextGenerator>) -> Self {
        Self { persona, text }
    }

    pub async fn respond(&self, user_message: &str) -> String {
        let prompt = PromptBuilder::build_reply_prompt(&self.persona, user_message);

        match self.text.generate(&prompt).await {
            Ok(reply) if !reply.trim().is_empty() => reply.trim().to_string(),
            Ok(_) => {
                warn!("{} returned an empty reply, using fallback", self.text.name());
                FALLBACK_REPLY.to_string()
            }
            Err(e) => {
                warn!("Interactive response failed, using fallback: {}", e);
                FALLBACK_REPLY.to_string()
            }
        }
    }
}
