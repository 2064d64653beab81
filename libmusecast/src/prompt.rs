//! Prompt construction
//!
//! Pure functions mapping a persona and a topic (or an incoming message) to
//! the instruction strings sent to the generation providers. The length
//! limit is only stated to the model here; the pipeline bounds the text
//! itself before publishing.

use crate::types::Persona;

/// Character limit stated to the text model
pub const TEXT_LENGTH_LIMIT: usize = 500;

pub struct PromptBuilder;

impl PromptBuilder {
    /// Prompt for a social media post about `topic` in the persona's voice
    ///
    /// The role, voice and focus all come from `persona`; nothing here assumes
    /// a particular field or audience.
    pub fn build_text_prompt(persona: &Persona, topic: &str) -> String {
        let mut prompt = format!(
            "You are {name}: {bio}.\n\
             Create an engaging social media post about {topic}, written in the voice of {name}.\n\
             Include insights, a thought-provoking statement, and maintain a professional yet approachable tone.",
            name = persona.name,
            bio = persona.bio,
            topic = topic,
        );

        if let Some(interests) = interest_list(persona) {
            prompt.push_str(&format!(
                "\nWhere it fits naturally, connect the post to your interests: {}.",
                interests
            ));
        }

        prompt.push_str(&format!(
            "\nStrictly keep it under {} characters.",
            TEXT_LENGTH_LIMIT
        ));
        prompt
    }

    /// Prompt for an illustration accompanying a post about `topic`
    pub fn build_image_prompt(topic: &str) -> String {
        format!(
            "Create a professional, modern illustration representing {}. \
             Use a clean, minimalist design with no text in the image.",
            topic
        )
    }

    /// Prompt for replying to a message addressed to the persona
    pub fn build_reply_prompt(persona: &Persona, user_message: &str) -> String {
        let perspective = match interest_list(persona) {
            Some(interests) => format!("Offers a perspective drawn from {}", interests),
            None => format!("Offers a perspective true to {}", persona.name),
        };

        format!(
            "{name} ({bio}) is responding to a message.\n\
             User Message: {message}\n\n\
             Provide a professional, insightful, and engaging response that:\n\
             - Addresses the user's query\n\
             - {perspective}\n\
             - Maintains an approachable tone\n\
             Keep it under {limit} characters.",
            name = persona.name,
            bio = persona.bio,
            message = user_message.trim(),
            perspective = perspective,
            limit = TEXT_LENGTH_LIMIT,
        )
    }
}

fn interest_list(persona: &Persona) -> Option<String> {
    let interests: Vec<&str> = persona
        .interests
        .iter()
        .map(|i| i.trim())
        .filter(|i| !i.is_empty())
        .collect();
    if interests.is_empty() {
        None
    } else {
        Some(interests.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_prompt_is_deterministic() {
        let persona = Persona::default();
        let first = PromptBuilder::build_text_prompt(&persona, "X");
        let second = PromptBuilder::build_text_prompt(&persona, "X");
        assert_eq!(first, second);
    }

    #[test]
    fn test_text_prompt_embeds_topic_persona_and_limit() {
        let persona = Persona::default();
        let prompt = PromptBuilder::build_text_prompt(&persona, "AI Ethics in Healthcare");

        assert!(prompt.contains("AI Ethics in Healthcare"));
        assert!(prompt.contains("Nova Tech Insights"));
        assert!(prompt.contains("Sustainable Technology, AI Ethics"));
        assert!(prompt.contains("under 500 characters"));
    }

    #[test]
    fn test_text_prompt_without_interests() {
        let persona = Persona {
            name: "Quiet".to_string(),
            bio: "minimal".to_string(),
            interests: vec![],
        };
        let prompt = PromptBuilder::build_text_prompt(&persona, "topic");
        assert!(!prompt.contains("interests"));
        assert!(prompt.contains("under 500 characters"));
    }

    #[test]
    fn test_image_prompt_embeds_topic() {
        let prompt = PromptBuilder::build_image_prompt("Digital Wellness");
        assert!(prompt.contains("representing Digital Wellness."));
        assert_eq!(prompt, PromptBuilder::build_image_prompt("Digital Wellness"));
    }

    #[test]
    fn test_reply_prompt_embeds_message() {
        let persona = Persona::default();
        let prompt = PromptBuilder::build_reply_prompt(&persona, "  What about GPUs?  ");
        assert!(prompt.contains("User Message: What about GPUs?\n"));
        assert!(prompt.contains("Nova Tech Insights"));
    }

    fn orbit() -> Persona {
        Persona {
            name: "Orbit".to_string(),
            bio: "Space systems commentary".to_string(),
            interests: vec!["Launch vehicles".to_string(), "Orbital debris".to_string()],
        }
    }

    #[test]
    fn test_custom_persona_sets_the_voice() {
        let persona = orbit();
        let prompt = PromptBuilder::build_text_prompt(&persona, "Reusable boosters");

        assert!(prompt.starts_with("You are Orbit: Space systems commentary."));
        assert!(prompt.contains("in the voice of Orbit"));
        assert!(prompt.contains("Launch vehicles, Orbital debris"));
        assert!(!prompt.contains("AI researcher"));
        assert!(!prompt.contains("tech"));
    }

    #[test]
    fn test_custom_persona_reply_prompt() {
        let prompt = PromptBuilder::build_reply_prompt(&orbit(), "How big is Starship?");

        assert!(prompt.starts_with("Orbit (Space systems commentary) is responding"));
        assert!(prompt.contains("perspective drawn from Launch vehicles, Orbital debris"));
        assert!(!prompt.contains("tech influencer"));
        assert!(!prompt.contains("tech perspective"));
    }

    #[test]
    fn test_reply_prompt_without_interests_names_the_persona() {
        let persona = Persona {
            interests: vec!["  ".to_string()],
            ..orbit()
        };
        let prompt = PromptBuilder::build_reply_prompt(&persona, "hi");
        assert!(prompt.contains("perspective true to Orbit"));
    }
}
