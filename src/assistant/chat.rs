//! Nutrition chat replies

use serde::Serialize;

use super::prompts::{chat_prompt, chat_system_prompt};
use super::{Source, TextGenerator};
use crate::models::{ChatContext, ChatMessage};

pub const DEMO_REPLY: &str = "I'm your AI nutrition assistant! While I'm currently in demo mode, \
I can help you with general nutrition advice. For personalized AI responses, please add your \
Google Gemini API key to the environment variables.";

pub const APOLOGY_REPLY: &str = "I apologize, but I'm having trouble connecting to my AI services \
right now. Please try again later or check your API configuration.";

/// An assistant answer
#[derive(Debug, Clone, Serialize)]
pub struct ChatReply {
    pub text: String,
    pub source: Source,
}

/// Answer `message` given the user context and earlier exchanges.
///
/// Never fails: without a generator the demo text is returned, and a failed
/// call yields the apology text.
pub fn reply(
    generator: Option<&dyn TextGenerator>,
    context: &ChatContext,
    history: &[ChatMessage],
    message: &str,
) -> ChatReply {
    let Some(generator) = generator else {
        return ChatReply {
            text: DEMO_REPLY.to_string(),
            source: Source::Mock,
        };
    };

    let system = chat_system_prompt(context);
    let prompt = chat_prompt(history, message);

    match generator.generate(Some(&system), &prompt) {
        Ok(text) => ChatReply {
            text: text.trim().to_string(),
            source: Source::Gemini,
        },
        Err(e) => {
            tracing::warn!(error = %e, "Gemini chat failed, replying with apology");
            ChatReply {
                text: APOLOGY_REPLY.to_string(),
                source: Source::Fallback,
            }
        }
    }
}
