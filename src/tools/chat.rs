//! Chat MCP Tools
//!
//! Nutrition assistant conversations, stored per user.

use serde::Serialize;

use crate::assistant::prompts::CHAT_HISTORY_TURNS;
use crate::assistant::{self, Source, TextGenerator};
use crate::db::Database;
use crate::models::{ChatContext, ChatMessage, User};

/// Exchanges returned by chat_history
pub const HISTORY_LIMIT: i64 = 50;

/// Longest accepted message in characters
pub const MESSAGE_MAX_CHARS: usize = 4000;

/// Response for chat
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
    pub source: Source,
    /// ID of the stored exchange, when a user was given
    pub message_id: Option<i64>,
}

/// Response for chat_history
#[derive(Debug, Serialize)]
pub struct ChatHistoryResponse {
    pub user_id: i64,
    pub messages: Vec<ChatMessage>,
    pub count: usize,
}

/// Answer a message, using and extending the user's history when given.
///
/// Blocks on the model call; async callers run this on a blocking thread.
/// Returns Ok(None) when the user does not exist.
pub fn chat(
    db: &Database,
    generator: Option<&dyn TextGenerator>,
    user_id: Option<i64>,
    message: &str,
) -> Result<Option<ChatResponse>, String> {
    let message = message.trim();
    if message.is_empty() {
        return Err("Message is required".to_string());
    }
    if message.chars().count() > MESSAGE_MAX_CHARS {
        return Err(format!("Message cannot be more than {} characters", MESSAGE_MAX_CHARS));
    }

    let (context, history) = match user_id {
        Some(id) => {
            let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
            let Some(user) = User::get_by_id(&conn, id).map_err(|e| format!("Failed to get user: {}", e))?
            else {
                return Ok(None);
            };
            let history = ChatMessage::recent(&conn, id, CHAT_HISTORY_TURNS as i64)
                .map_err(|e| format!("Failed to load chat history: {}", e))?;
            (ChatContext::for_user(&user), history)
        }
        None => (ChatContext::default(), Vec::new()),
    };

    // The connection is released while the model answers
    let reply = assistant::reply(generator, &context, &history, message);

    let message_id = match user_id {
        Some(id) => {
            let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
            let stored = ChatMessage::create(&conn, id, message, &reply.text, &context)
                .map_err(|e| format!("Failed to store chat message: {}", e))?;
            Some(stored.id)
        }
        None => None,
    };

    tracing::debug!(user_id = ?user_id, source = ?reply.source, "Answered chat message");
    Ok(Some(ChatResponse {
        response: reply.text,
        source: reply.source,
        message_id,
    }))
}

/// The last exchanges of a user, oldest first
pub fn chat_history(db: &Database, user_id: i64) -> Result<Option<ChatHistoryResponse>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let user = User::get_by_id(&conn, user_id).map_err(|e| format!("Failed to get user: {}", e))?;
    if user.is_none() {
        return Ok(None);
    }

    let messages = ChatMessage::recent(&conn, user_id, HISTORY_LIMIT)
        .map_err(|e| format!("Failed to load chat history: {}", e))?;

    Ok(Some(ChatHistoryResponse {
        user_id,
        count: messages.len(),
        messages,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assistant::chat::{APOLOGY_REPLY, DEMO_REPLY};
    use crate::assistant::AssistantError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Echoes the number of prompt lines, or fails when asked to
    struct Echo {
        calls: AtomicUsize,
        fail: bool,
    }

    impl TextGenerator for Echo {
        fn generate(&self, _system: Option<&str>, prompt: &str) -> Result<String, AssistantError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(AssistantError::EmptyResponse);
            }
            Ok(format!("lines: {}", prompt.lines().count()))
        }
    }

    fn setup() -> Database {
        let db = Database::in_memory().unwrap();
        let conn = db.get_conn().unwrap();
        conn.execute(
            "INSERT INTO users (name, email, age, sex, height_cm, weight_kg, health_conditions)
             VALUES ('A', 'a@b.com', 30, 'Female', 165, 60, '[\"diabetes\"]')",
            [],
        )
        .unwrap();
        drop(conn);
        db
    }

    #[test]
    fn test_rejects_empty_message() {
        let db = setup();
        assert!(chat(&db, None, Some(1), "   ").is_err());
    }

    #[test]
    fn test_demo_reply_is_stored() {
        let db = setup();
        let response = chat(&db, None, Some(1), "What should I eat?").unwrap().unwrap();
        assert_eq!(response.response, DEMO_REPLY);
        assert_eq!(response.source, Source::Mock);
        assert!(response.message_id.is_some());

        let history = chat_history(&db, 1).unwrap().unwrap();
        assert_eq!(history.count, 1);
        assert_eq!(history.messages[0].context.health_conditions, vec!["diabetes"]);
    }

    #[test]
    fn test_anonymous_chat_is_not_stored() {
        let db = setup();
        let echo = Echo {
            calls: AtomicUsize::new(0),
            fail: false,
        };
        let response = chat(&db, Some(&echo), None, "hi").unwrap().unwrap();
        assert_eq!(response.source, Source::Gemini);
        assert!(response.message_id.is_none());
        assert_eq!(chat_history(&db, 1).unwrap().unwrap().count, 0);
    }

    #[test]
    fn test_failure_stores_apology_and_history_grows() {
        let db = setup();
        let failing = Echo {
            calls: AtomicUsize::new(0),
            fail: true,
        };
        let response = chat(&db, Some(&failing), Some(1), "first").unwrap().unwrap();
        assert_eq!(response.response, APOLOGY_REPLY);
        assert_eq!(response.source, Source::Fallback);

        let echo = Echo {
            calls: AtomicUsize::new(0),
            fail: false,
        };
        let short = chat(&db, Some(&echo), Some(1), "second").unwrap().unwrap();
        let longer = chat(&db, Some(&echo), Some(1), "third").unwrap().unwrap();
        assert_ne!(short.response, longer.response);
        assert_eq!(echo.calls.load(Ordering::SeqCst), 2);

        let history = chat_history(&db, 1).unwrap().unwrap();
        let messages: Vec<&str> = history.messages.iter().map(|m| m.message.as_str()).collect();
        assert_eq!(messages, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_unknown_user() {
        let db = setup();
        assert!(chat(&db, None, Some(9), "hello").unwrap().is_none());
        assert!(chat_history(&db, 9).unwrap().is_none());
    }
}
