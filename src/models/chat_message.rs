//! Chat message model
//!
//! Stored assistant exchanges with the user context they were answered in.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use super::columns::{parse_json, to_json};
use super::User;
use crate::db::{DbError, DbResult};

/// User attributes the assistant was given
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatContext {
    #[serde(default)]
    pub dietary_preferences: Vec<String>,
    #[serde(default)]
    pub health_conditions: Vec<String>,
    #[serde(default)]
    pub goal: Option<String>,
    #[serde(default)]
    pub activity_level: Option<String>,
}

impl ChatContext {
    pub fn for_user(user: &User) -> Self {
        Self {
            dietary_preferences: user
                .dietary_preferences
                .iter()
                .map(|t| t.as_str().to_string())
                .collect(),
            health_conditions: user.health_conditions.clone(),
            goal: Some(user.goal.as_str().to_string()),
            activity_level: Some(user.activity_level.as_str().to_string()),
        }
    }
}

/// One question and answer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: i64,
    pub user_id: i64,
    pub message: String,
    pub response: String,
    pub context: ChatContext,
    pub created_at: String,
}

impl ChatMessage {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            message: row.get("message")?,
            response: row.get("response")?,
            context: parse_json(row, "context")?,
            created_at: row.get("created_at")?,
        })
    }

    /// Store an exchange
    pub fn create(
        conn: &Connection,
        user_id: i64,
        message: &str,
        response: &str,
        context: &ChatContext,
    ) -> DbResult<Self> {
        conn.execute(
            "INSERT INTO chat_messages (user_id, message, response, context) VALUES (?1, ?2, ?3, ?4)",
            params![user_id, message, response, to_json(context)?],
        )?;

        let id = conn.last_insert_rowid();
        let mut stmt = conn.prepare("SELECT * FROM chat_messages WHERE id = ?1")?;
        stmt.query_row([id], Self::from_row).map_err(DbError::from)
    }

    /// The most recent exchanges of a user, oldest first
    pub fn recent(conn: &Connection, user_id: i64, limit: i64) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT * FROM chat_messages WHERE user_id = ?1 ORDER BY created_at DESC, id DESC LIMIT ?2",
        )?;
        let mut messages = stmt
            .query_map(params![user_id, limit], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        messages.reverse();
        Ok(messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;

    fn setup() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        conn.execute(
            "INSERT INTO users (name, email, age, sex, height_cm, weight_kg) VALUES ('A', 'a@b.com', 30, 'Male', 180, 80)",
            [],
        )
        .unwrap();
        conn
    }

    #[test]
    fn test_recent_is_chronological_and_limited() {
        let conn = setup();
        let context = ChatContext {
            goal: Some("Lose Weight".to_string()),
            ..Default::default()
        };
        for i in 0..5 {
            ChatMessage::create(&conn, 1, &format!("q{}", i), &format!("a{}", i), &context).unwrap();
        }

        let recent = ChatMessage::recent(&conn, 1, 3).unwrap();
        let questions: Vec<_> = recent.iter().map(|m| m.message.as_str()).collect();
        assert_eq!(questions, vec!["q2", "q3", "q4"]);
        assert_eq!(recent[0].context, context);
    }
}
