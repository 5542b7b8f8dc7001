//! SQLite chat repository implementation.
//!
//! Implements `ChatRepository` from `personachat-core` using sqlx with split
//! read/write pools: raw queries, private Row structs, reader pool for
//! SELECTs and writer pool for everything else.

use chrono::Utc;
use personachat_core::chat::repository::ChatRepository;
use personachat_types::chat::{ChatSession, StoredMessage};
use personachat_types::error::RepositoryError;
use sqlx::Row;
use uuid::Uuid;

use super::pool::DatabasePool;
use super::{format_datetime, parse_datetime};

/// SQLite-backed implementation of `ChatRepository`.
pub struct SqliteChatRepository {
    pool: DatabasePool,
}

impl SqliteChatRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

// ---------------------------------------------------------------------------
// Private Row types for SQLite-to-domain mapping
// ---------------------------------------------------------------------------

struct ChatSessionRow {
    id: String,
    persona_id: String,
    user_id: Option<String>,
    title: Option<String>,
    created_at: String,
    updated_at: String,
}

impl ChatSessionRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            persona_id: row.try_get("persona_id")?,
            user_id: row.try_get("user_id")?,
            title: row.try_get("title")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn into_session(self) -> Result<ChatSession, RepositoryError> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| RepositoryError::Query(format!("invalid session id: {e}")))?;

        Ok(ChatSession {
            id,
            persona_id: self.persona_id,
            user_id: self.user_id,
            title: self.title,
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
        })
    }
}

struct MessageRow {
    id: String,
    content: String,
    is_user: bool,
    session_id: String,
    persona_id: String,
    model: Option<String>,
    metadata: Option<String>,
    created_at: String,
}

impl MessageRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            content: row.try_get("content")?,
            is_user: row.try_get("is_user")?,
            session_id: row.try_get("session_id")?,
            persona_id: row.try_get("persona_id")?,
            model: row.try_get("model")?,
            metadata: row.try_get("metadata")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_message(self) -> Result<StoredMessage, RepositoryError> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| RepositoryError::Query(format!("invalid message id: {e}")))?;
        let session_id = Uuid::parse_str(&self.session_id)
            .map_err(|e| RepositoryError::Query(format!("invalid session_id: {e}")))?;
        let metadata = self
            .metadata
            .as_deref()
            .map(serde_json::from_str)
            .transpose()
            .map_err(|e| RepositoryError::Query(format!("invalid message metadata: {e}")))?;

        Ok(StoredMessage {
            id,
            content: self.content,
            is_user: self.is_user,
            session_id,
            persona_id: self.persona_id,
            model: self.model,
            metadata,
            created_at: parse_datetime(&self.created_at)?,
        })
    }
}

fn map_sessions(rows: &[sqlx::sqlite::SqliteRow]) -> Result<Vec<ChatSession>, RepositoryError> {
    rows.iter()
        .map(|row| {
            ChatSessionRow::from_row(row)
                .map_err(|e| RepositoryError::Query(e.to_string()))?
                .into_session()
        })
        .collect()
}

// ---------------------------------------------------------------------------
// ChatRepository implementation
// ---------------------------------------------------------------------------

impl ChatRepository for SqliteChatRepository {
    async fn create_session(&self, session: &ChatSession) -> Result<ChatSession, RepositoryError> {
        sqlx::query(
            r#"INSERT INTO chat_sessions (id, persona_id, user_id, title, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?)"#,
        )
        .bind(session.id.to_string())
        .bind(&session.persona_id)
        .bind(&session.user_id)
        .bind(&session.title)
        .bind(format_datetime(&session.created_at))
        .bind(format_datetime(&session.updated_at))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(session.clone())
    }

    async fn get_session(&self, session_id: &Uuid) -> Result<Option<ChatSession>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM chat_sessions WHERE id = ?")
            .bind(session_id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        match row {
            Some(row) => {
                let session_row = ChatSessionRow::from_row(&row)
                    .map_err(|e| RepositoryError::Query(e.to_string()))?;
                Ok(Some(session_row.into_session()?))
            }
            None => Ok(None),
        }
    }

    async fn find_latest_session(
        &self,
        persona_id: &str,
        user_id: Option<&str>,
    ) -> Result<Option<ChatSession>, RepositoryError> {
        // `IS` matches NULL against NULL, which `=` does not.
        let rows = sqlx::query(
            r#"SELECT * FROM chat_sessions
               WHERE persona_id = ? AND user_id IS ?
               ORDER BY updated_at DESC, id DESC
               LIMIT 1"#,
        )
        .bind(persona_id)
        .bind(user_id)
        .fetch_all(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(map_sessions(&rows)?.into_iter().next())
    }

    async fn list_sessions_by_persona(
        &self,
        persona_id: &str,
        user_id: Option<&str>,
    ) -> Result<Vec<ChatSession>, RepositoryError> {
        let rows = sqlx::query(
            r#"SELECT * FROM chat_sessions
               WHERE persona_id = ? AND user_id IS ?
               ORDER BY updated_at DESC, id DESC"#,
        )
        .bind(persona_id)
        .bind(user_id)
        .fetch_all(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        map_sessions(&rows)
    }

    async fn list_sessions_by_user(&self, user_id: &str) -> Result<Vec<ChatSession>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT * FROM chat_sessions WHERE user_id = ? ORDER BY updated_at DESC, id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        map_sessions(&rows)
    }

    async fn update_session_title(
        &self,
        session_id: &Uuid,
        title: &str,
    ) -> Result<ChatSession, RepositoryError> {
        let result = sqlx::query("UPDATE chat_sessions SET title = ?, updated_at = ? WHERE id = ?")
            .bind(title)
            .bind(format_datetime(&Utc::now()))
            .bind(session_id.to_string())
            .execute(&self.pool.writer)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        // Read back through the writer so the row reflects this update.
        let row = sqlx::query("SELECT * FROM chat_sessions WHERE id = ?")
            .bind(session_id.to_string())
            .fetch_one(&self.pool.writer)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        ChatSessionRow::from_row(&row)
            .map_err(|e| RepositoryError::Query(e.to_string()))?
            .into_session()
    }

    async fn touch_session(&self, session_id: &Uuid) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE chat_sessions SET updated_at = ? WHERE id = ?")
            .bind(format_datetime(&Utc::now()))
            .bind(session_id.to_string())
            .execute(&self.pool.writer)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn delete_session(&self, session_id: &Uuid) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM chat_sessions WHERE id = ?")
            .bind(session_id.to_string())
            .execute(&self.pool.writer)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn save_message(&self, message: &StoredMessage) -> Result<(), RepositoryError> {
        let metadata = message
            .metadata
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| RepositoryError::Query(format!("invalid message metadata: {e}")))?;

        sqlx::query(
            r#"INSERT INTO messages (id, content, is_user, session_id, persona_id, model, metadata, created_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(message.id.to_string())
        .bind(&message.content)
        .bind(message.is_user)
        .bind(message.session_id.to_string())
        .bind(&message.persona_id)
        .bind(&message.model)
        .bind(metadata)
        .bind(format_datetime(&message.created_at))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(())
    }

    async fn recent_messages(
        &self,
        session_id: &Uuid,
        limit: usize,
    ) -> Result<Vec<StoredMessage>, RepositoryError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = sqlx::query(
            r#"SELECT * FROM (
                   SELECT * FROM messages WHERE session_id = ?
                   ORDER BY created_at DESC, id DESC
                   LIMIT ?
               ) ORDER BY created_at ASC, id ASC"#,
        )
        .bind(session_id.to_string())
        .bind(limit)
        .fetch_all(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let mut messages = Vec::with_capacity(rows.len());
        for row in &rows {
            let msg_row =
                MessageRow::from_row(row).map_err(|e| RepositoryError::Query(e.to_string()))?;
            messages.push(msg_row.into_message()?);
        }

        Ok(messages)
    }

    async fn delete_messages(&self, session_id: &Uuid) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM messages WHERE session_id = ?")
            .bind(session_id.to_string())
            .execute(&self.pool.writer)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(result.rows_affected())
    }

    async fn count_messages_by_persona(&self, persona_id: &str) -> Result<u64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM messages WHERE persona_id = ?")
            .bind(persona_id)
            .fetch_one(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(count as u64)
    }
}
