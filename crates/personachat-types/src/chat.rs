//! Chat session and message types.
//!
//! Sessions group the messages exchanged with one persona (optionally scoped
//! to a user). `HistoryMessage` is the compact shape the browser client sends
//! and receives.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A persistent conversation thread with a persona.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSession {
    pub id: Uuid,
    pub persona_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ChatSession {
    /// Start a new session for the persona/user pair.
    pub fn new(persona_id: &str, user_id: Option<&str>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            persona_id: persona_id.to_string(),
            user_id: user_id.map(str::to_string),
            title: Some(format!("Chat with {persona_id}")),
            created_at: now,
            updated_at: now,
        }
    }
}

/// A message as persisted in the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredMessage {
    pub id: Uuid,
    pub content: String,
    pub is_user: bool,
    pub session_id: Uuid,
    pub persona_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl StoredMessage {
    pub fn user(session_id: Uuid, persona_id: &str, content: &str) -> Self {
        Self {
            id: Uuid::now_v7(),
            content: content.to_string(),
            is_user: true,
            session_id,
            persona_id: persona_id.to_string(),
            model: None,
            metadata: None,
            created_at: Utc::now(),
        }
    }

    pub fn assistant(
        session_id: Uuid,
        persona_id: &str,
        content: &str,
        model: &str,
        metadata: serde_json::Value,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            content: content.to_string(),
            is_user: false,
            session_id,
            persona_id: persona_id.to_string(),
            model: Some(model.to_string()),
            metadata: Some(metadata),
            created_at: Utc::now(),
        }
    }
}

/// Client-facing message shape. `timestamp` is epoch milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryMessage {
    pub id: String,
    pub content: String,
    pub is_user: bool,
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persona_id: Option<String>,
}

impl From<&StoredMessage> for HistoryMessage {
    fn from(msg: &StoredMessage) -> Self {
        Self {
            id: msg.id.to_string(),
            content: msg.content.clone(),
            is_user: msg.is_user,
            timestamp: msg.created_at.timestamp_millis(),
            persona_id: Some(msg.persona_id.clone()),
        }
    }
}

/// Body of `POST /chat`.
///
/// `message` and `personaId` are optional at the wire level so that missing
/// values are reported with the same messages as blank ones.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub persona_id: Option<String>,
    #[serde(default)]
    pub chat_history: Option<Vec<HistoryMessage>>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}

/// Payload returned by `POST /chat`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageResponse {
    pub message: HistoryMessage,
    pub success: bool,
    pub session_id: Uuid,
}

/// Body of `PUT /chat/sessions/{id}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateSessionRequest {
    #[serde(default)]
    pub title: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_title() {
        let session = ChatSession::new("yoda", None);
        assert_eq!(session.title.as_deref(), Some("Chat with yoda"));
        assert!(session.user_id.is_none());
        assert_eq!(session.created_at, session.updated_at);
    }

    #[test]
    fn test_history_message_from_stored() {
        let session_id = Uuid::now_v7();
        let stored = StoredMessage::user(session_id, "yoda", "Hello there");
        let history = HistoryMessage::from(&stored);
        assert_eq!(history.id, stored.id.to_string());
        assert!(history.is_user);
        assert_eq!(history.timestamp, stored.created_at.timestamp_millis());
        assert_eq!(history.persona_id.as_deref(), Some("yoda"));
    }

    #[test]
    fn test_send_request_deserializes_client_payload() {
        let json = r#"{
            "message": "Hi",
            "personaId": "grandma",
            "chatHistory": [
                {"id": "1", "content": "Earlier", "isUser": true, "timestamp": 1700000000000}
            ],
            "model": "gpt-4o-mini"
        }"#;
        let req: SendMessageRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.persona_id.as_deref(), Some("grandma"));
        let history = req.chat_history.unwrap();
        assert_eq!(history.len(), 1);
        assert!(history[0].persona_id.is_none());
        assert!(req.user_id.is_none());
    }

    #[test]
    fn test_assistant_message_carries_model() {
        let msg = StoredMessage::assistant(
            Uuid::now_v7(),
            "yoda",
            "Hmm.",
            "gpt-4o",
            serde_json::json!({"provider": "openai"}),
        );
        assert!(!msg.is_user);
        assert_eq!(msg.model.as_deref(), Some("gpt-4o"));
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["metadata"]["provider"], "openai");
        assert_eq!(json["isUser"], false);
    }
}
