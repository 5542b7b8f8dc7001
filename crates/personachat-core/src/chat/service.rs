//! Chat orchestration service.
//!
//! A chat turn resolves the persona, finds or opens the session for the
//! persona/user pair, assembles history, persists the user message, asks
//! the dispatcher for a reply and persists that too.

use std::sync::Arc;

use personachat_types::chat::{ChatSession, HistoryMessage, SendMessageResponse, StoredMessage};
use personachat_types::config::ChatConfig;
use personachat_types::error::{ChatError, RepositoryError};
use tracing::{debug, info};
use uuid::Uuid;

use super::history::assemble_conversation;
use super::repository::ChatRepository;
use super::validation::ValidatedChat;
use crate::llm::dispatcher::LlmDispatcher;
use crate::repository::persona::PersonaRepository;

/// Service for sending messages and managing chat history.
pub struct ChatService<P: PersonaRepository, C: ChatRepository> {
    personas: P,
    chats: C,
    dispatcher: Arc<LlmDispatcher>,
    config: ChatConfig,
}

impl<P: PersonaRepository, C: ChatRepository> ChatService<P, C> {
    pub fn new(personas: P, chats: C, dispatcher: Arc<LlmDispatcher>, config: ChatConfig) -> Self {
        Self {
            personas,
            chats,
            dispatcher,
            config,
        }
    }

    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    pub fn dispatcher(&self) -> &LlmDispatcher {
        &self.dispatcher
    }

    /// Run one chat turn and return the persisted assistant reply.
    pub async fn send_message(&self, chat: ValidatedChat) -> Result<SendMessageResponse, ChatError> {
        let persona = self
            .personas
            .get_by_id(&chat.persona_id)
            .await?
            .ok_or_else(|| ChatError::PersonaNotFound(chat.persona_id.clone()))?;

        let session = self
            .get_or_create_session(&persona.id, chat.user_id.as_deref())
            .await?;

        // Stored history is read before the new user message is written.
        let history = match chat.chat_history {
            Some(h) if !h.is_empty() => h,
            _ => self
                .chats
                .recent_messages(&session.id, self.config.max_history)
                .await?
                .iter()
                .map(HistoryMessage::from)
                .collect(),
        };
        let conversation = assemble_conversation(&history, &chat.message, self.config.max_history);

        let user_message = StoredMessage::user(session.id, &persona.id, &chat.message);
        self.chats.save_message(&user_message).await?;

        debug!(
            session_id = %session.id,
            persona_id = %persona.id,
            model = %chat.model,
            turns = conversation.len(),
            "Dispatching chat turn"
        );

        let reply = self
            .dispatcher
            .reply(&chat.model, &persona.system_prompt, conversation)
            .await?;

        let metadata = serde_json::json!({
            "provider": reply.provider.to_string(),
            "inputTokens": reply.response.usage.input_tokens,
            "outputTokens": reply.response.usage.output_tokens,
            "stopReason": reply.response.stop_reason.to_string(),
            "responseMs": reply.elapsed_ms,
        });
        let ai_message = StoredMessage::assistant(
            session.id,
            &persona.id,
            &reply.response.content,
            &chat.model,
            metadata,
        );
        self.chats.save_message(&ai_message).await?;
        self.chats.touch_session(&session.id).await?;

        info!(
            session_id = %session.id,
            persona_id = %persona.id,
            provider = %reply.provider,
            elapsed_ms = reply.elapsed_ms,
            "Chat turn completed"
        );

        Ok(SendMessageResponse {
            message: HistoryMessage::from(&ai_message),
            success: true,
            session_id: session.id,
        })
    }

    async fn get_or_create_session(
        &self,
        persona_id: &str,
        user_id: Option<&str>,
    ) -> Result<ChatSession, ChatError> {
        if let Some(session) = self.chats.find_latest_session(persona_id, user_id).await? {
            return Ok(session);
        }
        let session = self.chats.create_session(&ChatSession::new(persona_id, user_id)).await?;
        info!(session_id = %session.id, persona_id, "Opened chat session");
        Ok(session)
    }

    /// Messages of the most recent session for the pair, capped at `max_history`.
    pub async fn get_chat_history(
        &self,
        persona_id: &str,
        user_id: Option<&str>,
    ) -> Result<Vec<HistoryMessage>, ChatError> {
        let Some(session) = self.chats.find_latest_session(persona_id, user_id).await? else {
            return Ok(Vec::new());
        };
        let messages = self
            .chats
            .recent_messages(&session.id, self.config.max_history)
            .await?;
        Ok(messages.iter().map(HistoryMessage::from).collect())
    }

    /// Delete every session (and message) for the pair. Returns sessions removed.
    pub async fn clear_chat_history(
        &self,
        persona_id: &str,
        user_id: Option<&str>,
    ) -> Result<usize, ChatError> {
        let sessions = self.chats.list_sessions_by_persona(persona_id, user_id).await?;
        for session in &sessions {
            let removed = self.chats.delete_messages(&session.id).await?;
            match self.chats.delete_session(&session.id).await {
                Ok(()) | Err(RepositoryError::NotFound) => {}
                Err(e) => return Err(e.into()),
            }
            debug!(session_id = %session.id, messages = removed, "Cleared chat session");
        }
        info!(persona_id, sessions = sessions.len(), "Cleared chat history");
        Ok(sessions.len())
    }

    pub async fn list_user_sessions(&self, user_id: &str) -> Result<Vec<ChatSession>, ChatError> {
        Ok(self.chats.list_sessions_by_user(user_id).await?)
    }

    /// All messages of a session in chronological order.
    pub async fn get_session_messages(
        &self,
        session_id: &Uuid,
    ) -> Result<Vec<HistoryMessage>, ChatError> {
        if self.chats.get_session(session_id).await?.is_none() {
            return Err(ChatError::SessionNotFound(*session_id));
        }
        let messages = self.chats.recent_messages(session_id, usize::MAX).await?;
        Ok(messages.iter().map(HistoryMessage::from).collect())
    }

    pub async fn update_session_title(
        &self,
        session_id: &Uuid,
        title: &str,
    ) -> Result<ChatSession, ChatError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(ChatError::Validation("Title cannot be empty".to_string()));
        }
        self.chats
            .update_session_title(session_id, title)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => ChatError::SessionNotFound(*session_id),
                other => other.into(),
            })
    }

    pub async fn count_messages(&self, persona_id: &str) -> Result<u64, ChatError> {
        Ok(self.chats.count_messages_by_persona(persona_id).await?)
    }
}
