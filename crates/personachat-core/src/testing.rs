//! In-memory repositories and a scripted LLM provider for unit tests.

use std::sync::{Arc, Mutex};

use chrono::Utc;
use personachat_types::chat::{ChatSession, StoredMessage};
use personachat_types::error::RepositoryError;
use personachat_types::llm::{
    CompletionRequest, CompletionResponse, LlmError, StopReason, Usage,
};
use personachat_types::persona::Persona;
use uuid::Uuid;

use crate::chat::repository::ChatRepository;
use crate::llm::provider::LlmProvider;
use crate::repository::persona::PersonaRepository;

#[derive(Clone, Default)]
pub struct MemoryPersonaRepository {
    personas: Arc<Mutex<Vec<Persona>>>,
}

impl MemoryPersonaRepository {
    pub fn insert(&self, persona: Persona) {
        self.personas.lock().unwrap().push(persona);
    }
}

impl PersonaRepository for MemoryPersonaRepository {
    async fn list(&self) -> Result<Vec<Persona>, RepositoryError> {
        let mut all = self.personas.lock().unwrap().clone();
        all.sort_by(|a, b| (a.is_custom, a.created_at).cmp(&(b.is_custom, b.created_at)));
        Ok(all)
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Persona>, RepositoryError> {
        Ok(self.personas.lock().unwrap().iter().find(|p| p.id == id).cloned())
    }

    async fn get_by_name(&self, name: &str) -> Result<Option<Persona>, RepositoryError> {
        Ok(self
            .personas
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
            .cloned())
    }

    async fn create(&self, persona: &Persona) -> Result<Persona, RepositoryError> {
        let mut all = self.personas.lock().unwrap();
        if all
            .iter()
            .any(|p| p.id == persona.id || p.name.eq_ignore_ascii_case(&persona.name))
        {
            return Err(RepositoryError::Conflict(persona.name.clone()));
        }
        all.push(persona.clone());
        Ok(persona.clone())
    }

    async fn update(&self, persona: &Persona) -> Result<Persona, RepositoryError> {
        let mut all = self.personas.lock().unwrap();
        let slot = all
            .iter_mut()
            .find(|p| p.id == persona.id)
            .ok_or(RepositoryError::NotFound)?;
        *slot = persona.clone();
        Ok(persona.clone())
    }

    async fn delete(&self, id: &str) -> Result<(), RepositoryError> {
        let mut all = self.personas.lock().unwrap();
        let before = all.len();
        all.retain(|p| p.id != id);
        if all.len() == before {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn count(&self) -> Result<u64, RepositoryError> {
        Ok(self.personas.lock().unwrap().len() as u64)
    }
}

#[derive(Default)]
struct ChatState {
    sessions: Vec<ChatSession>,
    messages: Vec<StoredMessage>,
}

#[derive(Clone, Default)]
pub struct MemoryChatRepository {
    state: Arc<Mutex<ChatState>>,
}

fn newest_first(sessions: &mut [ChatSession]) {
    sessions.sort_by(|a, b| (b.updated_at, b.id).cmp(&(a.updated_at, a.id)));
}

impl ChatRepository for MemoryChatRepository {
    async fn create_session(&self, session: &ChatSession) -> Result<ChatSession, RepositoryError> {
        self.state.lock().unwrap().sessions.push(session.clone());
        Ok(session.clone())
    }

    async fn get_session(&self, session_id: &Uuid) -> Result<Option<ChatSession>, RepositoryError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .sessions
            .iter()
            .find(|s| s.id == *session_id)
            .cloned())
    }

    async fn find_latest_session(
        &self,
        persona_id: &str,
        user_id: Option<&str>,
    ) -> Result<Option<ChatSession>, RepositoryError> {
        Ok(self
            .list_sessions_by_persona(persona_id, user_id)
            .await?
            .into_iter()
            .next())
    }

    async fn list_sessions_by_persona(
        &self,
        persona_id: &str,
        user_id: Option<&str>,
    ) -> Result<Vec<ChatSession>, RepositoryError> {
        let mut found: Vec<_> = self
            .state
            .lock()
            .unwrap()
            .sessions
            .iter()
            .filter(|s| s.persona_id == persona_id && s.user_id.as_deref() == user_id)
            .cloned()
            .collect();
        newest_first(&mut found);
        Ok(found)
    }

    async fn list_sessions_by_user(&self, user_id: &str) -> Result<Vec<ChatSession>, RepositoryError> {
        let mut found: Vec<_> = self
            .state
            .lock()
            .unwrap()
            .sessions
            .iter()
            .filter(|s| s.user_id.as_deref() == Some(user_id))
            .cloned()
            .collect();
        newest_first(&mut found);
        Ok(found)
    }

    async fn update_session_title(
        &self,
        session_id: &Uuid,
        title: &str,
    ) -> Result<ChatSession, RepositoryError> {
        let mut state = self.state.lock().unwrap();
        let session = state
            .sessions
            .iter_mut()
            .find(|s| s.id == *session_id)
            .ok_or(RepositoryError::NotFound)?;
        session.title = Some(title.to_string());
        session.updated_at = Utc::now();
        Ok(session.clone())
    }

    async fn touch_session(&self, session_id: &Uuid) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().unwrap();
        let session = state
            .sessions
            .iter_mut()
            .find(|s| s.id == *session_id)
            .ok_or(RepositoryError::NotFound)?;
        session.updated_at = Utc::now();
        Ok(())
    }

    async fn delete_session(&self, session_id: &Uuid) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().unwrap();
        let before = state.sessions.len();
        state.sessions.retain(|s| s.id != *session_id);
        if state.sessions.len() == before {
            return Err(RepositoryError::NotFound);
        }
        state.messages.retain(|m| m.session_id != *session_id);
        Ok(())
    }

    async fn save_message(&self, message: &StoredMessage) -> Result<(), RepositoryError> {
        self.state.lock().unwrap().messages.push(message.clone());
        Ok(())
    }

    async fn recent_messages(
        &self,
        session_id: &Uuid,
        limit: usize,
    ) -> Result<Vec<StoredMessage>, RepositoryError> {
        let mut found: Vec<_> = self
            .state
            .lock()
            .unwrap()
            .messages
            .iter()
            .filter(|m| m.session_id == *session_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| (a.created_at, a.id).cmp(&(b.created_at, b.id)));
        let start = found.len().saturating_sub(limit);
        Ok(found.split_off(start))
    }

    async fn delete_messages(&self, session_id: &Uuid) -> Result<u64, RepositoryError> {
        let mut state = self.state.lock().unwrap();
        let before = state.messages.len();
        state.messages.retain(|m| m.session_id != *session_id);
        Ok((before - state.messages.len()) as u64)
    }

    async fn count_messages_by_persona(&self, persona_id: &str) -> Result<u64, RepositoryError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .messages
            .iter()
            .filter(|m| m.persona_id == persona_id)
            .count() as u64)
    }
}

/// Provider that always answers with fixed text and records the last request.
#[derive(Clone)]
pub struct StubProvider {
    name: String,
    reply: String,
    last_request: Arc<Mutex<Option<CompletionRequest>>>,
}

impl StubProvider {
    pub fn replying(name: &str, reply: &str) -> Self {
        Self {
            name: name.to_string(),
            reply: reply.to_string(),
            last_request: Arc::new(Mutex::new(None)),
        }
    }

    pub fn last_request(&self) -> Option<CompletionRequest> {
        self.last_request.lock().unwrap().clone()
    }
}

impl LlmProvider for StubProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        *self.last_request.lock().unwrap() = Some(request.clone());
        Ok(CompletionResponse {
            id: format!("resp-{}", self.name),
            content: self.reply.clone(),
            model: request.model.clone(),
            stop_reason: StopReason::EndTurn,
            usage: Usage {
                input_tokens: 12,
                output_tokens: 7,
            },
        })
    }
}
