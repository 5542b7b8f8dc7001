//! Chat repository trait definition.
//!
//! Covers both sessions and the messages inside them, since every message
//! operation is scoped to a session.

use personachat_types::chat::{ChatSession, StoredMessage};
use personachat_types::error::RepositoryError;
use uuid::Uuid;

/// Repository trait for chat session and message persistence.
///
/// `user_id = None` addresses the anonymous user; it never matches sessions
/// that belong to a named user.
pub trait ChatRepository: Send + Sync {
    fn create_session(
        &self,
        session: &ChatSession,
    ) -> impl std::future::Future<Output = Result<ChatSession, RepositoryError>> + Send;

    fn get_session(
        &self,
        session_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Option<ChatSession>, RepositoryError>> + Send;

    /// Most recently updated session for the persona/user pair.
    fn find_latest_session(
        &self,
        persona_id: &str,
        user_id: Option<&str>,
    ) -> impl std::future::Future<Output = Result<Option<ChatSession>, RepositoryError>> + Send;

    /// Sessions for the persona/user pair, most recently updated first.
    fn list_sessions_by_persona(
        &self,
        persona_id: &str,
        user_id: Option<&str>,
    ) -> impl std::future::Future<Output = Result<Vec<ChatSession>, RepositoryError>> + Send;

    /// Sessions belonging to a named user across all personas, most recent first.
    fn list_sessions_by_user(
        &self,
        user_id: &str,
    ) -> impl std::future::Future<Output = Result<Vec<ChatSession>, RepositoryError>> + Send;

    fn update_session_title(
        &self,
        session_id: &Uuid,
        title: &str,
    ) -> impl std::future::Future<Output = Result<ChatSession, RepositoryError>> + Send;

    /// Bump `updated_at` to now.
    fn touch_session(
        &self,
        session_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    fn delete_session(
        &self,
        session_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    fn save_message(
        &self,
        message: &StoredMessage,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// The last `limit` messages of a session in chronological order.
    fn recent_messages(
        &self,
        session_id: &Uuid,
        limit: usize,
    ) -> impl std::future::Future<Output = Result<Vec<StoredMessage>, RepositoryError>> + Send;

    /// Delete every message in a session. Returns the number removed.
    fn delete_messages(
        &self,
        session_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<u64, RepositoryError>> + Send;

    fn count_messages_by_persona(
        &self,
        persona_id: &str,
    ) -> impl std::future::Future<Output = Result<u64, RepositoryError>> + Send;
}
