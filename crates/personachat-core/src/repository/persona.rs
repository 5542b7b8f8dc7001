//! Persona repository trait definition.

use personachat_types::error::RepositoryError;
use personachat_types::persona::Persona;

/// Repository trait for persona persistence.
///
/// Implementations live in personachat-infra (e.g., SqlitePersonaRepository).
/// Uses native async fn in traits (Rust 2024 edition, no async_trait macro).
pub trait PersonaRepository: Send + Sync {
    /// All personas, defaults first, then by creation time.
    fn list(&self) -> impl std::future::Future<Output = Result<Vec<Persona>, RepositoryError>> + Send;

    fn get_by_id(
        &self,
        id: &str,
    ) -> impl std::future::Future<Output = Result<Option<Persona>, RepositoryError>> + Send;

    /// Case-insensitive lookup by display name.
    fn get_by_name(
        &self,
        name: &str,
    ) -> impl std::future::Future<Output = Result<Option<Persona>, RepositoryError>> + Send;

    /// Insert a persona. A duplicate id or name yields `RepositoryError::Conflict`.
    fn create(
        &self,
        persona: &Persona,
    ) -> impl std::future::Future<Output = Result<Persona, RepositoryError>> + Send;

    /// Overwrite the mutable fields of an existing persona.
    fn update(
        &self,
        persona: &Persona,
    ) -> impl std::future::Future<Output = Result<Persona, RepositoryError>> + Send;

    /// Delete a persona. Its sessions and messages cascade.
    fn delete(&self, id: &str) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    fn count(&self) -> impl std::future::Future<Output = Result<u64, RepositoryError>> + Send;
}
