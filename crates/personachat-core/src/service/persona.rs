//! Persona management service.
//!
//! Owns the rules around personas: built-in personas are seeded into an
//! empty store and can never be changed, custom personas are validated and
//! must have unique names.

use chrono::Utc;
use personachat_types::error::{PersonaError, RepositoryError};
use personachat_types::persona::{
    CreatePersonaRequest, DEFAULT_PERSONAS, Persona, UpdatePersonaRequest,
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::chat::validation::{validate_create_persona, validate_update_persona};
use crate::repository::persona::PersonaRepository;

fn storage(e: RepositoryError) -> PersonaError {
    PersonaError::Storage(e.to_string())
}

/// Service orchestrating the persona lifecycle.
pub struct PersonaService<P: PersonaRepository> {
    repo: P,
}

impl<P: PersonaRepository> PersonaService<P> {
    pub fn new(repo: P) -> Self {
        Self { repo }
    }

    /// All personas. Seeds the built-ins first if the store is empty.
    pub async fn list_personas(&self) -> Result<Vec<Persona>, PersonaError> {
        let personas = self.repo.list().await.map_err(storage)?;
        if !personas.is_empty() {
            return Ok(personas);
        }
        self.ensure_defaults().await?;
        self.repo.list().await.map_err(storage)
    }

    /// Insert any built-in persona that is missing. Returns how many were added.
    pub async fn ensure_defaults(&self) -> Result<usize, PersonaError> {
        let mut created = 0;
        let now = Utc::now();
        for default in DEFAULT_PERSONAS {
            if self.repo.get_by_id(default.id).await.map_err(storage)?.is_some() {
                continue;
            }
            match self.repo.create(&default.to_persona(now)).await {
                Ok(_) => {
                    info!(persona_id = default.id, name = default.name, "Created default persona");
                    created += 1;
                }
                // Another request seeded it first.
                Err(RepositoryError::Conflict(msg)) => {
                    warn!(persona_id = default.id, %msg, "Default persona already present");
                }
                Err(e) => return Err(storage(e)),
            }
        }
        Ok(created)
    }

    pub async fn get_persona(&self, id: &str) -> Result<Persona, PersonaError> {
        self.repo
            .get_by_id(id)
            .await
            .map_err(storage)?
            .ok_or_else(|| PersonaError::NotFound(id.to_string()))
    }

    pub async fn create_persona(&self, req: CreatePersonaRequest) -> Result<Persona, PersonaError> {
        let valid = validate_create_persona(&req).map_err(PersonaError::Validation)?;

        if self.repo.get_by_name(&valid.name).await.map_err(storage)?.is_some() {
            return Err(PersonaError::Conflict(valid.name));
        }

        let now = Utc::now();
        let persona = Persona {
            id: Uuid::now_v7().to_string(),
            name: valid.name,
            description: valid.description,
            system_prompt: valid.system_prompt,
            avatar_url: valid.avatar_url,
            is_custom: true,
            created_by_id: valid.created_by_id,
            created_at: now,
            updated_at: now,
        };

        let created = self.repo.create(&persona).await.map_err(|e| match e {
            RepositoryError::Conflict(_) => PersonaError::Conflict(persona.name.clone()),
            other => storage(other),
        })?;

        info!(persona_id = %created.id, name = %created.name, "Created custom persona");
        Ok(created)
    }

    pub async fn update_persona(
        &self,
        id: &str,
        req: UpdatePersonaRequest,
    ) -> Result<Persona, PersonaError> {
        let mut persona = self.get_persona(id).await?;
        if !persona.is_custom {
            return Err(PersonaError::DefaultImmutable("modify"));
        }
        validate_update_persona(&req).map_err(PersonaError::Validation)?;

        if let Some(name) = req.name.as_deref().map(str::trim) {
            if !name.eq_ignore_ascii_case(&persona.name) {
                let clash = self.repo.get_by_name(name).await.map_err(storage)?;
                if clash.is_some_and(|other| other.id != persona.id) {
                    return Err(PersonaError::Conflict(name.to_string()));
                }
            }
            persona.name = name.to_string();
        }
        if let Some(description) = req.description {
            persona.description = description.trim().to_string();
        }
        if let Some(system_prompt) = req.system_prompt {
            persona.system_prompt = system_prompt.trim().to_string();
        }
        if let Some(avatar_url) = req.avatar_url {
            let avatar_url = avatar_url.trim();
            persona.avatar_url = (!avatar_url.is_empty()).then(|| avatar_url.to_string());
        }
        persona.updated_at = Utc::now();

        let updated = self.repo.update(&persona).await.map_err(|e| match e {
            RepositoryError::NotFound => PersonaError::NotFound(id.to_string()),
            RepositoryError::Conflict(_) => PersonaError::Conflict(persona.name.clone()),
            other => storage(other),
        })?;

        info!(persona_id = %id, "Updated persona");
        Ok(updated)
    }

    pub async fn delete_persona(&self, id: &str) -> Result<(), PersonaError> {
        let persona = self.get_persona(id).await?;
        if !persona.is_custom {
            return Err(PersonaError::DefaultImmutable("delete"));
        }

        self.repo.delete(id).await.map_err(|e| match e {
            RepositoryError::NotFound => PersonaError::NotFound(id.to_string()),
            other => storage(other),
        })?;

        info!(persona_id = %id, "Deleted persona");
        Ok(())
    }

    pub async fn count(&self) -> Result<u64, PersonaError> {
        self.repo.count().await.map_err(storage)
    }
}
