//! SQLite persona repository implementation.

use personachat_core::repository::persona::PersonaRepository;
use personachat_types::error::RepositoryError;
use personachat_types::persona::Persona;
use sqlx::Row;

use super::pool::DatabasePool;
use super::{format_datetime, parse_datetime};

/// SQLite-backed implementation of `PersonaRepository`.
pub struct SqlitePersonaRepository {
    pool: DatabasePool,
}

impl SqlitePersonaRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

/// Internal row type for mapping SQLite rows to domain Persona.
struct PersonaRow {
    id: String,
    name: String,
    description: String,
    system_prompt: String,
    avatar_url: Option<String>,
    is_custom: bool,
    created_by_id: Option<String>,
    created_at: String,
    updated_at: String,
}

impl PersonaRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            system_prompt: row.try_get("system_prompt")?,
            avatar_url: row.try_get("avatar_url")?,
            is_custom: row.try_get("is_custom")?,
            created_by_id: row.try_get("created_by_id")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn into_persona(self) -> Result<Persona, RepositoryError> {
        Ok(Persona {
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
            id: self.id,
            name: self.name,
            description: self.description,
            system_prompt: self.system_prompt,
            avatar_url: self.avatar_url,
            is_custom: self.is_custom,
            created_by_id: self.created_by_id,
        })
    }
}

fn map_row(row: &sqlx::sqlite::SqliteRow) -> Result<Persona, RepositoryError> {
    PersonaRow::from_row(row)
        .map_err(|e| RepositoryError::Query(e.to_string()))?
        .into_persona()
}

fn map_write_error(e: sqlx::Error, persona: &Persona) -> RepositoryError {
    match e {
        sqlx::Error::Database(db_err) if db_err.message().contains("UNIQUE") => {
            RepositoryError::Conflict(format!("persona '{}' already exists", persona.name))
        }
        other => RepositoryError::Query(other.to_string()),
    }
}

impl PersonaRepository for SqlitePersonaRepository {
    async fn list(&self) -> Result<Vec<Persona>, RepositoryError> {
        let rows = sqlx::query("SELECT * FROM personas ORDER BY is_custom ASC, created_at ASC, id ASC")
            .fetch_all(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        rows.iter().map(map_row).collect()
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Persona>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM personas WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        row.as_ref().map(map_row).transpose()
    }

    async fn get_by_name(&self, name: &str) -> Result<Option<Persona>, RepositoryError> {
        // `name` is declared COLLATE NOCASE, so equality is case-insensitive.
        let row = sqlx::query("SELECT * FROM personas WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        row.as_ref().map(map_row).transpose()
    }

    async fn create(&self, persona: &Persona) -> Result<Persona, RepositoryError> {
        sqlx::query(
            r#"INSERT INTO personas (id, name, description, system_prompt, avatar_url, is_custom, created_by_id, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(&persona.id)
        .bind(&persona.name)
        .bind(&persona.description)
        .bind(&persona.system_prompt)
        .bind(&persona.avatar_url)
        .bind(persona.is_custom)
        .bind(&persona.created_by_id)
        .bind(format_datetime(&persona.created_at))
        .bind(format_datetime(&persona.updated_at))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| map_write_error(e, persona))?;

        Ok(persona.clone())
    }

    async fn update(&self, persona: &Persona) -> Result<Persona, RepositoryError> {
        let result = sqlx::query(
            r#"UPDATE personas
               SET name = ?, description = ?, system_prompt = ?, avatar_url = ?, updated_at = ?
               WHERE id = ?"#,
        )
        .bind(&persona.name)
        .bind(&persona.description)
        .bind(&persona.system_prompt)
        .bind(&persona.avatar_url)
        .bind(format_datetime(&persona.updated_at))
        .bind(&persona.id)
        .execute(&self.pool.writer)
        .await
        .map_err(|e| map_write_error(e, persona))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(persona.clone())
    }

    async fn delete(&self, id: &str) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM personas WHERE id = ?")
            .bind(id)
            .execute(&self.pool.writer)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn count(&self) -> Result<u64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM personas")
            .fetch_one(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(count as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use personachat_types::persona::DEFAULT_PERSONAS;

    async fn test_pool() -> DatabasePool {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let url = format!("sqlite://{}?mode=rwc", db_path.display());
        // Leak tempdir so it lives for the test
        std::mem::forget(dir);
        DatabasePool::new(&url).await.unwrap()
    }

    fn custom(name: &str) -> Persona {
        let now = Utc::now();
        Persona {
            id: uuid::Uuid::now_v7().to_string(),
            name: name.to_string(),
            description: format!("{name} description"),
            system_prompt: format!("You are {name}."),
            avatar_url: None,
            is_custom: true,
            created_by_id: Some("user-1".to_string()),
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let repo = SqlitePersonaRepository::new(test_pool().await);
        let persona = custom("Pirate");
        repo.create(&persona).await.unwrap();

        let found = repo.get_by_id(&persona.id).await.unwrap().unwrap();
        assert_eq!(found.name, "Pirate");
        assert!(found.is_custom);
        assert_eq!(found.created_by_id.as_deref(), Some("user-1"));
        assert_eq!(
            found.created_at.timestamp_micros(),
            persona.created_at.timestamp_micros()
        );

        assert!(repo.get_by_id("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_get_by_name_case_insensitive() {
        let repo = SqlitePersonaRepository::new(test_pool().await);
        repo.create(&custom("Pirate")).await.unwrap();
        assert!(repo.get_by_name("pIrAtE").await.unwrap().is_some());
        assert!(repo.get_by_name("Ninja").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_name_conflict() {
        let repo = SqlitePersonaRepository::new(test_pool().await);
        repo.create(&custom("Pirate")).await.unwrap();
        let err = repo.create(&custom("PIRATE")).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_list_orders_defaults_first() {
        let repo = SqlitePersonaRepository::new(test_pool().await);
        let mut early_custom = custom("Early");
        early_custom.created_at = Utc::now() - Duration::days(1);
        repo.create(&early_custom).await.unwrap();
        for d in DEFAULT_PERSONAS {
            repo.create(&d.to_persona(Utc::now())).await.unwrap();
        }

        let all = repo.list().await.unwrap();
        assert_eq!(all.len(), 4);
        assert!(all[..3].iter().all(|p| !p.is_custom));
        assert_eq!(all[3].name, "Early");
        assert_eq!(repo.count().await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let repo = SqlitePersonaRepository::new(test_pool().await);
        let mut persona = custom("Pirate");
        repo.create(&persona).await.unwrap();

        persona.description = "Sails the seven seas".to_string();
        persona.avatar_url = Some("/personas/pirate.png".to_string());
        repo.update(&persona).await.unwrap();

        let found = repo.get_by_id(&persona.id).await.unwrap().unwrap();
        assert_eq!(found.description, "Sails the seven seas");
        assert_eq!(found.avatar_url.as_deref(), Some("/personas/pirate.png"));

        repo.delete(&persona.id).await.unwrap();
        assert!(matches!(
            repo.delete(&persona.id).await.unwrap_err(),
            RepositoryError::NotFound
        ));
        assert!(matches!(
            repo.update(&persona).await.unwrap_err(),
            RepositoryError::NotFound
        ));
    }
}
