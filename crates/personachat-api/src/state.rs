//! Application state wiring all services together.
//!
//! AppState holds the concrete service instances used by both CLI and REST API.
//! Services are generic over repository traits, but AppState pins them to the
//! SQLite implementations.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use personachat_core::chat::service::ChatService;
use personachat_core::llm::dispatcher::LlmDispatcher;
use personachat_core::ratelimit::FixedWindowRateLimiter;
use personachat_core::service::persona::PersonaService;
use personachat_infra::config::{load_config, resolve_data_dir, resolve_database_url};
use personachat_infra::llm::{ProviderKeys, build_dispatcher};
use personachat_infra::sqlite::chat::SqliteChatRepository;
use personachat_infra::sqlite::persona::SqlitePersonaRepository;
use personachat_infra::sqlite::pool::DatabasePool;
use personachat_types::config::AppConfig;

/// Concrete type aliases for the service generics pinned to infra implementations.
pub type ConcretePersonaService = PersonaService<SqlitePersonaRepository>;

pub type ConcreteChatService = ChatService<SqlitePersonaRepository, SqliteChatRepository>;

/// Shared application state holding all services.
///
/// Used by both CLI commands and REST API handlers.
#[derive(Clone)]
pub struct AppState {
    pub persona_service: Arc<ConcretePersonaService>,
    pub chat_service: Arc<ConcreteChatService>,
    pub rate_limiter: FixedWindowRateLimiter,
    pub config: Arc<AppConfig>,
    pub data_dir: PathBuf,
    pub db_pool: DatabasePool,
    pub started_at: Instant,
}

impl AppState {
    /// Initialize the application state: load config, connect to DB, wire services.
    pub async fn init(config_path: Option<&Path>) -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();

        // Ensure data directory exists
        tokio::fs::create_dir_all(&data_dir).await?;

        let config = load_config(config_path, &data_dir).await;

        let db_url = resolve_database_url(&config, &data_dir);
        let db_pool = DatabasePool::new(&db_url).await?;
        tracing::debug!(url = %db_url, "Database ready");

        let keys = ProviderKeys::from_env();
        let dispatcher = build_dispatcher(&config.llm, &keys);

        let state = Self::from_parts(config, data_dir, db_pool, dispatcher);

        let seeded = state.persona_service.ensure_defaults().await?;
        if seeded > 0 {
            tracing::info!(count = seeded, "Seeded default personas");
        }

        Ok(state)
    }

    /// Wire services over an already-open pool.
    pub fn from_parts(
        config: AppConfig,
        data_dir: PathBuf,
        db_pool: DatabasePool,
        dispatcher: LlmDispatcher,
    ) -> Self {
        let persona_service = PersonaService::new(SqlitePersonaRepository::new(db_pool.clone()));

        let chat_service = ChatService::new(
            SqlitePersonaRepository::new(db_pool.clone()),
            SqliteChatRepository::new(db_pool.clone()),
            Arc::new(dispatcher),
            config.chat.clone(),
        );

        let rate_limiter = FixedWindowRateLimiter::from_config(&config.rate_limit);

        Self {
            persona_service: Arc::new(persona_service),
            chat_service: Arc::new(chat_service),
            rate_limiter,
            config: Arc::new(config),
            data_dir,
            db_pool,
            started_at: Instant::now(),
        }
    }

    /// Whether internal error detail may be sent to clients.
    pub fn expose_errors(&self) -> bool {
        self.config.environment.is_development()
    }
}
