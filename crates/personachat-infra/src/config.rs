//! Configuration loader.
//!
//! Reads `config.toml` (an explicit path, or `{data_dir}/config.toml`),
//! falls back to defaults when the file is missing or malformed, then layers
//! environment variables on top.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use personachat_types::config::{AppConfig, ChatConfig, Environment};
use personachat_types::llm::is_supported_model;

use crate::sqlite::pool::default_database_url;

/// Resolve the data directory.
///
/// Priority:
/// 1. `PERSONACHAT_DATA_DIR` environment variable
/// 2. `~/.personachat`
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("PERSONACHAT_DATA_DIR") {
        return PathBuf::from(dir);
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".personachat");
    }

    PathBuf::from(".personachat")
}

/// Load configuration from TOML and the process environment.
pub async fn load_config(path: Option<&Path>, data_dir: &Path) -> AppConfig {
    let config_path = path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| data_dir.join("config.toml"));

    let mut config = read_config_file(&config_path).await;
    apply_env_overrides(&mut config, |name| std::env::var(name).ok());
    config
}

async fn read_config_file(config_path: &Path) -> AppConfig {
    let content = match tokio::fs::read_to_string(config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config file at {}, using defaults", config_path.display());
            return AppConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return AppConfig::default();
        }
    };

    match toml::from_str::<AppConfig>(&content) {
        Ok(mut config) => {
            if !is_supported_model(&config.chat.default_model) {
                tracing::warn!(
                    model = %config.chat.default_model,
                    "Unsupported chat.default_model in {}, using the built-in default",
                    config_path.display()
                );
                config.chat.default_model = ChatConfig::default().default_model;
            }
            config
        }
        Err(err) => {
            tracing::warn!("Failed to parse {}: {err}, using defaults", config_path.display());
            AppConfig::default()
        }
    }
}

/// Parse `name` from the environment into `target`. Unparseable values are
/// logged and ignored.
fn override_from<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, name: &str, target: &mut T)
where
    T::Err: std::fmt::Display,
{
    let Some(raw) = lookup(name) else {
        return;
    };
    let raw = raw.trim();
    if raw.is_empty() {
        return;
    }
    match raw.parse::<T>() {
        Ok(value) => *target = value,
        Err(err) => tracing::warn!(var = name, value = raw, "Ignoring invalid environment override: {err}"),
    }
}

/// Apply environment variable overrides on top of file configuration.
pub fn apply_env_overrides(config: &mut AppConfig, lookup: impl Fn(&str) -> Option<String>) {
    override_from::<Environment>(&lookup, "APP_ENV", &mut config.environment);
    override_from(&lookup, "HOST", &mut config.server.host);
    override_from(&lookup, "PORT", &mut config.server.port);

    if let Some(url) = lookup("DATABASE_URL").filter(|u| !u.trim().is_empty()) {
        config.database.url = Some(url.trim().to_string());
    }

    if let Some(model) = lookup("DEFAULT_MODEL").map(|m| m.trim().to_string()) {
        if is_supported_model(&model) {
            config.chat.default_model = model;
        } else if !model.is_empty() {
            tracing::warn!(var = "DEFAULT_MODEL", value = %model, "Ignoring unsupported model");
        }
    }
    override_from(&lookup, "MAX_MESSAGE_LENGTH", &mut config.chat.max_message_length);
    override_from(&lookup, "MAX_CHAT_HISTORY", &mut config.chat.max_history);

    override_from(&lookup, "RATE_LIMIT_MAX_REQUESTS", &mut config.rate_limit.max_requests);
    override_from(&lookup, "RATE_LIMIT_WINDOW_MS", &mut config.rate_limit.window_ms);
    override_from(&lookup, "RATE_LIMIT_TRUST_PROXY", &mut config.rate_limit.trust_proxy_headers);

    override_from(&lookup, "LLM_TIMEOUT_SECS", &mut config.llm.timeout_secs);
    override_from(&lookup, "LLM_MAX_TOKENS", &mut config.llm.max_tokens);
    override_from(&lookup, "LLM_TEMPERATURE", &mut config.llm.temperature);
}

/// The configured database URL, or `{data_dir}/personachat.db`.
pub fn resolve_database_url(config: &AppConfig, data_dir: &Path) -> String {
    config
        .database
        .url
        .clone()
        .unwrap_or_else(|| default_database_url(data_dir))
}
