//! Chat history CLI command.

use anyhow::Result;
use chrono::{DateTime, Utc};
use console::style;

use personachat_core::chat::validation::normalize_user_id;

use crate::state::AppState;

/// Print (or clear) the history of the latest session with a persona.
pub async fn history(
    state: &AppState,
    persona_id: &str,
    user: Option<&str>,
    clear: bool,
    json: bool,
) -> Result<()> {
    let user = normalize_user_id(user);

    // Fails early with a not-found error for unknown personas.
    let persona = state.persona_service.get_persona(persona_id).await?;

    if clear {
        let sessions = state.chat_service.clear_chat_history(&persona.id, user).await?;
        if json {
            println!(
                "{}",
                serde_json::json!({"cleared": true, "personaId": persona.id, "sessions": sessions})
            );
        } else {
            println!(
                "  {} Cleared {} session(s) with {}.",
                style("✓").green().bold(),
                sessions,
                style(&persona.name).cyan()
            );
        }
        return Ok(());
    }

    let messages = state.chat_service.get_chat_history(&persona.id, user).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&messages)?);
        return Ok(());
    }

    if messages.is_empty() {
        println!();
        println!(
            "  {} No history with {} yet.",
            style("i").blue().bold(),
            style(&persona.name).cyan()
        );
        println!();
        return Ok(());
    }

    println!();
    for msg in &messages {
        let when = DateTime::<Utc>::from_timestamp_millis(msg.timestamp)
            .map(|t| t.format("%H:%M").to_string())
            .unwrap_or_default();
        let speaker = if msg.is_user {
            style("You".to_string()).green().bold()
        } else {
            style(persona.name.clone()).cyan().bold()
        };
        println!("  {} {}", style(when).dim(), speaker);
        for line in msg.content.lines() {
            println!("    {line}");
        }
        println!();
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use personachat_core::chat::repository::ChatRepository;
    use personachat_core::llm::dispatcher::LlmDispatcher;
    use personachat_infra::sqlite::chat::SqliteChatRepository;
    use personachat_infra::sqlite::pool::DatabasePool;
    use personachat_types::chat::ChatSession;
    use personachat_types::config::AppConfig;

    #[tokio::test]
    async fn test_clear_trims_user() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}", dir.path().join("cli.db").display());
        let pool = DatabasePool::new(&url).await.unwrap();
        let state = AppState::from_parts(
            AppConfig::default(),
            dir.path().to_path_buf(),
            pool.clone(),
            LlmDispatcher::new(1000, None),
        );
        state.persona_service.ensure_defaults().await.unwrap();

        let chats = SqliteChatRepository::new(pool);
        chats
            .create_session(&ChatSession::new("yoda", Some("u1")))
            .await
            .unwrap();

        history(&state, "yoda", Some(" u1 "), true, true).await.unwrap();

        assert!(state.chat_service.list_user_sessions("u1").await.unwrap().is_empty());
    }
}
