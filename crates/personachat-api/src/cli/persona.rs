//! Persona CLI commands: list, show, create, delete.

use anyhow::Result;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use dialoguer::Confirm;

use personachat_types::persona::CreatePersonaRequest;

use super::format_relative_time;
use crate::state::AppState;

/// List all personas in a table.
pub async fn list_personas(state: &AppState, json: bool) -> Result<()> {
    let personas = state.persona_service.list_personas().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&personas)?);
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("ID").fg(Color::White),
        Cell::new("Name").fg(Color::White),
        Cell::new("Kind").fg(Color::White),
        Cell::new("Description").fg(Color::White),
        Cell::new("Updated").fg(Color::White),
    ]);

    for persona in &personas {
        let kind = if persona.is_custom {
            Cell::new("custom").fg(Color::Cyan)
        } else {
            Cell::new("built-in").fg(Color::DarkGrey)
        };
        table.add_row(vec![
            Cell::new(&persona.id),
            Cell::new(&persona.name),
            kind,
            Cell::new(&persona.description),
            Cell::new(format_relative_time(&persona.updated_at)),
        ]);
    }

    println!();
    println!("{table}");
    println!();
    println!(
        "  {} persona(s). Create one with: {}",
        personas.len(),
        style("pchat personas create --name ...").yellow()
    );
    println!();

    Ok(())
}

/// Show one persona with its full system prompt.
pub async fn show_persona(state: &AppState, id: &str, json: bool) -> Result<()> {
    let persona = state.persona_service.get_persona(id).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&persona)?);
        return Ok(());
    }

    let messages = state.chat_service.count_messages(&persona.id).await?;

    println!();
    println!("  {}", style(&persona.name).cyan().bold());
    println!("  {}", style(&persona.description).dim());
    println!();
    println!("  {}  {}", style("ID:").bold(), persona.id);
    println!(
        "  {}  {}",
        style("Kind:").bold(),
        if persona.is_custom { "custom" } else { "built-in" }
    );
    if let Some(avatar) = &persona.avatar_url {
        println!("  {}  {}", style("Avatar:").bold(), avatar);
    }
    println!("  {}  {}", style("Messages:").bold(), messages);
    println!(
        "  {}  {}",
        style("Created:").bold(),
        persona.created_at.format("%Y-%m-%d %H:%M UTC")
    );
    println!();
    println!("  {}", style("System prompt").bold());
    for line in textwrap(&persona.system_prompt, 76) {
        println!("    {line}");
    }
    println!();

    Ok(())
}

/// Create a custom persona from flags.
pub async fn create_persona(
    state: &AppState,
    request: CreatePersonaRequest,
    json: bool,
) -> Result<()> {
    let persona = state.persona_service.create_persona(request).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&persona)?);
        return Ok(());
    }

    println!();
    println!("  {} Persona created!", style("✓").green().bold());
    println!();
    println!("  {}  {}", style("Name:").bold(), style(&persona.name).cyan());
    println!("  {}  {}", style("ID:").bold(), style(&persona.id).dim());
    println!();
    println!(
        "  Chat with it: {}",
        style(format!(
            "POST /api/chat {{\"personaId\": \"{}\", \"message\": \"...\"}}",
            persona.id
        ))
        .yellow()
    );
    println!();

    Ok(())
}

/// Delete a custom persona after confirmation.
pub async fn delete_persona(state: &AppState, id: &str, force: bool, json: bool) -> Result<()> {
    let persona = state.persona_service.get_persona(id).await?;

    if !force && !json {
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Permanently delete persona '{}' and its chat history?",
                style(&persona.name).red().bold()
            ))
            .default(false)
            .interact()?;

        if !confirmed {
            println!("  Cancelled.");
            return Ok(());
        }
    }

    state.persona_service.delete_persona(id).await?;

    if json {
        println!("{}", serde_json::json!({"deleted": true, "id": id}));
    } else {
        println!("  {} Persona '{}' deleted.", style("✓").red().bold(), persona.name);
    }

    Ok(())
}

/// Greedy word wrap for terminal output.
fn textwrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if !current.is_empty() && current.len() + 1 + word.len() > width {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}
