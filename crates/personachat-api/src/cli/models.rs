//! Supported model listing.

use anyhow::Result;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use serde::Serialize;

use personachat_types::llm::{ProviderKind, SUPPORTED_MODELS};

use crate::state::AppState;

#[derive(Debug, Serialize)]
struct ModelRow {
    model: &'static str,
    provider: Option<ProviderKind>,
    configured: bool,
    default: bool,
}

fn model_rows(state: &AppState) -> Vec<ModelRow> {
    let dispatcher = state.chat_service.dispatcher();
    let default_model = &state.config.chat.default_model;
    SUPPORTED_MODELS
        .iter()
        .copied()
        .map(|model| {
            let provider = ProviderKind::for_model(model);
            ModelRow {
                model,
                provider,
                configured: provider.is_some_and(|p| dispatcher.is_configured(p)),
                default: model == default_model.as_str(),
            }
        })
        .collect()
}

pub fn list_models(state: &AppState, json: bool) -> Result<()> {
    let rows = model_rows(state);

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Model").fg(Color::White),
        Cell::new("Provider").fg(Color::White),
        Cell::new("Status").fg(Color::White),
    ]);

    for row in &rows {
        let name = if row.default {
            format!("{} (default)", row.model)
        } else {
            row.model.to_string()
        };
        let provider = row.provider.map(|p| p.to_string()).unwrap_or_default();
        let status = match (row.configured, row.provider) {
            (true, _) => Cell::new("● ready").fg(Color::Green),
            (false, Some(p)) => Cell::new(format!("○ set {}", p.api_key_env())).fg(Color::Yellow),
            (false, None) => Cell::new("○ unknown").fg(Color::DarkGrey),
        };
        table.add_row(vec![Cell::new(name), Cell::new(provider), status]);
    }

    println!();
    println!("{table}");
    println!();

    Ok(())
}
