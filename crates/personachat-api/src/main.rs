//! personachat CLI and REST API entry point.
//!
//! Binary name: `pchat`
//!
//! Parses CLI arguments, initializes database and services, then dispatches
//! to the appropriate command handler or starts the REST API server.

mod cli;
mod http;
mod state;

use std::net::SocketAddr;
use std::time::Duration;

use clap::Parser;
use clap_complete::generate;

use personachat_observe::tracing_setup::{TracingOptions, init_tracing, shutdown_tracing};
use personachat_types::persona::CreatePersonaRequest;

use cli::{Cli, Commands, PersonaAction};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Shell completions don't need tracing or app state
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "pchat", &mut std::io::stdout());
        return Ok(());
    }

    let mut tracing_options = TracingOptions::from_verbosity(cli.verbose, cli.quiet);
    if matches!(cli.command, Commands::Serve { .. }) && cli.verbose == 0 && !cli.quiet {
        tracing_options.default_filter = "info".to_string();
    }
    tracing_options.json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    tracing_options.otel = std::env::var_os("PERSONACHAT_OTEL").is_some();
    init_tracing(&tracing_options).map_err(|e| anyhow::anyhow!("tracing init failed: {e}"))?;

    // Initialize application state (config, DB, services)
    let state = AppState::init(cli.config.as_deref()).await?;

    let result = run(cli, state).await;
    shutdown_tracing();
    result
}

async fn run(cli: Cli, state: AppState) -> anyhow::Result<()> {
    match cli.command {
        Commands::Personas { action } => match action {
            PersonaAction::List => cli::persona::list_personas(&state, cli.json).await?,
            PersonaAction::Show { id } => cli::persona::show_persona(&state, &id, cli.json).await?,
            PersonaAction::Create {
                name,
                description,
                system_prompt,
                avatar_url,
            } => {
                let request = CreatePersonaRequest {
                    name: Some(name),
                    description: Some(description),
                    system_prompt: Some(system_prompt),
                    avatar_url,
                    created_by_id: None,
                };
                cli::persona::create_persona(&state, request, cli.json).await?;
            }
            PersonaAction::Delete { id, force } => {
                cli::persona::delete_persona(&state, &id, force, cli.json).await?;
            }
        },

        Commands::History {
            persona_id,
            user,
            clear,
        } => {
            cli::history::history(&state, &persona_id, user.as_deref(), clear, cli.json).await?;
        }

        Commands::Models => cli::models::list_models(&state, cli.json)?,

        Commands::Serve { port, host } => {
            let host = host.unwrap_or_else(|| state.config.server.host.clone());
            let port = port.unwrap_or(state.config.server.port);
            serve(state, &host, port, cli.quiet).await?;
        }

        Commands::Completions { .. } => {}
    }

    Ok(())
}

async fn serve(state: AppState, host: &str, port: u16, quiet: bool) -> anyhow::Result<()> {
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    let sweep_every = Duration::from_millis(state.config.rate_limit.window_ms.max(1_000));
    let sweeper = state.rate_limiter.spawn_sweeper(sweep_every);

    let configured = state.chat_service.dispatcher().configured();
    if configured.is_empty() {
        tracing::warn!("No LLM provider API keys set; chat requests will fail");
    }
    tracing::info!(
        %addr,
        environment = %state.config.environment,
        data_dir = %state.data_dir.display(),
        providers = ?configured,
        "Server starting"
    );

    if !quiet {
        println!(
            "  {} personachat API listening on {}",
            console::style("⚡").bold(),
            console::style(format!("http://{addr}")).cyan()
        );
        println!("  {}", console::style("Press Ctrl+C to stop").dim());
    }

    let db_pool = state.db_pool.clone();
    let router = http::router::build_router(state);

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    sweeper.abort();
    db_pool.close().await;
    tracing::info!("Server stopped");
    if !quiet {
        println!("\n  Server stopped.");
    }

    Ok(())
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
