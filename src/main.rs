use anyhow::Context;
use clap::Parser;
use quill::{
    api::routes::create_app,
    cli::{Cli, Commands},
    AppState, CredentialHasher, InMemoryUserStore, QuillConfig,
};
use std::io::Read;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_tracing(config: &QuillConfig, cli: &Cli) {
    let default_level = if cli.verbose {
        "debug"
    } else {
        config.server.log_level.as_str()
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("quill={default_level},tower_http={default_level}"))
    });

    let registry = tracing_subscriber::registry().with(filter);
    if cli.json_logs || config.server.json_logs {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = QuillConfig::load(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    init_tracing(&config, &cli);

    let secret = config.signing_secret(|key| std::env::var(key).ok())?;
    let tokens = config.auth.token_service(secret.as_bytes())?;

    match cli.command {
        Some(Commands::Token {
            user_id,
            email,
            username,
            role,
        }) => {
            let token = tokens.issue(user_id, &email, &username, role)?;
            println!("{token}");
            Ok(())
        }
        Some(Commands::HashPassword) => {
            let mut password = String::new();
            std::io::stdin().read_to_string(&mut password)?;
            let hash = CredentialHasher::new()?.hash(password.trim_end_matches(['\r', '\n']))?;
            println!("{hash}");
            Ok(())
        }
        Some(Commands::Serve) | None => serve(config, tokens).await,
    }
}

async fn serve(config: QuillConfig, tokens: quill::TokenService) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let environment = config.environment.clone();

    let state = AppState::new(config, Arc::new(InMemoryUserStore::new()), tokens)?;
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    tracing::info!(%addr, %environment, "quill server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
}
