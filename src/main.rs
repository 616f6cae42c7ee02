use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use todo_api_rust::config::AppConfig;
use todo_api_rust::server::{app, AppState};
use todo_api_rust::services::UserService;
use todo_api_rust::store::{MemoryStore, PgStore, Store};

#[derive(Parser)]
#[command(name = "todo-api")]
#[command(about = "Todo/task API with token access control")]
#[command(version)]
struct Args {
    #[arg(long, help = "Bind host (overrides SERVER_HOST)")]
    host: Option<String>,

    #[arg(long, help = "Bind port (overrides SERVER_PORT)")]
    port: Option<u16>,

    #[arg(long, help = "Use the in-memory store even if DATABASE_URL is set")]
    memory: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let mut config = AppConfig::from_env().context("invalid configuration")?;
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    info!("Starting todo API in {:?} mode", config.environment);

    let store: Arc<dyn Store> = match (&config.database.url, args.memory) {
        (Some(_), false) => {
            let pg = PgStore::connect(&config.database)
                .await
                .context("failed to connect to database")?;
            pg.migrate().await.context("failed to create schema")?;
            Arc::new(pg)
        }
        _ => {
            warn!("Using in-memory store; data is lost on exit");
            Arc::new(MemoryStore::new())
        }
    };

    if let (Some(email), Some(password)) = (
        config.security.admin_email.as_deref(),
        config.security.admin_password.as_deref(),
    ) {
        UserService::new(store.as_ref(), config.security.password_cost)
            .ensure_admin(email, password)
            .await
            .context("failed to bootstrap admin account")?;
    }

    let state = AppState::new(&config, store);

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    info!("Listening on http://{}", bind_addr);
    axum::serve(listener, app(state)).await?;

    Ok(())
}
