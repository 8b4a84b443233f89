use authz_service::config::{ServiceConfig, SessionStorageConfig};
use authz_service::{build_router, spawn_sweep, ServiceState};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "mobigate-authzd", version, about = "Mobigate treasury authorization service")]
struct Cli {
    /// Socket address to bind, e.g. 127.0.0.1:8094
    #[arg(long, default_value = "127.0.0.1:8094")]
    listen: SocketAddr,
    /// Credential digest file (role -> hex BLAKE3 digest).
    #[arg(long, default_value = "data/credentials.json", env = "AUTHZ_CREDENTIALS")]
    credentials: PathBuf,
    /// Requirement table JSON. Uses the built-in Mobigate table when omitted.
    #[arg(long, env = "AUTHZ_REQUIREMENT_TABLE")]
    requirement_table: Option<PathBuf>,
    /// Officer roster JSON. Seats one officer per role when omitted.
    #[arg(long, env = "AUTHZ_OFFICERS")]
    officers: Option<PathBuf>,
    /// File used to persist in-flight sessions. In-memory when omitted.
    #[arg(long, env = "AUTHZ_SESSION_STORE")]
    session_store: Option<PathBuf>,
    /// Session time-to-live in seconds.
    #[arg(long, default_value_t = 86_400, env = "AUTHZ_SESSION_TTL_SECS")]
    session_ttl_secs: i64,
    /// Expiry sweep interval in seconds.
    #[arg(long, default_value_t = 60, env = "AUTHZ_SWEEP_INTERVAL_SECS")]
    sweep_interval_secs: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "authz_service=info,info".to_string()),
        )
        .init();

    let cli = Cli::parse();
    let config = ServiceConfig {
        session_ttl_secs: cli.session_ttl_secs,
        sweep_interval_secs: cli.sweep_interval_secs,
        requirement_table_path: cli.requirement_table,
        officers_path: cli.officers,
        credentials_path: cli.credentials,
        session_storage: cli
            .session_store
            .map(SessionStorageConfig::File)
            .unwrap_or(SessionStorageConfig::Memory),
        ..ServiceConfig::default()
    };

    let sweep_interval = std::time::Duration::from_secs(config.sweep_interval_secs.max(1));
    let state = ServiceState::bootstrap(config)?;
    let _sweep = spawn_sweep(state.clone(), sweep_interval);

    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(cli.listen).await?;
    info!("authz-service listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
