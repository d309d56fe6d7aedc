use portal_backend::config::{Config, StorageMode};
use portal_backend::routes::build_router;
use portal_backend::services::mail_service::HttpMailer;
use portal_backend::storage::memory::MemoryCandidateStore;
use portal_backend::storage::postgres::{create_pool, PgCandidateStore};
use portal_backend::storage::CandidateStore;
use portal_backend::AppState;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let config = Config::from_env()?;

    let store: Arc<dyn CandidateStore> = match config.storage_mode {
        StorageMode::Postgres => {
            let database_url = config
                .database_url
                .clone()
                .ok_or_else(|| anyhow::anyhow!("DATABASE_URL is not set"))?;
            let pool = create_pool(&database_url).await?;
            info!("storage: postgres");
            Arc::new(PgCandidateStore::new(pool))
        }
        StorageMode::Memory => {
            tracing::warn!("storage: in-memory, nothing survives a restart");
            Arc::new(MemoryCandidateStore::new())
        }
    };

    let http_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()?;
    let mailer = Arc::new(HttpMailer::new(
        http_client.clone(),
        config.mail_relay_url.clone(),
        config.mail_from.clone(),
    ));

    let addr: SocketAddr = config.server_address.parse()?;
    let app = build_router(AppState::new(config, store, mailer, http_client));

    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
