//! Backend entry-point: runs migrations, builds the pool, and serves the
//! membership API.

use std::env;
use std::net::SocketAddr;

use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt};

use hearth_backend::outbound::persistence::DbPool;
use hearth_backend::server::{ServerConfig, run, run_migrations};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let database_url = env::var("DATABASE_URL")
        .map_err(|_| std::io::Error::other("DATABASE_URL must be set"))?;
    let bind_addr: SocketAddr = env::var("BIND_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:8080".into())
        .parse()
        .map_err(|err| std::io::Error::other(format!("invalid BIND_ADDR: {err}")))?;

    {
        let database_url = database_url.clone();
        tokio::task::spawn_blocking(move || run_migrations(&database_url))
            .await
            .map_err(|err| std::io::Error::other(format!("migration task failed: {err}")))??;
    }

    let pool = DbPool::connect(&database_url)
        .await
        .map_err(|err| std::io::Error::other(format!("pool construction failed: {err}")))?;

    let (server, health_state) = run(ServerConfig::new(bind_addr, pool))?;
    health_state.mark_ready();
    server.await
}
