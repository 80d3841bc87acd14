//! Gatehouse Server — application entry point.
//!
//! Wires the database connection, schema migrations, and the
//! periodic maintenance runner. The HTTP/RPC boundary layers attach
//! to the managers from their own deployables.

use std::time::Duration;

use gatehouse_db::{DbConfig, DbManager, SurrealStore};
use gatehouse_managers::{PeriodicRunner, PurgeDeletedUsers};
use tracing_subscriber::EnvFilter;

fn env_or(name: &str, fallback: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| fallback.to_string())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("gatehouse=info".parse().unwrap()),
        )
        .json()
        .init();

    tracing::info!("starting gatehouse server");

    let db_config = DbConfig {
        url: env_or("GATEHOUSE_DB_URL", "127.0.0.1:8000"),
        namespace: env_or("GATEHOUSE_DB_NAMESPACE", "gatehouse"),
        database: env_or("GATEHOUSE_DB_DATABASE", "identity"),
        username: env_or("GATEHOUSE_DB_USER", "root"),
        password: env_or("GATEHOUSE_DB_PASSWORD", "root"),
    };

    let manager = match DbManager::connect(&db_config).await {
        Ok(manager) => manager,
        Err(err) => {
            tracing::error!(error = %err, "database connection failed");
            std::process::exit(1);
        }
    };

    if let Err(err) = gatehouse_db::run_migrations(manager.client()).await {
        tracing::error!(error = %err, "migrations failed");
        std::process::exit(1);
    }

    let store = SurrealStore::new(manager.client().clone());

    let purge_interval = Duration::from_secs(
        env_or("GATEHOUSE_PURGE_INTERVAL_SECS", "3600")
            .parse()
            .unwrap_or(3600),
    );
    let purge_retention = env_or("GATEHOUSE_PURGE_RETENTION_SECS", "2592000")
        .parse()
        .unwrap_or(2_592_000);

    let mut runner = PeriodicRunner::new();
    runner.register(PurgeDeletedUsers::new(store, purge_interval, purge_retention));
    let tickers = runner.spawn();

    tracing::info!("gatehouse server running");

    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }

    for ticker in tickers {
        ticker.abort();
    }

    tracing::info!("gatehouse server stopped");
}
