use parlor::prelude::*;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), ParlorError> {
    // Load .env file if present (before any env var reads)
    if let Err(e) = dotenvy::dotenv() {
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("Warning: Failed to load .env file: {e}");
        }
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "parlor=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env();
    tracing::info!(
        addr = %config.bind_addr(),
        max_players = config.room.max_players,
        idle_ttl_secs = config.room.idle_ttl.as_secs(),
        reap_interval_secs = config.reap_interval.as_secs(),
        "starting Parlor"
    );

    let server = ParlorServer::builder()
        .bind(&config.bind_addr())
        .room_config(config.room)
        .reap_interval(config.reap_interval)
        .build()
        .await?;

    server.run().await
}
