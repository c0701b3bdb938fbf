use hcm_server::{Config, Server, ServerState, setup_environment};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. .env + logging
    setup_environment();

    tracing::info!("HCM server starting (version {})", env!("CARGO_PKG_VERSION"));

    // 2. Configuration
    let config = Config::from_env()?;
    tracing::info!("Environment: {}", config.environment);

    // 3. State (database, migrations, services)
    let state = ServerState::initialize(&config).await?;

    // 4. HTTP server
    let server = Server::with_state(config, state);
    if let Err(e) = server.run().await {
        tracing::error!("Server error: {}", e);
        return Err(e.into());
    }

    Ok(())
}
