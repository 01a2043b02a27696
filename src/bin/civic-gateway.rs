use anyhow::Result;
use civic_assistant::gateway::{self, GatewayConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_logging() -> Result<()> {
    let default_level = if cfg!(debug_assertions) {
        "debug,hyper=info,reqwest=info"
    } else {
        "info,hyper=warn,reqwest=warn"
    };
    let env_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(default_level))?;

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_logging()?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Civic gateway starting");

    let config = GatewayConfig::from_env()?;
    gateway::serve(config).await
}
