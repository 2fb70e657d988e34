//! Gateway entry-point: loads settings, wires adapters and serves HTTP.

use actix_web::web;
use ortho_config::OrthoConfig;
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt};

use payment_gateway::inbound::http::health::HealthState;
use payment_gateway::outbound::persistence::DbPool;
use payment_gateway::server::{ServerConfig, create_server, drain_on_shutdown_signal};
use payment_gateway::settings::GatewaySettings;

/// Application bootstrap.
#[actix_web::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = GatewaySettings::load()?;
    let mut config = ServerConfig::from_settings(&settings);
    if let Some(pool_config) = settings.pool_config() {
        let pool = DbPool::new(pool_config).await?;
        config = config.with_db_pool(pool);
    }

    let health_state = web::Data::new(HealthState::new());
    let server = create_server(health_state.clone(), config)?;
    actix_web::rt::spawn(drain_on_shutdown_signal(health_state, server.handle()));
    server.await?;
    Ok(())
}
