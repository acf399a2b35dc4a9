use metrics_gateway::{api, config::GatewayConfig, logging, metrics};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    logging::init_logger();
    logging::install_panic_hook();

    let config = match GatewayConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    metrics::init_metrics();

    info!(
        "Starting metrics gateway v{} on port {}",
        env!("CARGO_PKG_VERSION"),
        config.port
    );

    if let Err(e) = api::start_gateway(config).await {
        error!("Metrics gateway stopped: {}", e);
        std::process::exit(1);
    }
}
