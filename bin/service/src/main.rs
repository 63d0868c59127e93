use std::sync::Arc;

use ntex::web;
use tracing::info;

use topology_config::load_config;
use topology_service::{routes, state::ServiceState, topofile};

#[ntex::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = std::env::var("TOPOLOGY_CONFIG_FILE_PATH").ok();
    let config = load_config(config_path.as_deref())?;
    topology_internal::logging::init(&config.log);

    let topofile_path = std::env::var("TOPOFILE")
        .map_err(|_| "TOPOFILE environment variable is required to start the service")?;
    let graph = topofile::load(&topofile_path)?;
    info!(path = %topofile_path, "loaded startup topology");

    let addr = config.address();
    let state = Arc::new(ServiceState::new(
        graph,
        config.optimizer.default_kind,
        config.optimizer.solve_timeout,
    ));

    info!(%addr, "topology-service starting");
    web::HttpServer::new(move || {
        web::App::new()
            .state(state.clone())
            .configure(routes::configure)
    })
    .bind(&addr)?
    .run()
    .await?;

    Ok(())
}
