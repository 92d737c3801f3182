use std::net::SocketAddr;
use std::time::Duration;

use crystaltides::logging::init_tracing;
use crystaltides::metrics::{init_metrics, metrics_app};
use crystaltides::router::init_router;
use crystaltides::state::init_app_state;
use crystaltides_core::errors::set_expose_error_chain;
use dotenvy::dotenv;
use tracing::{error, info};

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
    }
    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    init_tracing();

    let state = init_app_state().await?;
    set_expose_error_chain(!state.server_config.is_production());

    if let Some(handle) = init_metrics() {
        let addr = SocketAddr::from(([0, 0, 0, 0], state.server_config.metrics_port));
        tokio::spawn(async move {
            match tokio::net::TcpListener::bind(addr).await {
                Ok(listener) => {
                    info!(%addr, "Metrics server listening");
                    if let Err(e) = axum::serve(listener, metrics_app(handle)).await {
                        error!(error = %e, "Metrics server stopped");
                    }
                }
                Err(e) => error!(error = %e, %addr, "Failed to bind metrics server"),
            }
        });
    }

    let limiters = state.rate_limiters.clone();
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(Duration::from_secs(60)).await;
            limiters.retain_recent();
        }
    });

    let addr = state.server_config.bind_addr;
    let app = init_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "Server running");
    info!("API docs available at http://{addr}/api/docs");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    Ok(())
}
