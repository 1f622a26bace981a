use std::sync::Arc;

use showhouse::config::AppConfig;
use showhouse_server::{build_router, build_state};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    let config = AppConfig::from_env();
    let address = config.bind_address.clone();

    let state = Arc::new(build_state(config));
    let router = build_router(state);

    let tcp_listener = tokio::net::TcpListener::bind(&address).await?;
    log::info!("Starting server on address: {}", address);

    axum::serve(tcp_listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    Ok(())
}
