use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::api::{api_router, AppState};
use crate::config::model::ServerConfig;

pub async fn start_server(
    config: &ServerConfig,
    state: AppState,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    let app = api_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
    info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(cancel.cancelled_owned())
        .await?;

    info!("server stopped");
    Ok(())
}
