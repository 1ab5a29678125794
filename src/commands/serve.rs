use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::api::AppState;
use crate::cache::ResponseCache;
use crate::cli::ServeArgs;
use crate::config;
use crate::server::start_server;
use crate::source::openf1::OpenF1Source;

pub async fn run(config_file: Option<&Path>, args: ServeArgs) -> Result<()> {
    let (_, mut config) = config::load_resolved(config_file)?;
    args.apply(&mut config);

    let timeout = config.source.timeout()?;
    let ttl = config.cache.ttl()?;
    let cache = if config.cache.enabled {
        ResponseCache::initialize(&config.cache.resolved_dir()).with_ttl(ttl)
    } else {
        info!("response cache disabled");
        ResponseCache::disabled()
    };
    let cache_dir = cache.root().map(Path::to_path_buf);

    let source = OpenF1Source::new(&config.source.base_url, timeout, cache)
        .context("building HTTP client for timing source")?;
    info!(base_url = %config.source.base_url, "using OpenF1 timing source");

    let state = AppState::new(Arc::new(source), cache_dir);

    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            warn!("failed to listen for ctrl-c");
            return;
        }
        info!("shutting down");
        signal_cancel.cancel();
    });

    start_server(&config.server, state, cancel).await
}
