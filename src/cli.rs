use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::model::AppConfig;

#[derive(Debug, Parser)]
#[command(
    name = "f1replay",
    version,
    about = "HTTP API for Formula 1 timing and telemetry data"
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Use a specific config file
    #[arg(short = 'f', long = "file", global = true, env = "F1REPLAY_CONFIG")]
    pub config_file: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the HTTP server
    Serve(ServeArgs),
    /// Print the resolved configuration and exit
    CheckConfig,
}

#[derive(Debug, Default, Args)]
pub struct ServeArgs {
    /// Address to bind
    #[arg(long, env = "F1REPLAY_HOST")]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "F1REPLAY_PORT")]
    pub port: Option<u16>,

    /// Directory for cached upstream responses
    #[arg(long, env = "F1REPLAY_CACHE_DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Disable the response cache
    #[arg(long)]
    pub no_cache: bool,

    /// Base URL of the timing data API
    #[arg(long, env = "F1REPLAY_SOURCE_URL")]
    pub source_url: Option<String>,
}

impl ServeArgs {
    /// Command-line values take precedence over the config file.
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(dir) = &self.cache_dir {
            config.cache.dir = Some(dir.clone());
        }
        if self.no_cache {
            config.cache.enabled = false;
        }
        if let Some(url) = &self.source_url {
            config.source.base_url = url.clone();
        }
    }
}
