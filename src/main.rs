use std::{net::SocketAddr, path::PathBuf};

use anyhow::Context as _;
use clap::Parser;
use reproxied_core::{ReProxied, logging::LogLevel, server::Server};
use tracing::{info, info_span};

mod config;
mod logging;

use config::FileConfig;

/// Rewrites every request to a target origin and relays the response
#[derive(Parser, Debug)]
#[command(name = "reproxied", version, about)]
struct Args {
    /// YAML or JSON configuration file
    #[arg(short, long, env = "REPROXIED_CONFIG")]
    config: Option<PathBuf>,

    /// Address to listen on
    #[arg(short, long)]
    listen: Option<SocketAddr>,

    /// Target origin, e.g. https://example.com
    #[arg(short, long)]
    target_host: Option<String>,

    /// Forward proxy for outbound calls, e.g. http://proxy:3128
    #[arg(short, long)]
    proxy: Option<String>,

    /// Keep the caller's Host header
    #[arg(short, long)]
    keep_host_header: bool,

    /// Log level: trace, debug, info, warn, error (or 0-4)
    #[arg(long)]
    log_level: Option<LogLevel>,
}

impl Args {
    fn into_config(self) -> anyhow::Result<FileConfig> {
        let mut config = match &self.config {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };

        if let Some(listen) = self.listen {
            config.listen = listen;
        }
        if let Some(target_host) = self.target_host {
            config.middleware.target_host = target_host;
        }
        if let Some(proxy) = self.proxy {
            config.middleware.proxy = proxy;
        }
        if self.keep_host_header {
            config.middleware.keep_host_header = true;
        }
        if let Some(log_level) = self.log_level {
            config.middleware.log_level = log_level;
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Args::parse().into_config()?;

    if let Err(e) = logging::init_logging(config.middleware.log_level.as_tracing()) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    let server = {
        let _span = info_span!("reproxied_startup").entered();
        info!("Starting reproxied");

        let middleware = ReProxied::new(&config.middleware, &config.name)
            .context("building middleware")?;
        let server = Server::new(config.listen, middleware)
            .await
            .with_context(|| format!("binding {}", config.listen))?;

        info!("Listening on {}", server.local_addr()?);
        server
    };

    server.run().await;
    Ok(())
}
