mod api;
mod args;
mod cache;
mod error;
mod server;

use clap::Parser as _;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;
use crate::api::UpstreamApi;
use crate::args::DirectoryArgs;
use crate::cache::PluginCache;
use crate::error::DirectoryError;

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_env("PLUGIN_DIRECTORY_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = args::DirectoryArgs::parse();

    let result = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build() {
        Ok(v) => v.block_on(async_main(args)),
        Err(err) => {
            tracing::error!("Failed to create tokio runtime: {:?}", err);
            std::process::exit(1);
        }
    };

    if let Err(err) = result {
        tracing::error!("Error: {:?}", err);
        std::process::exit(1);
    }
}

async fn async_main(args: DirectoryArgs) -> Result<(), DirectoryError> {
    tracing::trace!("args = {:#?}", args);

    let api = UpstreamApi::new(&args)?;
    tracing::info!("Serving plugins from {}", api.url());

    let cache = Arc::new(PluginCache::new(api, Duration::from_secs(args.cache_ttl_secs)));
    let router = server::router(cache, args.static_dir.as_deref());

    let (listener, addr) = server::bind(args.listen).await?;
    tracing::info!("Listening on http://{}", addr);

    let shutdown = CancellationToken::new();
    tokio::spawn({
        let shutdown = shutdown.clone();

        async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    tracing::info!("Shutdown signal received");
                    shutdown.cancel();
                }
                Err(err) => tracing::error!("Failed to listen for shutdown signal: {}", err),
            }
        }
    });

    server::serve(listener, router, shutdown).await?;

    tracing::info!("Done.");

    Ok(())
}
