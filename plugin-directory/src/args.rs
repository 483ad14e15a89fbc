use std::net::SocketAddr;
use std::path::PathBuf;
use clap::Parser;
use url::Url;
use crate::cache::DEFAULT_TTL;

#[derive(Debug, Clone, Parser)]
pub struct DirectoryArgs {
    #[arg(short, long, default_value = "127.0.0.1:5000", env = "PLUGIN_DIRECTORY_LISTEN")]
    pub listen: SocketAddr,

    #[arg(
        short,
        long,
        default_value = "https://rusherdevelopment.github.io/rusherhack-plugins/api/v1/",
        env = "PLUGIN_DIRECTORY_UPSTREAM"
    )]
    pub upstream_url: Url,

    /// How long a fetched plugin list is served without asking upstream again.
    #[arg(long, default_value_t = DEFAULT_TTL.as_secs())]
    pub cache_ttl_secs: u64,

    /// Abort upstream requests after this many seconds. Without it the
    /// client waits as long as the connection stays open.
    #[arg(long)]
    pub upstream_timeout_secs: Option<u64>,

    /// Directory holding the built front-end, served for every path that is
    /// not an API route.
    #[arg(long, env = "PLUGIN_DIRECTORY_STATIC_DIR")]
    pub static_dir: Option<PathBuf>,
}
