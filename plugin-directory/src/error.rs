use reqwest::StatusCode;
use thiserror::Error;

/// Reasons a refresh of the plugin list can fail.
///
/// All variants are handled the same way by the cache: fall back to the last
/// good document if there is one, otherwise surface the error.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("upstream unreachable: {0}")]
    UpstreamUnreachable(#[from] reqwest::Error),

    #[error("upstream responded with status {0}")]
    UpstreamStatus(StatusCode),

    #[error("malformed plugin list: {0}")]
    UpstreamMalformed(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("an I/O error occurred: {0}")]
    GenericIo(#[from] std::io::Error),

    #[error("http client error: {0}")]
    HttpClientError(#[from] reqwest::Error),
}
