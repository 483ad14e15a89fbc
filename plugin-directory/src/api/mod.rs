mod models;
pub use models::*;

use crate::args::DirectoryArgs;
use crate::cache::PluginSource;
use crate::error::FetchError;
use bytes::Bytes;
use reqwest::redirect::Policy;
use reqwest::{Client, Url};
use std::time::Duration;

/// Client for the remote plugin list.
#[derive(Debug, Clone)]
pub struct UpstreamApi {
    client: Client,
    url: Url,
}

impl UpstreamApi {
    /// Prepare the API client.
    pub fn new(args: &DirectoryArgs) -> Result<Self, reqwest::Error> {
        let mut builder = Client::builder()
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .redirect(Policy::limited(10))
            .hickory_dns(true);

        if let Some(secs) = args.upstream_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        Ok(Self {
            client: builder.build()?,
            url: args.upstream_url.clone(),
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

impl PluginSource for UpstreamApi {
    #[tracing::instrument(skip(self), fields(url = self.url.as_str()))]
    async fn fetch_plugins(&self) -> Result<Bytes, FetchError> {
        let response = self.client.get(self.url.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::UpstreamStatus(status));
        }

        Ok(response.bytes().await?)
    }
}
