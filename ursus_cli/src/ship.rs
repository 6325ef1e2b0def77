//! Connection settings shared by every command.

use std::time::Duration;

use anyhow::{Context, Result};
use ursus::{
    Channel, ChannelOptions,
    event_source::ReqwestEventSource,
    http_client::ReqwestHttpClient,
    spawn::TokioSpawn,
};

/// The channel type every command drives.
pub(crate) type ShipChannel = Channel<ReqwestHttpClient, ReqwestEventSource, TokioSpawn>;

/// Where the ship is and how to log in.
#[derive(Debug, clap::Args)]
pub(crate) struct ShipArgs {
    /// Base URL of the ship
    #[arg(short, long, env = "URSUS_URL", default_value = "http://localhost:8080")]
    pub(crate) url: String,

    /// The ship's +code
    #[arg(short, long, env = "URSUS_CODE", hide_env_values = true)]
    pub(crate) code: String,

    /// Request timeout in seconds
    #[arg(short, long, default_value_t = ursus::DEFAULT_REQUEST_TIMEOUT_SECS)]
    pub(crate) timeout: u64,
}

impl ShipArgs {
    /// Build a channel and log in.
    pub(crate) async fn login(&self) -> Result<ShipChannel> {
        let options = ChannelOptions {
            request_timeout: Duration::from_secs(self.timeout),
        };
        let channel = Channel::with_reqwest(&self.url, &self.code, &options);

        tracing::info!("Logging in to {}", channel.base_url());
        channel
            .authenticate()
            .await
            .with_context(|| format!("login to {} failed", self.url))?;

        Ok(channel)
    }
}
