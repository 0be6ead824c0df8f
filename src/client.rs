use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use log::debug;
use serde::Deserialize;
use std::time::Duration;

use crate::record::BlockReward;

/// Something that can look up the producer reward of a block
#[async_trait]
pub trait RewardSource {
    async fn fetch_reward(&self, block_number: u64) -> Result<BlockReward>;
}

// Response of the execution block endpoint
#[derive(Deserialize, Debug)]
struct ExecutionBlockResponse {
    status: String,
    data: Vec<BlockReward>,
}

/// Decode an execution block response body, keeping only the first entry.
///
/// An empty `data` array is an error so the caller retries it.
pub fn parse_execution_block(body: &[u8]) -> Result<BlockReward> {
    let response: ExecutionBlockResponse =
        serde_json::from_slice(body).context("failed to decode response")?;

    response
        .data
        .first()
        .copied()
        .ok_or_else(|| anyhow!("empty data payload (status: {})", response.status))
}

/// Client for the beaconcha.in execution block API
pub struct BeaconchainClient {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
}

impl BeaconchainClient {
    pub fn new(api_url: &str, api_key: &str, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build().context("failed to build HTTP client")?,
            api_url: api_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    fn block_url(&self, block_number: u64) -> String {
        format!(
            "{}/api/v1/execution/block/{}?apikey={}",
            self.api_url, block_number, self.api_key
        )
    }
}

#[async_trait]
impl RewardSource for BeaconchainClient {
    async fn fetch_reward(&self, block_number: u64) -> Result<BlockReward> {
        let response = self
            .client
            .get(self.block_url(block_number))
            .send()
            .await
            // The request URL carries the API key
            .map_err(reqwest::Error::without_url)
            .context("error fetching block")?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(reqwest::Error::without_url)
            .context("error reading response body")?;
        debug!("Block {}: HTTP {} ({} bytes)", block_number, status, body.len());

        parse_execution_block(&body)
            .with_context(|| format!("unexpected response for block {} (HTTP {})", block_number, status))
    }
}
