/// HTTP client for the controller's JSON API

use anyhow::{Context, Result};
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

use super::device::DeviceStatus;
use super::error::PollError;
use super::measurement::ChannelReading;

pub const MEASUREMENTS_PATH: &str = "/api/measurements/list";
pub const STATE_PATH: &str = "/api/state/list";

/// Anything that can produce one frame of channel readings
pub trait MeasurementSource: Send + Sync {
    fn fetch_measurements(
        &self,
    ) -> impl Future<Output = Result<Vec<ChannelReading>, PollError>> + Send;
}

pub struct ProbeClient {
    client: Client,
    base_url: String,
}

impl ProbeClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: normalize_base_url(base_url),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Fetch controller name, version and runtime state
    pub async fn fetch_status(&self) -> Result<DeviceStatus, PollError> {
        self.get_json(STATE_PATH).await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, PollError> {
        let url = self.url_for(path);
        debug!(%url, "GET");

        let response = self.client.get(&url).send().await?;
        let status = response.status();

        if !status.is_success() {
            return Err(PollError::Status(status));
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

impl MeasurementSource for ProbeClient {
    async fn fetch_measurements(&self) -> Result<Vec<ChannelReading>, PollError> {
        self.get_json(MEASUREMENTS_PATH).await
    }
}

/// Accept `host`, `host:port` or a full URL; strip trailing slashes
pub fn normalize_base_url(base_url: &str) -> String {
    let trimmed = base_url.trim().trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("http://{}", trimmed)
    }
}
