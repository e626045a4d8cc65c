use super::{Transport, encode_payload, judge_response};
use crate::config::TransportConfig;
use crate::error::DispatchError;
use crate::types::{Command, DispatchResult};
use async_trait::async_trait;
use std::time::Duration;

/// Talks to the webhook with an in-process `reqwest` client.
#[derive(Clone, Default)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self::default()
    }

    async fn post(&self, command: &Command, config: &TransportConfig) -> Result<String, DispatchError> {
        let body = encode_payload(command, config.field)?;

        let resp = self
            .client
            .post(&config.url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .timeout(config.timeout)
            .send()
            .await
            .map_err(|e| classify(e, config.timeout))?;

        let status = resp.status().as_u16();
        let text = resp.text().await.map_err(|e| classify(e, config.timeout))?;
        judge_response(status, text)
    }
}

fn classify(err: reqwest::Error, timeout: Duration) -> DispatchError {
    if err.is_timeout() {
        DispatchError::Timeout(timeout)
    } else {
        DispatchError::Network(err.to_string())
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, command: &Command, config: &TransportConfig) -> DispatchResult {
        match self.post(command, config).await {
            Ok(body) => {
                log::info!("Command delivered to {}", config.url);
                DispatchResult::sent(body)
            }
            Err(e) => {
                log::warn!("Failed to deliver command to {}: {}", config.url, e);
                e.into()
            }
        }
    }

    async fn probe(&self, config: &TransportConfig) -> bool {
        match self
            .client
            .get(&config.health_url)
            .timeout(config.timeout)
            .send()
            .await
        {
            Ok(resp) if resp.status() == reqwest::StatusCode::OK => true,
            Ok(resp) => {
                log::debug!("Health check {} returned HTTP {}", config.health_url, resp.status());
                false
            }
            Err(e) => {
                log::debug!("Cannot reach {}: {}", config.health_url, e);
                false
            }
        }
    }
}
