use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use leadflow_core::EventEmitter;

#[derive(Debug, Serialize)]
struct EventEnvelope<'a> {
    event: &'a str,
    data: serde_json::Value,
}

/// Posts `{event, data}` envelopes to a realtime gateway
pub struct WebhookEventEmitter {
    client: Client,
    url: String,
}

impl WebhookEventEmitter {
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl EventEmitter for WebhookEventEmitter {
    #[tracing::instrument(skip(self, payload))]
    async fn emit(&self, event: &str, payload: serde_json::Value) -> Result<()> {
        self.client
            .post(&self.url)
            .header("Content-Type", "application/json")
            .header("User-Agent", "Leadflow-Events/1.0")
            .json(&EventEnvelope {
                event,
                data: payload,
            })
            .send()
            .await
            .context("Failed to deliver event")?
            .error_for_status()
            .context("Event gateway rejected event")?;

        Ok(())
    }
}
