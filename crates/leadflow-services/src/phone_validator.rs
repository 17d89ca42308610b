use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use leadflow_core::PhoneValidator;

#[derive(Debug, Serialize)]
struct ValidationRequest<'a> {
    phone: &'a str,
    account_id: i64,
}

#[derive(Debug, Deserialize)]
struct ValidationResponse {
    valid: bool,
}

/// Phone reachability oracle reached over HTTP
pub struct HttpPhoneValidator {
    client: Client,
    url: String,
}

impl HttpPhoneValidator {
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl PhoneValidator for HttpPhoneValidator {
    #[tracing::instrument(skip(self, phone))]
    async fn validate_phone(&self, phone: &str, account_id: i64) -> Result<bool> {
        let response = self
            .client
            .post(&self.url)
            .json(&ValidationRequest { phone, account_id })
            .send()
            .await
            .context("Phone validator request failed")?
            .error_for_status()
            .context("Phone validator returned an error status")?;

        let body: ValidationResponse = response
            .json()
            .await
            .context("Failed to parse phone validator response")?;

        Ok(body.valid)
    }
}
