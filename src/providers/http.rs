//! HTTP price provider driven by a `ProviderConfig`

use super::{catalog::ProviderConfig, parser::parse_price};
use crate::{
    constants::USER_AGENT,
    error::{FetchErrorKind, PriceFetchError},
    provider::SpotPriceProvider,
    types::Metal,
};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// Longest slice of a response body quoted in an error message
const BODY_EXCERPT_CHARS: usize = 200;

/// Fetches one metal per GET request from a configured provider
pub struct HttpPriceProvider {
    client: Client,
    config: ProviderConfig,
}

impl HttpPriceProvider {
    /// Creates a provider whose every request is bounded by `timeout`
    pub fn new(config: ProviderConfig, timeout: Duration) -> Result<Self, PriceFetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| PriceFetchError::from_reqwest(&config.name, e))?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    fn error(&self, kind: FetchErrorKind) -> PriceFetchError {
        PriceFetchError::new(&self.config.name, kind)
    }
}

#[async_trait]
impl SpotPriceProvider for HttpPriceProvider {
    async fn fetch_price(&self, metal: Metal) -> Result<f64, PriceFetchError> {
        let url = self.config.build_url(metal)?;
        tracing::debug!(provider = %self.config.name, %metal, "Fetching spot price");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| PriceFetchError::from_reqwest(&self.config.name, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(self.error(FetchErrorKind::HttpStatus(status.as_u16())));
        }

        let response_text = response
            .text()
            .await
            .map_err(|e| PriceFetchError::from_reqwest(&self.config.name, e))?;

        let body: serde_json::Value = serde_json::from_str(&response_text).map_err(|e| {
            self.error(FetchErrorKind::Parse(format!(
                "Failed to parse {} response: {}",
                self.config.name, e
            )))
        })?;

        let price = parse_price(&self.config.kind, &body, metal).ok_or_else(|| {
            self.error(FetchErrorKind::Parse(format!(
                "No usable {} price in response: {}",
                metal,
                body_excerpt(&response_text)
            )))
        })?;

        tracing::debug!(provider = %self.config.name, %metal, price, "Fetched spot price");
        Ok(price)
    }

    fn provider_name(&self) -> &str {
        &self.config.name
    }
}

fn body_excerpt(body: &str) -> String {
    match body.char_indices().nth(BODY_EXCERPT_CHARS) {
        Some((end, _)) => format!("{}... ({} bytes)", &body[..end], body.len()),
        None => body.to_string(),
    }
}
