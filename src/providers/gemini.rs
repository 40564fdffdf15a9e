use crate::core::config::GeminiProviderConfig;
use crate::core::{Currency, PriceProvider};
use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tracing::{debug, error, instrument};

/// Prices currencies by asking a Gemini model for a `{"price": <number>}` reply.
pub struct GeminiPriceProvider {
    base_url: String,
    model: String,
    api_key: String,
    client: reqwest::Client,
}

impl GeminiPriceProvider {
    pub fn new(base_url: &str, model: &str, api_key: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("coinconv/1.0")
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(GeminiPriceProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: api_key.to_string(),
            client,
        })
    }

    pub fn from_config(config: &GeminiProviderConfig) -> Result<Self> {
        let api_key = config.resolve_api_key(|var| std::env::var(var).ok())?;
        Self::new(
            &config.base_url,
            &config.model,
            &api_key,
            Duration::from_secs(config.timeout_secs),
        )
    }

    fn request_body(currency: Currency) -> serde_json::Value {
        json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": price_prompt(currency) }]
            }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": {
                    "type": "OBJECT",
                    "properties": {
                        "price": {
                            "type": "NUMBER",
                            "description": format!("The current price of 1 {currency} in USD.")
                        }
                    },
                    "required": ["price"]
                },
                "temperature": 0
            }
        })
    }
}

pub fn price_prompt(currency: Currency) -> String {
    format!(
        "What is the current price of 1 {currency} in US Dollars (USD)? Provide only the numerical value."
    )
}

#[derive(Deserialize, Debug)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize, Debug)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Deserialize, Debug)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize, Debug)]
struct Part {
    text: Option<String>,
}

/// Exact shape the model is asked to produce.
#[derive(Deserialize, Serialize, Debug, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PriceReply {
    pub price: f64,
}

/// Validates the model's JSON text, failing on any shape mismatch or unusable price.
pub fn parse_price_reply(text: &str, currency: Currency) -> Result<f64> {
    let value: serde_json::Value = serde_json::from_str(text.trim())
        .with_context(|| format!("Invalid price format received for {currency}"))?;
    if !value.is_object() {
        bail!("Invalid price format received for {}", currency);
    }
    let reply: PriceReply = serde_json::from_value(value)
        .with_context(|| format!("Invalid price format received for {currency}"))?;
    if !reply.price.is_finite() || reply.price <= 0.0 {
        bail!("Invalid price {} received for {}", reply.price, currency);
    }
    Ok(reply.price)
}

#[async_trait]
impl PriceProvider for GeminiPriceProvider {
    #[instrument(
        name = "GeminiPriceFetch",
        skip(self),
        fields(currency = %currency, model = %self.model)
    )]
    async fn fetch_price(&self, currency: Currency) -> Result<f64> {
        if currency.is_usd() {
            return Ok(1.0);
        }

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );
        debug!("Requesting price from {}", url);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&Self::request_body(currency))
            .send()
            .await
            .map_err(|e| anyhow!("Request error: {} for currency: {}", e, currency))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(%status, response = %body, "Gemini request failed");
            bail!(
                "Could not fetch the latest {} price: HTTP {}",
                currency,
                status
            );
        }

        let data = response
            .json::<GenerateContentResponse>()
            .await
            .with_context(|| format!("Failed to parse Gemini response for {currency}"))?;

        let text = data
            .candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .and_then(|c| c.parts.first())
            .and_then(|p| p.text.as_deref())
            .ok_or_else(|| anyhow!("No price data found for currency: {}", currency))?;
        debug!(reply = %text, "Received Gemini reply");

        parse_price_reply(text, currency)
    }
}
