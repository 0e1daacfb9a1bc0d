// TRM (official COP/USD rate) used to price the assistance insurance.
// A missing rate never blocks a quote: callers fall back to a fixed rate.

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::ExchangeConfig;

#[derive(Error, Debug)]
pub enum ExchangeError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("API error: status {status_code}")]
    ApiResponseError { status_code: u16 },

    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    #[error("Rate not published")]
    NotPublished,
}

impl From<reqwest::Error> for ExchangeError {
    fn from(e: reqwest::Error) -> Self {
        ExchangeError::NetworkError(e.to_string())
    }
}

#[async_trait]
pub trait ExchangeRateSource: Send + Sync {
    async fn rate_for(&self, date: NaiveDate) -> Result<f64, ExchangeError>;
}

/// Always answers with the same rate.
#[derive(Debug, Clone, Copy)]
pub struct FixedRate(pub f64);

#[async_trait]
impl ExchangeRateSource for FixedRate {
    async fn rate_for(&self, _date: NaiveDate) -> Result<f64, ExchangeError> {
        Ok(self.0)
    }
}

pub struct TrmClient {
    client: reqwest::Client,
    endpoint: String,
}

impl TrmClient {
    pub fn new(config: &ExchangeConfig) -> Result<Self, ExchangeError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;
        Ok(Self {
            client,
            endpoint: config.trm_endpoint.clone(),
        })
    }
}

#[async_trait]
impl ExchangeRateSource for TrmClient {
    async fn rate_for(&self, date: NaiveDate) -> Result<f64, ExchangeError> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("date", date.format("%Y-%m-%d").to_string())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExchangeError::ApiResponseError {
                status_code: status.as_u16(),
            });
        }

        let body = response.text().await?;
        let rate = parse_trm_body(&body)?;
        debug!(%date, rate, "TRM fetched");
        Ok(rate)
    }
}

/// Reads `{"data": {"success": true, "value": ...}}`; the value may be a
/// number or a numeric string.
pub fn parse_trm_body(body: &str) -> Result<f64, ExchangeError> {
    let json: Value =
        serde_json::from_str(body).map_err(|e| ExchangeError::InvalidFormat(e.to_string()))?;
    let data = &json["data"];

    if data["success"].as_bool() != Some(true) {
        return Err(ExchangeError::NotPublished);
    }

    let rate = match &data["value"] {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .ok_or_else(|| ExchangeError::InvalidFormat(format!("unreadable value: {}", data["value"])))?;

    if !rate.is_finite() || rate <= 0.0 {
        return Err(ExchangeError::InvalidFormat(format!("non-positive rate {}", rate)));
    }
    Ok(rate)
}

/// Rate for the date, or `fallback` (with a warning) when the source fails.
pub async fn rate_or_fallback(
    source: &dyn ExchangeRateSource,
    date: NaiveDate,
    fallback: f64,
) -> f64 {
    match source.rate_for(date).await {
        Ok(rate) => rate,
        Err(e) => {
            warn!(%date, error = %e, fallback, "TRM unavailable, using fallback rate");
            fallback
        }
    }
}
