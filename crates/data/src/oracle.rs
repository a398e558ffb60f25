//! USD unit-price resolution.

use anyhow::Result;
use async_trait::async_trait;
use cl_lens_domain::Address;
use futures::future::join_all;
use rust_decimal::Decimal;
use rust_decimal::prelude::*;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::warn;

/// Address to USD unit price resolution.
///
/// Addresses with no resolvable price are absent from the returned map;
/// each caller decides what absence means (usually a zero contribution).
#[async_trait]
pub trait PriceOracle: Send + Sync {
    async fn usd_prices(&self, tokens: &[Address]) -> Result<HashMap<Address, Decimal>>;
}

#[derive(Debug, Deserialize)]
struct PriceDto {
    #[serde(default)]
    price: Option<f64>,
}

/// REST price oracle issuing one request per address, concurrently.
///
/// Endpoint shape: `GET {base_url}/{chain_id}/{address}` returning
/// `{ "price": <usd> }`. One address failing never affects the others.
pub struct HttpPriceOracle {
    base_url: String,
    chain_id: u64,
    client: reqwest::Client,
}

impl HttpPriceOracle {
    #[must_use]
    pub fn new(base_url: impl Into<String>, chain_id: u64) -> Self {
        Self {
            base_url: base_url.into(),
            chain_id,
            client: reqwest::Client::new(),
        }
    }

    async fn fetch_one(&self, token: &Address) -> Option<Decimal> {
        let url = format!(
            "{}/{}/{}",
            self.base_url.trim_end_matches('/'),
            self.chain_id,
            token
        );
        let response = match self.client.get(&url).send().await {
            Ok(response) => response,
            Err(error) => {
                warn!(token = %token, error = %error, "price request failed");
                return None;
            }
        };
        if !response.status().is_success() {
            warn!(token = %token, status = %response.status(), "price request rejected");
            return None;
        }
        let dto: PriceDto = match response.json().await {
            Ok(dto) => dto,
            Err(error) => {
                warn!(token = %token, error = %error, "price response was not valid JSON");
                return None;
            }
        };
        // a zero or negative quote means the oracle could not price it
        let price = dto.price.filter(|price| *price > 0.0)?;
        Decimal::from_f64(price)
    }
}

#[async_trait]
impl PriceOracle for HttpPriceOracle {
    async fn usd_prices(&self, tokens: &[Address]) -> Result<HashMap<Address, Decimal>> {
        let fetches = tokens
            .iter()
            .map(|token| async move { (token.clone(), self.fetch_one(token).await) });
        Ok(join_all(fetches)
            .await
            .into_iter()
            .filter_map(|(token, price)| price.map(|price| (token, price)))
            .collect())
    }
}

/// Oracle that resolves nothing; used when no price endpoint is
/// configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopPriceOracle;

#[async_trait]
impl PriceOracle for NoopPriceOracle {
    async fn usd_prices(&self, _tokens: &[Address]) -> Result<HashMap<Address, Decimal>> {
        Ok(HashMap::new())
    }
}
