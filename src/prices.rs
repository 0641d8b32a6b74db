//! USD prices for the configured tokens.
//!
//! Prices come from the CoinGecko simple-price endpoint. A token whose id is
//! missing from the response keeps working on its configured default price.

use crate::tokens::TokenBook;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

#[async_trait]
pub trait PriceFeed: Send + Sync {
    /// USD price per requested id. Ids the feed does not know are absent.
    async fn fetch(&self, ids: &[String]) -> Result<HashMap<String, Decimal>>;
}

#[derive(Debug, Deserialize)]
struct SimplePrice {
    #[serde(default)]
    usd: Option<Decimal>,
}

pub struct CoinGeckoFeed {
    http: Client,
    base_url: String,
}

impl CoinGeckoFeed {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build price feed HTTP client")?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl PriceFeed for CoinGeckoFeed {
    async fn fetch(&self, ids: &[String]) -> Result<HashMap<String, Decimal>> {
        let url = format!("{}/simple/price", self.base_url);
        debug!(%url, ids = ids.len(), "requesting prices");

        let body: HashMap<String, SimplePrice> = self
            .http
            .get(&url)
            .query(&[("ids", ids.join(",")), ("vs_currencies", "usd".to_string())])
            .send()
            .await
            .with_context(|| format!("Price request to {url} failed"))?
            .error_for_status()
            .context("Price feed returned an error status")?
            .json()
            .await
            .context("Failed to parse price feed response")?;

        Ok(parse_quotes(body))
    }
}

fn parse_quotes(body: HashMap<String, SimplePrice>) -> HashMap<String, Decimal> {
    body.into_iter()
        .filter_map(|(id, quote)| quote.usd.map(|usd| (id, usd)))
        .collect()
}

/// Stores fresh quotes on the book; tokens without a quote get their default.
pub fn apply_prices(book: &mut TokenBook, quotes: &HashMap<String, Decimal>) {
    for (_, token) in book.iter_mut() {
        match quotes.get(&token.price_id) {
            Some(price) if !price.is_zero() => {
                token.price = Some(*price);
            }
            _ => {
                token.price = Some(token.default_price);
                warn!(
                    "token {} default price set: {}",
                    token.price_id, token.default_price
                );
            }
        }
    }
}

/// Defaults only for tokens that were never priced; cached prices stay.
pub fn apply_default_prices(book: &mut TokenBook) {
    for (_, token) in book.iter_mut() {
        if token.price.is_none() {
            token.price = Some(token.default_price);
        }
    }
}

pub async fn refresh_prices(book: &mut TokenBook, feed: &dyn PriceFeed) -> Result<()> {
    info!("updating token prices");
    let quotes = feed.fetch(&book.price_ids()).await?;
    apply_prices(book, &quotes);
    Ok(())
}

/// When prices were last refreshed. Owned by the batch loop and handed back
/// after each refresh instead of living in a global.
#[derive(Debug, Clone, Copy)]
pub struct PriceClock {
    interval: Duration,
    last_refresh: Option<Instant>,
}

impl PriceClock {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_refresh: None,
        }
    }

    pub fn is_due(&self, now: Instant) -> bool {
        match self.last_refresh {
            None => true,
            Some(last) => now.saturating_duration_since(last) > self.interval,
        }
    }

    pub fn refreshed_at(self, now: Instant) -> Self {
        Self {
            last_refresh: Some(now),
            ..self
        }
    }

    pub fn last_refresh(&self) -> Option<Instant> {
        self.last_refresh
    }
}
