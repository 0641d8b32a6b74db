use crate::error::FarmError;
use alloy::primitives::Address;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const NATIVE: &str = "native";
pub const STABLE: &str = "stable";
pub const GOVERNANCE: &str = "governance";

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Token {
    pub symbol: String,
    /// For the native coin this is the wrapped token used in swap routes.
    pub address: Address,
    pub decimals: u32,
    /// CoinGecko id.
    pub price_id: String,
    pub default_price: Decimal,
    #[serde(skip)]
    pub price: Option<Decimal>,
}

impl Token {
    pub fn usd_price(&self) -> Decimal {
        self.price.unwrap_or(self.default_price)
    }
}

/// Token descriptors keyed by the role they play in the pipeline.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenBook {
    tokens: BTreeMap<String, Token>,
}

impl TokenBook {
    pub fn new(tokens: BTreeMap<String, Token>) -> Self {
        Self { tokens }
    }

    pub fn get(&self, key: &str) -> Result<&Token, FarmError> {
        self.tokens
            .get(key)
            .ok_or_else(|| FarmError::UnknownToken(key.to_string()))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&String, &mut Token)> {
        self.tokens.iter_mut()
    }

    pub fn price_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.tokens.values().map(|t| t.price_id.clone()).collect();
        ids.sort();
        ids.dedup();
        ids
    }
}
