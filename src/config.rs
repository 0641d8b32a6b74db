use crate::delay::DelayRange;
use crate::error::FarmError;
use crate::retry::RetryConfig;
use crate::tokens::{Token, TokenBook, GOVERNANCE, NATIVE, STABLE};
use alloy::primitives::Address;
use anyhow::{Context, Result};
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::PathBuf;
use toml::map::Map;

pub const COMMON_CONFIG_PATH: &str = "configs/common.toml";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChainConfig {
    pub chain: ChainSettings,
    pub contracts: ContractAddresses,
    pub tokens: BTreeMap<String, Token>,
    pub retry: RetrySettings,
    pub delays: DelaySettings,
    pub amounts: AmountSettings,
    pub lock: LockSettings,
    pub vote: VoteSettings,
    pub prices: PriceSettings,
    pub monitoring: MonitoringSettings,
    pub files: FileSettings,
    #[serde(default)]
    pub rescue: RescueSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChainSettings {
    pub chain_id: u64,
    pub rpc_url: String,
    pub explorer_url: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ContractAddresses {
    pub router: Address,
    pub pool_factory: Address,
    pub lending_pool: Address,
    pub voting_escrow: Address,
    pub voter: Address,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub backoff: DelayRange,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DelaySettings {
    pub startup: DelayRange,
    /// Between two transactions of one account.
    pub transaction: DelayRange,
    /// Between two accounts.
    pub account: DelayRange,
    /// Before re-reading a balance after a swap.
    pub balance_refresh: DelayRange,
}

/// Readable token amounts, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct AmountRange {
    pub min: Decimal,
    pub max: Decimal,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AmountSettings {
    pub stable_supply: AmountRange,
    pub native_swap: AmountRange,
    pub slippage_bps: u32,
    pub swap_deadline_seconds: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LockSettings {
    pub min_percent: u32,
    pub max_percent: u32,
    /// Lower bound of the upper lock limit, in base units.
    pub floor: u64,
    pub weeks: Vec<u64>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VoteSettings {
    pub pools: Vec<Address>,
    pub max_votes: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PriceSettings {
    pub base_url: String,
    pub refresh_interval_seconds: u64,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MonitoringSettings {
    pub transaction_timeout_seconds: u64,
    pub poll_interval_seconds: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FileSettings {
    pub private_keys: PathBuf,
    pub failed_keys: PathBuf,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RescueSettings {
    #[serde(default)]
    pub tokens: Vec<RescueToken>,
}

/// A leftover token swapped back to native by the rescue job.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RescueToken {
    pub symbol: String,
    pub address: Address,
    pub decimals: u32,
    /// Balances below this readable amount are left alone.
    pub min_swap: Decimal,
    #[serde(default)]
    pub stable: bool,
}

impl ChainConfig {
    pub fn load(path: &str) -> Result<Self> {
        Self::load_with_common(path, COMMON_CONFIG_PATH)
    }

    pub fn load_with_common(path: &str, common_path: &str) -> Result<Self> {
        // Load .env file if it exists
        dotenv::dotenv().ok();

        let common_content = Self::load_common_config(common_path)?;

        let specific_content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;

        // Specific config overrides common
        let merged_content = Self::merge_configs(common_content, specific_content)?;

        let content = Self::substitute_env_vars(merged_content)?;

        let config: ChainConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {path}"))?;
        config.validate()?;
        Ok(config)
    }

    fn load_common_config(common_path: &str) -> Result<String> {
        match fs::read_to_string(common_path) {
            Ok(content) => Ok(content),
            // A missing common file means the specific file stands alone
            Err(_) => Ok(String::new()),
        }
    }

    fn merge_configs(common: String, specific: String) -> Result<String> {
        if common.is_empty() {
            return Ok(specific);
        }

        let common_toml: toml::Value = toml::from_str(&common)?;
        let specific_toml: toml::Value = toml::from_str(&specific)?;

        let merged = Self::merge_toml_values(common_toml, specific_toml);

        let merged_toml = toml::to_string_pretty(&merged)?;
        Ok(merged_toml)
    }

    fn merge_toml_values(mut base: toml::Value, override_val: toml::Value) -> toml::Value {
        match (&mut base, override_val) {
            (toml::Value::Table(base_map), toml::Value::Table(override_map)) => {
                for (key, value) in override_map {
                    base_map.insert(key.clone(), Self::merge_toml_values(
                        base_map.get(&key).cloned().unwrap_or(toml::Value::Table(Map::new())),
                        value
                    ));
                }
                base
            }
            (_, override_val) => override_val,
        }
    }

    fn substitute_env_vars(content: String) -> Result<String> {
        let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")?;
        let mut result = content.clone();

        for cap in re.captures_iter(&content) {
            let var_name = &cap[1];
            if let Ok(value) = env::var(var_name) {
                let placeholder = cap[0].to_string();
                result = result.replace(&placeholder, &value);
            }
        }

        Ok(result)
    }

    pub fn validate(&self) -> Result<()> {
        if self.chain.rpc_url.contains("${") {
            return invalid(format!("unresolved variable in rpc_url: {}", self.chain.rpc_url));
        }
        for key in [NATIVE, STABLE, GOVERNANCE] {
            if !self.tokens.contains_key(key) {
                return invalid(format!("missing [tokens.{key}]"));
            }
        }
        for (name, range) in [
            ("delays.startup", self.delays.startup),
            ("delays.transaction", self.delays.transaction),
            ("delays.account", self.delays.account),
            ("delays.balance_refresh", self.delays.balance_refresh),
            ("retry.backoff", self.retry.backoff),
        ] {
            if !range.is_valid() {
                return invalid(format!("{name}: min {} > max {}", range.min, range.max));
            }
        }
        for (name, range) in [
            ("amounts.stable_supply", self.amounts.stable_supply),
            ("amounts.native_swap", self.amounts.native_swap),
        ] {
            if range.min.is_sign_negative() || range.min > range.max {
                return invalid(format!("{name}: invalid range {} - {}", range.min, range.max));
            }
        }
        if self.lock.min_percent > self.lock.max_percent || self.lock.max_percent > 100 {
            return invalid(format!(
                "lock percent range {} - {} is invalid",
                self.lock.min_percent, self.lock.max_percent
            ));
        }
        if self.lock.weeks.is_empty() {
            return invalid("lock.weeks must not be empty".into());
        }
        if self.vote.max_votes == 0 {
            return invalid("vote.max_votes must be at least 1".into());
        }
        if self.monitoring.poll_interval_seconds == 0 {
            return invalid("monitoring.poll_interval_seconds must be positive".into());
        }
        if self.amounts.slippage_bps > 10_000 {
            return invalid(format!("amounts.slippage_bps {} exceeds 10000", self.amounts.slippage_bps));
        }
        Ok(())
    }

    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig::new(self.retry.max_attempts, self.retry.backoff, self.delays.transaction)
    }

    pub fn token_book(&self) -> TokenBook {
        TokenBook::new(self.tokens.clone())
    }
}

fn invalid(msg: String) -> Result<()> {
    Err(FarmError::Config(msg).into())
}
