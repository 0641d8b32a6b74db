pub mod pipeline;
pub mod rescue;

pub use pipeline::{AccountPipeline, PipelineWorker, SwapReceipt};
pub use rescue::{RescueJob, RescueWorker};

use crate::accounts::Account;
use crate::blockchain::BlockchainClient;
use crate::config::ChainConfig;
use crate::delay::Pause;
use crate::error::FarmError;
use crate::retry::{RetryDriver, Settle};
use crate::tokens::Token;
use crate::units::{from_u256, Amount};
use alloy::primitives::U256;
use anyhow::Result;
use chrono::Utc;
use std::future::Future;

const BPS_DENOMINATOR: u32 = 10_000;

/// Opens an RPC connection for `account`, retrying like any other action.
pub(crate) async fn connect(
    config: &ChainConfig,
    pause: &dyn Pause,
    account: &Account,
) -> Result<BlockchainClient> {
    let retry = config.retry_config();
    let driver = RetryDriver::new(&retry, pause, &config.chain.explorer_url);
    let client = driver
        .execute(
            "Blockchain connection",
            || BlockchainClient::new(&config.chain.rpc_url, config.chain.chain_id, account, &config.monitoring),
            Settle::Skip,
        )
        .await?;
    Ok(client)
}

pub(crate) async fn read_amount<F, Fut>(
    driver: &RetryDriver<'_>,
    token: &Token,
    read: F,
) -> Result<Amount>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<U256>>,
{
    let raw = driver
        .execute(&format!("{} balance", token.symbol), read, Settle::Skip)
        .await?;
    let normalized = from_u256(raw).map_err(|e| FarmError::BalanceUnavailable {
        symbol: token.symbol.clone(),
        reason: e.to_string(),
    })?;
    Ok(Amount::from_normalized(normalized, token)?)
}

/// Lowest acceptable output for `quoted` after `slippage_bps`.
pub fn min_amount_out(quoted: U256, slippage_bps: u32) -> U256 {
    let keep = BPS_DENOMINATOR.saturating_sub(slippage_bps);
    quoted.saturating_mul(U256::from(keep)) / U256::from(BPS_DENOMINATOR)
}

pub fn deadline_after(seconds: u64) -> U256 {
    let now = u64::try_from(Utc::now().timestamp()).unwrap_or_default();
    U256::from(now.saturating_add(seconds))
}
