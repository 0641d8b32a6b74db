use crate::accounts::Account;
use crate::blockchain::ChainClient;
use crate::config::{ChainConfig, RescueToken};
use crate::contracts::router::SwapHop;
use crate::delay::Pause;
use crate::intent::TxIntent;
use crate::jobs::pipeline::approve;
use crate::jobs::{connect, deadline_after, min_amount_out};
use crate::retry::{RetryConfig, RetryDriver, Settle};
use crate::runner::AccountWorker;
use crate::tokens::{Token, TokenBook, NATIVE};
use crate::units::{from_u256, to_readable};
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

/// Swaps leftover tokens back to native so the wallet can be reused.
pub struct RescueJob<'a> {
    config: &'a ChainConfig,
    retry: RetryConfig,
    pause: &'a dyn Pause,
}

impl<'a> RescueJob<'a> {
    pub fn new(config: &'a ChainConfig, pause: &'a dyn Pause) -> Self {
        Self {
            config,
            retry: config.retry_config(),
            pause,
        }
    }

    /// Returns how many tokens were swapped.
    pub async fn run(&self, client: &dyn ChainClient, tokens: &TokenBook) -> Result<usize> {
        let driver = RetryDriver::new(&self.retry, self.pause, &self.config.chain.explorer_url);
        let native = tokens.get(NATIVE)?;
        let mut swapped = 0;

        for token in &self.config.rescue.tokens {
            if self.rescue(&driver, client, native, token).await? {
                swapped += 1;
            }
        }

        info!("🧹 rescued {} of {} tokens", swapped, self.config.rescue.tokens.len());
        Ok(swapped)
    }

    async fn rescue(
        &self,
        driver: &RetryDriver<'_>,
        client: &dyn ChainClient,
        native: &Token,
        token: &RescueToken,
    ) -> Result<bool> {
        let raw = driver
            .execute(
                &format!("{} balance", token.symbol),
                || client.token_balance(token.address),
                Settle::Skip,
            )
            .await?;
        let readable = to_readable(from_u256(raw)?, token.decimals)?;

        if raw.is_zero() || readable < token.min_swap {
            info!("{} balance {} below {}, skipping", token.symbol, readable, token.min_swap);
            return Ok(false);
        }

        let router = self.config.contracts.router;
        approve(driver, client, &token.symbol, token.address, router, raw).await?;

        let route = [SwapHop {
            from: token.address,
            to: native.address,
            stable: token.stable,
            factory: self.config.contracts.pool_factory,
        }];
        let route = &route;

        driver
            .execute(
                &format!("swap {} {} -> {}", readable, token.symbol, native.symbol),
                || async move {
                    let quoted = client.quote(router, raw, route).await?;
                    let intent = TxIntent::SwapExactTokensForNative {
                        router,
                        amount_in: raw,
                        amount_out_min: min_amount_out(quoted, self.config.amounts.slippage_bps),
                        route: route.to_vec(),
                        recipient: client.address(),
                        deadline: deadline_after(self.config.amounts.swap_deadline_seconds),
                    };
                    client.submit(&intent).await
                },
                Settle::Wait,
            )
            .await?;

        info!("🔄 swapped {} {} to {}", readable, token.symbol, native.symbol);
        Ok(true)
    }
}

pub struct RescueWorker {
    config: ChainConfig,
    pause: Arc<dyn Pause>,
}

impl RescueWorker {
    pub fn new(config: ChainConfig, pause: Arc<dyn Pause>) -> Self {
        Self { config, pause }
    }
}

#[async_trait]
impl AccountWorker for RescueWorker {
    async fn run_account(&self, account: &Account, tokens: &TokenBook) -> Result<()> {
        let client = connect(&self.config, self.pause.as_ref(), account).await?;
        RescueJob::new(&self.config, self.pause.as_ref())
            .run(&client, tokens)
            .await?;
        Ok(())
    }
}
