use crate::accounts::{Account, FailureLog};
use crate::config::ChainConfig;
use crate::delay::{DelayRange, Pause};
use crate::prices::{apply_default_prices, refresh_prices, PriceClock, PriceFeed};
use crate::tokens::TokenBook;
use anyhow::Result;
use async_trait::async_trait;
use secrecy::SecretString;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

/// One unit of per-account work the batch runner drives.
#[async_trait]
pub trait AccountWorker: Send + Sync {
    async fn run_account(&self, account: &Account, tokens: &TokenBook) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunnerSettings {
    pub startup: DelayRange,
    pub between_accounts: DelayRange,
    pub price_refresh: Duration,
}

impl RunnerSettings {
    pub fn from_config(config: &ChainConfig) -> Self {
        Self {
            startup: config.delays.startup,
            between_accounts: config.delays.account,
            price_refresh: Duration::from_secs(config.prices.refresh_interval_seconds),
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
}

/// Walks the key list in order, one account at a time.
///
/// A failing account never stops the batch: its secret goes to the failure
/// file and the next account starts after the usual pause.
pub struct BatchRunner<'a> {
    settings: RunnerSettings,
    pause: &'a dyn Pause,
    feed: &'a dyn PriceFeed,
    failures: FailureLog,
}

impl<'a> BatchRunner<'a> {
    pub fn new(
        settings: RunnerSettings,
        pause: &'a dyn Pause,
        feed: &'a dyn PriceFeed,
        failures: FailureLog,
    ) -> Self {
        Self {
            settings,
            pause,
            feed,
            failures,
        }
    }

    pub async fn run(
        &self,
        secrets: &[SecretString],
        worker: &dyn AccountWorker,
        tokens: &mut TokenBook,
    ) -> Result<RunSummary> {
        let mut summary = RunSummary {
            total: secrets.len(),
            ..Default::default()
        };
        info!("🚀 found {} private keys", secrets.len());
        if secrets.is_empty() {
            return Ok(summary);
        }

        self.wait(self.settings.startup).await;

        let mut clock = PriceClock::new(self.settings.price_refresh);
        for (index, secret) in secrets.iter().enumerate() {
            clock = self.refresh_if_due(clock, tokens, Instant::now()).await;

            match self.run_one(index, secret, worker, tokens).await {
                Ok(()) => {
                    summary.succeeded += 1;
                    info!("✅ account {} done", index + 1);
                }
                Err(e) => {
                    summary.failed += 1;
                    error!("❌ account {} failed: {:#}", index + 1, e);
                    if let Err(e) = self.failures.record(secret) {
                        error!("could not record failed key: {:#}", e);
                    }
                }
            }

            if index + 1 < secrets.len() {
                self.wait(self.settings.between_accounts).await;
            }
        }

        info!(
            "🏁 finished {} accounts: {} succeeded, {} failed",
            summary.total, summary.succeeded, summary.failed
        );
        Ok(summary)
    }

    async fn run_one(
        &self,
        index: usize,
        secret: &SecretString,
        worker: &dyn AccountWorker,
        tokens: &TokenBook,
    ) -> Result<()> {
        let account = Account::from_secret(secret.clone())?;
        info!("👤 starting account {}: {}", index + 1, account.address());
        worker.run_account(&account, tokens).await
    }

    /// Refreshes prices when the clock says so. A failed refresh falls back
    /// to default prices and leaves the clock alone so the next account
    /// tries again.
    pub async fn refresh_if_due(
        &self,
        clock: PriceClock,
        tokens: &mut TokenBook,
        now: Instant,
    ) -> PriceClock {
        if !clock.is_due(now) {
            return clock;
        }
        match refresh_prices(tokens, self.feed).await {
            Ok(()) => clock.refreshed_at(now),
            Err(e) => {
                warn!("price refresh failed, using defaults: {:#}", e);
                apply_default_prices(tokens);
                clock
            }
        }
    }

    async fn wait(&self, range: DelayRange) {
        if let Err(e) = self.pause.pause(range).await {
            warn!("skipping wait {}-{}s: {:#}", range.min, range.max, e);
        }
    }
}
