use crate::accounts::Account;
use crate::blockchain::ChainClient;
use crate::config::{AmountRange, ChainConfig, LockSettings, VoteSettings};
use crate::contracts::router::SwapHop;
use crate::delay::{DelayRange, Pause};
use crate::error::{FarmError, UnitError};
use crate::intent::TxIntent;
use crate::jobs::{connect, deadline_after, min_amount_out, read_amount};
use crate::random::{partition_sum, random_choice, random_choices, random_int};
use crate::retry::{RetryConfig, RetryDriver, Settle, TxReport};
use crate::runner::AccountWorker;
use crate::tokens::{Token, TokenBook, GOVERNANCE, NATIVE, STABLE};
use crate::units::{from_u256, to_normalized, to_readable, Amount};
use alloy::primitives::{Address, B256, U256};
use anyhow::Result;
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info, warn};

const SECONDS_PER_WEEK: u64 = 7 * 24 * 60 * 60;
const VOTE_WEIGHT_TOTAL: u64 = 100;

/// Hash of a swap plus what it actually delivered to the wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapReceipt {
    pub hash: B256,
    pub amount_out: U256,
}

impl TxReport for SwapReceipt {
    fn tx_hash(&self) -> Option<B256> {
        Some(self.hash)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StablePurchase {
    /// Stable base units the swap is sized for.
    pub stable_out: u128,
    /// Native base units paid for them.
    pub native_in: u128,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockPlan {
    pub amount: u128,
    pub weeks: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VotePlan {
    pub pools: Vec<Address>,
    pub weights: Vec<u64>,
}

/// Random base-unit amount inside a readable range of `token`.
pub fn plan_amount<R: Rng + ?Sized>(
    rng: &mut R,
    range: &AmountRange,
    token: &Token,
) -> Result<u128, FarmError> {
    let low = to_normalized(range.min, token.decimals)?;
    let high = to_normalized(range.max, token.decimals)?;
    Ok(random_int(rng, low, high)?)
}

/// Sizes a stable purchase and prices it in native at the cached USD rate.
pub fn plan_stable_purchase<R: Rng + ?Sized>(
    rng: &mut R,
    range: &AmountRange,
    native: &Token,
    stable: &Token,
) -> Result<StablePurchase, FarmError> {
    let stable_out = plan_amount(rng, range, stable)?;
    let price = native.usd_price();
    if price.is_sign_negative() || price.is_zero() {
        return Err(FarmError::Config(format!(
            "{} has no usable USD price",
            native.symbol
        )));
    }
    let native_readable = to_readable(stable_out, stable.decimals)? / price;
    Ok(StablePurchase {
        stable_out,
        native_in: to_normalized(native_readable, native.decimals)?,
    })
}

/// Supply amount between the configured minimum and the whole balance.
pub fn plan_supply<R: Rng + ?Sized>(
    rng: &mut R,
    min: &AmountRange,
    balance: u128,
    token: &Token,
) -> Result<u128, FarmError> {
    let low = to_normalized(min.min, token.decimals)?;
    Ok(random_int(rng, low, balance)?)
}

fn percent_of(amount: u128, percent: u32) -> Result<u128, FarmError> {
    amount
        .checked_mul(u128::from(percent))
        .and_then(|v| v.checked_add(50))
        .map(|v| v / 100)
        .ok_or_else(|| UnitError::Overflow(amount.to_string()).into())
}

/// Lock size and duration for `received` governance base units.
///
/// The upper limit never drops below `lock.floor`, so even a dust swap
/// produces a lock the escrow accepts.
pub fn plan_lock<R: Rng + ?Sized>(
    rng: &mut R,
    received: u128,
    lock: &LockSettings,
) -> Result<LockPlan, FarmError> {
    let low = percent_of(received, lock.min_percent)?;
    let high = percent_of(received, lock.max_percent)?.max(u128::from(lock.floor));
    let amount = random_int(rng, low, high)?;
    let weeks = *random_choice(rng, &lock.weeks)?;
    Ok(LockPlan { amount, weeks })
}

/// Picks up to `max_votes` pools and splits 100 weight points across them.
/// Every picked pool gets at least one point.
pub fn plan_vote<R: Rng + ?Sized>(rng: &mut R, vote: &VoteSettings) -> Result<VotePlan, FarmError> {
    let upper = vote
        .max_votes
        .min(vote.pools.len())
        .min(VOTE_WEIGHT_TOTAL as usize);
    let count = random_int(rng, 1usize, upper)?;
    let pools = random_choices(rng, &vote.pools, count)?;
    let weights = partition_sum(rng, count, VOTE_WEIGHT_TOTAL)?;
    Ok(VotePlan { pools, weights })
}

/// The farming sequence for one account: top up stable, lend it, buy the
/// governance token, lock it and vote with the lock.
pub struct AccountPipeline<'a> {
    config: &'a ChainConfig,
    retry: RetryConfig,
    pause: &'a dyn Pause,
    rng: Mutex<StdRng>,
}

impl<'a> AccountPipeline<'a> {
    pub fn new(config: &'a ChainConfig, pause: &'a dyn Pause) -> Self {
        Self {
            config,
            retry: config.retry_config(),
            pause,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = Mutex::new(rng);
        self
    }

    fn sample<T>(&self, draw: impl FnOnce(&mut StdRng) -> T) -> T {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        draw(&mut rng)
    }

    pub async fn run(&self, client: &dyn ChainClient, tokens: &TokenBook) -> Result<()> {
        let driver = RetryDriver::new(&self.retry, self.pause, &self.config.chain.explorer_url);
        let native = tokens.get(NATIVE)?;
        let stable = tokens.get(STABLE)?;
        let governance = tokens.get(GOVERNANCE)?;

        let native_balance = read_amount(&driver, native, || client.native_balance()).await?;
        let mut stable_balance =
            read_amount(&driver, stable, || client.token_balance(stable.address)).await?;
        info!(
            "💰 {} {} (${}) | {} {} (${})",
            native_balance.readable,
            native.symbol,
            native_balance.usd,
            stable_balance.readable,
            stable.symbol,
            stable_balance.usd
        );

        if stable_balance.readable < self.config.amounts.stable_supply.min {
            self.buy_stable(&driver, client, native, stable).await?;
            self.wait(self.config.delays.balance_refresh).await;
            stable_balance =
                read_amount(&driver, stable, || client.token_balance(stable.address)).await?;
            info!(
                "💰 new {} balance: {} (${})",
                stable.symbol, stable_balance.readable, stable_balance.usd
            );
            self.wait(self.config.delays.transaction).await;
        }

        self.lend(&driver, client, stable, &stable_balance).await?;
        let receipt = self.buy_governance(&driver, client, native, governance).await?;
        self.lock(&driver, client, governance, receipt.amount_out).await?;
        self.vote(&driver, client).await?;
        Ok(())
    }

    async fn buy_stable(
        &self,
        driver: &RetryDriver<'_>,
        client: &dyn ChainClient,
        native: &Token,
        stable: &Token,
    ) -> Result<()> {
        let purchase = self.sample(|rng| {
            plan_stable_purchase(rng, &self.config.amounts.stable_supply, native, stable)
        })?;
        let paid = Amount::from_normalized(purchase.native_in, native)?;
        let wanted = to_readable(purchase.stable_out, stable.decimals)?;

        let route = [self.hop(native, stable)];
        let route = &route;
        let amount_in = U256::from(purchase.native_in);
        let name = format!("swap {} {} -> {}", paid.readable, native.symbol, stable.symbol);

        driver
            .execute(
                &name,
                || async move {
                    let quoted = client.quote(self.config.contracts.router, amount_in, route).await?;
                    let intent = TxIntent::SwapExactNativeForTokens {
                        router: self.config.contracts.router,
                        amount_in,
                        amount_out_min: min_amount_out(quoted, self.config.amounts.slippage_bps),
                        route: route.to_vec(),
                        recipient: client.address(),
                        deadline: deadline_after(self.config.amounts.swap_deadline_seconds),
                    };
                    client.submit(&intent).await
                },
                Settle::Skip,
            )
            .await?;

        info!(
            "🔄 swapped {} {} (${}) for ~{} {}",
            paid.readable, native.symbol, paid.usd, wanted, stable.symbol
        );
        Ok(())
    }

    async fn lend(
        &self,
        driver: &RetryDriver<'_>,
        client: &dyn ChainClient,
        stable: &Token,
        balance: &Amount,
    ) -> Result<()> {
        let normalized = self.sample(|rng| {
            plan_supply(rng, &self.config.amounts.stable_supply, balance.normalized, stable)
        })?;
        let amount = Amount::from_normalized(normalized, stable)?;
        let pool = self.config.contracts.lending_pool;

        approve(driver, client, &stable.symbol, stable.address, pool, U256::from(normalized)).await?;

        let value = U256::from(normalized);
        driver
            .execute(
                &format!("supply {} {}", amount.readable, stable.symbol),
                || async move {
                    let intent = TxIntent::Supply {
                        pool,
                        asset: stable.address,
                        amount: value,
                        on_behalf_of: client.address(),
                    };
                    client.submit(&intent).await
                },
                Settle::Wait,
            )
            .await?;

        info!("🏦 supplied {} {} (${})", amount.readable, stable.symbol, amount.usd);
        Ok(())
    }

    async fn buy_governance(
        &self,
        driver: &RetryDriver<'_>,
        client: &dyn ChainClient,
        native: &Token,
        governance: &Token,
    ) -> Result<SwapReceipt> {
        let normalized =
            self.sample(|rng| plan_amount(rng, &self.config.amounts.native_swap, native))?;
        let paid = Amount::from_normalized(normalized, native)?;

        let route = [self.hop(native, governance)];
        let route = &route;
        let amount_in = U256::from(normalized);
        let name = format!("swap {} {} -> {}", paid.readable, native.symbol, governance.symbol);

        let receipt = driver
            .execute(
                &name,
                || async move {
                    let before = client.token_balance(governance.address).await?;
                    let quoted = client.quote(self.config.contracts.router, amount_in, route).await?;
                    let intent = TxIntent::SwapExactNativeForTokens {
                        router: self.config.contracts.router,
                        amount_in,
                        amount_out_min: min_amount_out(quoted, self.config.amounts.slippage_bps),
                        route: route.to_vec(),
                        recipient: client.address(),
                        deadline: deadline_after(self.config.amounts.swap_deadline_seconds),
                    };
                    let hash = client.submit(&intent).await?;
                    let after = client.token_balance(governance.address).await?;
                    Ok(SwapReceipt {
                        hash,
                        amount_out: after.saturating_sub(before),
                    })
                },
                Settle::Wait,
            )
            .await?;

        let received = Amount::from_normalized(from_u256(receipt.amount_out)?, governance)?;
        info!(
            "🔄 swapped {} {} (${}) for {} {} (${})",
            paid.readable,
            native.symbol,
            paid.usd,
            received.readable,
            governance.symbol,
            received.usd
        );
        Ok(receipt)
    }

    async fn lock(
        &self,
        driver: &RetryDriver<'_>,
        client: &dyn ChainClient,
        governance: &Token,
        received: U256,
    ) -> Result<()> {
        let received = from_u256(received)?;
        let plan = self.sample(|rng| plan_lock(rng, received, &self.config.lock))?;
        let amount = Amount::from_normalized(plan.amount, governance)?;
        let escrow = self.config.contracts.voting_escrow;
        let value = U256::from(plan.amount);

        approve(driver, client, &governance.symbol, governance.address, escrow, value).await?;

        let duration_secs = U256::from(plan.weeks.saturating_mul(SECONDS_PER_WEEK));
        driver
            .execute(
                &format!("lock {} {}", amount.readable, governance.symbol),
                || async move {
                    let intent = TxIntent::CreateLock {
                        escrow,
                        amount: value,
                        duration_secs,
                    };
                    client.submit(&intent).await
                },
                Settle::Wait,
            )
            .await?;

        info!(
            "🔒 locked {} {} (${}) for {} weeks",
            amount.readable, governance.symbol, amount.usd, plan.weeks
        );
        Ok(())
    }

    async fn vote(&self, driver: &RetryDriver<'_>, client: &dyn ChainClient) -> Result<()> {
        let plan = self.sample(|rng| plan_vote(rng, &self.config.vote))?;
        let weights: Vec<U256> = plan.weights.iter().map(|w| U256::from(*w)).collect();
        let weights = &weights;
        let pools = &plan.pools;
        let voter = self.config.contracts.voter;
        let escrow = self.config.contracts.voting_escrow;

        driver
            .execute(
                &format!("vote for {} pools", pools.len()),
                || async move {
                    let token_id = client.escrow_token_id(escrow).await?;
                    debug!("voting with escrow token {}", token_id);
                    let intent = TxIntent::Vote {
                        voter,
                        token_id,
                        pools: pools.clone(),
                        weights: weights.clone(),
                    };
                    client.submit(&intent).await
                },
                Settle::Wait,
            )
            .await?;

        info!("🗳️ voted {:?} with weights {:?}", plan.pools, plan.weights);
        Ok(())
    }

    fn hop(&self, from: &Token, to: &Token) -> SwapHop {
        SwapHop {
            from: from.address,
            to: to.address,
            stable: false,
            factory: self.config.contracts.pool_factory,
        }
    }

    async fn wait(&self, range: DelayRange) {
        if let Err(e) = self.pause.pause(range).await {
            warn!("skipping wait {}-{}s: {:#}", range.min, range.max, e);
        }
    }
}

/// Approves `spender` for `amount` unless the allowance already covers it.
pub async fn approve(
    driver: &RetryDriver<'_>,
    client: &dyn ChainClient,
    symbol: &str,
    token: Address,
    spender: Address,
    amount: U256,
) -> Result<Option<B256>> {
    let hash = driver
        .execute(
            &format!("approve {symbol}"),
            || async move {
                let current = client.allowance(token, spender).await?;
                if current >= amount {
                    debug!("{} allowance {} already covers {}", symbol, current, amount);
                    return Ok(None);
                }
                let intent = TxIntent::Approve {
                    token,
                    spender,
                    amount,
                };
                client.submit(&intent).await.map(Some)
            },
            Settle::Wait,
        )
        .await?;
    Ok(hash)
}

/// Runs [`AccountPipeline`] for each account on a fresh RPC connection.
pub struct PipelineWorker {
    config: ChainConfig,
    pause: Arc<dyn Pause>,
}

impl PipelineWorker {
    /// Fails fast when there is nothing to vote for, before any gas is spent.
    pub fn new(config: ChainConfig, pause: Arc<dyn Pause>) -> Result<Self> {
        if config.vote.pools.is_empty() {
            return Err(FarmError::Config(
                "vote.pools is empty; list the gauge-bearing pools to vote for under [vote] in the chain config before using `run`".into(),
            )
            .into());
        }
        Ok(Self { config, pause })
    }
}

#[async_trait]
impl AccountWorker for PipelineWorker {
    async fn run_account(&self, account: &Account, tokens: &TokenBook) -> Result<()> {
        let client = connect(&self.config, self.pause.as_ref(), account).await?;
        AccountPipeline::new(&self.config, self.pause.as_ref())
            .run(&client, tokens)
            .await
    }
}
