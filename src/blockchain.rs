use crate::accounts::Account;
use crate::config::MonitoringSettings;
use crate::contracts::router::SwapHop;
use crate::contracts::{ERC20Contract, RouterContract, VotingEscrowContract};
use crate::intent::TxIntent;
use crate::retry::TxReport;
use crate::transaction_monitor::TransactionMonitor;
use alloy::network::Ethereum;
use alloy::primitives::{Address, B256, U256};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::signers::Signer;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// Gas estimate headroom, in percent.
const GAS_HEADROOM_PERCENT: u64 = 120;

/// Everything the pipelines need from the chain, bound to one account.
#[async_trait]
pub trait ChainClient: Send + Sync {
    fn address(&self) -> Address;

    async fn native_balance(&self) -> Result<U256>;

    async fn token_balance(&self, token: Address) -> Result<U256>;

    async fn allowance(&self, token: Address, spender: Address) -> Result<U256>;

    /// Router quote for the final hop of `route`.
    async fn quote(&self, router: Address, amount_in: U256, route: &[SwapHop]) -> Result<U256>;

    /// Id of the newest lock the account holds in `escrow`.
    async fn escrow_token_id(&self, escrow: Address) -> Result<U256>;

    /// Signs, sends and waits for the transaction; reverts are errors.
    async fn submit(&self, intent: &TxIntent) -> Result<B256>;
}

pub struct BlockchainClient {
    provider: Arc<dyn Provider<Ethereum>>,
    address: Address,
    monitor: TransactionMonitor,
}

impl BlockchainClient {
    pub async fn new(
        rpc_url: &str,
        expected_chain_id: u64,
        account: &Account,
        monitoring: &MonitoringSettings,
    ) -> Result<Self> {
        debug!("🔗 Connecting to RPC: {}", rpc_url);

        let url = Url::parse(rpc_url)?;

        let signer = account.signer().clone().with_chain_id(Some(expected_chain_id));
        let address = signer.address();

        let provider = ProviderBuilder::new().wallet(signer).connect_http(url);

        let chain_id = provider.get_chain_id().await?;
        if chain_id != expected_chain_id {
            return Err(anyhow::anyhow!(
                "Chain ID mismatch: expected {}, got {}",
                expected_chain_id, chain_id
            ));
        }

        let provider: Arc<dyn Provider<Ethereum>> = Arc::new(provider);
        let monitor = TransactionMonitor::new(
            provider.clone(),
            Duration::from_secs(monitoring.transaction_timeout_seconds),
            Duration::from_secs(monitoring.poll_interval_seconds),
        );

        info!("🔑 Connected to chain {} as {}", expected_chain_id, address);

        Ok(Self {
            provider,
            address,
            monitor,
        })
    }

    pub fn provider(&self) -> Arc<dyn Provider<Ethereum>> {
        self.provider.clone()
    }
}

impl TxReport for BlockchainClient {}

#[async_trait]
impl ChainClient for BlockchainClient {
    fn address(&self) -> Address {
        self.address
    }

    async fn native_balance(&self) -> Result<U256> {
        let balance = self.provider.get_balance(self.address).await?;
        Ok(balance)
    }

    async fn token_balance(&self, token: Address) -> Result<U256> {
        ERC20Contract::new(token, self.provider())
            .balance_of(self.address)
            .await
            .with_context(|| format!("Failed to read balance of token {token}"))
    }

    async fn allowance(&self, token: Address, spender: Address) -> Result<U256> {
        ERC20Contract::new(token, self.provider())
            .allowance(self.address, spender)
            .await
    }

    async fn quote(&self, router: Address, amount_in: U256, route: &[SwapHop]) -> Result<U256> {
        RouterContract::new(router, self.provider())
            .get_amount_out(amount_in, route)
            .await
    }

    async fn escrow_token_id(&self, escrow: Address) -> Result<U256> {
        VotingEscrowContract::new(escrow, self.provider())
            .latest_token_id(self.address)
            .await
    }

    async fn submit(&self, intent: &TxIntent) -> Result<B256> {
        let mut tx = intent.to_request().from(self.address);

        let estimated = self
            .provider
            .estimate_gas(tx.clone())
            .await
            .with_context(|| format!("Gas estimation for {} failed", intent.label()))?;
        tx.gas = Some(estimated.saturating_mul(GAS_HEADROOM_PERCENT) / 100);

        let pending = self.provider.send_transaction(tx).await?;
        let tx_hash = *pending.tx_hash();
        debug!("{} transaction sent: {}", intent.label(), tx_hash);

        let receipt = self.monitor.monitor_transaction(tx_hash).await?;
        receipt.ensure_success()?;
        Ok(tx_hash)
    }
}
