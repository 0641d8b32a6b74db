use alloy::network::Ethereum;
use alloy::primitives::B256;
use alloy::providers::Provider;
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, timeout, MissedTickBehavior};
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct TransactionReceipt {
    pub hash: B256,
    pub block_number: u64,
    pub gas_used: u64,
    pub status: TransactionStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TransactionStatus {
    Success,
    Failed,
    Timeout,
}

/// Polls for a receipt until it lands or `max_wait_time` runs out.
pub struct TransactionMonitor {
    provider: Arc<dyn Provider<Ethereum>>,
    max_wait_time: Duration,
    poll_interval: Duration,
}

impl TransactionMonitor {
    pub fn new(provider: Arc<dyn Provider<Ethereum>>, max_wait_time: Duration, poll_interval: Duration) -> Self {
        Self {
            provider,
            max_wait_time,
            poll_interval,
        }
    }

    pub async fn monitor_transaction(&self, tx_hash: B256) -> Result<TransactionReceipt> {
        debug!("🔍 waiting for {}", tx_hash);

        match timeout(self.max_wait_time, self.poll_receipt(tx_hash)).await {
            Ok(receipt) => {
                info!("{} mined in block {} ({:?})", tx_hash, receipt.block_number, receipt.status);
                Ok(receipt)
            }
            Err(_) => {
                warn!("⏰ {} not mined after {:?}", tx_hash, self.max_wait_time);
                Ok(TransactionReceipt {
                    hash: tx_hash,
                    block_number: 0,
                    gas_used: 0,
                    status: TransactionStatus::Timeout,
                })
            }
        }
    }

    async fn poll_receipt(&self, tx_hash: B256) -> TransactionReceipt {
        let mut ticker = interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            match self.provider.get_transaction_receipt(tx_hash).await {
                Ok(Some(receipt)) => {
                    let status = if receipt.status() {
                        TransactionStatus::Success
                    } else {
                        TransactionStatus::Failed
                    };
                    return TransactionReceipt {
                        hash: tx_hash,
                        block_number: receipt.block_number.unwrap_or_default(),
                        gas_used: receipt.gas_used,
                        status,
                    };
                }
                Ok(None) => debug!("⏳ {} pending", tx_hash),
                Err(e) => warn!("receipt lookup for {} failed: {}", tx_hash, e),
            }
        }
    }
}

impl TransactionReceipt {
    /// Turns a non-successful receipt into an error so callers can retry.
    pub fn ensure_success(self) -> Result<Self> {
        match self.status {
            TransactionStatus::Success => Ok(self),
            TransactionStatus::Failed => Err(anyhow::anyhow!(
                "Transaction {} failed in block {}",
                self.hash,
                self.block_number
            )),
            TransactionStatus::Timeout => Err(anyhow::anyhow!(
                "Transaction {} monitoring timeout",
                self.hash
            )),
        }
    }
}
