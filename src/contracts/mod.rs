pub mod erc20;
pub mod lending_pool;
pub mod router;
pub mod voter;
pub mod voting_escrow;

pub use erc20::ERC20Contract;
pub use router::RouterContract;
pub use voting_escrow::VotingEscrowContract;

use alloy::network::Ethereum;
use alloy::primitives::{Address, Bytes, TxKind};
use alloy::providers::Provider;
use alloy::rpc::types::{TransactionInput, TransactionRequest};
use anyhow::Result;

/// Read-only `eth_call` against `to` at the latest block.
pub(crate) async fn view(
    provider: &dyn Provider<Ethereum>,
    to: Address,
    data: Vec<u8>,
) -> Result<Bytes> {
    let result = provider
        .call(TransactionRequest {
            to: Some(TxKind::Call(to)),
            input: TransactionInput::new(Bytes::from(data)),
            ..Default::default()
        })
        .await?;
    Ok(result)
}
