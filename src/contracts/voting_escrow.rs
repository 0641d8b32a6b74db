use super::view;
use alloy::network::Ethereum;
use alloy::primitives::{Address, U256};
use alloy::providers::Provider;
use alloy::sol;
use alloy::sol_types::SolCall;
use anyhow::Result;
use std::sync::Arc;

sol! {
    #[sol(rpc)]
    interface IVotingEscrow {
        function createLock(uint256 _value, uint256 _lockDuration) external returns (uint256);
        function balanceOf(address _owner) external view returns (uint256);
        function ownerToNFTokenIdList(address _owner, uint256 _index) external view returns (uint256);
    }
}

#[derive(Clone)]
pub struct VotingEscrowContract {
    address: Address,
    provider: Arc<dyn Provider<Ethereum>>,
}

impl VotingEscrowContract {
    pub fn new(address: Address, provider: Arc<dyn Provider<Ethereum>>) -> Self {
        Self { address, provider }
    }

    pub async fn lock_count(&self, owner: Address) -> Result<U256> {
        let data = IVotingEscrow::balanceOfCall { _owner: owner }.abi_encode();
        let result = view(self.provider.as_ref(), self.address, data).await?;
        Ok(IVotingEscrow::balanceOfCall::abi_decode_returns(&result)?)
    }

    pub async fn token_of_owner(&self, owner: Address, index: U256) -> Result<U256> {
        let call = IVotingEscrow::ownerToNFTokenIdListCall {
            _owner: owner,
            _index: index,
        };
        let result = view(self.provider.as_ref(), self.address, call.abi_encode()).await?;
        Ok(IVotingEscrow::ownerToNFTokenIdListCall::abi_decode_returns(&result)?)
    }

    /// Id of the most recently created lock held by `owner`.
    pub async fn latest_token_id(&self, owner: Address) -> Result<U256> {
        let count = self.lock_count(owner).await?;
        if count.is_zero() {
            return Err(anyhow::anyhow!("No lock found for {}", owner));
        }
        self.token_of_owner(owner, count - U256::from(1)).await
    }
}
