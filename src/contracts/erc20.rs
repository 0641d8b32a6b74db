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
    interface IERC20 {
        function approve(address spender, uint256 amount) external returns (bool);
        function allowance(address owner, address spender) external view returns (uint256);
        function balanceOf(address account) external view returns (uint256);
    }
}

#[derive(Clone)]
pub struct ERC20Contract {
    address: Address,
    provider: Arc<dyn Provider<Ethereum>>,
}

impl ERC20Contract {
    pub fn new(address: Address, provider: Arc<dyn Provider<Ethereum>>) -> Self {
        Self { address, provider }
    }

    pub async fn balance_of(&self, account: Address) -> Result<U256> {
        let data = IERC20::balanceOfCall { account }.abi_encode();
        let result = view(self.provider.as_ref(), self.address, data).await?;
        Ok(IERC20::balanceOfCall::abi_decode_returns(&result)?)
    }

    pub async fn allowance(&self, owner: Address, spender: Address) -> Result<U256> {
        let data = IERC20::allowanceCall { owner, spender }.abi_encode();
        let result = view(self.provider.as_ref(), self.address, data).await?;
        Ok(IERC20::allowanceCall::abi_decode_returns(&result)?)
    }
}

/// Calldata for `approve(spender, amount)`.
pub fn approve_calldata(spender: Address, amount: U256) -> Vec<u8> {
    IERC20::approveCall { spender, amount }.abi_encode()
}
