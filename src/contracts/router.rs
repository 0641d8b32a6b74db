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
    interface IRouter {
        struct Route {
            address from;
            address to;
            bool stable;
            address factory;
        }

        function getAmountsOut(uint256 amountIn, Route[] memory routes) external view returns (uint256[] memory amounts);
        function swapExactETHForTokens(uint256 amountOutMin, Route[] calldata routes, address to, uint256 deadline) external payable returns (uint256[] memory amounts);
        function swapExactTokensForETH(uint256 amountIn, uint256 amountOutMin, Route[] calldata routes, address to, uint256 deadline) external returns (uint256[] memory amounts);
    }
}

/// One pool hop of a swap route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapHop {
    pub from: Address,
    pub to: Address,
    pub stable: bool,
    pub factory: Address,
}

impl From<&SwapHop> for IRouter::Route {
    fn from(hop: &SwapHop) -> Self {
        IRouter::Route {
            from: hop.from,
            to: hop.to,
            stable: hop.stable,
            factory: hop.factory,
        }
    }
}

pub fn routes(hops: &[SwapHop]) -> Vec<IRouter::Route> {
    hops.iter().map(IRouter::Route::from).collect()
}

#[derive(Clone)]
pub struct RouterContract {
    address: Address,
    provider: Arc<dyn Provider<Ethereum>>,
}

impl RouterContract {
    pub fn new(address: Address, provider: Arc<dyn Provider<Ethereum>>) -> Self {
        Self { address, provider }
    }

    /// Expected output of the last hop for `amount_in`.
    pub async fn get_amount_out(&self, amount_in: U256, hops: &[SwapHop]) -> Result<U256> {
        let call = IRouter::getAmountsOutCall {
            amountIn: amount_in,
            routes: routes(hops),
        };
        let result = view(self.provider.as_ref(), self.address, call.abi_encode()).await?;

        let amounts = IRouter::getAmountsOutCall::abi_decode_returns(&result)?;
        amounts
            .last()
            .copied()
            .ok_or_else(|| anyhow::anyhow!("Router returned no amounts"))
    }
}
