//! Typed transaction intents, one variant per action the pipeline takes.
//!
//! An intent is plain data until `to_request` turns it into calldata at the
//! chain boundary.

use crate::contracts::erc20::approve_calldata;
use crate::contracts::lending_pool::IPool;
use crate::contracts::router::{routes, IRouter, SwapHop};
use crate::contracts::voter::IVoter;
use crate::contracts::voting_escrow::IVotingEscrow;
use alloy::primitives::{Address, TxKind, U256};
use alloy::rpc::types::{TransactionInput, TransactionRequest};
use alloy::sol_types::SolCall;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxIntent {
    Approve {
        token: Address,
        spender: Address,
        amount: U256,
    },
    SwapExactNativeForTokens {
        router: Address,
        amount_in: U256,
        amount_out_min: U256,
        route: Vec<SwapHop>,
        recipient: Address,
        deadline: U256,
    },
    SwapExactTokensForNative {
        router: Address,
        amount_in: U256,
        amount_out_min: U256,
        route: Vec<SwapHop>,
        recipient: Address,
        deadline: U256,
    },
    Supply {
        pool: Address,
        asset: Address,
        amount: U256,
        on_behalf_of: Address,
    },
    CreateLock {
        escrow: Address,
        amount: U256,
        duration_secs: U256,
    },
    Vote {
        voter: Address,
        token_id: U256,
        pools: Vec<Address>,
        weights: Vec<U256>,
    },
}

impl TxIntent {
    pub fn label(&self) -> &'static str {
        match self {
            TxIntent::Approve { .. } => "approve",
            TxIntent::SwapExactNativeForTokens { .. } | TxIntent::SwapExactTokensForNative { .. } => {
                "swap"
            }
            TxIntent::Supply { .. } => "supply",
            TxIntent::CreateLock { .. } => "lock",
            TxIntent::Vote { .. } => "vote",
        }
    }

    pub fn target(&self) -> Address {
        match self {
            TxIntent::Approve { token, .. } => *token,
            TxIntent::SwapExactNativeForTokens { router, .. }
            | TxIntent::SwapExactTokensForNative { router, .. } => *router,
            TxIntent::Supply { pool, .. } => *pool,
            TxIntent::CreateLock { escrow, .. } => *escrow,
            TxIntent::Vote { voter, .. } => *voter,
        }
    }

    /// Native value attached to the call.
    pub fn value(&self) -> U256 {
        match self {
            TxIntent::SwapExactNativeForTokens { amount_in, .. } => *amount_in,
            _ => U256::ZERO,
        }
    }

    pub fn calldata(&self) -> Vec<u8> {
        match self {
            TxIntent::Approve {
                spender, amount, ..
            } => approve_calldata(*spender, *amount),
            TxIntent::SwapExactNativeForTokens {
                amount_out_min,
                route,
                recipient,
                deadline,
                ..
            } => IRouter::swapExactETHForTokensCall {
                amountOutMin: *amount_out_min,
                routes: routes(route),
                to: *recipient,
                deadline: *deadline,
            }
            .abi_encode(),
            TxIntent::SwapExactTokensForNative {
                amount_in,
                amount_out_min,
                route,
                recipient,
                deadline,
                ..
            } => IRouter::swapExactTokensForETHCall {
                amountIn: *amount_in,
                amountOutMin: *amount_out_min,
                routes: routes(route),
                to: *recipient,
                deadline: *deadline,
            }
            .abi_encode(),
            TxIntent::Supply {
                asset,
                amount,
                on_behalf_of,
                ..
            } => IPool::supplyCall {
                asset: *asset,
                amount: *amount,
                onBehalfOf: *on_behalf_of,
                referralCode: 0,
            }
            .abi_encode(),
            TxIntent::CreateLock {
                amount,
                duration_secs,
                ..
            } => IVotingEscrow::createLockCall {
                _value: *amount,
                _lockDuration: *duration_secs,
            }
            .abi_encode(),
            TxIntent::Vote {
                token_id,
                pools,
                weights,
                ..
            } => IVoter::voteCall {
                _tokenId: *token_id,
                _poolVote: pools.clone(),
                _weights: weights.clone(),
            }
            .abi_encode(),
        }
    }

    pub fn to_request(&self) -> TransactionRequest {
        let value = self.value();
        TransactionRequest {
            to: Some(TxKind::Call(self.target())),
            input: TransactionInput::new(self.calldata().into()),
            value: (!value.is_zero()).then_some(value),
            ..Default::default()
        }
    }
}
