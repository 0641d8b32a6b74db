#![allow(dead_code)]

use alloy::primitives::{Address, B256, U256};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use ve_farmer::blockchain::ChainClient;
use ve_farmer::config::ChainConfig;
use ve_farmer::contracts::router::SwapHop;
use ve_farmer::delay::{DelayRange, Pause};
use ve_farmer::intent::TxIntent;

pub const KEY_ONE: &str = "0x0101010101010101010101010101010101010101010101010101010101010101";
pub const KEY_TWO: &str = "0x0202020202020202020202020202020202020202020202020202020202020202";

pub fn weth() -> Address {
    Address::repeat_byte(0xee)
}

pub fn usdc() -> Address {
    Address::repeat_byte(0xcc)
}

pub fn velo() -> Address {
    Address::repeat_byte(0x77)
}

pub const TEST_CONFIG: &str = r#"
[chain]
chain_id = 10
rpc_url = "http://localhost:8545"
explorer_url = "https://explorer.test/tx"

[contracts]
router = "0x000000000000000000000000000000000000a001"
pool_factory = "0x000000000000000000000000000000000000a002"
lending_pool = "0x000000000000000000000000000000000000a003"
voting_escrow = "0x000000000000000000000000000000000000a004"
voter = "0x000000000000000000000000000000000000a005"

[tokens.native]
symbol = "ETH"
address = "0xeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeee"
decimals = 18
price_id = "ethereum"
default_price = 2000

[tokens.stable]
symbol = "USDC"
address = "0xcccccccccccccccccccccccccccccccccccccccc"
decimals = 6
price_id = "usd-coin"
default_price = 1

[tokens.governance]
symbol = "VELO"
address = "0x7777777777777777777777777777777777777777"
decimals = 18
price_id = "velodrome-finance"
default_price = 0.05

[retry]
max_attempts = 2
backoff = { min = 10, max = 40 }

[delays]
startup = { min = 10, max = 10 }
transaction = { min = 10, max = 30 }
account = { min = 600, max = 1200 }
balance_refresh = { min = 2, max = 2 }

[amounts]
stable_supply = { min = 0.01, max = 0.1 }
native_swap = { min = 0.001, max = 0.006 }
slippage_bps = 100
swap_deadline_seconds = 600

[lock]
min_percent = 60
max_percent = 99
floor = 3
weeks = [4]

[vote]
pools = [
    "0x0000000000000000000000000000000000000b01",
    "0x0000000000000000000000000000000000000b02",
    "0x0000000000000000000000000000000000000b03",
]
max_votes = 2

[prices]
base_url = "https://prices.test"
refresh_interval_seconds = 1800
timeout_seconds = 5

[monitoring]
transaction_timeout_seconds = 60
poll_interval_seconds = 1

[files]
private_keys = "input/private_keys.txt"
failed_keys = "input/failed_keys.txt"

[[rescue.tokens]]
symbol = "VELO"
address = "0x7777777777777777777777777777777777777777"
decimals = 18
min_swap = 1
"#;

pub fn test_config() -> ChainConfig {
    let config: ChainConfig = toml::from_str(TEST_CONFIG).expect("test config parses");
    config.validate().expect("test config is valid");
    config
}

/// Returns instantly and remembers every range it was asked to wait for.
#[derive(Default)]
pub struct RecordingPause {
    waits: Mutex<Vec<DelayRange>>,
}

impl RecordingPause {
    pub fn waits(&self) -> Vec<DelayRange> {
        self.waits.lock().unwrap().clone()
    }
}

#[async_trait]
impl Pause for RecordingPause {
    async fn pause(&self, range: DelayRange) -> Result<Duration> {
        self.waits.lock().unwrap().push(range);
        Ok(Duration::from_secs(range.min))
    }
}

/// In-memory chain: swaps credit a fixed amount of the output token,
/// approvals set allowances, everything is recorded.
pub struct FakeChainClient {
    pub address: Address,
    pub native: U256,
    pub quote: U256,
    pub token_id: U256,
    balances: Mutex<HashMap<Address, U256>>,
    allowances: Mutex<HashMap<(Address, Address), U256>>,
    swap_credit: HashMap<Address, U256>,
    submitted: Mutex<Vec<TxIntent>>,
    failing_submits: AtomicU32,
}

impl FakeChainClient {
    pub fn new() -> Self {
        Self {
            address: Address::repeat_byte(0x42),
            native: U256::from(10u128.pow(18)),
            quote: U256::from(1_000u64),
            token_id: U256::from(7u64),
            balances: Mutex::new(HashMap::new()),
            allowances: Mutex::new(HashMap::new()),
            swap_credit: HashMap::new(),
            submitted: Mutex::new(Vec::new()),
            failing_submits: AtomicU32::new(0),
        }
    }

    pub fn with_balance(self, token: Address, amount: u128) -> Self {
        self.balances.lock().unwrap().insert(token, U256::from(amount));
        self
    }

    pub fn with_allowance(self, token: Address, spender: Address, amount: u128) -> Self {
        self.allowances
            .lock()
            .unwrap()
            .insert((token, spender), U256::from(amount));
        self
    }

    pub fn with_swap_credit(mut self, token: Address, amount: u128) -> Self {
        self.swap_credit.insert(token, U256::from(amount));
        self
    }

    /// The next `count` submissions are rejected.
    pub fn failing_submits(self, count: u32) -> Self {
        self.failing_submits.store(count, Ordering::SeqCst);
        self
    }

    pub fn submitted(&self) -> Vec<TxIntent> {
        self.submitted.lock().unwrap().clone()
    }

    pub fn labels(&self) -> Vec<&'static str> {
        self.submitted().iter().map(TxIntent::label).collect()
    }

    pub fn balance(&self, token: Address) -> U256 {
        self.balances
            .lock()
            .unwrap()
            .get(&token)
            .copied()
            .unwrap_or_default()
    }
}

#[async_trait]
impl ChainClient for FakeChainClient {
    fn address(&self) -> Address {
        self.address
    }

    async fn native_balance(&self) -> Result<U256> {
        Ok(self.native)
    }

    async fn token_balance(&self, token: Address) -> Result<U256> {
        Ok(self.balance(token))
    }

    async fn allowance(&self, token: Address, spender: Address) -> Result<U256> {
        Ok(self
            .allowances
            .lock()
            .unwrap()
            .get(&(token, spender))
            .copied()
            .unwrap_or_default())
    }

    async fn quote(&self, _router: Address, _amount_in: U256, route: &[SwapHop]) -> Result<U256> {
        if route.is_empty() {
            return Err(anyhow!("empty route"));
        }
        Ok(self.quote)
    }

    async fn escrow_token_id(&self, _escrow: Address) -> Result<U256> {
        Ok(self.token_id)
    }

    async fn submit(&self, intent: &TxIntent) -> Result<B256> {
        let pending_failures = self.failing_submits.load(Ordering::SeqCst);
        if pending_failures > 0 {
            self.failing_submits.store(pending_failures - 1, Ordering::SeqCst);
            return Err(anyhow!("execution reverted"));
        }

        match intent {
            TxIntent::Approve {
                token,
                spender,
                amount,
            } => {
                self.allowances
                    .lock()
                    .unwrap()
                    .insert((*token, *spender), *amount);
            }
            TxIntent::SwapExactNativeForTokens { route, .. } => {
                let out = route.last().map(|hop| hop.to).unwrap_or_default();
                let credit = self.swap_credit.get(&out).copied().unwrap_or_default();
                let mut balances = self.balances.lock().unwrap();
                let entry = balances.entry(out).or_default();
                *entry += credit;
            }
            TxIntent::SwapExactTokensForNative { route, amount_in, .. } => {
                let spent = route.first().map(|hop| hop.from).unwrap_or_default();
                let mut balances = self.balances.lock().unwrap();
                let entry = balances.entry(spent).or_default();
                *entry = entry.saturating_sub(*amount_in);
            }
            _ => {}
        }

        let mut submitted = self.submitted.lock().unwrap();
        submitted.push(intent.clone());
        Ok(B256::with_last_byte(submitted.len() as u8))
    }
}
