pub mod accounts;
pub mod blockchain;
pub mod cli;
pub mod config;
pub mod contracts;
pub mod delay;
pub mod error;
pub mod intent;
pub mod jobs;
pub mod logging;
pub mod prices;
pub mod random;
pub mod retry;
pub mod runner;
pub mod tokens;
pub mod transaction_monitor;
pub mod units;

pub use accounts::{Account, FailureLog};
pub use blockchain::{BlockchainClient, ChainClient};
pub use config::ChainConfig;
pub use delay::{DelayRange, Pause, RandomPause};
pub use error::{FarmError, RandomError, UnitError};
pub use jobs::{AccountPipeline, PipelineWorker, RescueJob, RescueWorker};
pub use retry::{RetryConfig, RetryDriver, RetryOutcome, Settle};
pub use runner::{AccountWorker, BatchRunner, RunSummary, RunnerSettings};
pub use transaction_monitor::{TransactionMonitor, TransactionReceipt, TransactionStatus};
