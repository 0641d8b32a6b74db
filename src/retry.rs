use crate::delay::{DelayRange, Pause};
use crate::error::FarmError;
use alloy::primitives::{B256, U256};
use std::future::Future;
use tracing::{error, info, warn};

#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_attempts: u32,
    /// Wait after a failed attempt.
    pub backoff: DelayRange,
    /// Wait after a successful action, before the next one starts.
    pub settle: DelayRange,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: DelayRange::new(10, 40), // Default values - overridden by TOML config in production
            settle: DelayRange::new(10, 30),
        }
    }
}

impl RetryConfig {
    pub fn new(max_attempts: u32, backoff: DelayRange, settle: DelayRange) -> Self {
        Self {
            max_attempts,
            backoff,
            settle,
        }
    }
}

/// Anything an action can hand back; a hash gets logged as an explorer link.
pub trait TxReport {
    fn tx_hash(&self) -> Option<B256> {
        None
    }
}

impl TxReport for B256 {
    fn tx_hash(&self) -> Option<B256> {
        Some(*self)
    }
}

impl TxReport for Option<B256> {
    fn tx_hash(&self) -> Option<B256> {
        *self
    }
}

impl TxReport for () {}

impl TxReport for U256 {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settle {
    Wait,
    Skip,
}

#[derive(Debug)]
pub enum RetryOutcome<T> {
    Done {
        value: T,
        attempts: u32,
        failures: Vec<String>,
    },
    Exhausted {
        attempts: u32,
        failures: Vec<String>,
    },
}

impl<T> RetryOutcome<T> {
    pub fn is_done(&self) -> bool {
        matches!(self, RetryOutcome::Done { .. })
    }

    pub fn attempts(&self) -> u32 {
        match self {
            RetryOutcome::Done { attempts, .. } | RetryOutcome::Exhausted { attempts, .. } => {
                *attempts
            }
        }
    }

    /// Error messages of the attempts that failed, oldest first.
    pub fn failures(&self) -> &[String] {
        match self {
            RetryOutcome::Done { failures, .. } | RetryOutcome::Exhausted { failures, .. } => {
                failures
            }
        }
    }

    pub fn into_result(self, action: &str) -> Result<T, FarmError> {
        match self {
            RetryOutcome::Done { value, .. } => Ok(value),
            RetryOutcome::Exhausted {
                attempts,
                mut failures,
            } => Err(FarmError::RetriesExhausted {
                action: action.to_string(),
                attempts,
                last_error: failures.pop(),
            }),
        }
    }
}

/// Runs one named action at a time with a bounded retry budget.
///
/// Attempt errors are logged and swallowed; the caller only sees failure
/// once the budget is spent.
pub struct RetryDriver<'a> {
    config: &'a RetryConfig,
    pause: &'a dyn Pause,
    explorer_url: &'a str,
}

impl<'a> RetryDriver<'a> {
    pub fn new(config: &'a RetryConfig, pause: &'a dyn Pause, explorer_url: &'a str) -> Self {
        Self {
            config,
            pause,
            explorer_url,
        }
    }

    pub async fn attempt<F, Fut, T>(&self, name: &str, operation: F, settle: Settle) -> RetryOutcome<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
        T: TxReport,
    {
        let mut attempt = 0;
        let mut failures = Vec::new();

        while attempt < self.config.max_attempts {
            attempt += 1;

            match operation().await {
                Ok(value) => {
                    self.report(name, &value);
                    if settle == Settle::Wait {
                        self.wait(self.config.settle).await;
                    }
                    return RetryOutcome::Done {
                        value,
                        attempts: attempt,
                        failures,
                    };
                }
                Err(e) => {
                    error!(
                        "❌ {} failed on attempt {}/{}: {:#}",
                        name, attempt, self.config.max_attempts, e
                    );
                    failures.push(format!("{e:#}"));
                    self.wait(self.config.backoff).await;
                }
            }
        }

        RetryOutcome::Exhausted {
            attempts: attempt,
            failures,
        }
    }

    pub async fn execute<F, Fut, T>(&self, name: &str, operation: F, settle: Settle) -> Result<T, FarmError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
        T: TxReport,
    {
        self.attempt(name, operation, settle).await.into_result(name)
    }

    fn report<T: TxReport>(&self, name: &str, value: &T) {
        if let Some(hash) = value.tx_hash() {
            info!("{}: {}/{}", name, self.explorer_url.trim_end_matches('/'), hash);
        }
    }

    async fn wait(&self, range: DelayRange) {
        if let Err(e) = self.pause.pause(range).await {
            warn!("skipping wait {}-{}s: {:#}", range.min, range.max, e);
        }
    }
}
