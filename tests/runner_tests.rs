mod common;

use alloy::primitives::Address;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use common::{test_config, RecordingPause, KEY_ONE, KEY_TWO};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use secrecy::SecretString;
use std::collections::HashMap;
use std::fs;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use ve_farmer::accounts::{Account, FailureLog};
use ve_farmer::prices::PriceFeed;
use ve_farmer::runner::{AccountWorker, BatchRunner, RunSummary, RunnerSettings};
use ve_farmer::tokens::{TokenBook, NATIVE};

/// Fails for one address and remembers who it ran for.
struct ScriptedWorker {
    fail_for: Option<Address>,
    seen: Mutex<Vec<Address>>,
}

impl ScriptedWorker {
    fn new(fail_for: Option<Address>) -> Self {
        Self {
            fail_for,
            seen: Mutex::new(Vec::new()),
        }
    }

    fn seen(&self) -> Vec<Address> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl AccountWorker for ScriptedWorker {
    async fn run_account(&self, account: &Account, _tokens: &TokenBook) -> Result<()> {
        self.seen.lock().unwrap().push(account.address());
        if Some(account.address()) == self.fail_for {
            return Err(anyhow!("lend: retry attempts have been reached"));
        }
        Ok(())
    }
}

struct StaticFeed {
    quotes: Option<HashMap<String, Decimal>>,
    calls: AtomicU32,
}

impl StaticFeed {
    fn new(quotes: Option<HashMap<String, Decimal>>) -> Self {
        Self {
            quotes,
            calls: AtomicU32::new(0),
        }
    }

    fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PriceFeed for StaticFeed {
    async fn fetch(&self, _ids: &[String]) -> Result<HashMap<String, Decimal>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.quotes
            .clone()
            .ok_or_else(|| anyhow!("price feed unavailable"))
    }
}

fn secret(value: &str) -> SecretString {
    SecretString::new(value.to_string())
}

fn address_of(key: &str) -> Address {
    Account::from_secret(secret(key)).unwrap().address()
}

#[tokio::test]
async fn test_failed_account_is_recorded_and_batch_continues() -> Result<()> {
    let config = test_config();
    let dir = tempfile::tempdir()?;
    let failed_path = dir.path().join("failed_keys.txt");
    let pause = RecordingPause::default();
    let feed = StaticFeed::new(Some(HashMap::from([("ethereum".to_string(), dec!(3000))])));
    let worker = ScriptedWorker::new(Some(address_of(KEY_ONE)));
    let mut tokens = config.token_book();

    let settings = RunnerSettings::from_config(&config);
    let runner = BatchRunner::new(settings, &pause, &feed, FailureLog::new(&failed_path));
    let summary = runner
        .run(&[secret(KEY_ONE), secret(KEY_TWO)], &worker, &mut tokens)
        .await?;

    assert_eq!(
        summary,
        RunSummary {
            total: 2,
            succeeded: 1,
            failed: 1
        }
    );
    assert_eq!(worker.seen(), vec![address_of(KEY_ONE), address_of(KEY_TWO)]);
    assert_eq!(fs::read_to_string(&failed_path)?, format!("{KEY_ONE}\n"));

    // startup once, one gap between the two accounts
    assert_eq!(pause.waits(), vec![settings.startup, settings.between_accounts]);

    // refreshed once; the interval has not elapsed for the second account
    assert_eq!(feed.calls(), 1);
    assert_eq!(tokens.get(NATIVE)?.usd_price(), dec!(3000));

    println!("✅ Failed account recorded, next account still ran");
    Ok(())
}

#[tokio::test]
async fn test_invalid_key_is_recorded() -> Result<()> {
    let config = test_config();
    let dir = tempfile::tempdir()?;
    let failed_path = dir.path().join("out").join("failed.txt");
    let pause = RecordingPause::default();
    let feed = StaticFeed::new(Some(HashMap::new()));
    let worker = ScriptedWorker::new(None);
    let mut tokens = config.token_book();

    let runner = BatchRunner::new(
        RunnerSettings::from_config(&config),
        &pause,
        &feed,
        FailureLog::new(&failed_path),
    );
    let summary = runner
        .run(&[secret("not-a-key"), secret(KEY_TWO)], &worker, &mut tokens)
        .await?;

    assert_eq!(summary.failed, 1);
    assert_eq!(summary.succeeded, 1);
    assert_eq!(worker.seen(), vec![address_of(KEY_TWO)]);
    assert_eq!(fs::read_to_string(&failed_path)?, "not-a-key\n");
    Ok(())
}

#[tokio::test]
async fn test_feed_failure_falls_back_to_defaults_and_retries() -> Result<()> {
    let config = test_config();
    let dir = tempfile::tempdir()?;
    let pause = RecordingPause::default();
    let feed = StaticFeed::new(None);
    let worker = ScriptedWorker::new(None);
    let mut tokens = config.token_book();

    let runner = BatchRunner::new(
        RunnerSettings::from_config(&config),
        &pause,
        &feed,
        FailureLog::new(dir.path().join("failed.txt")),
    );
    let summary = runner
        .run(&[secret(KEY_ONE), secret(KEY_TWO)], &worker, &mut tokens)
        .await?;

    assert_eq!(summary.succeeded, 2);
    // clock never advanced, so every account asked again
    assert_eq!(feed.calls(), 2);
    assert_eq!(tokens.get(NATIVE)?.price, Some(dec!(2000)));
    assert!(!dir.path().join("failed.txt").exists());
    Ok(())
}

#[tokio::test]
async fn test_empty_key_list_does_nothing() -> Result<()> {
    let config = test_config();
    let dir = tempfile::tempdir()?;
    let pause = RecordingPause::default();
    let feed = StaticFeed::new(None);
    let worker = ScriptedWorker::new(None);
    let mut tokens = config.token_book();

    let runner = BatchRunner::new(
        RunnerSettings::from_config(&config),
        &pause,
        &feed,
        FailureLog::new(dir.path().join("failed.txt")),
    );
    let summary = runner.run(&[], &worker, &mut tokens).await?;

    assert_eq!(summary, RunSummary::default());
    assert!(pause.waits().is_empty());
    assert_eq!(feed.calls(), 0);
    Ok(())
}
