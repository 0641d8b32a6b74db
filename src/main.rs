use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use ve_farmer::accounts::{read_secrets, FailureLog};
use ve_farmer::cli::{Cli, Command};
use ve_farmer::prices::CoinGeckoFeed;
use ve_farmer::{
    logging, AccountWorker, BatchRunner, ChainConfig, Pause, PipelineWorker, RandomPause,
    RescueWorker, RunnerSettings,
};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    logging::init();

    let cli = Cli::parse();
    let args = cli.command.args().clone();

    let mut config = ChainConfig::load(&args.config)?;
    if let Some(keys) = args.keys {
        config.files.private_keys = keys;
    }
    if let Some(failed) = args.failed {
        config.files.failed_keys = failed;
    }
    info!("⚙️ loaded {} (chain {})", args.config, config.chain.chain_id);

    let secrets = read_secrets(&config.files.private_keys)?;
    let mut tokens = config.token_book();
    let feed = CoinGeckoFeed::new(
        &config.prices.base_url,
        Duration::from_secs(config.prices.timeout_seconds),
    )?;
    let pause: Arc<dyn Pause> = Arc::new(RandomPause);

    let worker: Box<dyn AccountWorker> = match cli.command {
        Command::Run(_) => Box::new(PipelineWorker::new(config.clone(), pause.clone())?),
        Command::Rescue(_) => Box::new(RescueWorker::new(config.clone(), pause.clone())),
    };

    let runner = BatchRunner::new(
        RunnerSettings::from_config(&config),
        pause.as_ref(),
        &feed,
        FailureLog::new(&config.files.failed_keys),
    );
    let summary = runner.run(&secrets, worker.as_ref(), &mut tokens).await?;

    if summary.failed > 0 {
        info!(
            "{} keys written to {}",
            summary.failed,
            config.files.failed_keys.display()
        );
    }
    Ok(())
}
