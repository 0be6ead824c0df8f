use anyhow::Result;
use block_reward_collector::{Args, BeaconchainClient, Collector, Report};
use clap::Parser;
use log::info;

fn run_statistics(args: &Args) -> Result<()> {
    let rewards = args.load_rewards()?;

    let report = Report::compute(&rewards);
    report.log();

    if let Some(path) = &args.csv_out {
        report.write_csv(path)?;
    }

    Ok(())
}

async fn run_collector(args: &Args) -> Result<()> {
    let config = args.collector_config()?;
    let client = BeaconchainClient::new(
        &args.api_url,
        args.require_api_key()?,
        args.request_timeout(),
    )?;

    let mut collector = Collector::new(client, args.store(), config, args.retry_policy());
    collector.run().await;

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    // Initialize logging
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let args = Args::parse();

    if args.results {
        info!("Reading rewards from {}", args.rewards_file.display());
        return run_statistics(&args);
    }

    info!("Block Reward Collector starting up");
    run_collector(&args).await
}
