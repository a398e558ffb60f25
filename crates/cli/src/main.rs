//! Command line interface for concentrated-liquidity position analytics.
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use cl_lens_chain::{PoolRegistry, SnapshotChain};
use cl_lens_data::{
    HttpPriceOracle, IndexerApi, NoopIndexer, NoopPriceOracle, PriceOracle, SubgraphClient,
};
use cl_lens_domain::Address;
use cl_lens_engine::prelude::*;
use dotenv::dotenv;
use rust_decimal::Decimal;
use std::env;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "cl-lens")]
#[command(about = "Portfolio analytics for concentrated-liquidity positions", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a full position report for an owner address
    Report {
        /// Owner wallet address (0x…)
        #[arg(short, long)]
        owner: String,

        /// Path to a chain snapshot JSON file
        #[arg(short, long)]
        snapshot: PathBuf,

        /// Indexer GraphQL endpoint; falls back to INDEXER_URL
        #[arg(long)]
        indexer_url: Option<String>,

        /// Price oracle base URL; falls back to PRICE_ORACLE_URL
        #[arg(long)]
        oracle_url: Option<String>,

        /// Chain id passed to the price oracle
        #[arg(long, default_value_t = 8453)]
        chain_id: u64,

        /// Emit the report as JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Report {
            owner,
            snapshot,
            indexer_url,
            oracle_url,
            chain_id,
            json,
        } => {
            run_report(&owner, &snapshot, indexer_url, oracle_url, chain_id, json).await
        }
    }
}

async fn run_report(
    owner: &str,
    snapshot_path: &PathBuf,
    indexer_url: Option<String>,
    oracle_url: Option<String>,
    chain_id: u64,
    json: bool,
) -> Result<()> {
    let raw = fs::read_to_string(snapshot_path)
        .with_context(|| format!("cannot read snapshot file {}", snapshot_path.display()))?;
    let chain = SnapshotChain::from_json_str(&raw)?;
    let registry = PoolRegistry::new(chain.pool_keys());

    let indexer: Arc<dyn IndexerApi> =
        match indexer_url.or_else(|| env::var("INDEXER_URL").ok()) {
            Some(url) => Arc::new(SubgraphClient::new(url)),
            None => Arc::new(NoopIndexer),
        };
    let oracle: Arc<dyn PriceOracle> =
        match oracle_url.or_else(|| env::var("PRICE_ORACLE_URL").ok()) {
            Some(url) => Arc::new(HttpPriceOracle::new(url, chain_id)),
            None => Arc::new(NoopPriceOracle),
        };

    let pipeline = PositionPipeline::new(Arc::new(chain), indexer, oracle, registry);
    let mut guard = RefreshGuard::new(RefreshGuardConfig::default());

    if let Ok(address) = owner.parse::<Address>() {
        if !guard.ready(&address) {
            println!("⏳ refresh for {address} is cooling down, try again shortly");
            return Ok(());
        }
    }

    match pipeline.refresh(owner).await {
        Ok(report) => {
            guard.record_success(&report.owner);
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report);
            }
            Ok(())
        }
        Err(error) => {
            if let Ok(address) = owner.parse::<Address>() {
                guard.record_failure(&address);
            }
            Err(error.into())
        }
    }
}

fn print_report(report: &RefreshReport) {
    println!("\n📊 Positions for {}", report.owner);
    println!("════════════════════════════════════════════");
    if report.positions.is_empty() {
        println!("No concentrated-liquidity positions found.");
        return;
    }

    for position in &report.positions {
        let pair = position.pair_symbol.as_deref().unwrap_or("?/?");
        let staked = if position.is_staked { " [staked]" } else { "" };
        println!("\n#{} {}{}", position.id, pair, staked);
        println!(
            "  range: ticks {}..{} (spacing {})",
            position.tick_lower, position.tick_upper, position.tick_spacing
        );

        if let Some(price) = &position.price {
            println!(
                "  price: {} {}/{}",
                round(price.token1_per_token0),
                symbol(&position.token1.symbol),
                symbol(&position.token0.symbol)
            );
            println!(
                "  bounds: {} .. {}",
                round(price.range.min_token1_per_token0),
                round(price.range.max_token1_per_token0)
            );
        }

        if let Some(valuation) = &position.valuation {
            println!(
                "  amounts: {} {} + {} {} ({:?})",
                round(valuation.amounts.amount0),
                symbol(&position.token0.symbol),
                round(valuation.amounts.amount1),
                symbol(&position.token1.symbol),
                valuation.source
            );
            if let Some(usd) = valuation.usd_value {
                println!("  value: ${}", round(usd));
            }
        }

        if let Some(fees) = &position.unclaimed_fees {
            match fees.usd_value {
                Some(usd) => println!("  unclaimed fees: ${}", round(usd)),
                None => println!(
                    "  unclaimed fees: {} / {}",
                    round(fees.amount0),
                    round(fees.amount1)
                ),
            }
        }

        if let Some(rewards) = &position.rewards {
            let token = rewards
                .reward_symbol
                .clone()
                .unwrap_or_else(|| rewards.reward_token.to_string());
            println!(
                "  rewards: {} {}/day ({}% of gauge)",
                round(rewards.projection.per_day),
                token,
                round(rewards.liquidity_share * Decimal::ONE_HUNDRED)
            );
            if let Some(earned) = rewards.earned {
                println!("  earned: {} {}", round(earned), token);
            }
            if let Some(apr) = rewards.apr_percent {
                println!("  staking APR: {}%", round(apr));
            }
        }

        if let Some(stats) = &position.pool_stats {
            match stats.fee_apr_percent {
                Some(apr) => println!(
                    "  pool: TVL ${} | fee APR {}%",
                    round(stats.tvl_usd),
                    round(apr)
                ),
                None => println!("  pool: TVL ${}", round(stats.tvl_usd)),
            }
        }

        if let Some(history) = &position.history {
            print!("  age: {} days", history.age_days);
            if let Some(roi) = history.roi_percent {
                print!(" | ROI {}%", round(roi));
            }
            println!();
        }
    }

    println!("\n🔍 {} pipeline steps executed", report.diagnostics.steps.len());
}

fn symbol(symbol: &Option<String>) -> &str {
    symbol.as_deref().unwrap_or("?")
}

fn round(value: Decimal) -> Decimal {
    value.round_dp(6).normalize()
}
