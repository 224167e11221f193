//! Chain KPI command line
//!
//! Fetches recent blocks from one or more nodes and prints a statistic.

use clap::{Args, Parser, Subcommand};

use chain_kpi::chain::{BlockHash, BlockRange};
use chain_kpi::collector::{
    fetch_blocks_seen, fetch_chain_pair, fetch_observations, fetch_rewards_per_node,
    fetch_since_fork, fetch_window, latest_height, Collector,
};
use chain_kpi::config::Config;
use chain_kpi::constants::{ORPHAN_RANGE_FLOOR, RANGE_FLOOR};
use chain_kpi::metrics::{
    difficulty_listing, orphan_count, scan_orphans, BlockTimeReport, DifficultySeries,
    ForkComparison, LatencyReport, ReportedDifficulty,
};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Node JSON-RPC endpoint; repeat or comma separate for several (overrides KPI_NODES)
    #[arg(long = "node", global = true, value_delimiter = ',')]
    nodes: Vec<String>,

    /// Number of trailing blocks when no range is given (overrides KPI_WINDOW)
    #[arg(long, global = true)]
    window: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

/// Optional block range; missing bounds default to the trailing window
#[derive(Args, Debug, Clone, Copy)]
struct RangeArgs {
    /// First block
    start: Option<u64>,
    /// Last block
    end: Option<u64>,
}

impl RangeArgs {
    fn resolve(&self, latest: u64, window: u64, floor: u64) -> BlockRange {
        BlockRange::resolve(latest, self.start, self.end, window, floor)
    }

    /// Range resolver for the default floor
    fn resolver(self, window: u64) -> impl Fn(u64) -> BlockRange + Copy {
        move |latest| self.resolve(latest, window, RANGE_FLOOR)
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Block time mean and standard deviation, overall and per seal type
    BlockTime(RangeArgs),
    /// Block import latency across all configured nodes
    Latency(RangeArgs),
    /// Blocks sealed per miner and seal type, for every configured node
    Rewards(RangeArgs),
    /// Orphan rate from the node's per-height block counter
    OrphanRate(RangeArgs),
    /// Orphan rate from the node's lists of seen Pow and Pos hashes
    OrphanScan(RangeArgs),
    /// Accumulated Pow x Pos total difficulty
    TotalDifficulty(RangeArgs),
    /// Compare total difficulty of the first two nodes after their fork point
    Fork(RangeArgs),
    /// Accumulate total difficulty from the block after FORK_BLOCK to the head
    SinceFork {
        /// Last block before the fork (exclusive)
        fork_block: u64,
    },
    /// Block difficulty listed per seal type
    Difficulty(RangeArgs),
    /// Node-reported total difficulty per block
    TdSeries(RangeArgs),
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();
    env_logger::init();

    let cli = Cli::parse();
    let config = Config::from_env()?
        .with_nodes(&cli.nodes)?
        .with_window(cli.window)?;
    let collector = Collector::new(&config.nodes);

    run(cli.command, &config, &collector).await
}

async fn run(
    command: Command,
    config: &Config,
    collector: &Collector,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Command::BlockTime(args) => {
            let node = collector.primary()?;
            let (_, blocks) = fetch_window(node, args.resolver(config.window)).await?;
            print!("{}", BlockTimeReport::from_blocks(&blocks));
        }
        Command::Latency(args) => {
            let node = collector.primary()?;
            let latest = latest_height(node).await?;
            let range = args.resolve(latest, config.window, RANGE_FLOOR);
            let observations = fetch_observations(collector.clients(), range).await?;
            print!("{}", LatencyReport::from_observations(&observations));
        }
        Command::Rewards(args) => {
            let tallies =
                fetch_rewards_per_node(collector.clients(), args.resolver(config.window)).await?;
            for (node, tally) in collector.clients().iter().zip(tallies) {
                for line in tally.to_string().lines() {
                    println!("{}{}", node, line);
                }
            }
        }
        Command::OrphanRate(args) => {
            let node = collector.primary()?;
            let latest = latest_height(node).await?;
            let range = args.resolve(latest, config.orphan_window, ORPHAN_RANGE_FLOOR);
            let seen = fetch_blocks_seen(node, range).await?;
            println!("block height: {}", latest);
            print!("{}", orphan_count(range, &seen));
        }
        Command::OrphanScan(args) => {
            let node = collector.primary()?;
            let ((_, blocks), seen_pow, seen_pos) = futures::try_join!(
                fetch_window(node, args.resolver(config.window)),
                node.seen_pow_hashes(),
                node.seen_pos_hashes()
            )?;
            let canonical: Vec<BlockHash> = blocks.iter().map(|b| b.hash).collect();
            print!("{}", scan_orphans(&canonical, &seen_pow, &seen_pos));
        }
        Command::TotalDifficulty(args) => {
            let node = collector.primary()?;
            let (range, blocks) = fetch_window(node, args.resolver(config.window)).await?;
            print!("{}", DifficultySeries::from_blocks(range, &blocks));
        }
        Command::Fork(args) => {
            let (a, b) = collector.pair()?;
            let (range, chain_a, chain_b) =
                fetch_chain_pair(a, b, args.resolver(config.window)).await?;
            print!("{}", ForkComparison::from_chains(range, &chain_a, &chain_b));
        }
        Command::SinceFork { fork_block } => {
            let node = collector.primary()?;
            let (range, blocks) = fetch_since_fork(node, fork_block).await?;
            print!("{}", DifficultySeries::from_blocks(range, &blocks));
        }
        Command::Difficulty(args) => {
            let node = collector.primary()?;
            let (_, blocks) = fetch_window(node, args.resolver(config.difficulty_window)).await?;
            print!("{}", difficulty_listing(&blocks));
        }
        Command::TdSeries(args) => {
            let node = collector.primary()?;
            let (_, blocks) = fetch_window(node, args.resolver(config.window)).await?;
            print!("{}", ReportedDifficulty::from_blocks(&blocks));
        }
    }

    Ok(())
}
