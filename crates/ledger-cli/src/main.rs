use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use ledger_core::{Ledger, LedgerConfig, MineOutcome, Transaction};
use std::{collections::BTreeSet, path::PathBuf};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "ledger-cli")]
#[command(about = "Drive an in-memory proof-of-work ledger")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Alice pays Bob, Eva pays Alice, Miner mines the block
    Demo,
    /// Submit transactions and mine every block they fill
    Run(RunArgs),
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Transaction as FROM:TO:AMOUNT; a FROM of `-` mints coins
    #[arg(long = "tx", value_parser = parse_tx)]
    txs: Vec<Transaction>,
    /// Address that receives mining rewards
    #[arg(long, default_value = "miner")]
    miner: String,
    /// JSON file with ledger settings
    #[arg(long)]
    config: Option<PathBuf>,
    /// Leading zero hex characters required per block
    #[arg(long)]
    difficulty: Option<usize>,
    /// Transactions per block
    #[arg(long)]
    batch_size: Option<usize>,
    /// Coins paid to the miner per block
    #[arg(long)]
    reward: Option<u64>,
    /// Give up on a block after this many hash attempts
    #[arg(long)]
    max_attempts: Option<u64>,
    /// Print the chain as JSON instead of a summary
    #[arg(long)]
    json: bool,
}

fn parse_tx(raw: &str) -> Result<Transaction, String> {
    let mut parts = raw.splitn(3, ':');
    let (Some(from), Some(to), Some(amount)) = (parts.next(), parts.next(), parts.next()) else {
        return Err(format!("expected FROM:TO:AMOUNT, got `{raw}`"));
    };
    if to.is_empty() {
        return Err("recipient must not be empty".into());
    }
    let amount: u64 = amount
        .parse()
        .map_err(|e| format!("bad amount `{amount}`: {e}"))?;
    Ok(match from {
        "-" => Transaction::reward(to, amount),
        from => Transaction::new(from, to, amount),
    })
}

fn load_config(args: &RunArgs) -> Result<LedgerConfig> {
    let mut config = match &args.config {
        Some(path) => LedgerConfig::from_json_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => LedgerConfig::default(),
    };
    if let Some(difficulty) = args.difficulty {
        config.difficulty = difficulty;
    }
    if let Some(batch_size) = args.batch_size {
        config.batch_size = batch_size;
    }
    if let Some(reward) = args.reward {
        config.mining_reward = reward;
    }
    if args.max_attempts.is_some() {
        config.max_attempts = args.max_attempts;
    }
    Ok(config)
}

fn print_summary(ledger: &Ledger, addresses: &BTreeSet<String>) {
    for block in ledger.chain() {
        println!(
            "#{} nonce={} txs={} hash={} prev={}",
            block.index(),
            block.nonce(),
            block.transactions().len(),
            block.hash(),
            block.previous_hash()
        );
    }
    println!("chain length: {}", ledger.len());
    println!("chain valid: {}", ledger.is_chain_valid());
    println!("pending transactions: {}", ledger.pending_transactions().len());
    for address in addresses {
        println!("balance of {address}: {}", ledger.get_balance(address));
    }
}

fn demo() -> Result<()> {
    let mut ledger = Ledger::new(2)?;
    ledger.create_transaction(Transaction::new("Alice", "Bob", 100));
    ledger.create_transaction(Transaction::new("Eva", "Alice", 50));

    println!("Mining pending block...");
    if let MineOutcome::Mined(report) = ledger.mine_pending_block("Miner")? {
        println!(
            "BLOCK MINED! hash: {} nonce: {} time: {:.3}s",
            report.hash,
            report.nonce,
            report.elapsed.as_secs_f64()
        );
    }

    let addresses: BTreeSet<String> = ["Alice", "Bob", "Eva", "Miner"]
        .into_iter()
        .map(String::from)
        .collect();
    print_summary(&ledger, &addresses);
    Ok(())
}

fn run(args: RunArgs) -> Result<()> {
    let config = load_config(&args)?;
    let mut ledger = Ledger::with_config(config).context("building ledger")?;

    let mut addresses = BTreeSet::new();
    addresses.insert(args.miner.clone());
    for tx in args.txs {
        addresses.extend(tx.from().map(String::from));
        addresses.insert(tx.to().to_string());
        ledger.create_transaction(tx);
    }

    while ledger.has_pending_blocks() {
        ledger
            .mine_pending_block(&args.miner)
            .context("mining pending block")?;
    }
    info!(blocks = ledger.len(), "all pending blocks mined");

    if args.json {
        println!("{}", serde_json::to_string_pretty(ledger.chain())?);
    } else {
        print_summary(&ledger, &addresses);
    }
    Ok(())
}

fn main() -> Result<()> {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Demo => demo(),
        Command::Run(args) => run(args),
    }
}
