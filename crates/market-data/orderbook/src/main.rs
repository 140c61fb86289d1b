//! Replay a recorded book feed into an order book
//!
//! Reads newline-delimited JSON records, one delta or snapshot per line, and
//! prints the resulting top of book and depth.

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use common::{BookType, InstrumentId, OrderSide};
use orderbook::{BookRecord, BookStatus, OrderBook, OrderBookConfig};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Granularity {
    L1,
    L2,
    L3,
}

impl From<Granularity> for BookType {
    fn from(granularity: Granularity) -> Self {
        match granularity {
            Granularity::L1 => Self::L1Tbbo,
            Granularity::L2 => Self::L2Mbp,
            Granularity::L3 => Self::L3Mbo,
        }
    }
}

/// Replay NDJSON book records into an order book
#[derive(Parser, Debug)]
#[command(name = "book-replay")]
#[command(about = "Replay recorded book deltas and snapshots")]
struct Cli {
    /// Input file, one JSON record per line
    input: PathBuf,

    /// Instrument id, SYMBOL.VENUE
    #[arg(long, default_value = "UNKNOWN.REPLAY")]
    instrument: InstrumentId,

    /// JSON config file; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Book granularity
    #[arg(long, value_enum)]
    book_type: Option<Granularity>,

    /// Apply updates regardless of sequence numbers
    #[arg(long)]
    no_sequence_check: bool,

    /// Levels per side to print
    #[arg(long)]
    depth: Option<usize>,

    /// Stop at the first rejected update
    #[arg(long)]
    strict: bool,
}

fn load_config(cli: &Cli) -> Result<OrderBookConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            OrderBookConfig::from_json(&json)
                .with_context(|| format!("parsing config {}", path.display()))?
        }
        None => OrderBookConfig::default(),
    };
    if let Some(granularity) = cli.book_type {
        config.book_type = granularity.into();
    }
    if cli.no_sequence_check {
        config.sequence_check = false;
    }
    if let Some(depth) = cli.depth {
        config.max_depth = depth;
    }
    Ok(config)
}

fn replay(book: &mut OrderBook, reader: impl BufRead, strict: bool) -> Result<()> {
    let mut rejected = 0u64;
    let mut status = book.status();

    for (index, line) in reader.lines().enumerate() {
        let number = index + 1;
        let line = line.with_context(|| format!("reading line {number}"))?;
        if line.trim().is_empty() {
            continue;
        }
        let record: BookRecord =
            serde_json::from_str(&line).with_context(|| format!("parsing line {number}"))?;

        let outcome = match &record {
            BookRecord::Snapshot(snapshot) => book.apply_snapshot(snapshot).map(|()| book.status()),
            BookRecord::Delta(delta) => book.apply_update(delta),
        };
        match outcome {
            Ok(next) => {
                if next != status {
                    info!(line = number, from = %status, to = %next, "Book status changed");
                    status = next;
                }
            }
            Err(e) if strict => bail!("line {number}: {e}"),
            Err(e) => {
                rejected += 1;
                warn!(line = number, error = %e, "Record rejected");
            }
        }
    }

    info!(
        updates = book.update_count(),
        rejected,
        sequence = book.sequence(),
        "Replay finished"
    );
    Ok(())
}

fn print_summary(book: &OrderBook) -> Result<()> {
    println!("{book}");
    if book.status() == BookStatus::Stale {
        println!("book is stale, no prices available");
        return Ok(());
    }
    match book.top_of_book() {
        Ok(quote) => println!("top of book: {quote}"),
        Err(e) => println!("top of book unavailable: {e}"),
    }
    for side in [OrderSide::Buy, OrderSide::Sell] {
        println!("{side}:");
        for (price, size) in book.depth(side, usize::MAX)? {
            println!("  {price:>16} {size:>16}");
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_line_number(true)
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    info!(
        instrument = %cli.instrument,
        book_type = %config.book_type,
        sequence_check = config.sequence_check,
        "Starting replay"
    );

    let file = File::open(&cli.input)
        .with_context(|| format!("opening {}", cli.input.display()))?;
    let mut book = OrderBook::new(cli.instrument.clone(), config);
    replay(&mut book, BufReader::new(file), cli.strict)?;
    print_summary(&book)
}
