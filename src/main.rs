use anyhow::{Context, Result};
use clap::Parser;
use dotenvy::dotenv;
use sales_records::import::parse_order;
use sales_records::{logging, sales_order_layout, RecordWriter};
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info, warn};

#[derive(Debug, Parser)]
#[command(version, about = "Convert sales CSV into fixed-width binary records")]
struct Args {
    /// CSV file produced by the order generator (header line is skipped)
    #[arg(long, short = 'i', env = "CSV_FILE", default_value = "vendas.csv")]
    input: PathBuf,

    /// Output record file (.bin)
    #[arg(long, short = 'o', env = "BIN_FILE", default_value = "vendas.bin")]
    output: PathBuf,

    /// Log progress every N records (0 disables)
    #[arg(long, env = "PROGRESS_EVERY", default_value_t = 50_000)]
    progress_every: u64,
}

fn mib(bytes: u64) -> f64 {
    bytes as f64 / 1024.0 / 1024.0
}

fn main() -> Result<()> {
    // Load environment variables from .env if present
    let _ = dotenv();
    logging::init();
    let args = Args::parse();

    let layout = sales_order_layout();
    let csv = File::open(&args.input).with_context(|| format!("open {:?}", args.input))?;
    let mut lines = BufReader::with_capacity(64 * 1024, csv).lines();
    let mut w = RecordWriter::create(&args.output, layout).with_context(|| format!("create {:?}", args.output))?;

    println!("Record size: {} bytes", layout.total_size());
    let start = Instant::now();

    // header
    lines.next().transpose().context("read CSV header")?;

    let mut skipped = 0u64;
    for (n, line) in lines.enumerate() {
        let line = line.with_context(|| format!("read CSV line {}", n + 2))?;
        if line.trim().is_empty() {
            continue;
        }
        let order = match parse_order(&line) {
            Ok(o) => o,
            Err(e) => {
                skipped += 1;
                debug!(line = n + 2, error = %e, "skipping row");
                continue;
            }
        };
        w.append_order(&order).with_context(|| format!("encode CSV line {}", n + 2))?;
        if args.progress_every > 0 && w.records_written() % args.progress_every == 0 {
            info!(records = w.records_written(), "converting");
        }
    }

    let written = w.records_written();
    w.finish().context("flush output")?;
    let elapsed = start.elapsed();

    if skipped > 0 {
        warn!(skipped, "rows skipped (too few columns or bad values)");
    }

    let size_csv = fs::metadata(&args.input).map(|m| m.len()).unwrap_or(0);
    let size_bin = fs::metadata(&args.output).map(|m| m.len()).unwrap_or(0);
    let ratio = if size_csv > 0 { size_bin as f64 / size_csv as f64 * 100.0 } else { 0.0 };
    println!("Wrote {} records ({} skipped) in {:.4}s", written, skipped, elapsed.as_secs_f64());
    println!("CSV: {:.2} MiB | BIN: {:.2} MiB ({:.1}% of the original)", mib(size_csv), mib(size_bin), ratio);
    Ok(())
}
