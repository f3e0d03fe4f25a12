use anyhow::{bail, Context, Result};
use clap::Parser;
use dotenvy::dotenv;
use sales_records::import::{sum_csv_column, FINAL_VALUE_COLUMN};
use sales_records::record::fields;
use sales_records::{logging, sales_order_layout, ReaderOptions, RecordReader, SalesOrder, DEFAULT_CHUNK_RECORDS};
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::time::Instant;
use time::macros::format_description;
use time::OffsetDateTime;
use tracing::warn;

#[derive(Debug, Parser)]
#[command(about = "Scan a sales record file and sum one column")]
struct Args {
    /// Record file to read (.bin)
    #[arg(long, short = 'i', env = "BIN_FILE", default_value = "vendas.bin")]
    input: PathBuf,

    /// Records fetched per read
    #[arg(long, default_value_t = DEFAULT_CHUNK_RECORDS)]
    chunk_records: usize,

    /// Numeric field to sum; only this field is decoded per record
    #[arg(long, default_value = fields::FINAL_VALUE)]
    sum: String,

    /// Print the first N records as `id,date,name,final_value` lines
    #[arg(long, default_value_t = 0)]
    head: usize,

    /// Also sum `valor_final_item` from this CSV and compare timings
    #[arg(long, value_name = "CSV_FILE")]
    compare_csv: Option<PathBuf>,
}

fn main() -> Result<()> {
    let _ = dotenv();
    logging::init();
    let args = Args::parse();

    let layout = sales_order_layout();
    // resolve once; an unknown name fails here rather than per record
    let column = layout.field(&args.sum)?;
    let file = File::open(&args.input).with_context(|| format!("open {:?}", args.input))?;
    let mut rdr = RecordReader::with_options(file, layout, ReaderOptions { chunk_records: args.chunk_records });

    if args.head > 0 {
        let ymd = format_description!("[year]-[month]-[day]");
        println!("ID,DATE,NAME,FINAL_VALUE");
        for order in rdr.sales_orders().take(args.head) {
            let o: SalesOrder = order?;
            let date = OffsetDateTime::from_unix_timestamp(o.order_date as i64)
                .map(|d| d.format(ymd).unwrap_or_default())
                .unwrap_or_default();
            println!("{},{},{},{:.2}", o.order_id, date, o.customer_name, o.final_value);
        }
        println!("...");
        rdr.seek_to_record(0).context("rewind")?;
    }

    let start = Instant::now();
    let mut sum = 0f64;
    while let Some(block) = rdr.next_block().context("read records")? {
        let Some(v) = column.read(block)?.as_f64() else {
            bail!("field `{}` is not numeric", column.name);
        };
        sum += v;
    }
    let elapsed = start.elapsed();

    if rdr.discarded_bytes() > 0 {
        warn!(
            bytes = rdr.discarded_bytes(),
            "file ends with a truncated record; the last write did not complete"
        );
    }
    println!(
        "Read {} records in {:.4}s | sum({}) = {:.2}",
        rdr.records_read(),
        elapsed.as_secs_f64(),
        column.name,
        sum
    );
    rdr.close();

    if let Some(path) = &args.compare_csv {
        if column.name != fields::FINAL_VALUE {
            warn!(field = %column.name, "CSV comparison always sums {}", fields::FINAL_VALUE);
        }
        let csv = File::open(path).with_context(|| format!("open {:?}", path))?;
        let csv_start = Instant::now();
        let totals = sum_csv_column(BufReader::with_capacity(64 * 1024, csv), FINAL_VALUE_COLUMN)
            .with_context(|| format!("read {:?}", path))?;
        let csv_elapsed = csv_start.elapsed();
        println!(
            "CSV: {} rows in {:.4}s | sum({}) = {:.2}",
            totals.rows,
            csv_elapsed.as_secs_f64(),
            fields::FINAL_VALUE,
            totals.sum
        );
        let bin_secs = elapsed.as_secs_f64();
        if bin_secs > 0.0 {
            println!("Binary scan was {:.1}x faster", csv_elapsed.as_secs_f64() / bin_secs);
        }
    }
    Ok(())
}
