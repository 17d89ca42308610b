use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;

use leadflow_cli::{init_tracing, write_leads_csv};
use leadflow_processing::MAX_DATA_ROWS;

#[derive(Parser, Debug)]
#[command(name = "leadflow-gen")]
#[command(about = "Generate a valid lead import CSV")]
struct Args {
    /// Number of data rows
    #[arg(long, default_value_t = MAX_DATA_ROWS)]
    rows: usize,

    /// Output file
    #[arg(long, default_value = "leads.csv")]
    output: PathBuf,

    /// Seed for reproducible output
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    if args.rows == 0 || args.rows > MAX_DATA_ROWS {
        tracing::warn!(
            rows = args.rows,
            max = MAX_DATA_ROWS,
            "Row count outside the accepted range; the API will reject this file"
        );
    }

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    let file = File::create(&args.output)
        .with_context(|| format!("Failed to create {}", args.output.display()))?;
    write_leads_csv(BufWriter::new(file), args.rows, &mut rng)?;

    tracing::info!(rows = args.rows, output = %args.output.display(), "Generated lead import file");
    Ok(())
}
