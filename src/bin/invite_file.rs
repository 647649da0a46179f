use anyhow::Context;
use clap::{Parser, ValueEnum};
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

use party_invite::core::output::{customers_to_csv, customers_to_json};
use party_invite::domain::ports::{CustomerFilter, CustomersParser};
use party_invite::utils::{logger, validation::Validate};
use party_invite::{CommonArgs, CustomerFileParser, ProximityFilter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Csv,
}

#[derive(Parser)]
#[command(name = "invite-file")]
#[command(about = "Lists the customers of a local file close enough to be invited")]
struct Args {
    #[command(flatten)]
    common: CommonArgs,

    /// Customers file, one JSON object per line
    input: PathBuf,

    /// Output format written to stdout
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Override the ordering from the configuration
    #[arg(long)]
    order_by: Option<String>,

    /// Override the distance threshold in kilometers
    #[arg(long)]
    distance: Option<i64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    logger::init_logger(args.common.log_format.into(), args.common.verbose);

    let mut config = match args.common.load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config file '{}': {}", args.common.config.display(), e);
            std::process::exit(1);
        }
    };

    if let Some(order_by) = &args.order_by {
        config.filter.order_by = order_by.clone();
    }
    if let Some(distance) = args.distance {
        config.filter.location_near_to_km = distance;
    }

    if let Err(e) = config.validate() {
        tracing::error!(error = %e, "Configuration validation failed");
        eprintln!("Invalid configuration: {}", e);
        std::process::exit(1);
    }

    let settings = config.invite_settings()?;
    let cancel = CancellationToken::new();

    let file = File::open(&args.input)
        .with_context(|| format!("error to open input file, path: {}", args.input.display()))?;
    let customers = CustomerFileParser::new()
        .parse(&cancel, BufReader::new(file))
        .context("error to parse input file")?;

    let filter = ProximityFilter::new(config.workers());
    let invited = filter
        .by_near_location(
            &cancel,
            customers,
            &settings.base_location,
            settings.threshold_km,
            settings.order_by,
        )
        .await
        .context("error to filter customers by location")?;

    tracing::info!(invited = invited.len(), "Customers filtered");

    let mut stdout = std::io::stdout().lock();
    match args.format {
        OutputFormat::Json => {
            stdout.write_all(&customers_to_json(&invited)?)?;
            writeln!(stdout)?;
        }
        OutputFormat::Csv => stdout.write_all(customers_to_csv(&invited)?.as_bytes())?,
    }

    Ok(())
}
