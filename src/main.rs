use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use price_indices::catalog::{Category, Source};
use price_indices::config::Config;
use price_indices::export::{export_file_name, export_to_dir};
use price_indices::repository::Repository;
use price_indices::sources::big_mac::{self, BigMacSelection};
use price_indices::sources::bis::{self, BisSelection};
use price_indices::sources::numbeo::{self, NumbeoSelection};
use price_indices::sources::penn::{self, PennSelection};
use price_indices::sources::wb_cpi::{self, CpiSelection};
use price_indices::sources::wb_icp::{self, IcpSelection};
use price_indices::sources::{self, OptionScope};
use price_indices::table::Table;

#[derive(Parser)]
#[command(name = "price-indices")]
#[command(about = "Browse, filter and export price index datasets", long_about = None)]
struct Cli {
    /// Root of the raw data layout (overrides DATA_DIR)
    #[arg(long, env = "DATA_DIR", global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the datasets grouped by category
    Sources {
        /// Load every dataset and report its row count
        #[arg(long)]
        check: bool,
    },

    /// List the valid values of one dimension of a dataset
    Options(OptionsArgs),

    /// Filter a dataset, print the result and optionally export it as CSV
    Query(QueryArgs),
}

#[derive(Args)]
struct OptionsArgs {
    #[arg(value_enum)]
    source: Source,

    /// Dimension to list, e.g. "years" or "reference_area"
    dimension: String,

    #[arg(long)]
    iso: Option<String>,
    #[arg(long)]
    currency: Option<String>,
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    country: Option<String>,
    #[arg(long)]
    classification: Option<String>,
    #[arg(long)]
    year: Option<i32>,
    #[arg(long)]
    month: Option<u32>,

    /// Print as a JSON array
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct QueryArgs {
    #[command(subcommand)]
    dataset: Dataset,

    /// Rows to print
    #[arg(long, default_value = "10", global = true)]
    limit: usize,

    /// Print every row
    #[arg(long, global = true)]
    all: bool,

    /// Print the rows as JSON instead of a text table
    #[arg(long, global = true)]
    json: bool,

    /// Write the filtered table to a CSV file
    #[arg(long, global = true)]
    export: bool,

    /// Export directory (overrides EXPORT_DIR)
    #[arg(long, global = true)]
    out_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Dataset {
    BigMac(BigMacSelection),
    Bis(BisSelection),
    Numbeo(NumbeoSelection),
    Penn(PennSelection),
    WbCpi(CpiSelection),
    WbIcp(IcpSelection),
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,price_indices=debug")),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_line_number(true)
                .with_writer(std::io::stderr),
        )
        .init();

    // Load .env file if it exists (ignore errors if not found)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let mut config = Config::from_env();
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = data_dir;
    }
    debug!("Configuration: {:?}", config);

    let repository = Repository::new(config);

    match cli.command {
        Command::Sources { check } => list_sources(&repository, check).await,
        Command::Options(args) => list_options(&repository, args).await,
        Command::Query(args) => run_query(&repository, args).await,
    }
}

async fn list_sources(
    repository: &Repository,
    check: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let counts = if check {
        Some(repository.preload().await)
    } else {
        None
    };

    for category in Category::ALL {
        println!("{}", category.label());
        for source in category.sources() {
            let status = counts
                .as_ref()
                .and_then(|c| c.iter().find(|(s, _)| *s == source))
                .map(|(_, result)| match result {
                    Ok(rows) => format!("  [{rows} rows]"),
                    Err(e) => format!("  [unavailable: {e}]"),
                })
                .unwrap_or_default();
            println!("  {:<10} {}{}", kebab(source), source.display_name(), status);
        }
    }
    Ok(())
}

fn kebab(source: Source) -> String {
    use clap::ValueEnum;
    source
        .to_possible_value()
        .map(|v| v.get_name().to_string())
        .unwrap_or_default()
}

async fn list_options(
    repository: &Repository,
    args: OptionsArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let table = repository.table(args.source).await?;
    let scope = OptionScope {
        iso: args.iso,
        currency: args.currency,
        name: args.name,
        country: args.country,
        classification: args.classification,
        year: args.year,
        month: args.month,
    };
    let values = sources::options(args.source, table, &args.dimension, &scope)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&values)?);
    } else {
        for value in &values {
            println!("{value}");
        }
    }
    Ok(())
}

async fn run_query(
    repository: &Repository,
    args: QueryArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let (source, table, parts) = match &args.dataset {
        Dataset::BigMac(selection) => (
            Source::BigMac,
            big_mac::filter(repository.big_mac().await?, selection)?,
            selection.export_parts(),
        ),
        Dataset::Bis(selection) => (
            Source::BisReer,
            bis::filter(repository.bis_reer().await?, selection)?,
            selection.export_parts(),
        ),
        Dataset::Numbeo(selection) => (
            Source::Numbeo,
            numbeo::filter(repository.numbeo().await?, selection)?,
            selection.export_parts(),
        ),
        Dataset::Penn(selection) => (
            Source::Penn,
            penn::filter(repository.penn().await?, selection)?,
            selection.export_parts(),
        ),
        Dataset::WbCpi(selection) => (
            Source::WbCpi,
            wb_cpi::filter(repository.wb_cpi().await?, selection)?,
            selection.export_parts(),
        ),
        Dataset::WbIcp(selection) => (
            Source::WbIcp,
            wb_icp::filter(repository.wb_icp().await?, selection)?,
            selection.export_parts(),
        ),
    };
    info!("{}: {} matching rows", source, table.height());

    let limit = if args.all { table.height() } else { args.limit };
    if args.json {
        let shown = Table::new(
            table.columns().to_vec(),
            table.rows().iter().take(limit).cloned().collect(),
        );
        println!("{}", serde_json::to_string_pretty(&shown)?);
    } else {
        print_table(&table, limit);
    }

    if args.export {
        let dir = args
            .out_dir
            .unwrap_or_else(|| repository.config().export_dir.clone());
        let path = export_to_dir(&table, &dir, &export_file_name(source, &parts))?;
        println!("Exported {} rows to {}", table.height(), path.display());
    }
    Ok(())
}

fn print_table(table: &Table, limit: usize) {
    let shown: Vec<Vec<String>> = table
        .rows()
        .iter()
        .take(limit)
        .map(|row| row.iter().map(|v| v.to_string()).collect())
        .collect();

    let mut widths: Vec<usize> = table.columns().iter().map(|c| c.chars().count()).collect();
    for row in &shown {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let line = |cells: Vec<&str>| {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, &width)| format!("{cell:<width$}"))
            .collect::<Vec<_>>()
            .join("  ")
    };

    println!("{}", line(table.columns().iter().map(String::as_str).collect()));
    for row in &shown {
        println!("{}", line(row.iter().map(String::as_str).collect()));
    }
    println!("({} of {} rows)", shown.len(), table.height());
}
