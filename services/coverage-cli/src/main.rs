//! Coverage catalog command-line tool.
//!
//! Loads a catalog directory and answers identifier questions as JSON on
//! stdout. Logs go to stderr.

mod commands;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use coverage_catalog::{load_catalog_from_dir, CatalogSettings, IdentifierOrder};

#[derive(Parser, Debug)]
#[command(name = "coverage-cli")]
#[command(about = "Generate, parse and relate coverage identifiers of a catalog")]
struct Args {
    /// Catalog directory (parameters.yaml + configurations/)
    #[arg(
        long,
        global = true,
        default_value = "config/catalog",
        env = "COVERAGE_CATALOG_DIR"
    )]
    catalog_dir: PathBuf,

    /// Log level
    #[arg(long, global = true, default_value = "warn", env = "RUST_LOG")]
    log_level: String,

    /// Log format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    /// Parameter order inside identifiers (overrides COVERAGE_CATALOG__IDENTIFIER_ORDER)
    #[arg(long, global = true, value_enum)]
    identifier_order: Option<OrderArg>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OrderArg {
    Pattern,
    Alphabetical,
}

impl From<OrderArg> for IdentifierOrder {
    fn from(order: OrderArg) -> Self {
        match order {
            OrderArg::Pattern => IdentifierOrder::Pattern,
            OrderArg::Alphabetical => IdentifierOrder::Alphabetical,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List configurations with their identifier pattern and count
    Configurations,

    /// List coverage identifiers, optionally filtered and paginated
    List {
        /// Only this configuration
        #[arg(short, long)]
        configuration: Option<String>,

        /// Substring the configuration name must contain (repeatable)
        #[arg(long = "name-contains")]
        name_contains: Vec<String>,

        /// PARAMETER:VALUE pair to filter by (repeatable)
        #[arg(short, long = "filter", value_parser = commands::parse_filter_pair)]
        filters: Vec<(String, String)>,

        #[arg(long, default_value_t = 0)]
        offset: usize,

        #[arg(long)]
        limit: Option<usize>,
    },

    /// Count the identifiers of one configuration
    Count {
        #[arg(short, long)]
        configuration: String,
    },

    /// Resolve an identifier to its dataset path and THREDDS URLs
    Resolve { identifier: String },

    /// Uncertainty bounds and related coverages of an identifier
    Relations { identifier: String },

    /// Check catalog consistency; exits non-zero when issues are found
    Validate,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let args = Args::parse();
    init_tracing(&args);

    let mut settings = CatalogSettings::from_env().context("Failed to read catalog settings")?;
    if let Some(order) = args.identifier_order {
        settings = settings.with_identifier_order(order.into());
    }

    let catalog = load_catalog_from_dir(&args.catalog_dir, settings)
        .with_context(|| format!("Failed to load catalog from {}", args.catalog_dir.display()))?;
    info!(
        dir = %args.catalog_dir.display(),
        configurations = catalog.configuration_count(),
        "Catalog loaded"
    );

    let output = match args.command {
        Command::Configurations => commands::configurations(&catalog)?,
        Command::List {
            configuration,
            name_contains,
            filters,
            offset,
            limit,
        } => commands::list(&catalog, configuration, name_contains, filters, offset, limit)?,
        Command::Count { configuration } => commands::count(&catalog, &configuration)?,
        Command::Resolve { identifier } => commands::resolve(&catalog, &identifier)?,
        Command::Relations { identifier } => commands::relations(&catalog, &identifier)?,
        Command::Validate => {
            let (output, issues) = commands::validate(&catalog)?;
            println!("{}", output);
            if issues > 0 {
                anyhow::bail!("{} catalog issue(s) found", issues);
            }
            return Ok(());
        }
    };

    println!("{}", output);
    Ok(())
}

fn init_tracing(args: &Args) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    let builder = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    match args.log_format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}
