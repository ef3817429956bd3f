use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use sentinel_archiver::aoi::AreaOfInterest;
use sentinel_archiver::archive::Archive;
use sentinel_archiver::config::{ConfigLoader, ResolvedConfig};
use sentinel_archiver::credentials::UserCredentials;
use sentinel_archiver::domain::{ProductDescriptor, ProductType};
use sentinel_archiver::error::FetchError;
use sentinel_archiver::orchestrator::{BatchRunner, SingleFileDownloader};
use sentinel_archiver::output::JsonOutput;
use sentinel_archiver::search::{CatalogHttpClient, CatalogSearch};
use sentinel_archiver::transfer::HttpRemoteSource;

#[derive(Parser)]
#[command(name = "s2-archiver")]
#[command(about = "Search the Sentinel-2 catalog and download products into a local archive")]
#[command(version, author)]
struct Cli {
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Run the catalog search and print matching products")]
    Search(SearchArgs),
    #[command(about = "Search the catalog and download matching products")]
    Fetch(FetchArgs),
    #[command(about = "List products recorded in the local archive")]
    List,
}

#[derive(Args, Clone)]
struct SearchArgs {
    #[arg(long)]
    product_type: Option<ProductType>,

    #[arg(long)]
    cloud_threshold: Option<f64>,

    #[arg(long)]
    limit: Option<usize>,

    #[arg(long)]
    offset: Option<usize>,
}

#[derive(Args, Clone)]
struct FetchArgs {
    #[command(flatten)]
    search: SearchArgs,

    #[arg(long)]
    destination: Option<String>,

    #[arg(long)]
    overwrite: bool,
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => ExitCode::from(code),
        Err(report) => {
            eprintln!("{report:?}");
            if let Some(fetch) = report.downcast_ref::<FetchError>() {
                return ExitCode::from(map_exit_code(fetch));
            }
            ExitCode::from(1)
        }
    }
}

fn map_exit_code(error: &FetchError) -> u8 {
    match error {
        FetchError::MissingConfig
        | FetchError::ConfigRead(_)
        | FetchError::ConfigParse(_)
        | FetchError::InvalidProductType(_)
        | FetchError::InvalidAoi(_) => 2,
        FetchError::CatalogHttp(_)
        | FetchError::ProductNotFound(_)
        | FetchError::Timeout(_)
        | FetchError::TransferHttp(_)
        | FetchError::TransferStatus { .. } => 3,
        FetchError::Filesystem(_) => 1,
    }
}

fn run() -> miette::Result<u8> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let resolved = ConfigLoader::resolve(cli.config.as_deref()).into_diagnostic()?;

    match cli.command {
        Commands::Search(args) => {
            let products = run_search(&resolved, &args)?;
            JsonOutput::print_search(&products).into_diagnostic()?;
            Ok(0)
        }
        Commands::Fetch(args) => {
            let products = run_search(&resolved, &args.search)?;
            let destination = args
                .destination
                .map(Into::into)
                .unwrap_or_else(|| resolved.destination.clone());
            let credentials = UserCredentials::from_env();
            let source = HttpRemoteSource::new(credentials).into_diagnostic()?;
            let downloader = SingleFileDownloader::new(
                source,
                resolved.download_url.clone(),
                args.overwrite || resolved.overwrite,
            );
            let runner = BatchRunner::new(Archive::new(destination));
            let report = runner.run(&downloader, &products);
            JsonOutput::print_batch(&report).into_diagnostic()?;
            Ok(report.status.exit_code())
        }
        Commands::List => {
            let archive = Archive::new(resolved.destination.clone());
            let records = archive.list_records().into_diagnostic()?;
            JsonOutput::print_records(&records).into_diagnostic()?;
            Ok(0)
        }
    }
}

fn run_search(
    resolved: &ResolvedConfig,
    args: &SearchArgs,
) -> miette::Result<Vec<ProductDescriptor>> {
    let product_type = args.product_type.or(resolved.product_type);
    let mut search = CatalogSearch::new(resolved.search_url.clone(), product_type);
    if let Some(limit) = args.limit.or(resolved.limit) {
        search.query_mut().limit(limit);
    }
    if let Some(offset) = args.offset.or(resolved.offset) {
        search.query_mut().start(offset);
    }
    for (key, value) in &resolved.filters {
        search.query_mut().filter_mut().add_equality(key, value);
    }
    search.query_mut().filter_mut().add_name_set(&resolved.products);
    search.cloud_threshold(args.cloud_threshold.unwrap_or(resolved.cloud_threshold));

    let credentials = UserCredentials::from_env();
    let client = CatalogHttpClient::new(credentials).into_diagnostic()?;
    search
        .execute(&client, Some(&resolved.aoi as &dyn AreaOfInterest))
        .into_diagnostic()
}
