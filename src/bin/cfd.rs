use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use climate_fact_data::app::Fetcher;
use climate_fact_data::config::{ConfigLoader, ResolvedConfig};
use climate_fact_data::domain::Dataset;
use climate_fact_data::drive::GoogleDriveClient;
use climate_fact_data::error::FetchError;
use climate_fact_data::http::ReqwestHttpClient;
use climate_fact_data::output::{HumanOutput, JsonOutput, OutputMode};
use climate_fact_data::store::Store;

#[derive(Parser)]
#[command(name = "cfd")]
#[command(about = "Fetch the climate fact-checking datasets, skipping files already present")]
#[command(version, author)]
struct Cli {
    /// JSON config file (defaults to ./climate-fact-data.json when present)
    #[arg(long, global = true)]
    config: Option<String>,

    /// Print results as JSON on stdout
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Fetch a single dataset")]
    Fetch(FetchArgs),
    #[command(about = "Fetch every dataset into a folder (default command)")]
    All(AllArgs),
    #[command(about = "List the datasets and where they come from")]
    List,
}

#[derive(Args)]
struct FetchArgs {
    /// train-claims, dev-claims, test-claims, dev-baseline or evidence
    dataset: String,

    /// Write to this path instead of the default file under the data directory
    #[arg(long)]
    dest: Option<Utf8PathBuf>,
}

#[derive(Args, Default)]
struct AllArgs {
    /// Destination folder (defaults to the data directory)
    #[arg(long)]
    dir: Option<Utf8PathBuf>,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(err) = report.downcast_ref::<FetchError>() {
            return ExitCode::from(map_exit_code(err));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &FetchError) -> u8 {
    match error {
        FetchError::UnknownDataset(_)
        | FetchError::ConfigRead(_)
        | FetchError::ConfigParse(_) => 2,
        FetchError::Http(_)
        | FetchError::HttpStatus { .. }
        | FetchError::DriveHttp(_)
        | FetchError::DriveStatus { .. }
        | FetchError::DriveConfirm { .. } => 3,
        FetchError::Filesystem(_) => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output_mode = if cli.json {
        OutputMode::Json
    } else {
        OutputMode::Human
    };

    let config = ConfigLoader::resolve(cli.config.as_deref())?;

    match cli.command.unwrap_or(Commands::All(AllArgs::default())) {
        Commands::Fetch(args) => {
            let dataset = args.dataset.parse::<Dataset>()?;
            let fetcher = build_fetcher(&config)?;
            let item = fetcher.fetch(dataset, args.dest.as_deref())?;
            let printed = match output_mode {
                OutputMode::Json => JsonOutput::print_item(&item),
                OutputMode::Human => HumanOutput::print_item(&item),
            };
            printed.into_diagnostic()
        }
        Commands::All(args) => {
            let fetcher = build_fetcher(&config)?;
            let result = fetcher.fetch_all(args.dir.as_deref())?;
            let printed = match output_mode {
                OutputMode::Json => JsonOutput::print_fetch(&result),
                OutputMode::Human => HumanOutput::print_fetch(&result),
            };
            printed.into_diagnostic()
        }
        Commands::List => {
            let printed = match output_mode {
                OutputMode::Json => JsonOutput::print_manifest(),
                OutputMode::Human => HumanOutput::print_manifest(),
            };
            printed.into_diagnostic()
        }
    }
}

fn build_fetcher(
    config: &ResolvedConfig,
) -> Result<Fetcher<ReqwestHttpClient, GoogleDriveClient>, FetchError> {
    let store = match &config.data_dir {
        Some(dir) => Store::new_with_root(dir.clone()),
        None => Store::new()?,
    };
    let http = ReqwestHttpClient::new(&config.client)?;
    let drive = GoogleDriveClient::new(&config.client)?;
    Ok(Fetcher::new(store, http, drive))
}
