use anyhow::Result;
use chrono::NaiveDate;
use clap::Parser;
use stargazer_etl::mars::DEFAULT_ROVER;
use stargazer_etl::{Config, IngestError, IngestRequest};
use std::path::PathBuf;
use std::process::ExitCode;

mod commands;

#[derive(Debug, Parser)]
#[command(name = "stargazer", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the database (default: ~/.local/share/stargazer/apod.db)
    #[arg(long, global = true)]
    database: Option<PathBuf>,
}

#[derive(Debug, clap::Subcommand)]
enum Commands {
    /// Fetch Astronomy Picture of the Day entries into the database
    ///
    /// Resolves a date range, fetches every entry in it from the NASA APOD
    /// API in a single request, and upserts the result keyed by date.
    ///
    /// Range resolution:
    ///
    /// - No dates: the last --days days, ending today
    /// - --start-date only: --days days starting there
    /// - --end-date only: --days days ending there
    /// - Both: exactly that range
    ///
    /// The end is never later than today. Entries already in the database
    /// are overwritten, so re-running a range is safe.
    ///
    /// Network errors, HTTP 429 and 5xx responses are retried. A 429 with a
    /// Retry-After header waits that many seconds; anything else waits
    /// --retry-wait seconds.
    Ingest {
        /// Number of days to fetch when the range is open on either side
        #[arg(long, default_value_t = 30, allow_negative_numbers = true)]
        days: i64,

        /// First day to fetch (YYYY-MM-DD)
        #[arg(long, value_parser = parse_date_arg)]
        start_date: Option<NaiveDate>,

        /// Last day to fetch (YYYY-MM-DD), clamped to today
        #[arg(long, value_parser = parse_date_arg)]
        end_date: Option<NaiveDate>,

        /// NASA API key (default: config, then NASA_API_KEY, then DEMO_KEY)
        #[arg(long)]
        api_key: Option<String>,

        /// Retries after the first attempt (default: 3)
        #[arg(long)]
        max_retries: Option<u32>,

        /// Seconds between retries when the server gives no hint (default: 5)
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        retry_wait: Option<u64>,

        /// Do not request thumbnails for video entries
        #[arg(long)]
        no_thumbs: bool,
    },
    /// Fetch Mars rover photos for one Earth date into a JSON file
    Mars {
        /// Earth date (YYYY-MM-DD, default: today)
        #[arg(long, value_parser = parse_date_arg)]
        date: Option<NaiveDate>,

        /// Rover name
        #[arg(long, default_value = DEFAULT_ROVER)]
        rover: String,

        /// NASA API key (default: config, then NASA_API_KEY, then DEMO_KEY)
        #[arg(long)]
        api_key: Option<String>,

        /// Output file
        #[arg(long, default_value = "data/mars_photos.json")]
        output: PathBuf,
    },
    /// Show what the database holds
    Status,
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, clap::Subcommand)]
enum ConfigAction {
    /// Show the effective configuration
    Show,
    /// Print the config file path
    Path,
    /// Print an example config file
    Example,
    /// Create the config file if it does not exist
    Init,
}

fn parse_date_arg(value: &str) -> std::result::Result<NaiveDate, String> {
    stargazer_etl::parse_date(value).map_err(|e| e.to_string())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            match err.downcast_ref::<IngestError>() {
                Some(ingest) if ingest.is_transient() => {
                    eprintln!("Error [{}]: {err:#}", ingest.kind());
                    eprintln!("The failure may be temporary; re-running is safe.");
                }
                Some(ingest) => eprintln!("Error [{}]: {err:#}", ingest.kind()),
                None => eprintln!("Error: {err:#}"),
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?.with_overrides(cli.database, None, None, None)?;

    match cli.command {
        Commands::Ingest {
            days,
            start_date,
            end_date,
            api_key,
            max_retries,
            retry_wait,
            no_thumbs,
        } => {
            let config = config.with_overrides(None, api_key, max_retries, retry_wait)?;
            let request = IngestRequest {
                days,
                start: start_date,
                end: end_date,
            };
            commands::run_ingest(&config, request, !no_thumbs).await?;
        }
        Commands::Mars {
            date,
            rover,
            api_key,
            output,
        } => {
            let config = config.with_overrides(None, api_key, None, None)?;
            commands::run_mars(&config, date, &rover, &output).await?;
        }
        Commands::Status => {
            commands::show_status(&config.database_path)?;
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config::show_config(&config),
            ConfigAction::Path => commands::config::show_path(),
            ConfigAction::Example => commands::config::show_example(),
            ConfigAction::Init => commands::config::init_config()?,
        },
    }

    Ok(())
}
