use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use json_adapter::{JsonHistoryStore, JsonRegistryStore, TextCandidateSource};
use milestone_core::application::{FailurePolicy, MilestoneCheckService};
use milestone_core::discovery::{DiscoveryService, DEFAULT_MIN_SUBSCRIBERS};
use milestone_core::ports::{Announcer, HistoryStore, RegistryStore, SystemClock};
use sqlite_adapter::{SqliteHistoryStore, SqliteRegistryStore};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use twitter_adapter::oauth::OAuthCredentials;
use twitter_adapter::{DryRunAnnouncer, TwitterClient};
use youtube_adapter::YoutubeClient;

/// Tracks YouTube subscriber milestones and announces each crossing
#[derive(Parser, Debug)]
#[command(name = "milestone-bot", version)]
#[command(about = "Announces when tracked YouTube channels pass million-subscriber milestones")]
struct Cli {
    /// Tracked-channel registry (JSON backend)
    #[arg(long, global = true, default_value = "channels.json")]
    channels: PathBuf,

    /// Milestone history log (JSON backend)
    #[arg(long, global = true, default_value = "milestone_history.json")]
    history: PathBuf,

    /// Where the registry and history are persisted
    #[arg(long, global = true, value_enum, default_value_t = Backend::Json)]
    backend: Backend,

    /// Database file (sqlite backend)
    #[arg(long, global = true, default_value = "milestones.db")]
    database: String,

    /// YouTube Data API key
    #[arg(long, global = true, env = "YOUTUBE_API_KEY", hide_env_values = true)]
    youtube_api_key: Option<String>,

    /// Log at debug level unless RUST_LOG is set
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Backend {
    Json,
    Sqlite,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check every tracked channel and announce crossed milestones
    Check(CheckArgs),
    /// Resolve candidate channel names and add eligible channels to the registry
    Discover(DiscoverArgs),
}

#[derive(Args, Debug)]
struct CheckArgs {
    /// Log announcements instead of posting them
    #[arg(long)]
    dry_run: bool,

    /// Continue with the next channel when one fails
    #[arg(long)]
    keep_going: bool,

    #[arg(long, env = "TWITTER_API_KEY", hide_env_values = true)]
    twitter_api_key: Option<String>,

    #[arg(long, env = "TWITTER_API_SECRET_KEY", hide_env_values = true)]
    twitter_api_secret: Option<String>,

    #[arg(long, env = "TWITTER_ACCESS_TOKEN", hide_env_values = true)]
    twitter_access_token: Option<String>,

    #[arg(long, env = "TWITTER_ACCESS_SECRET", hide_env_values = true)]
    twitter_access_secret: Option<String>,
}

#[derive(Args, Debug)]
struct DiscoverArgs {
    /// Candidate channel names, one per line
    #[arg(long, default_value = "channelname.txt")]
    candidates: PathBuf,

    /// Minimum subscriber count for a channel to be tracked (inclusive)
    #[arg(long, default_value_t = DEFAULT_MIN_SUBSCRIBERS)]
    min_subscribers: u64,
}

const VERBOSE_FILTER: &str = "info,milestone_bot=debug,milestone_core=debug,json_adapter=debug,\
sqlite_adapter=debug,youtube_adapter=debug,twitter_adapter=debug";

fn init_tracing(verbose: bool) {
    let fallback = if verbose { VERBOSE_FILTER } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)))
        .init();
}

fn stores(cli: &Cli) -> (Box<dyn RegistryStore>, Box<dyn HistoryStore>) {
    match cli.backend {
        Backend::Json => (
            Box::new(JsonRegistryStore::new(cli.channels.clone())),
            Box::new(JsonHistoryStore::new(cli.history.clone())),
        ),
        Backend::Sqlite => (
            Box::new(SqliteRegistryStore::new(cli.database.clone())),
            Box::new(SqliteHistoryStore::new(cli.database.clone())),
        ),
    }
}

fn youtube_client(cli: &Cli) -> Result<YoutubeClient> {
    let api_key = cli
        .youtube_api_key
        .clone()
        .context("missing YouTube API key (set YOUTUBE_API_KEY or pass --youtube-api-key)")?;
    YoutubeClient::new(api_key).context("failed to build YouTube client")
}

fn announcer(args: &CheckArgs) -> Result<Box<dyn Announcer>> {
    if args.dry_run {
        return Ok(Box::new(DryRunAnnouncer));
    }

    let require = |value: &Option<String>, var: &str| {
        value
            .clone()
            .with_context(|| format!("missing Twitter credential {var} (or pass --dry-run)"))
    };
    let credentials = OAuthCredentials {
        consumer_key: require(&args.twitter_api_key, "TWITTER_API_KEY")?,
        consumer_secret: require(&args.twitter_api_secret, "TWITTER_API_SECRET_KEY")?,
        access_token: require(&args.twitter_access_token, "TWITTER_ACCESS_TOKEN")?,
        access_secret: require(&args.twitter_access_secret, "TWITTER_ACCESS_SECRET")?,
    };
    Ok(Box::new(TwitterClient::new(credentials).context("failed to build Twitter client")?))
}

fn run_check(cli: &Cli, args: &CheckArgs) -> Result<()> {
    let (registry_store, history_store) = stores(cli);
    let youtube = youtube_client(cli)?;
    let announcer = announcer(args)?;

    let policy = if args.keep_going {
        FailurePolicy::KeepGoing
    } else {
        FailurePolicy::Halt
    };

    // Instantiate the core business service with dependency injection
    let service = MilestoneCheckService::new(
        registry_store,
        history_store,
        Box::new(youtube),
        announcer,
        Box::new(SystemClock),
    )
    .with_failure_policy(policy);

    let report = service.run_check().context("milestone check failed")?;
    tracing::info!(
        checked = report.outcomes.len(),
        announced = report.announced(),
        failed = report.failures.len(),
        "check finished"
    );
    if !report.failures.is_empty() {
        anyhow::bail!("{} channel(s) failed to check", report.failures.len());
    }
    Ok(())
}

fn run_discover(cli: &Cli, args: &DiscoverArgs) -> Result<()> {
    let (registry_store, _) = stores(cli);
    // Resolver and stats lookup are the same API client
    let youtube = youtube_client(cli)?;

    let service = DiscoveryService::new(
        Box::new(TextCandidateSource::new(args.candidates.clone())),
        Box::new(youtube.clone()),
        Box::new(youtube),
        registry_store,
    )
    .with_min_subscribers(args.min_subscribers);

    let report = service.run_discovery().context("discovery failed")?;
    tracing::info!(
        added = report.added.len(),
        skipped = report.skipped.len(),
        not_found = report.not_found.len(),
        "Finished processing. Popular channels saved."
    );
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match &cli.command {
        Commands::Check(args) => run_check(&cli, args),
        Commands::Discover(args) => run_discover(&cli, args),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
