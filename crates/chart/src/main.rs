//! `chart-update`: bring a year of SNEP Top Singles up to date, or export it.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use chart::{
    ChartStore, Result, SqliteChartStore, UpdateConfig, current_iso_week, import_csv, write_csv,
};
use clap::{Args, Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, filter::LevelFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "chart-update", version, about)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    update: UpdateArgs,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scrape, enrich and persist every week after the last stored one (default).
    Update(UpdateArgs),
    /// Write the stored rows of a year as CSV.
    Export(ExportArgs),
    /// Load a yearly CSV file into the database, skipping rows already stored.
    Import(ImportArgs),
    /// Enrich stored rows of a year that have no producer yet.
    Enrich(UpdateArgs),
}

#[derive(Args, Debug)]
struct UpdateArgs {
    /// Year to update. Defaults to the current ISO year.
    #[arg(long, env = "TARGET_YEAR")]
    year: Option<i32>,

    /// Last week to process. Defaults to the current ISO week.
    #[arg(long, env = "TARGET_WEEK", value_parser = clap::value_parser!(u32).range(1..=53))]
    week: Option<u32>,

    /// SQLite database path.
    #[arg(long, env = "CHART_DB_PATH", default_value = "charts.db")]
    db: PathBuf,

    /// Song enrichment cache file.
    #[arg(long, env = "SONG_CACHE_PATH", default_value = "song_cache_v2.json")]
    song_cache: PathBuf,

    /// Scraped week cache file.
    #[arg(long, env = "WEEK_CACHE_PATH", default_value = "week_cache.json")]
    week_cache: PathBuf,

    /// Genius API access token. Songs are not enriched without it.
    #[arg(long, env = "GENIUS_ACCESS_TOKEN", hide_env_values = true)]
    genius_token: Option<String>,

    /// Pause after each chart page fetch, in milliseconds.
    #[arg(long, default_value_t = 1500)]
    page_delay_ms: u64,

    /// Pause after each Genius lookup, in milliseconds.
    #[arg(long, default_value_t = 100)]
    api_delay_ms: u64,
}

#[derive(Args, Debug)]
struct ExportArgs {
    /// Year to export. Defaults to the current ISO year.
    #[arg(long, env = "TARGET_YEAR")]
    year: Option<i32>,

    /// SQLite database path.
    #[arg(long, env = "CHART_DB_PATH", default_value = "charts.db")]
    db: PathBuf,

    /// Output file. Defaults to `top_singles_<year>.csv`.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct ImportArgs {
    /// Year to import. Defaults to the current ISO year.
    #[arg(long, env = "TARGET_YEAR")]
    year: Option<i32>,

    /// SQLite database path.
    #[arg(long, env = "CHART_DB_PATH", default_value = "charts.db")]
    db: PathBuf,

    /// Input file. Defaults to `top_singles_<year>.csv`.
    #[arg(long)]
    csv: Option<PathBuf>,
}

impl From<UpdateArgs> for UpdateConfig {
    fn from(args: UpdateArgs) -> Self {
        let defaults = Self::default();
        Self {
            year: args.year.unwrap_or(defaults.year),
            week: args.week.unwrap_or(defaults.week),
            db_path: args.db,
            song_cache_path: args.song_cache,
            week_cache_path: args.week_cache,
            genius_token: None,
            page_delay: Duration::from_millis(args.page_delay_ms),
            api_delay: Duration::from_millis(args.api_delay_ms),
        }
        .with_genius_token(args.genius_token)
    }
}

async fn update(args: UpdateArgs) -> Result<()> {
    let config = UpdateConfig::from(args);
    info!(year = config.year, week = config.week, "Starting chart update");

    let updater = config.build_updater()?;
    let report = updater.run(config.year, config.week).await;

    for unit in report.units.iter().filter(|u| u.is_failed()) {
        if let Some(e) = &unit.error {
            error!(unit = %unit.unit, state = %unit.state, error = %e, "Week failed");
        }
    }
    info!(
        persisted = report.persisted(),
        skipped = report.skipped(),
        failed = report.failed(),
        incomplete = report.incomplete(),
        rows = report.rows_inserted(),
        "Chart update completed"
    );
    Ok(())
}

async fn enrich(args: UpdateArgs) -> Result<()> {
    let config = UpdateConfig::from(args);
    info!(year = config.year, "Starting enrichment backfill");

    let updater = config.build_updater()?;
    let report = updater.backfill(config.year).await?;
    info!(
        pending = report.pending,
        enriched = report.enriched,
        unresolved = report.unresolved,
        failed = report.failed,
        "Enrichment backfill completed"
    );
    Ok(())
}

async fn import(args: ImportArgs) -> Result<()> {
    let year = args.year.unwrap_or_else(|| current_iso_week().0);
    let csv = args
        .csv
        .unwrap_or_else(|| PathBuf::from(format!("top_singles_{year}.csv")));

    let store = SqliteChartStore::new(&args.db)?;
    import_csv(&store, year, &csv).await?;
    Ok(())
}

async fn export(args: ExportArgs) -> Result<()> {
    let year = args.year.unwrap_or_else(|| current_iso_week().0);
    let out = args
        .out
        .unwrap_or_else(|| PathBuf::from(format!("top_singles_{year}.csv")));

    let store = SqliteChartStore::new(&args.db)?;
    let rows = store.rows_for_year(year).await?;
    let written = write_csv(&rows, &out)?;
    info!(year, rows = written, path = %out.display(), "Exported chart rows");
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
    {
        eprintln!("failed to install tracing subscriber: {e}");
    }

    let result = match cli.command.unwrap_or(Command::Update(cli.update)) {
        Command::Update(args) => update(args).await,
        Command::Export(args) => export(args).await,
        Command::Import(args) => import(args).await,
        Command::Enrich(args) => enrich(args).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "chart-update failed");
            ExitCode::FAILURE
        }
    }
}
