// courtvision entry point.
//
// Usage: courtvision <player_id> [season]
//
// 1. Initialize tracing (log to file, stdout carries the report)
// 2. Load config
// 3. Open the cache database
// 4. Build the report and print it as JSON

use std::sync::Arc;

use anyhow::{bail, Context};
use tracing::info;

use courtvision::cache::SqliteCache;
use courtvision::config;
use courtvision::pipeline::RatingPipeline;
use courtvision::provider::csv::CsvSource;
use courtvision::stats::PlayerId;

fn main() -> anyhow::Result<()> {
    init_tracing()?;
    info!("courtvision starting up");

    let mut args = std::env::args().skip(1);
    let Some(player_arg) = args.next() else {
        bail!("usage: courtvision <player_id> [season]");
    };
    let player_id: PlayerId = player_arg
        .parse()
        .with_context(|| format!("invalid player id: {player_arg}"))?;
    let season = args.next();

    let config = config::load_config().context("failed to load configuration")?;
    info!(
        "Config loaded: reference season {}, cache at {}",
        config.league.reference_season, config.cache.db_path
    );

    let store = SqliteCache::open(&config.cache.db_path).context("failed to open cache database")?;
    let source = Arc::new(CsvSource::from_paths(&config.data_paths));
    let pipeline = RatingPipeline::new(source.clone(), source, Arc::new(store), &config);

    let report = pipeline
        .player_report(player_id, season.as_deref())
        .with_context(|| format!("failed to build report for player {player_id}"))?;
    info!(
        "report built for {}: blended {} / {}",
        report.profile.player_name, report.blended.blended_value, report.blended_with_playoffs.blended_value
    );

    println!(
        "{}",
        serde_json::to_string_pretty(&report).context("failed to serialize report")?
    );
    Ok(())
}

/// Append tracing output to `logs/courtvision.log`. Each invocation builds
/// one report, so runs accumulate in the same file; stdout is the report.
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = std::env::current_dir()?.join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let log_path = log_dir.join("courtvision.log");
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("failed to open {}", log_path.display()))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("courtvision=info,warn")),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
