use anyhow::Result;
use chrono::Local;

use nba_breakouts::collect::SeasonSource;
use nba_breakouts::config::CollectConfig;
use nba_breakouts::fake_source::SyntheticSource;
use nba_breakouts::nba_stats::NbaStatsClient;
use nba_breakouts::pipeline;

const OFFLINE_PLAYERS: u32 = 600;
const OFFLINE_SEED: u64 = 1996;

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    nba_breakouts::init_logging();

    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let cfg = CollectConfig::from_env().apply_args(&args);

    println!("NBA Player Breakout Season Dataset Generator");
    println!("Start time: {}", Local::now().format("%Y-%m-%d %H:%M:%S"));

    let source: Box<dyn SeasonSource> = if cfg.offline {
        Box::new(SyntheticSource::new(
            OFFLINE_PLAYERS,
            OFFLINE_SEED,
            cfg.start_year,
        ))
    } else {
        Box::new(NbaStatsClient::new()?)
    };

    let report = pipeline::run_collection(source.as_ref(), &cfg)?;
    pipeline::print_report(&report, &cfg.breakout.primary_metric);
    println!("Dataset: {}", cfg.final_path().display());
    println!("End time: {}", Local::now().format("%Y-%m-%d %H:%M:%S"));
    Ok(())
}
