use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};

use nba_breakouts::config::{CollectConfig, arg_value};
use nba_breakouts::panel_csv::{PROGRESS_FILE, read_panel_csv};
use nba_breakouts::pipeline::{self, DatasetReport};

// Rebuilds lag features and breakout labels from an existing panel CSV, e.g. the
// progress file of an interrupted run, without touching the network.
fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    nba_breakouts::init_logging();

    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let cfg = CollectConfig::from_env().apply_args(&args);
    let input = arg_value(&args, "--input")
        .map(PathBuf::from)
        .unwrap_or_else(|| cfg.output_dir.join(PROGRESS_FILE));
    let output = arg_value(&args, "--output")
        .map(PathBuf::from)
        .unwrap_or_else(|| cfg.final_path());
    if input == output {
        return Err(anyhow!("refusing to overwrite the input {}", input.display()));
    }

    let panel = read_panel_csv(&input).context("load panel")?;
    if panel.is_empty() {
        return Err(anyhow!("no rows in {}", input.display()));
    }

    let (panel, breakouts) =
        pipeline::engineer_features(panel, &cfg.lag_config(), &cfg.breakout);
    pipeline::write_dataset(&output, &panel)?;

    let report = DatasetReport {
        collection: None,
        breakouts,
        dataset: panel.summary(&cfg.breakout.primary_metric),
        columns: panel.columns.len(),
    };
    pipeline::print_report(&report, &cfg.breakout.primary_metric);
    println!("Dataset: {}", output.display());
    Ok(())
}
