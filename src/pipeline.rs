use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::breakout::{BreakoutConfig, BreakoutSummary, label_breakouts};
use crate::collect::{CollectionOutcome, NoDataCollected, SeasonSource, collect_all_seasons};
use crate::config::CollectConfig;
use crate::lag_features::{LagConfig, compute_lag_features};
use crate::panel::{Panel, PanelSummary};
use crate::panel_csv::write_panel_csv;
use crate::panel_store;

#[derive(Debug, Clone)]
pub struct DatasetReport {
    pub collection: Option<CollectionStats>,
    pub breakouts: BreakoutSummary,
    pub dataset: PanelSummary,
    pub columns: usize,
}

#[derive(Debug, Clone)]
pub struct CollectionStats {
    pub seasons_total: usize,
    pub seasons_succeeded: usize,
    pub failed: Vec<String>,
}

impl From<&CollectionOutcome> for CollectionStats {
    fn from(outcome: &CollectionOutcome) -> Self {
        Self {
            seasons_total: outcome.seasons_total,
            seasons_succeeded: outcome.seasons_succeeded,
            failed: outcome
                .failures
                .iter()
                .map(|f| format!("{}: {}", f.season, f.reason))
                .collect(),
        }
    }
}

/// Lag features then breakout labels, in that order.
pub fn engineer_features(
    panel: Panel,
    lag: &LagConfig,
    breakout: &BreakoutConfig,
) -> (Panel, BreakoutSummary) {
    let mut panel = compute_lag_features(panel, lag);
    let summary = label_breakouts(&mut panel, breakout);
    (panel, summary)
}

/// Full run: collect, engineer, write the final CSV and, when configured, the SQLite
/// copy. Nothing is written past the progress file if no season was collected.
pub fn run_collection(source: &dyn SeasonSource, cfg: &CollectConfig) -> Result<DatasetReport> {
    let seasons = cfg.seasons();
    let progress = cfg.progress_path();

    let mut ledger = match cfg.db_path.as_deref() {
        Some(path) => {
            let conn = panel_store::open_db(path)?;
            let run_id = panel_store::begin_run(&conn, seasons.len())?;
            Some((conn, run_id))
        }
        None => None,
    };

    let outcome = collect_all_seasons(
        source,
        &seasons,
        &cfg.retry,
        &cfg.pacing,
        progress.as_deref(),
    );
    let outcome = match outcome {
        Ok(outcome) => outcome,
        Err(err) => {
            if let Some((conn, run_id)) = ledger.as_ref() {
                let failures = err
                    .downcast_ref::<NoDataCollected>()
                    .map(|e| e.failures.as_slice())
                    .unwrap_or_default();
                panel_store::finish_run(conn, *run_id, 0, 0, failures)?;
            }
            return Err(err);
        }
    };

    let stats = CollectionStats::from(&outcome);
    let (panel, breakouts) =
        engineer_features(outcome.panel, &cfg.lag_config(), &cfg.breakout);
    write_dataset(&cfg.final_path(), &panel)?;

    if let Some((conn, run_id)) = ledger.as_mut() {
        let rows = panel_store::store_panel(conn, &panel)?;
        panel_store::finish_run(
            conn,
            *run_id,
            outcome.seasons_succeeded,
            rows,
            &outcome.failures,
        )?;
        info!(rows, "panel stored in sqlite");
    }

    Ok(DatasetReport {
        collection: Some(stats),
        breakouts,
        dataset: panel.summary(&cfg.breakout.primary_metric),
        columns: panel.columns.len(),
    })
}

pub fn write_dataset(path: &Path, panel: &Panel) -> Result<()> {
    write_panel_csv(path, panel).with_context(|| format!("save dataset {}", path.display()))?;
    info!(
        path = %path.display(),
        rows = panel.len(),
        columns = panel.columns.len(),
        "dataset saved"
    );
    Ok(())
}

pub fn print_report(report: &DatasetReport, primary_metric: &str) {
    let line = "=".repeat(70);
    println!("{line}");
    println!("DATASET SUMMARY");
    println!("{line}");
    if let Some(collection) = &report.collection {
        println!(
            "Seasons collected: {}/{}",
            collection.seasons_succeeded, collection.seasons_total
        );
        if !collection.failed.is_empty() {
            println!("Failed seasons: {}", collection.failed.len());
            for err in collection.failed.iter().take(8) {
                println!(" - {err}");
            }
        }
    }
    let d = &report.dataset;
    println!("Total player-seasons: {}", d.rows);
    println!("Columns: {}", report.columns);
    if let (Some(first), Some(last)) = (d.first_season, d.last_season) {
        println!("Seasons covered: {first} to {last} ({})", d.seasons_covered);
    }
    println!("Unique players: {}", d.unique_players);
    let b = &report.breakouts;
    println!("Eligible (have previous season): {}", b.eligible);
    println!(
        "Breakouts: {} ({:.2}% of eligible, {:.2}% of all rows)",
        b.breakouts,
        b.rate_pct,
        b.share_of_rows_pct()
    );
    if let Some(m) = b.magnitudes {
        println!(
            "Breakout improvements: min {:+.2} max {:+.2} mean {:+.2} median {:+.2}",
            m.min, m.max, m.mean, m.median
        );
    }
    if let Some(p) = d.primary {
        println!(
            "{primary_metric}: min {:.2} max {:.2} mean {:.2} median {:.2}",
            p.min, p.max, p.mean, p.median
        );
    }
    if !d.most_missing.is_empty() {
        println!("Missing data:");
        for (column, pct) in &d.most_missing {
            println!("  {column:<28} {pct:>6.2}%");
        }
    }
    println!("{line}");
}
