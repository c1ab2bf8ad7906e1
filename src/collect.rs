use std::fmt;
use std::path::Path;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use tracing::{info, warn};

use crate::merge::merge_season;
use crate::panel::Panel;
use crate::panel_csv::write_panel_csv;
use crate::season::Season;
use crate::table::StatTable;

/// Anything that can hand over the two raw tables of a season.
pub trait SeasonSource {
    fn league_stats(&self, season: &Season) -> Result<StatTable>;
    fn estimated_metrics(&self, season: &Season) -> Result<StatTable>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub attempts: u32,
    /// Delay before retry `n` is `backoff_base * n`.
    pub backoff_base: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            backoff_base: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    pub fn no_delay(attempts: u32) -> Self {
        Self {
            attempts,
            backoff_base: Duration::ZERO,
        }
    }

    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.backoff_base.saturating_mul(attempt)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pacing {
    pub after_request: Duration,
    pub after_season: Duration,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            after_request: Duration::from_millis(600),
            after_season: Duration::from_secs(1),
        }
    }
}

impl Pacing {
    pub fn none() -> Self {
        Self {
            after_request: Duration::ZERO,
            after_season: Duration::ZERO,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SeasonFailure {
    pub season: Season,
    pub reason: String,
}

/// Every season failed. Carries the per-season reasons for the run ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct NoDataCollected {
    pub failures: Vec<SeasonFailure>,
}

impl fmt::Display for NoDataCollected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "no data collected: all {} seasons failed",
            self.failures.len()
        )
    }
}

impl std::error::Error for NoDataCollected {}

#[derive(Debug, Clone)]
pub struct CollectionOutcome {
    pub seasons_total: usize,
    pub seasons_succeeded: usize,
    pub failures: Vec<SeasonFailure>,
    pub panel: Panel,
}

pub fn fetch_with_retry<T>(
    what: &str,
    season: &Season,
    policy: &RetryPolicy,
    mut fetch: impl FnMut() -> Result<T>,
) -> Result<T> {
    let attempts = policy.attempts.max(1);
    let mut last_err: Option<anyhow::Error> = None;
    for attempt in 1..=attempts {
        info!(%season, attempt, attempts, "fetching {what}");
        match fetch() {
            Ok(value) => return Ok(value),
            Err(err) => {
                warn!(%season, attempt, "{what} fetch failed: {err:#}");
                last_err = Some(err);
                if attempt < attempts {
                    pause(policy.delay_after(attempt));
                }
            }
        }
    }
    Err(last_err
        .unwrap_or_else(|| anyhow!("{what} fetch failed"))
        .context(format!("{what} for {season} failed after {attempts} attempts")))
}

/// Walks the seasons one at a time. Failed seasons are skipped; the progress file,
/// when given, is rewritten with everything merged so far after each success.
pub fn collect_all_seasons(
    source: &dyn SeasonSource,
    seasons: &[Season],
    policy: &RetryPolicy,
    pacing: &Pacing,
    progress_path: Option<&Path>,
) -> Result<CollectionOutcome> {
    let (Some(first), Some(last)) = (seasons.first(), seasons.last()) else {
        return Err(anyhow!("no seasons to collect"));
    };
    info!(from = %first, to = %last, total = seasons.len(), "collecting player seasons");

    let mut merged: Vec<Panel> = Vec::new();
    let mut failures = Vec::new();

    for (idx, season) in seasons.iter().enumerate() {
        info!(%season, "[{}/{}] processing season", idx + 1, seasons.len());

        let league = fetch_with_retry("league stats", season, policy, || {
            source.league_stats(season)
        });
        pause(pacing.after_request);
        let metrics = fetch_with_retry("estimated metrics", season, policy, || {
            source.estimated_metrics(season)
        });
        pause(pacing.after_request);

        let reason = match (&league, &metrics) {
            (Err(err), _) | (_, Err(err)) => Some(format!("{err:#}")),
            _ => None,
        };
        match merge_season(league.as_ref().ok(), metrics.as_ref().ok(), *season) {
            Some(panel) => {
                info!(%season, players = panel.len(), "season complete");
                merged.push(panel);
                if let Some(path) = progress_path {
                    let progress = Panel::concat(&merged);
                    write_panel_csv(path, &progress)
                        .with_context(|| format!("save progress after {season}"))?;
                    info!(rows = progress.len(), path = %path.display(), "progress saved");
                }
            }
            None => {
                let reason = reason.unwrap_or_else(|| "season inputs could not be merged".into());
                warn!(%season, "season failed, skipping: {reason}");
                failures.push(SeasonFailure {
                    season: *season,
                    reason,
                });
            }
        }

        pause(pacing.after_season);
    }

    if merged.is_empty() {
        return Err(NoDataCollected { failures }.into());
    }

    let panel = Panel::concat(&merged);
    info!(
        rows = panel.len(),
        seasons = merged.len(),
        players = panel.unique_players(),
        "data collection complete"
    );
    Ok(CollectionOutcome {
        seasons_total: seasons.len(),
        seasons_succeeded: merged.len(),
        failures,
        panel,
    })
}

fn pause(delay: Duration) {
    if !delay.is_zero() {
        thread::sleep(delay);
    }
}
