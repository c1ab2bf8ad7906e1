use tracing::{info, warn};

use crate::lag_features::{change_column, prev_column};
use crate::panel::{BREAKOUT, BREAKOUT_MAGNITUDE, BreakoutLabel, Panel, ValueStats};

pub const DEFAULT_PRIMARY_METRIC: &str = "E_NET_RATING";
pub const DEFAULT_THRESHOLD: f64 = 5.0;

#[derive(Debug, Clone, PartialEq)]
pub struct BreakoutConfig {
    pub primary_metric: String,
    /// Minimum one-season improvement, in the primary metric's own units.
    pub threshold: f64,
}

impl Default for BreakoutConfig {
    fn default() -> Self {
        Self {
            primary_metric: DEFAULT_PRIMARY_METRIC.to_string(),
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BreakoutSummary {
    pub total: usize,
    pub eligible: usize,
    pub breakouts: usize,
    /// Percent of eligible rows.
    pub rate_pct: f64,
    pub magnitudes: Option<ValueStats>,
}

impl BreakoutSummary {
    /// Breakouts as a percent of every row, first seasons included.
    pub fn share_of_rows_pct(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.breakouts as f64 / self.total as f64 * 100.0
    }
}

pub fn label_row(prev: Option<f64>, change: Option<f64>, threshold: f64) -> BreakoutLabel {
    if prev.is_none() {
        return BreakoutLabel {
            eligible: false,
            breakout: false,
            magnitude: Some(0.0),
        };
    }
    BreakoutLabel {
        eligible: true,
        breakout: change.is_some_and(|c| c >= threshold),
        magnitude: change,
    }
}

/// Labels every row of a lag-augmented panel and returns the labeling summary.
pub fn label_breakouts(panel: &mut Panel, config: &BreakoutConfig) -> BreakoutSummary {
    let prev_col = prev_column(&config.primary_metric);
    let change_col = change_column(&config.primary_metric);
    if !panel.has_column(&prev_col) {
        warn!(
            metric = %config.primary_metric,
            "panel has no {prev_col} column, no row is eligible"
        );
    }

    for record in &mut panel.records {
        let label = label_row(
            record.value(&prev_col),
            record.value(&change_col),
            config.threshold,
        );
        record.label = Some(label);
    }
    panel.push_column(BREAKOUT);
    panel.push_column(BREAKOUT_MAGNITUDE);

    let summary = summarize(panel);
    info!(
        threshold = config.threshold,
        metric = %config.primary_metric,
        total = summary.total,
        eligible = summary.eligible,
        breakouts = summary.breakouts,
        rate_pct = format_args!("{:.2}", summary.rate_pct),
        "breakouts labeled"
    );
    if let Some(stats) = summary.magnitudes {
        info!(
            min = format_args!("{:+.2}", stats.min),
            max = format_args!("{:+.2}", stats.max),
            mean = format_args!("{:+.2}", stats.mean),
            median = format_args!("{:+.2}", stats.median),
            "breakout improvements"
        );
    }
    summary
}

pub fn summarize(panel: &Panel) -> BreakoutSummary {
    let labels = panel.records.iter().filter_map(|r| r.label);
    let mut eligible = 0usize;
    let mut positives = Vec::new();
    for label in labels {
        if label.eligible {
            eligible += 1;
        }
        if label.breakout
            && let Some(m) = label.magnitude
        {
            positives.push(m);
        }
    }
    let breakouts = positives.len();
    let rate_pct = if eligible > 0 {
        breakouts as f64 / eligible as f64 * 100.0
    } else {
        0.0
    };
    BreakoutSummary {
        total: panel.len(),
        eligible,
        breakouts,
        rate_pct,
        magnitudes: ValueStats::from_values(&positives),
    }
}
