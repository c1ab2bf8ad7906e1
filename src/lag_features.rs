use tracing::{debug, info};

use crate::panel::Panel;

pub const DEFAULT_LAG_METRICS: &[&str] = &[
    "E_NET_RATING",
    "E_OFF_RATING",
    "E_DEF_RATING",
    "PTS",
    "AST",
    "REB",
    "MIN",
    "GP",
    "TS_PCT",
    "E_USG_PCT",
    "FG_PCT",
    "FG3_PCT",
];

#[derive(Debug, Clone, PartialEq)]
pub struct LagConfig {
    pub metrics: Vec<String>,
}

impl Default for LagConfig {
    fn default() -> Self {
        Self {
            metrics: DEFAULT_LAG_METRICS.iter().map(|m| m.to_string()).collect(),
        }
    }
}

impl LagConfig {
    pub fn with_metrics(metrics: &[&str]) -> Self {
        Self {
            metrics: metrics.iter().map(|m| m.to_string()).collect(),
        }
    }

    /// Puts `metric` first when the set does not already carry it.
    pub fn including(mut self, metric: &str) -> Self {
        if !self.metrics.iter().any(|m| m == metric) {
            self.metrics.insert(0, metric.to_string());
        }
        self
    }
}

pub fn prev_column(metric: &str) -> String {
    format!("{metric}_PREV")
}

pub fn two_back_column(metric: &str) -> String {
    format!("{metric}_2YRS_AGO")
}

pub fn change_column(metric: &str) -> String {
    format!("{metric}_CHANGE_1YR")
}

pub fn growth_column(metric: &str) -> String {
    format!("{metric}_GROWTH_RATE")
}

pub fn change(current: Option<f64>, prev: Option<f64>) -> Option<f64> {
    Some(current? - prev?)
}

pub fn growth_rate(change: Option<f64>, prev: Option<f64>) -> Option<f64> {
    let prev = prev?;
    if prev == 0.0 {
        return None;
    }
    let rate = change? / prev.abs();
    rate.is_finite().then_some(rate)
}

/// Stable sort by player, then season.
pub fn sort_panel(panel: &mut Panel) {
    panel
        .records
        .sort_by(|a, b| (a.player_id, a.season).cmp(&(b.player_id, b.season)));
}

/// Adds `_PREV`, `_2YRS_AGO`, `_CHANGE_1YR` and `_GROWTH_RATE` columns for every
/// configured metric the panel has.
///
/// Lags are positional within each player's sorted seasons: a player who missed a
/// season is compared against their last recorded one, not the calendar year before.
pub fn compute_lag_features(mut panel: Panel, config: &LagConfig) -> Panel {
    sort_panel(&mut panel);

    let metrics = config
        .metrics
        .iter()
        .filter(|m| panel.has_column(m))
        .cloned()
        .collect::<Vec<_>>();
    if metrics.len() < config.metrics.len() {
        debug!(
            requested = config.metrics.len(),
            present = metrics.len(),
            "some lag metrics are absent from the panel"
        );
    }

    for metric in &metrics {
        panel.push_column(&prev_column(metric));
        panel.push_column(&two_back_column(metric));
    }
    for metric in &metrics {
        panel.push_column(&change_column(metric));
        panel.push_column(&growth_column(metric));
    }

    let mut back1: Option<usize> = None;
    let mut back2: Option<usize> = None;
    for idx in 0..panel.records.len() {
        let player_id = panel.records[idx].player_id;
        if back1.is_some_and(|b| panel.records[b].player_id != player_id) {
            back1 = None;
            back2 = None;
        }

        for metric in &metrics {
            let prev = back1.and_then(|b| panel.records[b].value(metric));
            let two_back = back2.and_then(|b| panel.records[b].value(metric));
            let record = &mut panel.records[idx];
            let delta = change(record.value(metric), prev);
            record.set_value(&prev_column(metric), prev);
            record.set_value(&two_back_column(metric), two_back);
            record.set_value(&change_column(metric), delta);
            record.set_value(&growth_column(metric), growth_rate(delta, prev));
        }

        back2 = back1;
        back1 = Some(idx);
    }

    info!(metrics = metrics.len(), rows = panel.len(), "lag features calculated");
    panel
}

#[cfg(test)]
mod tests {
    use super::{LagConfig, change, growth_rate};

    #[test]
    fn including_adds_missing_metric_once() {
        let cfg = LagConfig::with_metrics(&["PTS"]).including("E_PIE");
        assert_eq!(cfg.metrics, vec!["E_PIE", "PTS"]);
        let again = cfg.clone().including("PTS");
        assert_eq!(again, cfg);
    }

    #[test]
    fn change_propagates_missing() {
        assert_eq!(change(Some(8.0), Some(3.0)), Some(5.0));
        assert_eq!(change(None, Some(3.0)), None);
        assert_eq!(change(Some(8.0), None), None);
    }

    #[test]
    fn growth_rate_uses_absolute_previous() {
        assert_eq!(growth_rate(Some(5.0), Some(-10.0)), Some(0.5));
        assert_eq!(growth_rate(Some(-2.0), Some(4.0)), Some(-0.5));
        assert_eq!(growth_rate(Some(5.0), Some(0.0)), None);
        assert_eq!(growth_rate(Some(0.0), Some(0.0)), None);
        assert_eq!(growth_rate(None, Some(4.0)), None);
        assert_eq!(growth_rate(Some(1.0), None), None);
    }
}
