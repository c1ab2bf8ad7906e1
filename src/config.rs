use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::breakout::{BreakoutConfig, DEFAULT_PRIMARY_METRIC};
use crate::collect::{Pacing, RetryPolicy};
use crate::lag_features::LagConfig;
use crate::panel_csv::{FINAL_FILE, PROGRESS_FILE};
use crate::season::{FIRST_TRACKED_YEAR, Season, season_range};

const DEFAULT_OUTPUT_DIR: &str = "data/raw";

#[derive(Debug, Clone, PartialEq)]
pub struct CollectConfig {
    pub start_year: i32,
    /// Exclusive; `None` means the current year.
    pub end_year: Option<i32>,
    pub breakout: BreakoutConfig,
    /// Lagged metrics; the breakout metric is added on use if missing.
    pub lag: LagConfig,
    pub retry: RetryPolicy,
    pub pacing: Pacing,
    pub output_dir: PathBuf,
    pub save_progress: bool,
    pub db_path: Option<PathBuf>,
    pub offline: bool,
}

impl Default for CollectConfig {
    fn default() -> Self {
        Self {
            start_year: FIRST_TRACKED_YEAR,
            end_year: None,
            breakout: BreakoutConfig::default(),
            lag: LagConfig::default(),
            retry: RetryPolicy::default(),
            pacing: Pacing::default(),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            save_progress: true,
            db_path: None,
            offline: false,
        }
    }
}

impl CollectConfig {
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Some(year) = env_parse::<i32>("NBA_START_YEAR") {
            cfg.start_year = year;
        }
        cfg.end_year = env_parse::<i32>("NBA_END_YEAR");
        if let Some(threshold) = env_parse::<f64>("BREAKOUT_THRESHOLD").filter(|t| t.is_finite())
        {
            cfg.breakout.threshold = threshold;
        }
        cfg.breakout.primary_metric = env::var("BREAKOUT_PRIMARY_METRIC")
            .ok()
            .map(|s| s.trim().to_ascii_uppercase())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_PRIMARY_METRIC.to_string());
        if let Some(metrics) = env::var("LAG_METRICS").ok().and_then(|v| parse_metric_list(&v)) {
            cfg.lag.metrics = metrics;
        }
        if let Some(attempts) = env_parse::<u32>("FETCH_RETRY_ATTEMPTS") {
            cfg.retry.attempts = attempts.clamp(1, 10);
        }
        if let Some(secs) = env_parse::<u64>("FETCH_BACKOFF_SECS") {
            cfg.retry.backoff_base = Duration::from_secs(secs.min(120));
        }
        if let Some(ms) = env_parse::<u64>("REQUEST_PAUSE_MS") {
            cfg.pacing.after_request = Duration::from_millis(ms);
        }
        if let Some(ms) = env_parse::<u64>("SEASON_PAUSE_MS") {
            cfg.pacing.after_season = Duration::from_millis(ms);
        }
        if let Some(dir) = env_path("NBA_OUTPUT_DIR") {
            cfg.output_dir = dir;
        }
        cfg.save_progress = env_bool("SAVE_PROGRESS", true);
        cfg.db_path = env_path("NBA_DB_PATH");
        cfg
    }

    /// Applies `--flag value` / `--flag=value` overrides on top of the current values.
    pub fn apply_args(mut self, args: &[String]) -> Self {
        if let Some(year) = arg_value(args, "--start").and_then(|v| v.parse().ok()) {
            self.start_year = year;
        }
        if let Some(year) = arg_value(args, "--end").and_then(|v| v.parse().ok()) {
            self.end_year = Some(year);
        }
        if let Some(t) = arg_value(args, "--threshold")
            .and_then(|v| v.parse::<f64>().ok())
            .filter(|t| t.is_finite())
        {
            self.breakout.threshold = t;
        }
        if let Some(metric) = arg_value(args, "--metric") {
            self.breakout.primary_metric = metric.to_ascii_uppercase();
        }
        if let Some(metrics) = arg_value(args, "--lag-metrics").and_then(|v| parse_metric_list(&v))
        {
            self.lag.metrics = metrics;
        }
        if let Some(dir) = arg_value(args, "--out") {
            self.output_dir = PathBuf::from(dir);
        }
        if let Some(db) = arg_value(args, "--db") {
            self.db_path = Some(PathBuf::from(db));
        }
        if has_flag(args, "--no-progress") {
            self.save_progress = false;
        }
        if has_flag(args, "--offline") {
            self.offline = true;
        }
        self
    }

    pub fn seasons(&self) -> Vec<Season> {
        season_range(self.start_year, self.end_year)
    }

    /// The lag set actually used: the configured metrics plus the breakout metric.
    pub fn lag_config(&self) -> LagConfig {
        self.lag.clone().including(&self.breakout.primary_metric)
    }

    pub fn progress_path(&self) -> Option<PathBuf> {
        self.save_progress
            .then(|| self.output_dir.join(PROGRESS_FILE))
    }

    pub fn final_path(&self) -> PathBuf {
        self.output_dir.join(FINAL_FILE)
    }
}

pub fn arg_value(args: &[String], flag: &str) -> Option<String> {
    let prefix = format!("{flag}=");
    for (idx, arg) in args.iter().enumerate() {
        if let Some(value) = arg.strip_prefix(&prefix) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        if arg == flag {
            let Some(next) = args.get(idx + 1) else {
                continue;
            };
            if !next.trim().is_empty() && !next.starts_with("--") {
                return Some(next.trim().to_string());
            }
        }
    }
    None
}

fn parse_metric_list(raw: &str) -> Option<Vec<String>> {
    let metrics = raw
        .split(',')
        .map(|m| m.trim().to_ascii_uppercase())
        .filter(|m| !m.is_empty())
        .collect::<Vec<_>>();
    (!metrics.is_empty()).then_some(metrics)
}

pub fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|a| a == flag)
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.trim().parse::<T>().ok())
}

fn env_path(key: &str) -> Option<PathBuf> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

fn env_bool(key: &str, default: bool) -> bool {
    env::var(key)
        .ok()
        .map(|v| {
            let t = v.trim().to_ascii_lowercase();
            !(t.is_empty() || t == "0" || t == "false" || t == "off" || t == "no")
        })
        .unwrap_or(default)
}
