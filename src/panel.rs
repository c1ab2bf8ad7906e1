use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};

use crate::season::Season;

pub const PLAYER_ID: &str = "PLAYER_ID";
pub const SEASON: &str = "SEASON";
pub const BREAKOUT: &str = "BREAKOUT";
pub const BREAKOUT_MAGNITUDE: &str = "BREAKOUT_MAGNITUDE";

/// Columns carried as text rather than numbers.
pub const TEXT_COLUMNS: &[&str] = &["PLAYER_NAME", "TEAM_ABBREVIATION"];

pub fn is_text_column(name: &str) -> bool {
    TEXT_COLUMNS.contains(&name)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BreakoutLabel {
    pub eligible: bool,
    pub breakout: bool,
    /// 0.0 on ineligible rows; check `eligible` before reading it as a change.
    pub magnitude: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cell<'a> {
    Int(i64),
    Season(Season),
    Text(&'a str),
    Number(f64),
    Missing,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerSeasonRecord {
    pub player_id: i64,
    pub season: Season,
    pub text: BTreeMap<String, String>,
    pub values: BTreeMap<String, Option<f64>>,
    pub label: Option<BreakoutLabel>,
}

impl PlayerSeasonRecord {
    pub fn new(player_id: i64, season: Season) -> Self {
        Self {
            player_id,
            season,
            text: BTreeMap::new(),
            values: BTreeMap::new(),
            label: None,
        }
    }

    pub fn value(&self, column: &str) -> Option<f64> {
        self.values.get(column).copied().flatten()
    }

    pub fn set_value(&mut self, column: &str, value: Option<f64>) {
        let value = value.filter(|v| v.is_finite());
        self.values.insert(column.to_string(), value);
    }

    pub fn with_value(mut self, column: &str, value: f64) -> Self {
        self.set_value(column, Some(value));
        self
    }

    pub fn set_text(&mut self, column: &str, value: String) {
        self.text.insert(column.to_string(), value);
    }

    pub fn cell(&self, column: &str) -> Cell<'_> {
        match column {
            PLAYER_ID => Cell::Int(self.player_id),
            SEASON => Cell::Season(self.season),
            BREAKOUT => match self.label {
                Some(label) => Cell::Int(i64::from(label.breakout)),
                None => Cell::Missing,
            },
            BREAKOUT_MAGNITUDE => match self.label.and_then(|l| l.magnitude) {
                Some(m) => Cell::Number(m),
                None => Cell::Missing,
            },
            _ if is_text_column(column) => match self.text.get(column) {
                Some(s) => Cell::Text(s.as_str()),
                None => Cell::Missing,
            },
            _ => match self.value(column) {
                Some(v) => Cell::Number(v),
                None => Cell::Missing,
            },
        }
    }
}

/// The longitudinal player-season table. `columns` fixes the output order; the
/// season column is rendered from each record's identity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Panel {
    pub columns: Vec<String>,
    pub records: Vec<PlayerSeasonRecord>,
}

impl Panel {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            records: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    pub fn push_column(&mut self, name: &str) {
        if !self.has_column(name) {
            self.columns.push(name.to_string());
        }
    }

    /// Stacks per-season tables; the column list is the union in first-seen order.
    pub fn concat<'a>(parts: impl IntoIterator<Item = &'a Panel>) -> Panel {
        let mut out = Panel::default();
        for part in parts {
            for column in &part.columns {
                out.push_column(column);
            }
            out.records.extend(part.records.iter().cloned());
        }
        out
    }

    pub fn unique_players(&self) -> usize {
        self.records
            .iter()
            .map(|r| r.player_id)
            .collect::<HashSet<_>>()
            .len()
    }

    pub fn seasons(&self) -> Vec<Season> {
        let mut seasons = self
            .records
            .iter()
            .map(|r| r.season)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect::<Vec<_>>();
        seasons.sort();
        seasons
    }

    pub fn present_values(&self, column: &str) -> Vec<f64> {
        self.records.iter().filter_map(|r| r.value(column)).collect()
    }

    pub fn summary(&self, primary_metric: &str) -> PanelSummary {
        let seasons = self.seasons();
        let breakouts = self
            .records
            .iter()
            .filter(|r| r.label.is_some_and(|l| l.breakout))
            .count();
        PanelSummary {
            rows: self.len(),
            first_season: seasons.first().copied(),
            last_season: seasons.last().copied(),
            seasons_covered: seasons.len(),
            unique_players: self.unique_players(),
            breakouts,
            primary: ValueStats::from_values(&self.present_values(primary_metric)),
            most_missing: self.missing_shares(10),
        }
    }

    /// Columns with at least one missing cell, as a percentage of rows, worst first.
    pub fn missing_shares(&self, limit: usize) -> Vec<(String, f64)> {
        if self.records.is_empty() {
            return Vec::new();
        }
        let total = self.records.len() as f64;
        let mut shares = self
            .columns
            .iter()
            .filter_map(|column| {
                let missing = self
                    .records
                    .iter()
                    .filter(|r| matches!(r.cell(column), Cell::Missing))
                    .count();
                (missing > 0).then(|| (column.clone(), missing as f64 / total * 100.0))
            })
            .collect::<Vec<_>>();
        shares.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        shares.truncate(limit);
        shares
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PanelSummary {
    pub rows: usize,
    pub first_season: Option<Season>,
    pub last_season: Option<Season>,
    pub seasons_covered: usize,
    pub unique_players: usize,
    pub breakouts: usize,
    pub primary: Option<ValueStats>,
    pub most_missing: Vec<(String, f64)>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueStats {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
}

impl ValueStats {
    pub fn from_values(values: &[f64]) -> Option<Self> {
        let median = median_f64(values)?;
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mean = values.iter().sum::<f64>() / values.len() as f64;
        Some(Self {
            count: values.len(),
            min,
            max,
            mean,
            median,
        })
    }
}

fn median_f64(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}
