use std::collections::{HashMap, HashSet};

use tracing::{debug, info, warn};

use crate::panel::{PLAYER_ID, Panel, PlayerSeasonRecord, SEASON, is_text_column};
use crate::season::Season;
use crate::table::{StatTable, value_as_i64};

pub const MIN_TOTAL_MINUTES: f64 = 500.0;

pub const TS_PCT: &str = "TS_PCT";
pub const EXPERIENCE: &str = "EXPERIENCE";

pub const LEAGUE_COLUMNS: &[&str] = &[
    "PLAYER_ID",
    "PLAYER_NAME",
    "TEAM_ABBREVIATION",
    "AGE",
    "GP",
    "W",
    "L",
    "MIN",
    "FGM",
    "FGA",
    "FG_PCT",
    "FG3M",
    "FG3A",
    "FG3_PCT",
    "FTM",
    "FTA",
    "FT_PCT",
    "OREB",
    "DREB",
    "REB",
    "AST",
    "TOV",
    "STL",
    "BLK",
    "BLKA",
    "PF",
    "PFD",
    "PTS",
    "PLUS_MINUS",
];

pub const METRIC_COLUMNS: &[&str] = &[
    "PLAYER_ID",
    "E_OFF_RATING",
    "E_DEF_RATING",
    "E_NET_RATING",
    "E_AST_RATIO",
    "E_OREB_PCT",
    "E_DREB_PCT",
    "E_REB_PCT",
    "E_TOV_PCT",
    "E_USG_PCT",
    "E_PACE",
];

/// Keeps rows with at least `min_total` minutes (per-game minutes times games played).
/// Returns `None` when the table has no `MIN` or `GP` column.
pub fn filter_min_minutes(table: &StatTable, min_total: f64) -> Option<StatTable> {
    let min_idx = table.column_index("MIN")?;
    let gp_idx = table.column_index("GP")?;
    let rows = (0..table.len())
        .filter(|&row| {
            match (table.number_at(row, min_idx), table.number_at(row, gp_idx)) {
                (Some(min), Some(gp)) => min * gp >= min_total,
                _ => false,
            }
        })
        .map(|row| table.rows[row].clone())
        .collect();
    Some(StatTable {
        headers: table.headers.clone(),
        rows,
    })
}

/// Allow-listed columns that the table actually has, in allow-list order.
pub fn project<'a>(table: &StatTable, allow: &[&'a str]) -> Vec<(&'a str, usize)> {
    allow
        .iter()
        .filter_map(|name| table.column_index(name).map(|idx| (*name, idx)))
        .collect()
}

pub fn true_shooting_pct(pts: Option<f64>, fga: Option<f64>, fta: Option<f64>) -> Option<f64> {
    let denom = 2.0 * (fga? + 0.44 * fta?);
    if denom == 0.0 {
        return None;
    }
    let ts = pts? / denom;
    ts.is_finite().then_some(ts)
}

pub fn experience(age: Option<f64>) -> Option<f64> {
    age.map(|a| (a - 19.0).max(0.0))
}

/// Joins one season's league stats with its estimated metrics. `None` means the
/// season cannot be used and should be skipped.
pub fn merge_season(
    league: Option<&StatTable>,
    metrics: Option<&StatTable>,
    season: Season,
) -> Option<Panel> {
    let (Some(league), Some(metrics)) = (league, metrics) else {
        return None;
    };

    let Some(league) = filter_min_minutes(league, MIN_TOTAL_MINUTES) else {
        warn!(%season, "league stats lack MIN/GP columns");
        return None;
    };
    debug!(%season, players = league.len(), "players with {MIN_TOTAL_MINUTES}+ minutes");

    let league_cols = project(&league, LEAGUE_COLUMNS);
    let metric_cols = project(metrics, METRIC_COLUMNS);
    let (Some(league_key), Some(metrics_key)) =
        (league.column_index(PLAYER_ID), metrics.column_index(PLAYER_ID))
    else {
        warn!(%season, "season inputs are not keyed by {PLAYER_ID}");
        return None;
    };

    let mut metric_rows: HashMap<i64, usize> = HashMap::with_capacity(metrics.len());
    for (row, cells) in metrics.rows.iter().enumerate() {
        if let Some(id) = cells.get(metrics_key).and_then(value_as_i64) {
            metric_rows.entry(id).or_insert(row);
        }
    }

    let has_ts_inputs = ["PTS", "FGA", "FTA"]
        .iter()
        .all(|c| league_cols.iter().any(|(name, _)| name == c));

    let mut columns = league_cols
        .iter()
        .chain(metric_cols.iter().filter(|(name, _)| *name != PLAYER_ID))
        .map(|(name, _)| name.to_string())
        .collect::<Vec<_>>();
    columns.push(SEASON.to_string());
    if has_ts_inputs {
        columns.push(TS_PCT.to_string());
    }
    columns.push(EXPERIENCE.to_string());

    let mut panel = Panel::new(columns);
    let mut seen = HashSet::new();
    for (row, cells) in league.rows.iter().enumerate() {
        let Some(player_id) = cells.get(league_key).and_then(value_as_i64) else {
            continue;
        };
        let Some(&metric_row) = metric_rows.get(&player_id) else {
            continue;
        };
        if !seen.insert(player_id) {
            continue;
        }

        let mut record = PlayerSeasonRecord::new(player_id, season);
        fill_columns(&mut record, &league, row, &league_cols);
        fill_columns(&mut record, metrics, metric_row, &metric_cols);

        if has_ts_inputs {
            let ts = true_shooting_pct(
                record.value("PTS"),
                record.value("FGA"),
                record.value("FTA"),
            );
            record.set_value(TS_PCT, ts);
        }
        let exp = experience(record.value("AGE"));
        record.set_value(EXPERIENCE, exp);
        panel.records.push(record);
    }

    info!(%season, players = panel.len(), "merged season");
    Some(panel)
}

fn fill_columns(
    record: &mut PlayerSeasonRecord,
    table: &StatTable,
    row: usize,
    columns: &[(&str, usize)],
) {
    for &(name, idx) in columns {
        if name == PLAYER_ID {
            continue;
        }
        if is_text_column(name) {
            if let Some(text) = table.text_at(row, idx) {
                record.set_text(name, text);
            }
        } else {
            record.set_value(name, table.number_at(row, idx));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{experience, true_shooting_pct};

    #[test]
    fn true_shooting_handles_zero_denominator() {
        let ts = true_shooting_pct(Some(20.0), Some(15.0), Some(5.0)).unwrap();
        assert!((ts - 20.0 / (2.0 * (15.0 + 2.2))).abs() < 1e-12);
        assert_eq!(true_shooting_pct(Some(0.0), Some(0.0), Some(0.0)), None);
        assert_eq!(true_shooting_pct(Some(3.0), Some(0.0), Some(0.0)), None);
        assert_eq!(true_shooting_pct(None, Some(10.0), Some(2.0)), None);
    }

    #[test]
    fn experience_is_floored_at_zero() {
        assert_eq!(experience(Some(18.0)), Some(0.0));
        assert_eq!(experience(Some(19.0)), Some(0.0));
        assert_eq!(experience(Some(27.0)), Some(8.0));
        assert_eq!(experience(None), None);
    }
}
