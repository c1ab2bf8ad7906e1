use nba_breakouts::breakout::{BreakoutConfig, label_breakouts};
use nba_breakouts::lag_features::{LagConfig, compute_lag_features};
use nba_breakouts::panel::{Cell, Panel, PlayerSeasonRecord};
use nba_breakouts::pipeline::engineer_features;
use nba_breakouts::season::Season;

fn panel_of(rows: &[(i64, i32, f64)]) -> Panel {
    let mut panel = Panel::new(
        ["PLAYER_ID", "SEASON", "E_NET_RATING"]
            .iter()
            .map(|s| s.to_string())
            .collect(),
    );
    for &(id, year, net) in rows {
        panel
            .records
            .push(PlayerSeasonRecord::new(id, Season::new(year)).with_value("E_NET_RATING", net));
    }
    panel
}

fn labeled(rows: &[(i64, i32, f64)], threshold: f64) -> Panel {
    let cfg = BreakoutConfig {
        threshold,
        ..BreakoutConfig::default()
    };
    engineer_features(panel_of(rows), &LagConfig::default(), &cfg).0
}

#[test]
fn boundary_change_is_a_breakout() {
    let panel = labeled(&[(1, 2010, 3.0), (1, 2011, 8.0)], 5.0);
    let row = &panel.records[1];
    assert_eq!(row.value("E_NET_RATING_CHANGE_1YR"), Some(5.0));
    assert_eq!(row.cell("BREAKOUT"), Cell::Int(1));
    assert_eq!(row.cell("BREAKOUT_MAGNITUDE"), Cell::Number(5.0));
}

#[test]
fn first_season_is_never_a_breakout() {
    let panel = labeled(&[(1, 2010, 40.0)], 5.0);
    let row = &panel.records[0];
    let label = row.label.unwrap();
    assert!(!label.eligible);
    assert_eq!(row.cell("BREAKOUT"), Cell::Int(0));
    assert_eq!(row.cell("BREAKOUT_MAGNITUDE"), Cell::Number(0.0));
}

#[test]
fn breakout_iff_eligible_and_change_at_least_threshold() {
    let rows = [
        (1, 2000, -2.0),
        (1, 2001, 4.0),
        (1, 2002, 8.9),
        (1, 2004, 1.0),
        (2, 1999, 0.0),
        (2, 2000, 5.0),
        (2, 2001, 9.99),
    ];
    let threshold = 5.0;
    let panel = labeled(&rows, threshold);
    for rec in &panel.records {
        let prev = rec.value("E_NET_RATING_PREV");
        let cur = rec.value("E_NET_RATING");
        let expected = match (prev, cur) {
            (Some(p), Some(c)) => c - p >= threshold,
            _ => false,
        };
        let label = rec.label.unwrap();
        assert_eq!(label.breakout, expected, "player {} {}", rec.player_id, rec.season);
        assert_eq!(label.eligible, prev.is_some());
    }
}

#[test]
fn summary_counts_and_magnitudes() {
    let mut panel = compute_lag_features(
        panel_of(&[
            (1, 2000, 0.0),
            (1, 2001, 6.0),
            (1, 2002, 7.0),
            (2, 2000, 1.0),
            (2, 2001, 11.0),
        ]),
        &LagConfig::default(),
    );
    let summary = label_breakouts(&mut panel, &BreakoutConfig::default());
    assert_eq!(summary.total, 5);
    assert_eq!(summary.eligible, 3);
    assert_eq!(summary.breakouts, 2);
    assert!((summary.rate_pct - 200.0 / 3.0).abs() < 1e-9);
    assert!((summary.share_of_rows_pct() - 40.0).abs() < 1e-9);
    let m = summary.magnitudes.unwrap();
    assert_eq!(m.min, 6.0);
    assert_eq!(m.max, 10.0);
    assert_eq!(m.mean, 8.0);
    assert_eq!(m.median, 8.0);
    assert_eq!(panel.summary("E_NET_RATING").breakouts, 2);
}

#[test]
fn missing_primary_metric_leaves_everything_ineligible() {
    let mut panel = compute_lag_features(
        panel_of(&[(1, 2000, 0.0), (1, 2001, 9.0)]),
        &LagConfig::default(),
    );
    let cfg = BreakoutConfig {
        primary_metric: "E_PIE".to_string(),
        threshold: 5.0,
    };
    let summary = label_breakouts(&mut panel, &cfg);
    assert_eq!(summary.eligible, 0);
    assert_eq!(summary.breakouts, 0);
    assert_eq!(summary.rate_pct, 0.0);
    assert_eq!(summary.share_of_rows_pct(), 0.0);
    assert!(summary.magnitudes.is_none());
}

#[test]
fn custom_threshold_applies() {
    let panel = labeled(&[(1, 2000, 0.0), (1, 2001, 2.0)], 2.0);
    assert_eq!(panel.records[1].cell("BREAKOUT"), Cell::Int(1));
    let panel = labeled(&[(1, 2000, 0.0), (1, 2001, 2.0)], 2.5);
    assert_eq!(panel.records[1].cell("BREAKOUT"), Cell::Int(0));
}
