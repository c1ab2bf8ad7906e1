use serde_json::{Value, json};

use nba_breakouts::merge::{filter_min_minutes, merge_season};
use nba_breakouts::panel::Cell;
use nba_breakouts::season::Season;
use nba_breakouts::table::StatTable;

fn league(rows: &[(i64, f64, f64, f64)]) -> StatTable {
    // (player id, minutes per game, games played, age)
    let mut table = StatTable::new(&[
        "PLAYER_ID",
        "PLAYER_NAME",
        "AGE",
        "GP",
        "MIN",
        "FGA",
        "FTA",
        "PTS",
    ]);
    for &(id, min, gp, age) in rows {
        table.rows.push(vec![
            json!(id),
            json!(format!("P{id}")),
            json!(age),
            json!(gp),
            json!(min),
            json!(10.0),
            json!(5.0),
            json!(15.0),
        ]);
    }
    table
}

fn metrics(ids: &[(i64, f64)]) -> StatTable {
    let mut table = StatTable::new(&["PLAYER_ID", "E_NET_RATING", "E_OFF_RATING"]);
    for &(id, net) in ids {
        table.rows.push(vec![json!(id), json!(net), json!(110.0)]);
    }
    table
}

#[test]
fn absent_input_means_failed_season() {
    let l = league(&[(1, 30.0, 60.0, 25.0)]);
    let m = metrics(&[(1, 2.0)]);
    assert!(merge_season(None, Some(&m), Season::new(2000)).is_none());
    assert!(merge_season(Some(&l), None, Season::new(2000)).is_none());
    assert!(merge_season(None, None, Season::new(2000)).is_none());
}

#[test]
fn inner_join_drops_one_sided_players() {
    let l = league(&[(1, 30.0, 60.0, 25.0), (2, 30.0, 60.0, 25.0)]);
    let m = metrics(&[(2, 1.5), (3, 4.0)]);
    let panel = merge_season(Some(&l), Some(&m), Season::new(2000)).unwrap();
    let ids = panel.records.iter().map(|r| r.player_id).collect::<Vec<_>>();
    assert_eq!(ids, vec![2]);
    assert_eq!(panel.records[0].value("E_NET_RATING"), Some(1.5));
}

#[test]
fn minimum_minutes_filter_is_inclusive() {
    // 10 * 50 = 500 stays, 9.9 * 50 = 495 goes.
    let l = league(&[(1, 10.0, 50.0, 22.0), (2, 9.9, 50.0, 22.0)]);
    let filtered = filter_min_minutes(&l, 500.0).unwrap();
    assert_eq!(filtered.len(), 1);

    let m = metrics(&[(1, 0.0), (2, 0.0)]);
    let panel = merge_season(Some(&l), Some(&m), Season::new(2000)).unwrap();
    assert_eq!(panel.len(), 1);
    assert_eq!(panel.records[0].player_id, 1);
}

#[test]
fn missing_minutes_or_games_excludes_row() {
    let mut l = league(&[(1, 30.0, 60.0, 25.0)]);
    l.rows.push(vec![
        json!(2),
        json!("P2"),
        json!(25.0),
        Value::Null,
        json!(30.0),
        json!(10.0),
        json!(5.0),
        json!(15.0),
    ]);
    let filtered = filter_min_minutes(&l, 500.0).unwrap();
    assert_eq!(filtered.len(), 1);
}

#[test]
fn allow_list_tolerates_missing_columns() {
    // No FTA column in this season: TS_PCT cannot be derived and is not emitted.
    let l = StatTable::new(&["PLAYER_ID", "GP", "MIN", "PTS", "FGA", "SOMETHING_NEW"])
        .with_row(vec![
            json!(1),
            json!(70),
            json!(30.0),
            json!(20.0),
            json!(15.0),
            json!(1),
        ]);
    let m = StatTable::new(&["PLAYER_ID", "E_NET_RATING"]).with_row(vec![json!(1), json!(3.0)]);
    let panel = merge_season(Some(&l), Some(&m), Season::new(1997)).unwrap();

    assert_eq!(
        panel.columns,
        vec!["PLAYER_ID", "GP", "MIN", "FGA", "PTS", "E_NET_RATING", "SEASON", "EXPERIENCE"]
    );
    assert_eq!(panel.records[0].cell("EXPERIENCE"), Cell::Missing);
    assert_eq!(panel.records[0].cell("SEASON"), Cell::Season(Season::new(1997)));
}

#[test]
fn derived_metrics_handle_edge_cases() {
    let l = StatTable::new(&["PLAYER_ID", "AGE", "GP", "MIN", "FGA", "FTA", "PTS"])
        .with_row(vec![
            json!(1),
            json!(18),
            json!(70),
            json!(30.0),
            json!(0.0),
            json!(0.0),
            json!(0.0),
        ])
        .with_row(vec![
            json!(2),
            json!(31),
            json!(70),
            json!(30.0),
            json!(20.0),
            json!(10.0),
            json!(28.0),
        ]);
    let m = metrics(&[(1, 0.0), (2, 0.0)]);
    let panel = merge_season(Some(&l), Some(&m), Season::new(2010)).unwrap();

    let young = &panel.records[0];
    assert_eq!(young.value("TS_PCT"), None);
    assert_eq!(young.value("EXPERIENCE"), Some(0.0));

    let vet = &panel.records[1];
    let expected = 28.0 / (2.0 * (20.0 + 0.44 * 10.0));
    assert!((vet.value("TS_PCT").unwrap() - expected).abs() < 1e-12);
    assert_eq!(vet.value("EXPERIENCE"), Some(12.0));
}

#[test]
fn duplicate_player_rows_keep_the_first() {
    let l = league(&[(5, 30.0, 60.0, 25.0), (5, 20.0, 40.0, 25.0)]);
    let m = metrics(&[(5, 1.0), (5, 9.0)]);
    let panel = merge_season(Some(&l), Some(&m), Season::new(2000)).unwrap();
    assert_eq!(panel.len(), 1);
    assert_eq!(panel.records[0].value("MIN"), Some(30.0));
    assert_eq!(panel.records[0].value("E_NET_RATING"), Some(1.0));
}

#[test]
fn unkeyed_input_fails_the_season() {
    let l = league(&[(1, 30.0, 60.0, 25.0)]);
    let m = StatTable::new(&["E_NET_RATING"]).with_row(vec![json!(1.0)]);
    assert!(merge_season(Some(&l), Some(&m), Season::new(2000)).is_none());
}
