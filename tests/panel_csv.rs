use nba_breakouts::breakout::BreakoutConfig;
use nba_breakouts::lag_features::LagConfig;
use nba_breakouts::panel::{Cell, Panel, PlayerSeasonRecord};
use nba_breakouts::panel_csv::{read_panel, write_panel, write_panel_csv};
use nba_breakouts::pipeline::engineer_features;
use nba_breakouts::season::Season;

fn sample() -> Panel {
    let mut panel = Panel::new(
        ["PLAYER_ID", "PLAYER_NAME", "E_NET_RATING", "FG3_PCT", "SEASON"]
            .iter()
            .map(|s| s.to_string())
            .collect(),
    );
    let mut a = PlayerSeasonRecord::new(1, Season::new(1999)).with_value("E_NET_RATING", -2.0);
    a.set_text("PLAYER_NAME", "Smith, Jr.".to_string());
    a.set_value("FG3_PCT", None);
    let b = PlayerSeasonRecord::new(1, Season::new(2000)).with_value("E_NET_RATING", 4.0);
    panel.records.push(a);
    panel.records.push(b);
    panel
}

#[test]
fn header_and_cells_render_as_expected() {
    let (panel, _) = engineer_features(sample(), &LagConfig::default(), &BreakoutConfig::default());
    let mut buf = Vec::new();
    write_panel(&mut buf, &panel).unwrap();
    let text = String::from_utf8(buf).unwrap();
    let mut lines = text.lines();

    assert_eq!(
        lines.next().unwrap(),
        "PLAYER_ID,PLAYER_NAME,E_NET_RATING,FG3_PCT,SEASON,\
         E_NET_RATING_PREV,E_NET_RATING_2YRS_AGO,FG3_PCT_PREV,FG3_PCT_2YRS_AGO,\
         E_NET_RATING_CHANGE_1YR,E_NET_RATING_GROWTH_RATE,FG3_PCT_CHANGE_1YR,FG3_PCT_GROWTH_RATE,\
         BREAKOUT,BREAKOUT_MAGNITUDE"
    );
    assert_eq!(
        lines.next().unwrap(),
        "1,\"Smith, Jr.\",-2,,1999-00,,,,,,,,,0,0"
    );
    assert_eq!(lines.next().unwrap(), "1,,4,,2000-01,-2,,,,6,3,,,1,6");
}

#[test]
fn reading_back_drops_labels_and_keeps_missing() {
    let (panel, _) = engineer_features(sample(), &LagConfig::default(), &BreakoutConfig::default());
    let mut buf = Vec::new();
    write_panel(&mut buf, &panel).unwrap();

    let loaded = read_panel(buf.as_slice()).unwrap();
    assert_eq!(loaded.len(), 2);
    assert!(!loaded.has_column("BREAKOUT"));
    assert!(loaded.records.iter().all(|r| r.label.is_none()));
    let first = &loaded.records[0];
    assert_eq!(first.cell("PLAYER_NAME"), Cell::Text("Smith, Jr."));
    assert_eq!(first.cell("FG3_PCT"), Cell::Missing);
    assert_eq!(loaded.records[1].value("E_NET_RATING_CHANGE_1YR"), Some(6.0));
}

#[test]
fn relabeling_a_loaded_panel_is_stable() {
    let (panel, first) =
        engineer_features(sample(), &LagConfig::default(), &BreakoutConfig::default());
    let mut buf = Vec::new();
    write_panel(&mut buf, &panel).unwrap();
    let loaded = read_panel(buf.as_slice()).unwrap();

    let (again, second) =
        engineer_features(loaded, &LagConfig::default(), &BreakoutConfig::default());
    assert_eq!(first, second);
    assert_eq!(again.columns, panel.columns);
}

#[test]
fn file_write_replaces_previous_contents() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("panel.csv");
    write_panel_csv(&path, &sample()).unwrap();
    let mut smaller = sample();
    smaller.records.truncate(1);
    write_panel_csv(&path, &smaller).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    assert_eq!(text.lines().count(), 2);
    assert!(!path.with_extension("csv.tmp").exists());
}
