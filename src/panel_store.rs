use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{Connection, params};

use crate::collect::SeasonFailure;
use crate::panel::{BREAKOUT, BREAKOUT_MAGNITUDE, Cell, PLAYER_ID, Panel, SEASON, is_text_column};

pub fn open_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).ok();
    }
    let conn =
        Connection::open(path).with_context(|| format!("open sqlite db {}", path.display()))?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        PRAGMA journal_mode = WAL;
        CREATE TABLE IF NOT EXISTS player_seasons (
            player_id INTEGER NOT NULL,
            season TEXT NOT NULL,
            player_name TEXT NULL,
            team_abbreviation TEXT NULL,
            breakout INTEGER NULL,
            breakout_magnitude REAL NULL,
            updated_at TEXT NOT NULL,
            PRIMARY KEY (player_id, season)
        );
        CREATE TABLE IF NOT EXISTS player_season_values (
            player_id INTEGER NOT NULL,
            season TEXT NOT NULL,
            metric TEXT NOT NULL,
            value REAL NULL,
            PRIMARY KEY (player_id, season, metric)
        );
        CREATE INDEX IF NOT EXISTS idx_values_metric ON player_season_values(metric);
        CREATE INDEX IF NOT EXISTS idx_player_seasons_breakout ON player_seasons(breakout);

        CREATE TABLE IF NOT EXISTS collection_runs (
            run_id INTEGER PRIMARY KEY AUTOINCREMENT,
            started_at TEXT NOT NULL,
            finished_at TEXT NULL,
            seasons_total INTEGER NOT NULL,
            seasons_succeeded INTEGER NOT NULL,
            rows_written INTEGER NOT NULL,
            errors_json TEXT NOT NULL
        );
        "#,
    )
    .context("create sqlite schema")?;
    Ok(())
}

pub fn begin_run(conn: &Connection, seasons_total: usize) -> Result<i64> {
    conn.execute(
        "INSERT INTO collection_runs(started_at, finished_at, seasons_total, seasons_succeeded, rows_written, errors_json)
         VALUES (?1, NULL, ?2, 0, 0, '[]')",
        params![Utc::now().to_rfc3339(), seasons_total as i64],
    )
    .context("insert collection run")?;
    Ok(conn.last_insert_rowid())
}

pub fn finish_run(
    conn: &Connection,
    run_id: i64,
    seasons_succeeded: usize,
    rows_written: usize,
    failures: &[SeasonFailure],
) -> Result<()> {
    let errors = failures
        .iter()
        .map(|f| format!("season {}: {}", f.season, f.reason))
        .collect::<Vec<_>>();
    let errors_json = serde_json::to_string(&errors).unwrap_or_else(|_| "[]".to_string());
    conn.execute(
        "UPDATE collection_runs
         SET finished_at = ?1, seasons_succeeded = ?2, rows_written = ?3, errors_json = ?4
         WHERE run_id = ?5",
        params![
            Utc::now().to_rfc3339(),
            seasons_succeeded as i64,
            rows_written as i64,
            errors_json,
            run_id
        ],
    )
    .context("update collection run")?;
    Ok(())
}

/// Upserts every record with its numeric columns in long form. Returns rows written.
pub fn store_panel(conn: &mut Connection, panel: &Panel) -> Result<usize> {
    let metrics = panel
        .columns
        .iter()
        .filter(|c| !matches!(c.as_str(), PLAYER_ID | SEASON | BREAKOUT | BREAKOUT_MAGNITUDE))
        .filter(|c| !is_text_column(c))
        .collect::<Vec<_>>();

    let now = Utc::now().to_rfc3339();
    let tx = conn.transaction().context("begin store transaction")?;
    {
        let mut upsert_row = tx
            .prepare(
                r#"
                INSERT INTO player_seasons (
                    player_id, season, player_name, team_abbreviation,
                    breakout, breakout_magnitude, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                ON CONFLICT(player_id, season) DO UPDATE SET
                    player_name = excluded.player_name,
                    team_abbreviation = excluded.team_abbreviation,
                    breakout = excluded.breakout,
                    breakout_magnitude = excluded.breakout_magnitude,
                    updated_at = excluded.updated_at
                "#,
            )
            .context("prepare player season upsert")?;
        let mut upsert_value = tx
            .prepare(
                r#"
                INSERT INTO player_season_values (player_id, season, metric, value)
                VALUES (?1, ?2, ?3, ?4)
                ON CONFLICT(player_id, season, metric) DO UPDATE SET value = excluded.value
                "#,
            )
            .context("prepare value upsert")?;

        for record in &panel.records {
            let season = record.season.token();
            upsert_row
                .execute(params![
                    record.player_id,
                    season,
                    record.text.get("PLAYER_NAME"),
                    record.text.get("TEAM_ABBREVIATION"),
                    record.label.map(|l| i64::from(l.breakout)),
                    record.label.and_then(|l| l.magnitude),
                    now,
                ])
                .context("upsert player season")?;
            for metric in &metrics {
                let value = match record.cell(metric) {
                    Cell::Number(v) => Some(v),
                    _ => None,
                };
                upsert_value
                    .execute(params![record.player_id, season, metric, value])
                    .context("upsert player season value")?;
            }
        }
    }
    tx.commit().context("commit store transaction")?;
    Ok(panel.len())
}

pub fn count_breakouts(conn: &Connection) -> Result<usize> {
    let n = conn
        .query_row(
            "SELECT COUNT(*) FROM player_seasons WHERE breakout = 1",
            [],
            |row| row.get::<_, i64>(0),
        )
        .context("count breakouts")?;
    Ok(usize::try_from(n).unwrap_or_default())
}
