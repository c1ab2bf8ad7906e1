use std::fs;
use std::io::{Read, Write};
use std::path::Path;

use anyhow::{Context, Result, anyhow};

use crate::panel::{
    BREAKOUT, BREAKOUT_MAGNITUDE, Cell, PLAYER_ID, Panel, PlayerSeasonRecord, SEASON,
    is_text_column,
};
use crate::season::Season;

pub const PROGRESS_FILE: &str = "player_seasons_progress.csv";
pub const FINAL_FILE: &str = "player_seasons_with_breakouts.csv";

/// Writes the panel through a temp file and renames it over `path`.
pub fn write_panel_csv(path: &Path, panel: &Panel) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    }
    let tmp = path.with_extension("csv.tmp");
    let file = fs::File::create(&tmp).with_context(|| format!("create {}", tmp.display()))?;
    write_panel(file, panel).with_context(|| format!("write {}", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| format!("swap {}", path.display()))?;
    Ok(())
}

pub fn write_panel<W: Write>(writer: W, panel: &Panel) -> Result<()> {
    let mut out = csv::Writer::from_writer(writer);
    out.write_record(&panel.columns).context("write csv header")?;
    let mut row = Vec::with_capacity(panel.columns.len());
    for record in &panel.records {
        row.clear();
        row.extend(panel.columns.iter().map(|c| render_cell(record.cell(c))));
        out.write_record(&row).context("write csv row")?;
    }
    out.flush().context("flush csv")?;
    Ok(())
}

fn render_cell(cell: Cell<'_>) -> String {
    match cell {
        Cell::Int(v) => v.to_string(),
        Cell::Season(s) => s.token(),
        Cell::Text(s) => s.to_string(),
        Cell::Number(v) => v.to_string(),
        Cell::Missing => String::new(),
    }
}

pub fn read_panel_csv(path: &Path) -> Result<Panel> {
    let file = fs::File::open(path).with_context(|| format!("open {}", path.display()))?;
    read_panel(file).with_context(|| format!("read {}", path.display()))
}

/// Loads identity, text and numeric columns. Breakout label columns are dropped so the
/// panel can be relabeled from its lag columns.
pub fn read_panel<R: Read>(reader: R) -> Result<Panel> {
    let mut rdr = csv::Reader::from_reader(reader);
    let headers = rdr
        .headers()
        .context("read csv header")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect::<Vec<_>>();
    let id_idx = headers
        .iter()
        .position(|h| h == PLAYER_ID)
        .ok_or_else(|| anyhow!("csv has no {PLAYER_ID} column"))?;
    let season_idx = headers
        .iter()
        .position(|h| h == SEASON)
        .ok_or_else(|| anyhow!("csv has no {SEASON} column"))?;

    let columns = headers
        .iter()
        .filter(|h| h.as_str() != BREAKOUT && h.as_str() != BREAKOUT_MAGNITUDE)
        .cloned()
        .collect::<Vec<_>>();
    let mut panel = Panel::new(columns);

    for (line, row) in rdr.records().enumerate() {
        let row = row.with_context(|| format!("csv row {}", line + 2))?;
        let raw_id = row.get(id_idx).unwrap_or_default().trim();
        let player_id = parse_player_id(raw_id)
            .ok_or_else(|| anyhow!("csv row {}: bad {PLAYER_ID} {raw_id:?}", line + 2))?;
        let season = row
            .get(season_idx)
            .unwrap_or_default()
            .parse::<Season>()
            .with_context(|| format!("csv row {}", line + 2))?;

        let mut record = PlayerSeasonRecord::new(player_id, season);
        for (idx, name) in headers.iter().enumerate() {
            if idx == id_idx || idx == season_idx || name == BREAKOUT || name == BREAKOUT_MAGNITUDE
            {
                continue;
            }
            let raw = row.get(idx).unwrap_or_default();
            if is_text_column(name) {
                if !raw.is_empty() {
                    record.set_text(name, raw.to_string());
                }
            } else {
                record.set_value(name, raw.trim().parse::<f64>().ok());
            }
        }
        panel.records.push(record);
    }
    Ok(panel)
}

fn parse_player_id(raw: &str) -> Option<i64> {
    if let Ok(id) = raw.parse::<i64>() {
        return Some(id);
    }
    let f = raw.parse::<f64>().ok()?;
    (f.is_finite() && f.fract() == 0.0).then_some(f as i64)
}
