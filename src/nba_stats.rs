use anyhow::{Context, Result, anyhow};
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::collect::SeasonSource;
use crate::http_client::http_client;
use crate::season::Season;
use crate::table::StatTable;

pub const NBA_STATS_URL: &str = "https://stats.nba.com/stats";

const LEAGUE_STATS_ENDPOINT: &str = "leaguedashplayerstats";
const ESTIMATED_METRICS_ENDPOINT: &str = "playerestimatedmetrics";
const REGULAR_SEASON: &str = "Regular Season";

/// Live `SeasonSource` backed by the public stats.nba.com endpoints.
pub struct NbaStatsClient {
    client: &'static Client,
    base_url: String,
}

impl NbaStatsClient {
    pub fn new() -> Result<Self> {
        Ok(Self {
            client: http_client()?,
            base_url: NBA_STATS_URL.to_string(),
        })
    }

    fn get(&self, endpoint: &str, params: &[(&str, &str)]) -> Result<String> {
        let url = format!("{}/{endpoint}", self.base_url);
        debug!(%url, "requesting");
        let resp = self
            .client
            .get(&url)
            .query(params)
            .send()
            .with_context(|| format!("request {endpoint}"))?;
        let status = resp.status();
        let body = resp
            .text()
            .with_context(|| format!("read {endpoint} body"))?;
        if !status.is_success() {
            return Err(anyhow!("http {status} from {endpoint}"));
        }
        Ok(body)
    }
}

impl SeasonSource for NbaStatsClient {
    fn league_stats(&self, season: &Season) -> Result<StatTable> {
        let token = season.token();
        let params = league_stats_params(&token);
        let body = self.get(LEAGUE_STATS_ENDPOINT, &params)?;
        parse_result_set_json(&body, "LeagueDashPlayerStats")
    }

    fn estimated_metrics(&self, season: &Season) -> Result<StatTable> {
        let token = season.token();
        let params = [
            ("LeagueID", "00"),
            ("Season", token.as_str()),
            ("SeasonType", REGULAR_SEASON),
        ];
        let body = self.get(ESTIMATED_METRICS_ENDPOINT, &params)?;
        parse_result_set_json(&body, "PlayerEstimatedMetrics")
    }
}

// The endpoint rejects requests that leave out any of its filters, even empty ones.
fn league_stats_params(season: &str) -> Vec<(&'static str, &str)> {
    vec![
        ("College", ""),
        ("Conference", ""),
        ("Country", ""),
        ("DateFrom", ""),
        ("DateTo", ""),
        ("Division", ""),
        ("DraftPick", ""),
        ("DraftYear", ""),
        ("GameScope", ""),
        ("GameSegment", ""),
        ("Height", ""),
        ("LastNGames", "0"),
        ("LeagueID", "00"),
        ("Location", ""),
        ("MeasureType", "Base"),
        ("Month", "0"),
        ("OpponentTeamID", "0"),
        ("Outcome", ""),
        ("PORound", "0"),
        ("PaceAdjust", "N"),
        ("PerMode", "PerGame"),
        ("Period", "0"),
        ("PlayerExperience", ""),
        ("PlayerPosition", ""),
        ("PlusMinus", "N"),
        ("Rank", "N"),
        ("Season", season),
        ("SeasonSegment", ""),
        ("SeasonType", REGULAR_SEASON),
        ("ShotClockRange", ""),
        ("StarterBench", ""),
        ("TeamID", "0"),
        ("TwoWay", "0"),
        ("VsConference", ""),
        ("VsDivision", ""),
        ("Weight", ""),
    ]
}

#[derive(Debug, Deserialize)]
struct RawResultSet {
    #[serde(default)]
    name: Option<String>,
    headers: Vec<String>,
    #[serde(rename = "rowSet")]
    row_set: Vec<Vec<Value>>,
}

/// Pulls the named result set out of a stats response. Endpoints answer either with a
/// `resultSets` array or a single `resultSet` object; the first set is used when none
/// carries the requested name.
pub fn parse_result_set_json(raw: &str, name: &str) -> Result<StatTable> {
    let value =
        serde_json::from_str::<Value>(raw.trim()).context("invalid stats response json")?;

    let sets = match (value.get("resultSets"), value.get("resultSet")) {
        (Some(Value::Array(sets)), _) => sets.clone(),
        (Some(set @ Value::Object(_)), _) => vec![set.clone()],
        (None, Some(Value::Array(sets))) => sets.clone(),
        (None, Some(set @ Value::Object(_))) => vec![set.clone()],
        _ => return Err(anyhow!("stats response has no result sets")),
    };

    let mut parsed = sets
        .into_iter()
        .map(serde_json::from_value::<RawResultSet>)
        .collect::<Result<Vec<_>, _>>()
        .context("malformed result set")?;
    let pick = parsed
        .iter()
        .position(|s| s.name.as_deref() == Some(name))
        .unwrap_or(0);
    if parsed.is_empty() {
        return Err(anyhow!("stats response has an empty result set list"));
    }
    let set = parsed.swap_remove(pick);

    let width = set.headers.len();
    if let Some(bad) = set.row_set.iter().position(|row| row.len() != width) {
        return Err(anyhow!(
            "result set {name}: row {bad} has {} cells, expected {width}",
            set.row_set[bad].len()
        ));
    }
    Ok(StatTable {
        headers: set.headers,
        rows: set.row_set,
    })
}
