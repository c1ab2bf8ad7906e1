use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use anyhow::{Result, anyhow};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{Value, json};

use crate::collect::SeasonSource;
use crate::season::Season;
use crate::table::StatTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Feed {
    League,
    Metrics,
}

/// In-memory source with hand-written tables and injectable failures.
#[derive(Default)]
pub struct ScriptedSource {
    league: HashMap<Season, StatTable>,
    metrics: HashMap<Season, StatTable>,
    failures: RefCell<HashMap<(Season, Feed), u32>>,
    calls: Cell<usize>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_season(mut self, season: Season, league: StatTable, metrics: StatTable) -> Self {
        self.league.insert(season, league);
        self.metrics.insert(season, metrics);
        self
    }

    pub fn with_league_only(mut self, season: Season, league: StatTable) -> Self {
        self.league.insert(season, league);
        self
    }

    /// The next `times` league-stat requests for `season` fail.
    pub fn failing_league(self, season: Season, times: u32) -> Self {
        self.failures
            .borrow_mut()
            .insert((season, Feed::League), times);
        self
    }

    pub fn failing_metrics(self, season: Season, times: u32) -> Self {
        self.failures
            .borrow_mut()
            .insert((season, Feed::Metrics), times);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.get()
    }

    fn serve(&self, season: &Season, feed: Feed) -> Result<StatTable> {
        self.calls.set(self.calls.get() + 1);
        if let Some(left) = self.failures.borrow_mut().get_mut(&(*season, feed))
            && *left > 0
        {
            *left -= 1;
            return Err(anyhow!("scripted {feed:?} failure for {season}"));
        }
        let tables = match feed {
            Feed::League => &self.league,
            Feed::Metrics => &self.metrics,
        };
        tables
            .get(season)
            .cloned()
            .ok_or_else(|| anyhow!("no {feed:?} table scripted for {season}"))
    }
}

impl SeasonSource for ScriptedSource {
    fn league_stats(&self, season: &Season) -> Result<StatTable> {
        self.serve(season, Feed::League)
    }

    fn estimated_metrics(&self, season: &Season) -> Result<StatTable> {
        self.serve(season, Feed::Metrics)
    }
}

const TEAMS: &[&str] = &[
    "ATL", "BOS", "CHI", "DAL", "DEN", "GSW", "HOU", "LAL", "MIA", "MIL", "NYK", "PHX", "SAS",
    "TOR", "UTA",
];

/// Deterministic league generator for offline runs and benchmarks. Every player has a
/// fixed career window and an underlying skill that drifts a little each season.
pub struct SyntheticSource {
    players: u32,
    seed: u64,
    first_year: i32,
}

impl SyntheticSource {
    pub fn new(players: u32, seed: u64, first_year: i32) -> Self {
        Self {
            players,
            seed,
            first_year,
        }
    }

    fn career(&self, player: u32) -> (i32, i32) {
        let mut rng = StdRng::seed_from_u64(self.seed ^ u64::from(player).wrapping_mul(0x9e37));
        let start = self.first_year + rng.gen_range(0..20);
        let length = rng.gen_range(2..14);
        (start, start + length)
    }

    fn season_rng(&self, player: u32, season: &Season) -> StdRng {
        let mixed = self
            .seed
            .wrapping_add(u64::from(player) << 20)
            .wrapping_add(season.start_year() as u64);
        StdRng::seed_from_u64(mixed)
    }

    fn active(&self, season: &Season) -> impl Iterator<Item = u32> + '_ {
        let year = season.start_year();
        (1..=self.players).filter(move |p| {
            let (start, end) = self.career(*p);
            (start..end).contains(&year)
        })
    }

    fn net_rating(&self, player: u32, season: &Season) -> f64 {
        let (start, _) = self.career(player);
        let base = (f64::from(player % 17) - 8.0) * 0.9;
        let years_in = f64::from(season.start_year() - start);
        let mut rng = self.season_rng(player, season);
        base + years_in * 0.8 + rng.gen_range(-4.5..4.5)
    }
}

impl SeasonSource for SyntheticSource {
    fn league_stats(&self, season: &Season) -> Result<StatTable> {
        let mut table = StatTable::new(&[
            "PLAYER_ID",
            "PLAYER_NAME",
            "TEAM_ABBREVIATION",
            "AGE",
            "GP",
            "MIN",
            "FGA",
            "FG_PCT",
            "FG3_PCT",
            "FTA",
            "REB",
            "AST",
            "PTS",
        ]);
        for player in self.active(season) {
            let (start, _) = self.career(player);
            let mut rng = self.season_rng(player, season);
            let gp = f64::from(rng.gen_range(10..83_u32));
            let min = rng.gen_range(6.0..38.0_f64);
            let fga = (min * rng.gen_range(0.25..0.55_f64) * 10.0).round() / 10.0;
            let fta = (fga * rng.gen_range(0.1..0.45_f64) * 10.0).round() / 10.0;
            let fg_pct = rng.gen_range(0.38..0.58_f64);
            let pts = ((fga * fg_pct * 2.2 + fta * 0.75) * 10.0).round() / 10.0;
            let row: Vec<Value> = vec![
                json!(player),
                json!(format!("Player {player}")),
                json!(TEAMS[(player as usize + season.start_year() as usize) % TEAMS.len()]),
                json!(20 + season.start_year() - start + i32::from(player % 3 == 0)),
                json!(gp),
                json!((min * 10.0).round() / 10.0),
                json!(fga),
                json!((fg_pct * 1000.0).round() / 1000.0),
                json!((rng.gen_range(0.25..0.42_f64) * 1000.0).round() / 1000.0),
                json!(fta),
                json!((min * rng.gen_range(0.1..0.35_f64) * 10.0).round() / 10.0),
                json!((min * rng.gen_range(0.03..0.25_f64) * 10.0).round() / 10.0),
                json!(pts),
            ];
            table.rows.push(row);
        }
        Ok(table)
    }

    fn estimated_metrics(&self, season: &Season) -> Result<StatTable> {
        let mut table = StatTable::new(&[
            "PLAYER_ID",
            "PLAYER_NAME",
            "E_OFF_RATING",
            "E_DEF_RATING",
            "E_NET_RATING",
            "E_USG_PCT",
            "E_PACE",
        ]);
        for player in self.active(season) {
            let net = self.net_rating(player, season);
            let mut rng = self.season_rng(player, season);
            let def = rng.gen_range(102.0..114.0_f64);
            let row: Vec<Value> = vec![
                json!(player),
                json!(format!("Player {player}")),
                json!(((def + net) * 10.0).round() / 10.0),
                json!((def * 10.0).round() / 10.0),
                json!((net * 10.0).round() / 10.0),
                json!((rng.gen_range(0.12..0.32_f64) * 1000.0).round() / 1000.0),
                json!((rng.gen_range(90.0..102.0_f64) * 10.0).round() / 10.0),
            ];
            table.rows.push(row);
        }
        Ok(table)
    }
}
