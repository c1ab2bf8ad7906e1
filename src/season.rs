use std::fmt;
use std::str::FromStr;

use anyhow::{Result, anyhow};
use chrono::{Datelike, Utc};

pub const FIRST_TRACKED_YEAR: i32 = 1996;

/// A league season such as `1996-97`, identified by the year it starts in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Season {
    start_year: i32,
}

impl Season {
    pub fn new(start_year: i32) -> Self {
        Self { start_year }
    }

    pub fn start_year(&self) -> i32 {
        self.start_year
    }

    pub fn token(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let end = (self.start_year + 1).rem_euclid(100);
        write!(f, "{:04}-{:02}", self.start_year, end)
    }
}

impl FromStr for Season {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        let (start, end) = trimmed
            .split_once('-')
            .ok_or_else(|| anyhow!("season token {trimmed:?} is not YYYY-YY"))?;
        if start.len() != 4 || end.len() != 2 {
            return Err(anyhow!("season token {trimmed:?} is not YYYY-YY"));
        }
        let start_year = start
            .parse::<i32>()
            .map_err(|_| anyhow!("season token {trimmed:?} has a bad start year"))?;
        let end_suffix = end
            .parse::<i32>()
            .map_err(|_| anyhow!("season token {trimmed:?} has a bad end year"))?;
        if (start_year + 1).rem_euclid(100) != end_suffix {
            return Err(anyhow!(
                "season token {trimmed:?} does not span consecutive years"
            ));
        }
        Ok(Self { start_year })
    }
}

/// Seasons starting in `start_year..end_year`; `end_year` defaults to the current year,
/// so the season still in progress is left out.
pub fn season_range(start_year: i32, end_year: Option<i32>) -> Vec<Season> {
    let end_year = end_year.unwrap_or_else(current_year);
    (start_year..end_year).map(Season::new).collect()
}

pub fn current_year() -> i32 {
    Utc::now().year()
}
