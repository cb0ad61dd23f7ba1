use anyhow::{bail, ensure, Context};
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

const DANAWA_RECORD_URL: &str = "https://auto.danawa.com/auto/";

/// Which side of the market a model belongs to: domestically branded or imported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Nation {
    Domestic,
    Export,
}

impl Nation {
    pub const ALL: [Nation; 2] = [Nation::Domestic, Nation::Export];

    pub fn as_str(self) -> &'static str {
        match self {
            Nation::Domestic => "domestic",
            Nation::Export => "export",
        }
    }
}

impl fmt::Display for Nation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Nation {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "domestic" => Ok(Nation::Domestic),
            "export" => Ok(Nation::Export),
            other => bail!("invalid nation {other:?} (expected domestic or export)"),
        }
    }
}

/// A calendar month in `YYYY-MM` form.
///
/// Field order makes the derived `Ord` chronological, which also matches the
/// lexicographic order of the string form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Month {
    year: i32,
    month: u32,
}

impl Month {
    pub fn new(year: i32, month: u32) -> anyhow::Result<Self> {
        ensure!((1000..=9999).contains(&year), "year out of range: {year}");
        ensure!((1..=12).contains(&month), "month out of range: {month}");
        Ok(Self { year, month })
    }

    pub fn parse(s: &str) -> anyhow::Result<Self> {
        let bytes = s.as_bytes();
        ensure!(
            bytes.len() == 7 && bytes[4] == b'-',
            "month must be YYYY-MM (got {s:?})"
        );
        ensure!(
            bytes[..4].iter().chain(&bytes[5..]).all(u8::is_ascii_digit),
            "month must be YYYY-MM (got {s:?})"
        );

        let year: i32 = s[..4].parse().context("invalid year")?;
        let month: u32 = s[5..].parse().context("invalid month")?;
        Self::new(year, month)
    }

    pub fn from_date(date: NaiveDate) -> anyhow::Result<Self> {
        Self::new(date.year(), date.month())
    }

    pub fn year(self) -> i32 {
        self.year
    }

    pub fn month(self) -> u32 {
        self.month
    }

    /// The month before this one, or `None` when it would fall outside the supported range.
    pub fn pred(self) -> Option<Self> {
        if self.month == 1 {
            Self::new(self.year - 1, 12).ok()
        } else {
            Self::new(self.year, self.month - 1).ok()
        }
    }

    /// Compact `YYYYMM` form, used for seeding and lock keys.
    pub fn compact(self) -> String {
        format!("{:04}{:02}", self.year, self.month)
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for Month {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Month {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Month {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Month::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RadarKey {
    pub month: Month,
    pub nation: Nation,
}

impl RadarKey {
    pub fn new(month: Month, nation: Nation) -> Self {
        Self { month, nation }
    }
}

impl fmt::Display for RadarKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.month, self.nation)
    }
}

/// One ranked model within a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarModel {
    pub id: Uuid,
    pub rank: u32,
    pub name: String,
    pub brand: String,
    pub sales: u32,
    pub prev_sales: u32,
    pub mom_abs: i64,
    pub mom_pct: f64,
    pub rank_change: i32,
    pub score: f64,
    pub is_new_entry: bool,
    pub nation: Nation,
    pub month: Month,
    pub danawa_url: String,
}

/// Immutable ranked snapshot for one (month, nation) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RadarData {
    pub month: Month,
    pub nation: Nation,
    pub models: Vec<CarModel>,
    pub fetched_at: DateTime<Utc>,
}

impl RadarData {
    pub fn key(&self) -> RadarKey {
        RadarKey::new(self.month, self.nation)
    }
}

pub fn danawa_url(month: Month, nation: Nation) -> String {
    format!("{DANAWA_RECORD_URL}?Month={month}-00&Nation={nation}&Tab=Model&Work=record")
}
