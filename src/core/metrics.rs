//! Derived metrics over NAV and index series.
//!
//! Everything here is a pure function over ascending, date-unique series
//! (the invariant `NavSeries` and `IndexSeries` maintain). A series with
//! fewer than two points has nothing to measure, which the functions
//! report as `None` rather than as an error.

use crate::core::fund::Observation;
use anyhow::{Result, anyhow, bail};
use chrono::{NaiveDate, TimeDelta};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Display;
use std::str::FromStr;

/// How far back from the latest point a growth window reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Lookback {
    Days(i64),
    All,
}

/// Longest `Nd` window accepted from user input.
pub const MAX_LOOKBACK_DAYS: i64 = 100 * 366;

impl Lookback {
    pub const THREE_MONTHS: Lookback = Lookback::Days(90);
    pub const SIX_MONTHS: Lookback = Lookback::Days(180);
    pub const TWELVE_MONTHS: Lookback = Lookback::Days(365);
    pub const THIRTY_SIX_MONTHS: Lookback = Lookback::Days(3 * 365);
}

impl Display for Lookback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            Lookback::All => write!(f, "all"),
            Lookback::Days(90) => write!(f, "3 months"),
            Lookback::Days(180) => write!(f, "6 months"),
            Lookback::Days(365) => write!(f, "12 months"),
            Lookback::Days(1095) => write!(f, "36 months"),
            Lookback::Days(days) => write!(f, "{days} days"),
        }
    }
}

impl FromStr for Lookback {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "3m" => Ok(Lookback::THREE_MONTHS),
            "6m" => Ok(Lookback::SIX_MONTHS),
            "12m" | "1y" => Ok(Lookback::TWELVE_MONTHS),
            "36m" | "3y" => Ok(Lookback::THIRTY_SIX_MONTHS),
            "all" => Ok(Lookback::All),
            other => other
                .strip_suffix('d')
                .and_then(|days| days.parse::<i64>().ok())
                .filter(|days| (0..=MAX_LOOKBACK_DAYS).contains(days))
                .map(Lookback::Days)
                .ok_or_else(|| anyhow!("Invalid lookback window: {}", s)),
        }
    }
}

/// Inclusive date range picked by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            bail!("Start date {start} must not be after end date {end}");
        }
        Ok(Self { start, end })
    }

    /// The `days` days leading up to and including `end`, clamped at the earliest representable date.
    pub fn trailing(end: NaiveDate, days: i64) -> Self {
        Self {
            start: days_before(end, days.max(0)).unwrap_or(NaiveDate::MIN),
            end,
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// `date` moved back by `days`, or `None` when that leaves chrono's date range.
fn days_before(date: NaiveDate, days: i64) -> Option<NaiveDate> {
    TimeDelta::try_days(days).and_then(|delta| date.checked_sub_signed(delta))
}

/// Growth over a lookback window and the points it was measured on.
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodGrowth<'a, P> {
    pub growth_pct: f64,
    pub window: &'a [P],
}

/// Index of the point closest to `target`; ties go to the earlier point.
pub fn nearest_index<P: Observation>(series: &[P], target: NaiveDate) -> Option<usize> {
    if series.is_empty() {
        return None;
    }
    let after = series.partition_point(|p| p.date() < target);
    if after == 0 {
        return Some(0);
    }
    if after == series.len() {
        return Some(series.len() - 1);
    }
    let before_gap = (target - series[after - 1].date()).num_days().abs();
    let after_gap = (series[after].date() - target).num_days().abs();
    if before_gap <= after_gap {
        Some(after - 1)
    } else {
        Some(after)
    }
}

fn growth_between(start: f64, end: f64) -> f64 {
    if start == 0.0 {
        0.0
    } else {
        (end - start) / start * 100.0
    }
}

/// Percentage growth from the window start to the latest point.
///
/// The window starts at the point nearest to `latest - days` (or at the first
/// point for [`Lookback::All`]). A target before the first point starts the
/// window at the first point. A zero start value yields `0.0`.
pub fn period_growth<P: Observation>(
    series: &[P],
    lookback: Lookback,
) -> Option<PeriodGrowth<'_, P>> {
    if series.len() < 2 {
        return None;
    }
    let latest = series.last()?;
    let start_idx = match lookback {
        Lookback::All => 0,
        // A target before every representable date is before the first point too
        Lookback::Days(days) => match days_before(latest.date(), days) {
            Some(target) => nearest_index(series, target)?,
            None => 0,
        },
    };
    let window = &series[start_idx..];
    Some(PeriodGrowth {
        growth_pct: growth_between(window[0].value(), latest.value()),
        window,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReturnPoint {
    pub date: NaiveDate,
    pub value: f64,
}

impl Observation for ReturnPoint {
    fn date(&self) -> NaiveDate {
        self.date
    }

    fn value(&self) -> f64 {
        self.value
    }
}

/// A series rescaled so its first point is 100.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CumulativeReturnSeries {
    pub symbol: String,
    pub points: Vec<ReturnPoint>,
}

impl CumulativeReturnSeries {
    pub fn last_value(&self) -> Option<f64> {
        self.points.last().map(|p| p.value)
    }
}

/// Rebases `series` to 100 at its first point.
///
/// Returns `None` for an empty series or a zero anchor; such a series has no
/// meaningful cumulative return and must be left out of comparisons.
pub fn rebase_to_100<P: Observation>(symbol: &str, series: &[P]) -> Option<CumulativeReturnSeries> {
    let anchor = series.first()?.value();
    if anchor == 0.0 || !anchor.is_finite() {
        return None;
    }
    Some(CumulativeReturnSeries {
        symbol: symbol.to_string(),
        points: series
            .iter()
            .map(|p| ReturnPoint {
                date: p.date(),
                value: p.value() / anchor * 100.0,
            })
            .collect(),
    })
}

/// The slice of `series` falling inside `range`.
pub fn clip_to_range<'a, P: Observation>(series: &'a [P], range: &DateRange) -> &'a [P] {
    let from = series.partition_point(|p| p.date() < range.start);
    let to = series.partition_point(|p| p.date() <= range.end);
    &series[from..to.max(from)]
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonRow {
    pub date: NaiveDate,
    /// One cell per symbol, in `ComparisonTable::symbols` order.
    pub values: Vec<Option<f64>>,
}

/// Rebased series joined on the union of their dates.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ComparisonTable {
    pub symbols: Vec<String>,
    pub rows: Vec<ComparisonRow>,
}

impl ComparisonTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.rows.iter().map(|r| r.date).collect()
    }

    pub fn column(&self, symbol: &str) -> Option<Vec<Option<f64>>> {
        let idx = self.symbols.iter().position(|s| s == symbol)?;
        Some(self.rows.iter().map(|r| r.values[idx]).collect())
    }

    /// Latest populated value of a column.
    pub fn last_value(&self, symbol: &str) -> Option<f64> {
        self.column(symbol)?.into_iter().rev().flatten().next()
    }
}

/// Outer join of rebased series on date.
///
/// Dates missing from a series stay `None`; nothing is interpolated or
/// zero-filled, since funds and indices publish on different calendars.
pub fn align_and_merge(series: &[CumulativeReturnSeries]) -> ComparisonTable {
    let width = series.len();
    let mut by_date: BTreeMap<NaiveDate, Vec<Option<f64>>> = BTreeMap::new();

    for (col, s) in series.iter().enumerate() {
        for point in &s.points {
            by_date
                .entry(point.date)
                .or_insert_with(|| vec![None; width])[col] = Some(point.value);
        }
    }

    ComparisonTable {
        symbols: series.iter().map(|s| s.symbol.clone()).collect(),
        rows: by_date
            .into_iter()
            .map(|(date, values)| ComparisonRow { date, values })
            .collect(),
    }
}
