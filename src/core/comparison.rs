//! Cumulative return comparison of funds and market indices

use crate::core::fund::Observation;
use crate::core::metrics::{
    ComparisonTable, CumulativeReturnSeries, DateRange, align_and_merge, clip_to_range,
    rebase_to_100,
};
use crate::core::outcome::FetchOutcome;
use crate::core::service::{FundDataService, normalize_code};
use anyhow::{Result, bail};
use chrono::NaiveDate;
use std::fmt::Display;
use tracing::{debug, info};

/// Most funds, and separately most indices, one comparison may include.
pub const MAX_SELECTIONS: usize = 5;

/// A validated set of series to compare over one date range.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonRequest {
    pub funds: Vec<String>,
    pub indices: Vec<String>,
    pub range: DateRange,
}

fn dedup_codes(codes: &[String]) -> Vec<String> {
    let mut seen = Vec::new();
    for code in codes.iter().map(|c| normalize_code(c)) {
        if !code.is_empty() && !seen.contains(&code) {
            seen.push(code);
        }
    }
    seen
}

impl ComparisonRequest {
    pub fn new(
        funds: &[String],
        indices: &[String],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Self> {
        let range = DateRange::new(start, end)?;
        let funds = dedup_codes(funds);
        let indices = dedup_codes(indices);

        if funds.len() > MAX_SELECTIONS {
            bail!(
                "At most {MAX_SELECTIONS} funds can be compared, got {}",
                funds.len()
            );
        }
        if indices.len() > MAX_SELECTIONS {
            bail!(
                "At most {MAX_SELECTIONS} indices can be compared, got {}",
                indices.len()
            );
        }
        if funds.is_empty() && indices.is_empty() {
            bail!("Select at least one fund or index to compare");
        }

        Ok(Self {
            funds,
            indices,
            range,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesSource {
    Fund,
    Index,
}

impl Display for SeriesSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SeriesSource::Fund => write!(f, "fund"),
            SeriesSource::Index => write!(f, "index"),
        }
    }
}

/// Why a requested series is missing from the comparison table.
#[derive(Debug, Clone, PartialEq)]
pub enum Exclusion {
    NoData,
    Failed(String),
    InsufficientData { points: usize },
    ZeroAnchor,
}

impl Display for Exclusion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Exclusion::NoData => write!(f, "no data available"),
            Exclusion::Failed(reason) => write!(f, "fetch failed: {reason}"),
            Exclusion::InsufficientData { points } => {
                write!(f, "only {points} point(s) in the selected range")
            }
            Exclusion::ZeroAnchor => write!(f, "first value in range is zero"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExcludedSeries {
    pub symbol: String,
    pub source: SeriesSource,
    pub reason: Exclusion,
}

/// Rebased series that made it into the table, plus the ones left out.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Comparison {
    pub table: ComparisonTable,
    pub series: Vec<CumulativeReturnSeries>,
    pub excluded: Vec<ExcludedSeries>,
}

impl Comparison {
    fn add<P: Observation>(
        &mut self,
        symbol: &str,
        source: SeriesSource,
        points: FetchOutcome<&[P]>,
        range: &DateRange,
    ) {
        let reason = match points {
            FetchOutcome::Data(points) => {
                let clipped = clip_to_range(points, range);
                if clipped.len() < 2 {
                    Exclusion::InsufficientData {
                        points: clipped.len(),
                    }
                } else if let Some(rebased) = rebase_to_100(symbol, clipped) {
                    self.series.push(rebased);
                    return;
                } else {
                    Exclusion::ZeroAnchor
                }
            }
            FetchOutcome::Empty => Exclusion::NoData,
            FetchOutcome::Failed(reason) => Exclusion::Failed(reason),
        };
        debug!("Excluding {} {} from comparison: {}", source, symbol, reason);
        self.excluded.push(ExcludedSeries {
            symbol: symbol.to_string(),
            source,
            reason,
        });
    }
}

/// Fetches every requested series, rebases what has enough data and joins it on date.
///
/// Funds come first in the table, then indices, each in request order.
pub async fn build_comparison(
    service: &FundDataService,
    request: &ComparisonRequest,
) -> Comparison {
    let mut comparison = Comparison::default();

    for code in &request.funds {
        let outcome = service.nav_history(code).await;
        let points = match &outcome {
            FetchOutcome::Data(series) => FetchOutcome::Data(series.points()),
            FetchOutcome::Empty => FetchOutcome::Empty,
            FetchOutcome::Failed(reason) => FetchOutcome::Failed(reason.clone()),
        };
        comparison.add(code, SeriesSource::Fund, points, &request.range);
    }

    for symbol in &request.indices {
        let outcome = service.index_history(symbol, &request.range).await;
        let points = match &outcome {
            FetchOutcome::Data(series) => FetchOutcome::Data(series.points()),
            FetchOutcome::Empty => FetchOutcome::Empty,
            FetchOutcome::Failed(reason) => FetchOutcome::Failed(reason.clone()),
        };
        comparison.add(symbol, SeriesSource::Index, points, &request.range);
    }

    comparison.table = align_and_merge(&comparison.series);
    info!(
        "Comparison built: {} series over {} dates, {} excluded",
        comparison.series.len(),
        comparison.table.rows.len(),
        comparison.excluded.len()
    );
    comparison
}
