use super::{http_client, post_json};
use crate::core::fund::{IndexPricePoint, IndexSeries};
use crate::core::metrics::DateRange;
use crate::core::provider::IndexDataProvider;
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Exchange time zone; daily bars are stamped at local midnight.
const MARKET_UTC_OFFSET_SECS: i32 = 7 * 3600;

/// Daily index closes from the VCI OHLC chart API.
pub struct VciIndexProvider {
    base_url: String,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ChartRequest<'a> {
    time_frame: &'a str,
    symbols: [&'a str; 1],
    from: i64,
    to: i64,
}

#[derive(Debug, Deserialize)]
struct ChartSeries {
    symbol: Option<String>,
    #[serde(default)]
    t: Vec<Timestamp>,
    #[serde(default)]
    c: Vec<Option<f64>>,
}

/// Bar timestamps arrive as numbers or as numeric strings.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Timestamp {
    Seconds(i64),
    Text(String),
}

impl Timestamp {
    fn seconds(&self) -> Result<i64> {
        match self {
            Timestamp::Seconds(s) => Ok(*s),
            Timestamp::Text(s) => s
                .parse()
                .with_context(|| format!("Invalid bar timestamp: {s}")),
        }
    }
}

fn market_offset() -> Result<FixedOffset> {
    FixedOffset::east_opt(MARKET_UTC_OFFSET_SECS).ok_or_else(|| anyhow!("Invalid market offset"))
}

fn epoch_seconds(date: NaiveDate, time: NaiveTime, offset: FixedOffset) -> Result<i64> {
    date.and_time(time)
        .and_local_timezone(offset)
        .single()
        .map(|dt| dt.timestamp())
        .ok_or_else(|| anyhow!("Invalid market time for {date}"))
}

fn market_date(seconds: i64, offset: FixedOffset) -> Result<NaiveDate> {
    DateTime::from_timestamp(seconds, 0)
        .map(|dt| dt.with_timezone(&offset).date_naive())
        .ok_or_else(|| anyhow!("Bar timestamp out of range: {seconds}"))
}

impl VciIndexProvider {
    pub fn new(base_url: &str) -> Result<Self> {
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: http_client()?,
        })
    }
}

#[async_trait]
impl IndexDataProvider for VciIndexProvider {
    #[instrument(name = "VciIndexHistory", skip(self), fields(symbol = %symbol))]
    async fn index_history(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<IndexSeries> {
        let offset = market_offset()?;
        let url = format!("{}/api/chart/OHLCChart/gap-chart", self.base_url);
        let request = ChartRequest {
            time_frame: "ONE_DAY",
            symbols: [symbol],
            from: epoch_seconds(start, NaiveTime::MIN, offset)?,
            to: epoch_seconds(
                end,
                NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN),
                offset,
            )?,
        };

        let response: Vec<ChartSeries> =
            post_json(&self.client, &url, &request, &format!("index history {symbol}")).await?;

        let Some(chart) = response
            .into_iter()
            .find(|s| s.symbol.as_deref().is_none_or(|s| s.eq_ignore_ascii_case(symbol)))
        else {
            debug!("No chart returned for {}", symbol);
            return Ok(IndexSeries::new(symbol, Vec::new()));
        };

        let range = DateRange { start, end };
        let mut points = Vec::new();
        for (ts, close) in chart.t.iter().zip(chart.c) {
            let Some(close) = close.filter(|c| c.is_finite()) else {
                continue;
            };
            let date = market_date(ts.seconds()?, offset)?;
            if range.contains(date) {
                points.push(IndexPricePoint {
                    date,
                    close,
                    symbol: symbol.to_string(),
                });
            }
        }
        debug!("Fetched {} closes for {}", points.len(), symbol);
        Ok(IndexSeries::new(symbol, points))
    }
}
