use super::ui;
use crate::core::comparison::{Comparison, ComparisonRequest, build_comparison};
use crate::core::config::AppConfig;
use crate::core::service::normalize_code;
use crate::core::{DateRange, FundDataService};
use anyhow::{Result, bail};
use chrono::NaiveDate;
use comfy_table::{Cell, CellAlignment};
use std::collections::HashMap;

/// Rows sampled from the merged table for the timeline view.
const TIMELINE_ROWS: usize = 12;
const SPARKLINE_WIDTH: usize = 40;

/// Explicit bounds win; a missing start defaults to `days` before the end, a missing end to today.
pub fn resolve_range(
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    days: i64,
    today: NaiveDate,
) -> Result<DateRange> {
    let end = to.unwrap_or(today);
    match from {
        Some(start) => DateRange::new(start, end),
        None => Ok(DateRange::trailing(end, days)),
    }
}

/// Rejects index symbols the configuration does not offer.
pub fn check_indices(config: &AppConfig, symbols: &[String]) -> Result<()> {
    let unknown: Vec<&str> = symbols
        .iter()
        .map(String::as_str)
        .filter(|s| config.index(s).is_none())
        .collect();
    if !unknown.is_empty() {
        let offered: Vec<&str> = config.indices.iter().map(|i| i.symbol.as_str()).collect();
        bail!(
            "Unknown index symbol(s): {} (available: {})",
            unknown.join(", "),
            offered.join(", ")
        );
    }
    Ok(())
}

/// Rejects fund codes missing from a non-empty listing.
fn check_funds(labels: &HashMap<String, String>, codes: &[String]) -> Result<()> {
    if labels.is_empty() {
        return Ok(());
    }
    let unknown: Vec<&str> = codes
        .iter()
        .map(String::as_str)
        .filter(|c| !labels.contains_key(&normalize_code(c)))
        .collect();
    if !unknown.is_empty() {
        bail!("Unknown fund code(s): {}", unknown.join(", "));
    }
    Ok(())
}

fn display_name<'a>(labels: &'a HashMap<String, String>, symbol: &'a str) -> &'a str {
    labels.get(symbol).map_or(symbol, String::as_str)
}

pub fn render_comparison(comparison: &Comparison, labels: &HashMap<String, String>) -> String {
    let table = &comparison.table;
    let mut summary = ui::new_styled_table();
    summary.set_header(vec![
        ui::header_cell("Series"),
        ui::header_cell("From"),
        ui::header_cell("Value"),
        ui::header_cell("Return"),
        ui::header_cell("Trend"),
    ]);
    for series in &comparison.series {
        let values: Vec<f64> = series.points.iter().map(|p| p.value).collect();
        summary.add_row(vec![
            Cell::new(display_name(labels, &series.symbol)),
            ui::format_optional_cell(series.points.first().map(|p| p.date), |d| d.to_string()),
            ui::format_optional_cell(series.last_value(), |v| format!("{v:.2}")),
            ui::optional_change_cell(series.last_value().map(|v| v - 100.0)),
            Cell::new(ui::sparkline(&values, SPARKLINE_WIDTH)),
        ]);
    }

    let mut timeline = ui::new_styled_table();
    let mut header = vec![ui::header_cell("Date")];
    header.extend(table.symbols.iter().map(|s| ui::header_cell(s)));
    timeline.set_header(header);
    for idx in sample_indices(table.rows.len(), TIMELINE_ROWS) {
        let row = &table.rows[idx];
        let mut cells = vec![Cell::new(row.date)];
        cells.extend(row.values.iter().map(|v| {
            v.map_or(ui::na_cell(), |v| {
                Cell::new(format!("{v:.2}")).set_alignment(CellAlignment::Right)
            })
        }));
        timeline.add_row(cells);
    }

    format!(
        "Cumulative return, base 100 at each series' first date in range\n{}\n{}",
        summary, timeline
    )
}

/// Up to `count` evenly spaced indices into `len` rows, always keeping the first and last.
fn sample_indices(len: usize, count: usize) -> Vec<usize> {
    if len <= count {
        return (0..len).collect();
    }
    let mut indices: Vec<usize> = (0..count).map(|i| i * (len - 1) / (count - 1)).collect();
    indices.dedup();
    indices
}

fn print_comparison(comparison: &Comparison, labels: &HashMap<String, String>) {
    for excluded in &comparison.excluded {
        let name = display_name(labels, &excluded.symbol);
        ui::print_warning(&format!(
            "{} ({}) left out: {}",
            name, excluded.source, excluded.reason
        ));
    }
    if comparison.table.is_empty() {
        ui::print_notice("Nothing to compare: no series has enough data in this range.");
    } else {
        println!("{}", render_comparison(comparison, labels));
    }
}

async fn compare_and_print(
    service: &FundDataService,
    request: &ComparisonRequest,
    labels: &HashMap<String, String>,
) {
    let pb = ui::new_spinner("Fetching price history...");
    let comparison = build_comparison(service, request).await;
    pb.finish_and_clear();
    print_comparison(&comparison, labels);
}

/// Fund against fund cumulative returns.
pub async fn run_compare(
    service: &FundDataService,
    config: &AppConfig,
    codes: &[String],
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    today: NaiveDate,
) -> Result<()> {
    let labels = service.fund_labels().await;
    let request = resolve_range(from, to, config.comparison_days, today)
        .and_then(|range| ComparisonRequest::new(codes, &[], range.start, range.end))
        .and_then(|request| check_funds(&labels, &request.funds).map(|_| request));

    ui::print_section("Fund comparison", None);
    match request {
        Ok(request) => compare_and_print(service, &request, &labels).await,
        Err(e) => ui::print_warning(&format!("{e:#}")),
    }
    Ok(())
}

/// Funds against market indices. Without `--indices` the first configured index is used.
pub async fn run_benchmark(
    service: &FundDataService,
    config: &AppConfig,
    funds: &[String],
    indices: &[String],
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    today: NaiveDate,
) -> Result<()> {
    let mut labels = if funds.is_empty() {
        HashMap::new()
    } else {
        service.fund_labels().await
    };
    let indices: Vec<String> = if indices.is_empty() {
        config.indices.iter().take(1).map(|i| i.symbol.clone()).collect()
    } else {
        indices.to_vec()
    };

    let request = check_indices(config, &indices)
        .and_then(|_| resolve_range(from, to, config.comparison_days, today))
        .and_then(|range| ComparisonRequest::new(funds, &indices, range.start, range.end))
        .and_then(|request| check_funds(&labels, &request.funds).map(|_| request));

    ui::print_section("Benchmark against market indices", None);
    match request {
        Ok(request) => {
            for index in &config.indices {
                labels.insert(normalize_code(&index.symbol), index.name.clone());
            }
            compare_and_print(service, &request, &labels).await
        }
        Err(e) => ui::print_warning(&format!("{e:#}")),
    }
    Ok(())
}
