use super::ui;
use crate::core::metrics::period_growth;
use crate::core::service::normalize_code;
use crate::core::{
    FetchOutcome, FundDataService, HoldingEntry, Lookback, NavPoint, NavSeries, SecurityHolding,
};
use anyhow::Result;
use chrono::NaiveDate;
use comfy_table::{Cell, CellAlignment};

/// NAV rows listed under the chart.
const NAV_TABLE_ROWS: usize = 20;
const SPARKLINE_WIDTH: usize = 60;
const BAR_WIDTH: usize = 30;

/// Most recent update date across the holdings, if any carry one.
pub fn holdings_as_of(holdings: &[SecurityHolding]) -> Option<NaiveDate> {
    holdings.iter().filter_map(|h| h.updated_at).max()
}

pub fn render_nav_section(series: &NavSeries, lookback: Lookback) -> String {
    let mut output = String::new();

    if let Some(latest) = series.latest() {
        output.push_str(&format!(
            "Latest NAV: {} on {}\n",
            ui::style_text(&ui::format_grouped(latest.nav_per_unit), ui::StyleType::Highlight),
            latest.date
        ));
    }

    match period_growth(series.points(), lookback) {
        Some(growth) => {
            let (first, last) = (&growth.window[0], &growth.window[growth.window.len() - 1]);
            output.push_str(&format!(
                "Growth over {}: {} ({} to {})\n",
                lookback,
                ui::format_percent(Some(growth.growth_pct)),
                first.date,
                last.date
            ));
            output.push_str(&render_nav_chart(growth.window));
        }
        None => output.push_str(&ui::style_text(
            "Not enough NAV history to compute growth.",
            ui::StyleType::Subtle,
        )),
    }
    output.push('\n');

    let mut table = ui::new_styled_table();
    table.set_header(vec![ui::header_cell("Date"), ui::header_cell("NAV")]);
    let skip = series.len().saturating_sub(NAV_TABLE_ROWS);
    for point in &series.points()[skip..] {
        table.add_row(vec![
            Cell::new(point.date),
            Cell::new(ui::format_grouped(point.nav_per_unit)).set_alignment(CellAlignment::Right),
        ]);
    }
    output.push_str(&table.to_string());
    output
}

fn render_nav_chart(window: &[NavPoint]) -> String {
    let values: Vec<f64> = window.iter().map(|p| p.nav_per_unit).collect();
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    format!(
        "{} {} {}\n",
        ui::style_text(&ui::abbreviate_amount(min), ui::StyleType::Subtle),
        ui::sparkline(&values, SPARKLINE_WIDTH),
        ui::style_text(&ui::abbreviate_amount(max), ui::StyleType::Subtle)
    )
}

pub fn render_top_holdings(holdings: &[SecurityHolding]) -> String {
    let max = max_percent(holdings.iter().filter_map(|h| h.net_asset_percent));
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Stock"),
        ui::header_cell("Industry"),
        ui::header_cell("% NAV"),
        ui::header_cell(""),
    ]);
    for holding in holdings {
        table.add_row(vec![
            Cell::new(&holding.stock_code),
            Cell::new(holding.industry.as_deref().unwrap_or(ui::MISSING)),
            percent_cell(holding.net_asset_percent),
            bar_cell(holding.net_asset_percent, max),
        ]);
    }

    let entries: Vec<HoldingEntry> = holdings.iter().cloned().map(HoldingEntry::from).collect();
    let as_of = holdings_as_of(holdings).map_or("unknown".to_string(), |d| d.to_string());
    format!("{}\n{}\nUpdated as of {}", table, render_coverage(&entries), as_of)
}

/// Share of net assets the listed entries account for. Not guaranteed to reach 100%.
pub fn render_coverage(entries: &[HoldingEntry]) -> String {
    let total: f64 = entries.iter().filter_map(HoldingEntry::percent).sum();
    format!(
        "Listed entries cover {} of net assets",
        ui::format_percent(Some(total))
    )
}

/// Table of one composition breakdown; bars are drawn for positive shares only.
pub fn render_allocation(label: &str, entries: &[HoldingEntry]) -> String {
    let max = max_percent(entries.iter().filter_map(HoldingEntry::percent));
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell(label),
        ui::header_cell("% NAV"),
        ui::header_cell(""),
    ]);
    for entry in entries {
        table.add_row(vec![
            Cell::new(entry.label()),
            percent_cell(entry.percent()),
            bar_cell(entry.percent(), max),
        ]);
    }
    format!("{}\n{}", table, render_coverage(entries))
}

fn max_percent(values: impl Iterator<Item = f64>) -> f64 {
    values.filter(|v| *v > 0.0).fold(0.0, f64::max)
}

fn percent_cell(value: Option<f64>) -> Cell {
    Cell::new(ui::format_percent(value)).set_alignment(CellAlignment::Right)
}

fn bar_cell(value: Option<f64>, max: f64) -> Cell {
    Cell::new(value.map_or(String::new(), |v| ui::bar(v, max, BAR_WIDTH)))
}

fn print_outcome<T>(outcome: FetchOutcome<T>, what: &str, render: impl FnOnce(T) -> String) {
    match outcome {
        FetchOutcome::Data(data) => println!("{}", render(data)),
        FetchOutcome::Empty => ui::print_notice(&format!("No {what} available.")),
        FetchOutcome::Failed(reason) => {
            ui::print_warning(&format!("Could not load {what}: {reason}"))
        }
    }
}

pub async fn run(service: &FundDataService, fund_code: &str, lookback: Lookback) -> Result<()> {
    let code = normalize_code(fund_code);
    let labels = service.fund_labels().await;
    if !labels.is_empty() && !labels.contains_key(&code) {
        ui::print_warning(&format!("Unknown fund code: {code}"));
        return Ok(());
    }
    let title = labels.get(&code).cloned().unwrap_or_else(|| code.clone());
    println!("{}", ui::style_text(&title, ui::StyleType::Title));

    let pb = ui::new_spinner("Fetching NAV history...");
    let nav = service.nav_history(&code).await;
    pb.finish_and_clear();
    ui::print_section("NAV history", None);
    print_outcome(nav, "NAV history", |series| {
        render_nav_section(&series, lookback)
    });

    let pb = ui::new_spinner("Fetching holdings...");
    let top = service.top_holdings(&code).await;
    let industries = service.industry_holdings(&code).await;
    let assets = service.asset_holdings(&code).await;
    pb.finish_and_clear();

    ui::print_section("Top holdings", None);
    print_outcome(top, "top holdings", |holdings| {
        render_top_holdings(&holdings)
    });

    ui::print_section("Industry allocation", None);
    print_outcome(industries, "industry allocation", |holdings| {
        let entries: Vec<HoldingEntry> = holdings.into_iter().map(Into::into).collect();
        render_allocation("Industry", &entries)
    });

    ui::print_section("Asset allocation", None);
    print_outcome(assets, "asset allocation", |holdings| {
        let entries: Vec<HoldingEntry> = holdings.into_iter().map(Into::into).collect();
        render_allocation("Asset class", &entries)
    });

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{AssetHolding, IndustryHolding};

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn holding(code: &str, percent: Option<f64>, updated: Option<&str>) -> SecurityHolding {
        SecurityHolding {
            stock_code: code.to_string(),
            industry: Some("Banks".to_string()),
            net_asset_percent: percent,
            updated_at: updated.map(date),
        }
    }

    #[test]
    fn test_holdings_as_of_takes_latest_date() {
        let holdings = vec![
            holding("VCB", Some(8.0), Some("2024-04-30")),
            holding("TCB", Some(6.0), None),
            holding("MBB", Some(5.0), Some("2024-05-31")),
        ];
        assert_eq!(holdings_as_of(&holdings), Some(date("2024-05-31")));
        assert_eq!(holdings_as_of(&[holding("VCB", None, None)]), None);
    }

    #[test]
    fn test_render_top_holdings() {
        let output = render_top_holdings(&[
            holding("VCB", Some(8.0), None),
            holding("TCB", None, None),
        ]);
        assert!(output.contains("VCB"));
        assert!(output.contains("8.00%"));
        assert!(output.contains(ui::MISSING));
        assert!(output.contains("Updated as of unknown"));
        assert!(output.contains("cover 8.00% of net assets"));
    }

    #[test]
    fn test_render_coverage_sums_known_shares() {
        let entries: Vec<HoldingEntry> = vec![
            holding("VCB", Some(8.5), None).into(),
            holding("TCB", None, None).into(),
            holding("MBB", Some(6.0), None).into(),
        ];
        assert_eq!(entries[0].label(), "VCB");
        assert_eq!(
            render_coverage(&entries),
            "Listed entries cover 14.50% of net assets"
        );
        assert!(render_coverage(&[]).contains("0.00%"));
    }

    #[test]
    fn test_render_allocation_skips_bars_for_non_positive() {
        let entries: Vec<HoldingEntry> = vec![
            AssetHolding {
                asset_type: "Stocks".to_string(),
                net_asset_percent: Some(90.0),
            }
            .into(),
            IndustryHolding {
                industry: "Cash".to_string(),
                net_asset_percent: Some(0.0),
            }
            .into(),
        ];
        let output = render_allocation("Asset class", &entries);
        assert!(output.contains("Stocks"));
        assert!(output.contains("90.00%"));
        assert!(output.contains("cover 90.00% of net assets"));
        assert_eq!(output.matches('█').count(), BAR_WIDTH);
    }

    #[test]
    fn test_render_nav_section() {
        let points = (0..30)
            .map(|i| NavPoint {
                date: date("2024-01-01") + chrono::Duration::days(i),
                nav_per_unit: 10_000.0 + i as f64 * 100.0,
            })
            .collect();
        let series = NavSeries::new("VESAF", points);

        let output = render_nav_section(&series, Lookback::All);

        assert!(output.contains("Latest NAV"));
        assert!(output.contains("12,900.00"));
        assert!(output.contains("Growth over all: 29.00%"));
        // Only the most recent rows are tabulated
        assert!(!output.contains("2024-01-05"));
        assert!(output.contains("2024-01-30"));
    }

    #[test]
    fn test_render_nav_section_single_point() {
        let series = NavSeries::new(
            "NEW",
            vec![NavPoint {
                date: date("2024-01-01"),
                nav_per_unit: 10_000.0,
            }],
        );
        let output = render_nav_section(&series, Lookback::THREE_MONTHS);
        assert!(output.contains("Not enough NAV history"));
    }
}
