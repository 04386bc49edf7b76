use super::ui;
use crate::core::{CategoryFilter, FetchOutcome, FundDataService, FundSummary, GrowthWindow};
use anyhow::Result;
use comfy_table::Cell;

const LISTING_WINDOWS: [GrowthWindow; 5] = [
    GrowthWindow::OneDay,
    GrowthWindow::OneMonth,
    GrowthWindow::ThreeMonths,
    GrowthWindow::YearToDate,
    GrowthWindow::OneYear,
];

pub fn render_fund_table(funds: &[FundSummary]) -> String {
    let mut table = ui::new_styled_table();

    let mut header = vec![
        ui::header_cell("Code"),
        ui::header_cell("Name"),
        ui::header_cell("Category"),
        ui::header_cell("Manager"),
        ui::header_cell("Fee"),
        ui::header_cell("NAV"),
    ];
    header.extend(LISTING_WINDOWS.iter().map(|w| ui::header_cell(&w.to_string())));
    header.push(ui::header_cell("Updated"));
    table.set_header(header);

    for fund in funds {
        let mut row = vec![
            Cell::new(&fund.code),
            Cell::new(&fund.name),
            Cell::new(fund.category.to_string()),
            Cell::new(fund.manager.as_deref().unwrap_or(ui::MISSING)),
            ui::format_optional_cell(fund.management_fee, |fee| format!("{fee:.2}%")),
            ui::format_optional_cell(fund.nav, ui::format_grouped),
        ];
        row.extend(
            LISTING_WINDOWS
                .iter()
                .map(|w| ui::optional_change_cell(fund.growth(*w))),
        );
        row.push(ui::format_optional_cell(fund.nav_updated_at, |at| {
            at.format("%Y-%m-%d").to_string()
        }));
        table.add_row(row);
    }

    table.to_string()
}

pub async fn run(service: &FundDataService, filter: CategoryFilter, refresh: bool) -> Result<()> {
    if refresh {
        service.refresh_listing().await;
    }

    let pb = ui::new_spinner("Fetching fund listing...");
    let outcome = service.list_funds(filter).await;
    pb.finish_and_clear();

    ui::print_section(&format!("Funds ({filter})"), None);
    match outcome {
        FetchOutcome::Data(funds) => {
            println!("{}", render_fund_table(&funds));
            println!(
                "{}",
                ui::style_text(&format!("{} funds", funds.len()), ui::StyleType::Subtle)
            );
        }
        FetchOutcome::Empty => ui::print_notice("No funds found for this category."),
        FetchOutcome::Failed(reason) => {
            ui::print_warning(&format!("Could not load the fund listing: {reason}"))
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::FundCategory;
    use std::collections::BTreeMap;

    #[test]
    fn test_render_fund_table_marks_missing_values() {
        let funds = vec![FundSummary {
            code: "DCBF".to_string(),
            name: "DC Bond Fund".to_string(),
            category: FundCategory::Bond,
            manager: None,
            management_fee: Some(0.9),
            nav: Some(27_123.4),
            growth: BTreeMap::from([(GrowthWindow::OneYear, 6.789)]),
            nav_updated_at: None,
        }];

        let output = render_fund_table(&funds);

        assert!(output.contains("DCBF"));
        assert!(output.contains("Bond"));
        assert!(output.contains("27,123.40"));
        assert!(output.contains("0.90%"));
        assert!(output.contains("6.79%"));
        assert!(output.contains(ui::MISSING));
        assert!(output.contains("YTD"));
    }
}
