use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Shown wherever a number is missing.
pub const MISSING: &str = "—";

const SPARK_LEVELS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Defines different styles for text elements.
pub enum StyleType {
    Title,
    Highlight,
    Warning,
    Subtle,
}

/// Applies a consistent style to a string.
pub fn style_text(text: &str, style_type: StyleType) -> String {
    let styled = match style_type {
        StyleType::Title => style(text).bold().underlined(),
        StyleType::Highlight => style(text).green().bold(),
        StyleType::Warning => style(text).yellow(),
        StyleType::Subtle => style(text).dim(),
    };
    styled.to_string()
}

/// Creates a new `comfy_table::Table` with standard styling.
pub fn new_styled_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Creates a styled header cell for a table.
pub fn header_cell(text: &str) -> Cell {
    Cell::new(text)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

/// Right-aligned cell; `None` is displayed as the missing placeholder.
pub fn format_optional_cell<T>(value: Option<T>, format_fn: impl Fn(T) -> String) -> Cell {
    value.map_or(na_cell(), |v| {
        Cell::new(format_fn(v)).set_alignment(CellAlignment::Right)
    })
}

/// Creates a cell for displaying percentage change with color coding.
pub fn change_cell(change: f64) -> Cell {
    let text = format!("{change:.2}%");
    if change >= 0.0 {
        Cell::new(text)
            .fg(Color::Green)
            .set_alignment(CellAlignment::Right)
    } else {
        Cell::new(text)
            .fg(Color::Red)
            .set_alignment(CellAlignment::Right)
    }
}

/// Growth cell: colored when present, the placeholder when missing.
pub fn optional_change_cell(change: Option<f64>) -> Cell {
    change.filter(|c| c.is_finite()).map_or(na_cell(), change_cell)
}

pub fn na_cell() -> Cell {
    Cell::new(MISSING)
        .fg(Color::DarkGrey)
        .set_alignment(CellAlignment::Right)
}

/// Spinner shown on stderr while a section is being fetched.
pub fn new_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(spinner_style) = ProgressStyle::with_template("{spinner:.green} {msg} [{elapsed}]")
    {
        pb.set_style(spinner_style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Section heading followed by an optional dim subtitle.
pub fn print_section(title: &str, subtitle: Option<&str>) {
    println!("\n{}", style_text(title, StyleType::Title));
    if let Some(subtitle) = subtitle {
        println!("{}", style_text(subtitle, StyleType::Subtle));
    }
}

/// Inline notice for a section that has nothing to show.
pub fn print_notice(message: &str) {
    println!("{}", style_text(message, StyleType::Subtle));
}

/// Inline warning for a section whose data could not be loaded.
pub fn print_warning(message: &str) {
    println!("{}", style_text(&format!("⚠ {message}"), StyleType::Warning));
}

/// `12.35%`, or the placeholder for missing and non-finite values.
pub fn format_percent(value: Option<f64>) -> String {
    value
        .filter(|v| v.is_finite())
        .map_or(MISSING.to_string(), |v| format!("{v:.2}%"))
}

/// Two decimals with comma thousands separators, e.g. `31,234.56`.
pub fn format_grouped(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, digit) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if value < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{sign}{grouped}.{frac_part}")
}

/// Short axis label: `950`, `31.2k`, `1.5M`, `2.0B`, `3.1T`.
pub fn abbreviate_amount(value: f64) -> String {
    let magnitude = value.abs();
    let (scaled, suffix) = if magnitude >= 1e12 {
        (value / 1e12, "T")
    } else if magnitude >= 1e9 {
        (value / 1e9, "B")
    } else if magnitude >= 1e6 {
        (value / 1e6, "M")
    } else if magnitude >= 1e3 {
        (value / 1e3, "k")
    } else {
        return format!("{value:.0}");
    };
    format!("{scaled:.1}{suffix}")
}

/// One-line chart of `values`, resampled to at most `width` columns.
pub fn sparkline(values: &[f64], width: usize) -> String {
    if values.is_empty() || width == 0 {
        return String::new();
    }
    let columns = values.len().min(width);
    let sampled: Vec<f64> = (0..columns)
        .map(|col| {
            let idx = if columns == 1 {
                values.len() - 1
            } else {
                col * (values.len() - 1) / (columns - 1)
            };
            values[idx]
        })
        .collect();

    let min = sampled.iter().copied().fold(f64::INFINITY, f64::min);
    let max = sampled.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let span = max - min;
    let top = SPARK_LEVELS.len() - 1;

    sampled
        .iter()
        .map(|v| {
            if span <= 0.0 || !span.is_finite() {
                SPARK_LEVELS[top / 2]
            } else {
                SPARK_LEVELS[(((v - min) / span) * top as f64).round() as usize]
            }
        })
        .collect()
}

/// Horizontal bar scaled so `max` fills `width` cells.
pub fn bar(value: f64, max: f64, width: usize) -> String {
    if value <= 0.0 || max <= 0.0 || !value.is_finite() {
        return String::new();
    }
    let cells = ((value / max) * width as f64).round().clamp(1.0, width as f64) as usize;
    "█".repeat(cells)
}
