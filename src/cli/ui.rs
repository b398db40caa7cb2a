use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use console::style;

/// Placeholder shown where a figure has no finite value.
pub const UNDEFINED: &str = "—";

/// Defines different styles for text elements.
pub enum StyleType {
    Title,
    Section,
    Highlight,
    Subtle,
}

/// Applies a consistent style to a string.
pub fn style_text(text: &str, style_type: StyleType) -> String {
    let styled = match style_type {
        StyleType::Title => style(text).bold().underlined(),
        StyleType::Section => style(text).bold(),
        StyleType::Highlight => style(text).green().bold(),
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

/// Right aligned cell for numeric values.
pub fn value_cell(text: impl Into<String>) -> Cell {
    Cell::new(text.into()).set_alignment(CellAlignment::Right)
}

/// Formats an `Option<T>` into a `Cell`. `None` is displayed as the undefined placeholder.
pub fn format_optional_cell<T>(value: Option<T>, format_fn: impl Fn(T) -> String) -> Cell {
    value.map_or(
        Cell::new(UNDEFINED)
            .fg(Color::DarkGrey)
            .set_alignment(CellAlignment::Right),
        |v| value_cell(format_fn(v)),
    )
}

/// Creates a bold cell, green for gains and red for losses.
pub fn gain_cell(text: String, gain: f64) -> Cell {
    let color = if gain >= 0.0 { Color::Green } else { Color::Red };
    value_cell(text).fg(color).add_attribute(Attribute::Bold)
}

/// Inserts thousands separators into the integer digits of `digits`.
fn group_thousands(digits: &str) -> String {
    let (sign, digits) = match digits.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", digits),
    };
    let (int_part, frac_part) = match digits.split_once('.') {
        Some((int_part, frac)) => (int_part, Some(frac)),
        None => (digits, None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    match frac_part {
        Some(frac) => format!("{sign}{grouped}.{frac}"),
        None => format!("{sign}{grouped}"),
    }
}

/// Formats a whole-unit amount with separators, e.g. `1,800,000`.
pub fn format_amount(value: f64) -> String {
    if !value.is_finite() {
        return UNDEFINED.to_string();
    }
    // avoid rendering "-0"
    let value = if value.abs() < 0.5 { 0.0 } else { value };
    group_thousands(&format!("{value:.0}"))
}

/// Formats a currency amount, e.g. `₣12,000`.
pub fn format_currency(value: f64, symbol: &str) -> String {
    if !value.is_finite() {
        return UNDEFINED.to_string();
    }
    format!("{symbol}{}", format_amount(value))
}

/// Formats a count with separators.
pub fn format_count(value: i64) -> String {
    group_thousands(&value.to_string())
}

/// Formats an ROI multiple as `35.00×`, or the placeholder when undefined.
pub fn format_multiple(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{}×", group_thousands(&format!("{v:.2}"))),
        _ => UNDEFINED.to_string(),
    }
}

/// Formats a percentage with one decimal, e.g. `30.0%`.
pub fn format_percent(value: f64) -> String {
    format!("{value:.1}%")
}
