use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Defines different styles for text elements.
pub enum StyleType {
    Title,
    Label,
    Value,
    Warning,
    Error,
    Subtle,
}

/// Applies a consistent style to a string.
pub fn style_text(text: &str, style_type: StyleType) -> String {
    let styled = match style_type {
        StyleType::Title => style(text).bold().underlined(),
        StyleType::Label => style(text).bold(),
        StyleType::Value => style(text).green().bold(),
        StyleType::Warning => style(text).yellow(),
        StyleType::Error => style(text).red(),
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

/// Formats an `Option<T>` into a `Cell`. `None` is displayed as "N/A" in red.
pub fn format_optional_cell<T>(value: Option<T>, format_fn: impl Fn(T) -> String) -> Cell {
    value.map_or(
        Cell::new("N/A")
            .fg(Color::Red)
            .set_alignment(CellAlignment::Right),
        |v| Cell::new(format_fn(v)).set_alignment(CellAlignment::Right),
    )
}

/// Creates a spinner shown while prices are being fetched.
pub fn new_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(spinner_style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}")
    {
        pb.set_style(spinner_style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}
