//! Parsing and display of amounts typed into the converter fields

/// Fractional digits kept when displaying an amount (satoshi precision).
pub const DISPLAY_PRECISION: usize = 8;

/// Parses user input into a finite amount. Empty or malformed text yields `None`.
pub fn parse_amount(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Renders an amount with [`DISPLAY_PRECISION`] digits and strips insignificant zeros.
pub fn format_amount(value: f64) -> String {
    trim_amount(&format!("{:.*}", DISPLAY_PRECISION, value))
}

/// Strips trailing zeros and a dangling decimal point from a numeric string.
pub fn trim_amount(text: &str) -> String {
    if !text.contains('.') {
        return normalize_zero(text);
    }
    let trimmed = text.trim_end_matches('0').trim_end_matches('.');
    normalize_zero(trimmed)
}

fn normalize_zero(text: &str) -> String {
    if text == "-0" {
        "0".to_string()
    } else {
        text.to_string()
    }
}
