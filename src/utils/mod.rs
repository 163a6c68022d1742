//! Utility functions for formatting report figures
//!
//! Centralized number formatting so tables and summaries print values the
//! same way: `,` thousands separator, `.` decimal separator.

/// Core formatting function with full control over output.
///
/// # Arguments
/// * `value` - The value to format
/// * `decimals` - Digits after the decimal point
/// * `width` - Minimum width for padding (0 for no padding, right-aligned)
///
/// # Examples
/// ```
/// use value_analysis::utils::format_number_with_width;
///
/// assert_eq!(format_number_with_width(1234.567, 2, 0), "1,234.57");
/// assert_eq!(format_number_with_width(-1234.0, 0, 8), "  -1,234");
/// ```
pub fn format_number_with_width(value: f64, decimals: usize, width: usize) -> String {
    if !value.is_finite() {
        return format!("{:>width$}", value, width = width);
    }

    let formatted = format!("{:.*}", decimals, value.abs());
    let (integer_part, decimal_part) = match formatted.split_once('.') {
        Some((int, dec)) => (int, Some(dec)),
        None => (formatted.as_str(), None),
    };

    // Add thousands separators (,) to integer part
    let with_separators: String = integer_part
        .chars()
        .rev()
        .enumerate()
        .flat_map(|(i, c)| {
            if i > 0 && i % 3 == 0 {
                vec![',', c]
            } else {
                vec![c]
            }
        })
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();

    // Rounding can turn a tiny negative into zero; don't print "-0"
    let is_negative = value < 0.0 && formatted.chars().any(|c| c.is_ascii_digit() && c != '0');
    let sign = if is_negative { "-" } else { "" };

    let result = match decimal_part {
        Some(dec) => format!("{}{}.{}", sign, with_separators, dec),
        None => format!("{}{}", sign, with_separators),
    };

    if width > 0 && result.len() < width {
        format!("{:>width$}", result, width = width)
    } else {
        result
    }
}

// ============ Convenience functions ============

/// Two decimals with separators: "1,234.56"
pub fn format_number(value: f64) -> String {
    format_number_with_width(value, 2, 0)
}

/// Percentage with one decimal: "12.5%"
pub fn format_pct(value: f64) -> String {
    format!("{}%", format_number_with_width(value, 1, 0))
}

/// Optional value, "N/A" when absent
pub fn format_optional(value: Option<f64>, format: fn(f64) -> String) -> String {
    value.map(format).unwrap_or_else(|| "N/A".to_string())
}

/// Large amounts scaled to a unit suffix: "149.21B", "3.10T"
pub fn format_compact(value: f64) -> String {
    const UNITS: [(f64, &str); 4] = [(1e12, "T"), (1e9, "B"), (1e6, "M"), (1e3, "K")];

    let abs = value.abs();
    for (scale, suffix) in UNITS {
        if abs >= scale {
            return format!("{}{}", format_number(value / scale), suffix);
        }
    }
    format_number(value)
}
