//! Number formatting for table cells and footers.

/// Rendered in place of ratios that did not produce a finite number.
pub const NOT_FINITE: &str = "-";

/// Groups the integer part in thousands, keeping any fractional digits.
pub fn format_number(value: f64) -> String {
    if !value.is_finite() {
        return NOT_FINITE.to_string();
    }
    let raw = value.abs().to_string();
    let (int_part, frac_part) = match raw.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (raw.as_str(), None),
    };

    let mut out = String::with_capacity(raw.len() + raw.len() / 3 + 1);
    if value < 0.0 {
        out.push('-');
    }
    out.push_str(&group_thousands(int_part));
    if let Some(frac) = frac_part {
        out.push('.');
        out.push_str(frac);
    }
    out
}

/// Whole-currency amount: `$1,235`, `-$40`.
pub fn format_budget(value: f64) -> String {
    if !value.is_finite() {
        return NOT_FINITE.to_string();
    }
    let rounded = value.round();
    let sign = if rounded < 0.0 { "-" } else { "" };
    format!("{sign}${}", format_number(rounded.abs()))
}

/// At most two decimals, trailing zeros dropped: `1,234.5`.
pub fn format_number_with_decimal_point(value: f64) -> String {
    if !value.is_finite() {
        return NOT_FINITE.to_string();
    }
    format_number(precision_format(value))
}

/// Rounds to two decimals.
pub fn precision_format(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Per-unit average. Non-finite values (division by zero) render as the
/// placeholder.
pub fn average_format(value: f64, currency: bool) -> String {
    if !value.is_finite() {
        return NOT_FINITE.to_string();
    }
    let magnitude = format_number_with_decimal_point(value.abs());
    let sign = if precision_format(value) < 0.0 { "-" } else { "" };
    if currency {
        format!("{sign}${magnitude}")
    } else {
        format!("{sign}{magnitude}")
    }
}

/// Return multiple: `3.5x`. Zero and non-finite values carry no suffix.
pub fn roi_format(value: f64) -> String {
    let suffix = if value.is_finite() && value != 0.0 {
        "x"
    } else {
        ""
    };
    format!("{}{suffix}", average_format(value, false))
}

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number_groups_thousands() {
        assert_eq!(format_number(0.0), "0");
        assert_eq!(format_number(999.0), "999");
        assert_eq!(format_number(1000.0), "1,000");
        assert_eq!(format_number(1234567.0), "1,234,567");
        assert_eq!(format_number(-9876.5), "-9,876.5");
        assert_eq!(format_number(-0.0), "0");
    }

    #[test]
    fn test_format_budget() {
        assert_eq!(format_budget(100.0), "$100");
        assert_eq!(format_budget(1234.56), "$1,235");
        assert_eq!(format_budget(-40.2), "-$40");
        assert_eq!(format_budget(-0.2), "$0");
        assert_eq!(format_budget(f64::NAN), NOT_FINITE);
    }

    #[test]
    fn test_decimal_point_trims_trailing_zeros() {
        assert_eq!(format_number_with_decimal_point(5.0), "5");
        assert_eq!(format_number_with_decimal_point(1234.5), "1,234.5");
        assert_eq!(format_number_with_decimal_point(2.0 / 3.0), "0.67");
    }

    #[test]
    fn test_average_format_placeholder_for_non_finite() {
        assert_eq!(average_format(20.0, true), "$20");
        assert_eq!(average_format(12.5, false), "12.5");
        assert_eq!(average_format(-3.25, true), "-$3.25");
        assert_eq!(average_format(f64::INFINITY, true), NOT_FINITE);
        assert_eq!(average_format(f64::NAN, false), NOT_FINITE);
    }

    #[test]
    fn test_roi_format_suffix() {
        assert_eq!(roi_format(3.5), "3.5x");
        assert_eq!(roi_format(0.0), "0");
        assert_eq!(roi_format(f64::INFINITY), NOT_FINITE);
    }
}
