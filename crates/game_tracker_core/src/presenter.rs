//! crates/game_tracker_core/src/presenter.rs
//!
//! Renders amounts as Brazilian real strings, e.g. `R$ 1.234,56`.
//!
//! Amounts that are not regional are USD and get converted with a fixed rate;
//! the result carries an `*` to mark it as an approximation.

/// USD → BRL rate applied to non-regional amounts.
pub const USD_TO_BRL: f64 = 6.15;

/// Label shown for a zero amount.
pub const FREE_LABEL: &str = "Grátis";

/// Appended to converted amounts.
pub const APPROXIMATION_MARKER: &str = "*";

/// Shown when the amount is not a number.
pub const PLACEHOLDER: &str = "-";

const CURRENCY_PREFIX: &str = "R$\u{a0}";

/// Formats a textual amount. Blank or non-numeric input yields [`PLACEHOLDER`].
pub fn format_price(raw: Option<&str>, is_regional: bool) -> String {
    let parsed = raw
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .and_then(|v| v.parse::<f64>().ok());
    match parsed {
        Some(amount) => format_amount(amount, is_regional),
        None => PLACEHOLDER.to_string(),
    }
}

/// Formats a numeric amount. Zero is free whatever `is_regional` says.
pub fn format_amount(amount: f64, is_regional: bool) -> String {
    if !amount.is_finite() {
        return PLACEHOLDER.to_string();
    }
    if amount == 0.0 {
        return FREE_LABEL.to_string();
    }
    if is_regional {
        return format_brl(amount);
    }
    format!("{}{}", format_brl(amount * USD_TO_BRL), APPROXIMATION_MARKER)
}

fn format_brl(amount: f64) -> String {
    // Half-up on cents, so 1.125 shows as 1,13.
    let cents = (amount.abs() * 100.0).round() as u64;
    let int_part = (cents / 100).to_string();
    let frac_part = cents % 100;

    let digits = int_part.as_bytes();
    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, digit) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(*digit as char);
    }

    let sign = if amount < 0.0 && cents != 0 { "-" } else { "" };
    format!("{}{}{},{:02}", sign, CURRENCY_PREFIX, grouped, frac_part)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regional_amounts_have_no_marker() {
        assert_eq!(format_amount(36.99, true), "R$\u{a0}36,99");
        assert_eq!(format_amount(1234.5, true), "R$\u{a0}1.234,50");
        assert_eq!(format_amount(1_234_567.891, true), "R$\u{a0}1.234.567,89");
        for amount in [0.01, 1.0, 59.9, 999.99, 1000.0] {
            assert!(!format_amount(amount, true).ends_with(APPROXIMATION_MARKER));
        }
    }

    #[test]
    fn usd_amounts_are_converted_and_marked() {
        assert_eq!(format_amount(10.0, false), "R$\u{a0}61,50*");
        assert_eq!(format_price(Some("9.99"), false), format!("{}*", format_brl(9.99 * USD_TO_BRL)));
        assert_eq!(format_price(Some("200"), false), "R$\u{a0}1.230,00*");
    }

    #[test]
    fn zero_is_free_regardless_of_flag() {
        assert_eq!(format_amount(0.0, true), FREE_LABEL);
        assert_eq!(format_amount(0.0, false), FREE_LABEL);
        assert_eq!(format_price(Some("0.00"), false), FREE_LABEL);
    }

    #[test]
    fn non_numeric_input_renders_placeholder() {
        assert_eq!(format_price(Some("abc"), true), PLACEHOLDER);
        assert_eq!(format_price(Some("   "), false), PLACEHOLDER);
        assert_eq!(format_price(None, true), PLACEHOLDER);
        assert_eq!(format_amount(f64::NAN, false), PLACEHOLDER);
        assert_eq!(format_amount(f64::INFINITY, true), PLACEHOLDER);
    }

    #[test]
    fn half_cents_round_up() {
        assert_eq!(format_amount(1.125, true), "R$\u{a0}1,13");
        assert_eq!(format_amount(0.375, true), "R$\u{a0}0,38");
        assert_eq!(format_amount(2.5, true), "R$\u{a0}2,50");
    }

    #[test]
    fn surrounding_whitespace_is_tolerated() {
        assert_eq!(format_price(Some(" 5 "), true), "R$\u{a0}5,00");
    }
}
