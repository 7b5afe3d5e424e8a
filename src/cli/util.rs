use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::config::DisplayConfig;

/// Whole-unit currency rendering: `$120.000`, `-$5.300`.
pub fn fmt_money(d: &Decimal, display: &DisplayConfig) -> String {
    let rounded = d.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() { "-" } else { "" };
    let digits = rounded.abs().to_u128().unwrap_or_default().to_string();
    format!(
        "{sign}{}{}",
        display.currency_symbol,
        group_thousands(&digits, &display.thousands_separator)
    )
}

fn group_thousands(digits: &str, sep: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 * sep.len());
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push_str(sep);
        }
        out.push(ch);
    }
    out
}

/// Largest amount a form accepts.
pub const MAX_AMOUNT: i64 = 1_000_000_000_000;

/// Amount fields accept plain decimals from 0 to [`MAX_AMOUNT`].
pub fn parse_money(s: &str) -> Option<Decimal> {
    s.trim()
        .parse::<Decimal>()
        .ok()
        .filter(|d| d.is_zero() || d.is_sign_positive())
        .filter(|d| *d <= Decimal::from(MAX_AMOUNT))
}

pub fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok()
}

pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

pub fn iso(d: &NaiveDate) -> String {
    d.format("%Y-%m-%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn money_is_grouped_without_decimals() {
        let display = DisplayConfig::default();
        assert_eq!(fmt_money(&Decimal::from(1_234_567), &display), "$1.234.567");
        assert_eq!(fmt_money(&Decimal::new(9995, 1), &display), "$1.000");
        assert_eq!(fmt_money(&Decimal::from(-5300), &display), "-$5.300");
        assert_eq!(fmt_money(&Decimal::ZERO, &display), "$0");
    }

    #[test]
    fn money_parsing_rejects_negatives() {
        assert_eq!(parse_money(""), None);
        assert_eq!(parse_money("0"), Some(Decimal::ZERO));
        assert_eq!(parse_money(" 12.5 "), Some(Decimal::new(125, 1)));
        assert_eq!(parse_money("-3"), None);
        assert_eq!(parse_money("abc"), None);
    }

    #[test]
    fn money_parsing_caps_huge_values() {
        assert_eq!(parse_money("1000000000000"), Some(Decimal::from(MAX_AMOUNT)));
        assert_eq!(parse_money("1000000000000.01"), None);
        assert_eq!(parse_money("79228162514264337593543950335"), None);
    }

    #[test]
    fn dates_round_trip_through_iso() {
        let d = parse_date("2024-02-29").unwrap();
        assert_eq!(iso(&d), "2024-02-29");
        assert!(parse_date("2023-02-29").is_none());
    }
}
