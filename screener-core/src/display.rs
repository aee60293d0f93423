//! Number formatting for result tables and summaries.

use rust_decimal::{Decimal, RoundingStrategy};

const YI: Decimal = Decimal::from_parts(100_000_000, 0, 0, false, 0);
const WAN: Decimal = Decimal::from_parts(10_000, 0, 0, false, 0);

fn fixed(value: Decimal, dp: u32) -> String {
    let rounded = value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero);
    format!("{rounded:.prec$}", prec = dp as usize)
}

fn group_thousands(value: Decimal) -> String {
    let rounded = value
        .round_dp_with_strategy(3, RoundingStrategy::MidpointAwayFromZero)
        .normalize();
    let text = rounded.abs().to_string();
    let (int_part, frac_part) = match text.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (text.as_str(), None),
    };
    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() { "-" } else { "" };
    match frac_part {
        Some(f) => format!("{sign}{grouped}.{f}"),
        None => format!("{sign}{grouped}"),
    }
}

/// Large amounts in Chinese units: `≥ 1e8` as `x.x亿`, `≥ 1e4` as `x.x万`,
/// otherwise grouped digits.
#[must_use]
pub fn format_amount(value: Decimal) -> String {
    if value >= YI {
        format!("{}亿", fixed(value / YI, 1))
    } else if value >= WAN {
        format!("{}万", fixed(value / WAN, 1))
    } else {
        group_thousands(value)
    }
}

/// Price with two decimals.
#[must_use]
pub fn format_price(value: Decimal) -> String {
    fixed(value, 2)
}

/// Change in percent with two decimals and an explicit `+` for gains.
#[must_use]
pub fn format_change_pct(value: Decimal) -> String {
    let sign = if value > Decimal::ZERO { "+" } else { "" };
    format!("{sign}{}%", fixed(value, 2))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amounts_use_chinese_units() {
        assert_eq!(format_amount(Decimal::from(30_000_000_000_i64)), "300.0亿");
        assert_eq!(format_amount(Decimal::from(1_234_567)), "123.5万");
        assert_eq!(format_amount(Decimal::from(9_876)), "9,876");
        assert_eq!(format_amount(Decimal::new(12_345, 1)), "1,234.5");
        assert_eq!(format_amount(Decimal::ZERO), "0");
    }

    #[test]
    fn price_and_change() {
        assert_eq!(format_price(Decimal::new(155, 1)), "15.50");
        assert_eq!(format_change_pct(Decimal::new(23, 1)), "+2.30%");
        assert_eq!(format_change_pct(Decimal::new(-1005, 3)), "-1.01%");
        assert_eq!(format_change_pct(Decimal::ZERO), "0.00%");
    }
}
