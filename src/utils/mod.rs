//! Formatting utilities
//!
//! Brazilian locale conventions for every number the CLI prints:
//! thousands separated by `.`, decimals by `,`, currency prefixed "R$ ".

use rust_decimal::Decimal;

/// Format with a fixed number of decimal places, Brazilian separators.
pub fn format_number(value: Decimal, decimals: u32) -> String {
    let is_negative = value < Decimal::ZERO;
    let rounded = value.abs().round_dp(decimals);

    let formatted = format!("{:.*}", decimals as usize, rounded);
    let (integer_part, decimal_part) = match formatted.split_once('.') {
        Some((i, d)) => (i, Some(d)),
        None => (formatted.as_str(), None),
    };

    let mut with_separators = String::new();
    let digits: Vec<char> = integer_part.chars().collect();
    for (i, c) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            with_separators.push('.');
        }
        with_separators.push(*c);
    }

    let sign = if is_negative { "-" } else { "" };
    match decimal_part {
        Some(d) => format!("{}{},{}", sign, with_separators, d),
        None => format!("{}{}", sign, with_separators),
    }
}

/// Format as Brazilian Real: "R$ 1.234,56"
pub fn format_brl(value: Decimal) -> String {
    format!("R$ {}", format_number(value, 2))
}

/// Format a unit quantity with crypto-friendly precision, trimming
/// trailing zeros past two decimal places.
pub fn format_qty(value: Decimal) -> String {
    let normalized = value.round_dp(8).normalize();
    let decimals = normalized.scale().clamp(2, 8);
    format_number(value, decimals)
}

/// Format a percentage with one decimal place: "42,0%"
pub fn format_pct(value: Decimal) -> String {
    format!("{}%", format_number(value, 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_format_brl() {
        assert_eq!(format_brl(dec!(1234.56)), "R$ 1.234,56");
        assert_eq!(format_brl(dec!(0.99)), "R$ 0,99");
        assert_eq!(format_brl(dec!(1000000)), "R$ 1.000.000,00");
        assert_eq!(format_brl(dec!(-500)), "R$ -500,00");
        assert_eq!(format_brl(Decimal::ZERO), "R$ 0,00");
    }

    #[test]
    fn test_format_brl_rounds_to_cents() {
        assert_eq!(format_brl(dec!(1.234)), "R$ 1,23");
        assert_eq!(format_brl(dec!(1.235)), "R$ 1,24");
    }

    #[test]
    fn test_format_qty_trims_trailing_zeros() {
        assert_eq!(format_qty(dec!(100)), "100,00");
        assert_eq!(format_qty(dec!(0.00000001)), "0,00000001");
        assert_eq!(format_qty(dec!(1.50000000)), "1,50");
        assert_eq!(format_qty(dec!(12.345678)), "12,345678");
    }

    #[test]
    fn test_format_pct() {
        assert_eq!(format_pct(dec!(42)), "42,0%");
        assert_eq!(format_pct(dec!(7.25)), "7,3%");
        assert_eq!(format_pct(dec!(-3.5)), "-3,5%");
    }
}
