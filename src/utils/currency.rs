/// Currency utility functions for rupee amounts.
///
/// Amounts are `BigDecimal` rupees end to end. Every intermediate monetary
/// result is rounded to paise (2 places, half-up) before it is summed or stored.
use std::str::FromStr;

use bigdecimal::{BigDecimal, RoundingMode};
use num_traits::{Signed, ToPrimitive, Zero};

pub const DEFAULT_TDS_PERCENT: i64 = 2;
pub const PAYOUT_CURRENCY: &str = "INR";
pub const PAYOUT_TRANSACTION_TYPE: &str = "NEFT";
pub const RECONCILIATION_LOOKBACK_DAYS: i64 = 14;

/// Rounding band accepted between a bank row and a payout's net amount (₹0.01).
pub fn reconciliation_tolerance() -> BigDecimal {
    BigDecimal::from(1) / BigDecimal::from(100)
}

/// Round to 2 places, half-up.
pub fn round_money(amount: &BigDecimal) -> BigDecimal {
    amount.with_scale_round(2, RoundingMode::HalfUp)
}

/// `percent`% of `base`, unrounded.
pub fn percent_of(percent: &BigDecimal, base: &BigDecimal) -> BigDecimal {
    (percent * base) / BigDecimal::from(100)
}

/// `percent`% of `base`, floored to whole rupees and never negative.
pub fn floor_percent_of(percent: &BigDecimal, base: &BigDecimal) -> i64 {
    percent_of(percent, base)
        .with_scale_round(0, RoundingMode::Floor)
        .to_i64()
        .unwrap_or(0)
        .max(0)
}

/// Sum amounts, rounding each one to paise first.
pub fn sum_money<'a, I>(amounts: I) -> BigDecimal
where
    I: IntoIterator<Item = &'a BigDecimal>,
{
    let total = amounts
        .into_iter()
        .fold(BigDecimal::zero(), |acc, amount| acc + round_money(amount));
    round_money(&total)
}

/// Returns `(tds_amount, net_amount)` for a gross total.
pub fn withhold_tds(total: &BigDecimal, tds_percent: &BigDecimal) -> (BigDecimal, BigDecimal) {
    let tds = round_money(&percent_of(tds_percent, total));
    let net = round_money(&(round_money(total) - &tds));
    (tds, net)
}

pub fn within_tolerance(expected: &BigDecimal, actual: &BigDecimal) -> bool {
    (expected - actual).abs() <= reconciliation_tolerance()
}

/// Format with exactly two fractional digits.
pub fn format_money(amount: &BigDecimal) -> String {
    round_money(amount).to_string()
}

/// Parse a bank-file amount such as `"₹1,234.50"` or `"INR 980"`.
/// Non-positive amounts are rejected.
pub fn parse_amount(raw: &str) -> Result<BigDecimal, String> {
    let cleaned: String = raw
        .trim()
        .trim_start_matches("INR")
        .trim_start_matches("Rs.")
        .trim_start_matches("Rs")
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();

    if cleaned.is_empty() {
        return Err(format!("Invalid amount format: {:?}", raw));
    }

    let amount = BigDecimal::from_str(&cleaned)
        .map_err(|_| format!("Invalid amount format: {:?}", raw))?;

    if !amount.is_positive() {
        return Err(format!("Amount must be positive, got {}", amount));
    }

    Ok(amount)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(value: &str) -> BigDecimal {
        BigDecimal::from_str(value).unwrap()
    }

    #[test]
    fn test_withhold_tds_on_round_total() {
        let (tds, net) = withhold_tds(&dec("1000.00"), &BigDecimal::from(DEFAULT_TDS_PERCENT));
        assert_eq!(format_money(&tds), "20.00");
        assert_eq!(format_money(&net), "980.00");
    }

    #[test]
    fn test_withhold_tds_rounds_half_up() {
        // 2% of 333.33 = 6.6666
        let (tds, net) = withhold_tds(&dec("333.33"), &BigDecimal::from(2));
        assert_eq!(tds, dec("6.67"));
        assert_eq!(net, dec("326.66"));
        assert_eq!(&tds + &net, dec("333.33"));
    }

    #[test]
    fn test_sum_money_has_no_float_drift() {
        let amounts = vec![dec("0.1"), dec("0.2"), dec("0.3")];
        assert_eq!(sum_money(&amounts), dec("0.60"));
    }

    #[test]
    fn test_floor_percent_of() {
        assert_eq!(floor_percent_of(&dec("20"), &dec("2000")), 400);
        assert_eq!(floor_percent_of(&dec("15"), &dec("3000")), 450);
        assert_eq!(floor_percent_of(&dec("12.5"), &dec("999")), 124);
        assert_eq!(floor_percent_of(&dec("10"), &dec("0")), 0);
        assert_eq!(floor_percent_of(&dec("10"), &dec("-50")), 0);
    }

    #[test]
    fn test_within_tolerance_band() {
        let net = dec("980.00");
        assert!(within_tolerance(&net, &dec("980.01")));
        assert!(within_tolerance(&net, &dec("979.99")));
        assert!(!within_tolerance(&net, &dec("980.02")));
        assert!(!within_tolerance(&net, &dec("979.98")));
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("980.00"), Ok(dec("980.00")));
        assert_eq!(parse_amount(" ₹1,234.50 "), Ok(dec("1234.50")));
        assert_eq!(parse_amount("INR 980"), Ok(dec("980")));
        assert!(parse_amount("abc").is_err());
        assert!(parse_amount("").is_err());
        assert!(parse_amount("0").is_err());
        assert!(parse_amount("-10").is_err());
    }
}
