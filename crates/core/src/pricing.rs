//! Exact-decimal order total arithmetic.
//!
//! Money is represented as [`rust_decimal::Decimal`] end to end; binary
//! floating point never touches an amount. Totals are computed exactly and
//! rounded to currency precision only at the storage/display boundary.

use rust_decimal::Decimal;
use thiserror::Error;

/// Decimal places stored and displayed for currency amounts.
pub const CURRENCY_SCALE: u32 = 2;

/// Errors from total computation.
///
/// These are defensive: upstream validation rejects non-positive quantities
/// and negative prices before totals are taken.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PricingError {
    /// A line had a negative quantity.
    #[error("quantity cannot be negative: {0}")]
    NegativeQuantity(i64),
    /// A line had a negative unit price.
    #[error("unit price cannot be negative: {0}")]
    NegativePrice(Decimal),
}

/// Sum of `quantity * unit_price` over a sequence of order lines.
///
/// The result is exact; no intermediate rounding is applied. Callers round
/// via [`round_currency`] when persisting or displaying the value.
///
/// # Errors
///
/// Returns [`PricingError`] if any line carries a negative quantity or a
/// negative unit price.
pub fn order_total<I>(lines: I) -> Result<Decimal, PricingError>
where
    I: IntoIterator<Item = (i64, Decimal)>,
{
    let mut total = Decimal::ZERO;
    for (quantity, unit_price) in lines {
        if quantity < 0 {
            return Err(PricingError::NegativeQuantity(quantity));
        }
        if unit_price.is_sign_negative() {
            return Err(PricingError::NegativePrice(unit_price));
        }
        total += Decimal::from(quantity) * unit_price;
    }
    Ok(total)
}

/// Round an amount to currency precision (2 decimal places, banker's rounding
/// is not used; ties round half away from zero to match display formatting).
#[must_use]
pub fn round_currency(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(
        CURRENCY_SCALE,
        rust_decimal::RoundingStrategy::MidpointAwayFromZero,
    )
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn test_empty_total_is_zero() {
        assert_eq!(order_total([]).expect("empty total"), Decimal::ZERO);
    }

    #[test]
    fn test_total_sums_lines_exactly() {
        let total = order_total([(3, dec!(9.99)), (1, dec!(5.00))]).expect("total");
        assert_eq!(total, dec!(34.97));
    }

    #[test]
    fn test_no_floating_point_drift() {
        // 0.1 + 0.2 style inputs stay exact under decimal arithmetic.
        let lines = std::iter::repeat_n((1, dec!(0.10)), 10);
        assert_eq!(order_total(lines).expect("total"), dec!(1.00));
    }

    #[test]
    fn test_cart_scenario() {
        // stock 5 @ 10.00 x2 plus stock 1 @ 25.50 x1
        let total = order_total([(2, dec!(10.00)), (1, dec!(25.50))]).expect("total");
        assert_eq!(total, dec!(45.50));
    }

    #[test]
    fn test_negative_quantity_rejected() {
        let err = order_total([(-1, dec!(1.00))]).expect_err("should reject");
        assert_eq!(err, PricingError::NegativeQuantity(-1));
    }

    #[test]
    fn test_negative_price_rejected() {
        let err = order_total([(1, dec!(-1.00))]).expect_err("should reject");
        assert_eq!(err, PricingError::NegativePrice(dec!(-1.00)));
    }

    #[test]
    fn test_zero_quantity_contributes_nothing() {
        let total = order_total([(0, dec!(99.99)), (2, dec!(1.50))]).expect("total");
        assert_eq!(total, dec!(3.00));
    }

    #[test]
    fn test_round_currency() {
        assert_eq!(round_currency(dec!(1.005)), dec!(1.01));
        assert_eq!(round_currency(dec!(29.97)), dec!(29.97));
        assert_eq!(round_currency(dec!(2.3333)), dec!(2.33));
    }
}
