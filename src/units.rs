//! Conversions between base-unit amounts, human-readable amounts and USD.
//!
//! All scaling goes through `rust_decimal`; binary floats never touch an
//! amount. Rounding is half away from zero everywhere.

use crate::error::UnitError;
use crate::tokens::Token;
use alloy::primitives::U256;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

const MAX_DECIMALS: u32 = 28;

/// One amount in every shape the pipeline logs or submits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Amount {
    pub normalized: u128,
    pub readable: Decimal,
    pub usd: Decimal,
}

impl Amount {
    pub fn from_normalized(normalized: u128, token: &Token) -> Result<Self, UnitError> {
        let readable = to_readable(normalized, token.decimals)?;
        Ok(Self {
            normalized,
            readable,
            usd: to_usd(readable, token.usd_price()),
        })
    }
}

fn pow10(decimals: u32) -> Result<Decimal, UnitError> {
    if decimals > MAX_DECIMALS {
        return Err(UnitError::UnsupportedDecimals(decimals));
    }
    Ok(Decimal::from_i128_with_scale(10i128.pow(decimals), 0))
}

pub fn to_readable(normalized: u128, decimals: u32) -> Result<Decimal, UnitError> {
    if decimals > MAX_DECIMALS {
        return Err(UnitError::UnsupportedDecimals(decimals));
    }
    let mantissa =
        i128::try_from(normalized).map_err(|_| UnitError::Overflow(normalized.to_string()))?;
    // Setting the scale divides by 10^decimals exactly.
    let readable = Decimal::try_from_i128_with_scale(mantissa, decimals)
        .map_err(|_| UnitError::Overflow(normalized.to_string()))?;
    Ok(readable
        .round_dp_with_strategy(decimals, RoundingStrategy::MidpointAwayFromZero)
        .normalize())
}

pub fn to_normalized(readable: Decimal, decimals: u32) -> Result<u128, UnitError> {
    if readable.is_sign_negative() && !readable.is_zero() {
        return Err(UnitError::Negative(readable.to_string()));
    }
    let scaled = readable
        .checked_mul(pow10(decimals)?)
        .ok_or_else(|| UnitError::Overflow(readable.to_string()))?;
    scaled
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_u128()
        .ok_or_else(|| UnitError::Overflow(readable.to_string()))
}

pub fn to_usd(readable: Decimal, price: Decimal) -> Decimal {
    (readable * price).round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Narrows an on-chain value to the `u128` base units the converter works on.
pub fn from_u256(value: U256) -> Result<u128, UnitError> {
    if value > U256::from(u128::MAX) {
        return Err(UnitError::Overflow(value.to_string()));
    }
    Ok(value.to::<u128>())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_to_readable_scales_exactly() {
        assert_eq!(to_readable(1_234_567, 6).unwrap(), dec!(1.234567));
        assert_eq!(to_readable(1, 8).unwrap(), dec!(0.00000001));
        assert_eq!(to_readable(0, 18).unwrap(), Decimal::ZERO);
        assert_eq!(
            to_readable(1_000_000_000_000_000_000, 18).unwrap(),
            dec!(1)
        );
    }

    #[test]
    fn test_to_normalized_rounds_half_away_from_zero() {
        assert_eq!(to_normalized(dec!(0.0000005), 6).unwrap(), 1);
        assert_eq!(to_normalized(dec!(0.00000049), 6).unwrap(), 0);
        assert_eq!(to_normalized(dec!(0.01), 6).unwrap(), 10_000);
        assert_eq!(to_normalized(dec!(2.5), 0).unwrap(), 3);
    }

    #[test]
    fn test_to_normalized_rejects_negative_and_precision_limit() {
        assert!(matches!(
            to_normalized(dec!(-1), 6),
            Err(UnitError::Negative(_))
        ));
        assert_eq!(
            to_normalized(dec!(1), 29),
            Err(UnitError::UnsupportedDecimals(29))
        );
        assert_eq!(to_readable(1, 29), Err(UnitError::UnsupportedDecimals(29)));
    }

    #[test]
    fn test_to_usd_rounds_to_cents() {
        assert_eq!(to_usd(dec!(0.123456), dec!(15)), dec!(1.85));
        assert_eq!(to_usd(dec!(1), dec!(0.05494)), dec!(0.05));
        assert_eq!(to_usd(dec!(0.005), dec!(1)), dec!(0.01));
    }

    #[test]
    fn test_readable_round_trip_within_granularity() {
        let values = [dec!(0), dec!(0.01), dec!(123.456789), dec!(0.00000001)];
        for decimals in [6u32, 8] {
            let granularity = Decimal::new(5, decimals + 1);
            for x in values {
                let normalized = to_normalized(x, decimals).unwrap();
                let back = to_readable(normalized, decimals).unwrap();
                assert!(
                    (back - x).abs() <= granularity,
                    "x={x} d={decimals} back={back}"
                );
            }
        }
        // Below the granularity of 6 places the value collapses to zero.
        assert_eq!(to_normalized(dec!(0.00000001), 6).unwrap(), 0);
    }

    #[test]
    fn test_normalized_round_trip_is_exact() {
        for decimals in 0..=12u32 {
            for n in [0u128, 1, 7, 999_999, 123_456_789_012, u64::MAX as u128] {
                let readable = to_readable(n, decimals).unwrap();
                assert_eq!(to_normalized(readable, decimals).unwrap(), n);
            }
        }
    }

    #[test]
    fn test_from_u256_overflow() {
        assert_eq!(from_u256(U256::from(42u64)).unwrap(), 42);
        assert!(from_u256(U256::MAX).is_err());
    }
}
