//! Raw token amount <-> display decimal conversions.
//!
//! Token amounts are carried on-chain as integers with a separate `decimals`
//! field; this module is the one place the conversion happens so it can't be
//! done inconsistently (or through binary floating point) elsewhere.

use rust_decimal::Decimal;

/// Convert a human-readable decimal amount into its raw integer representation
/// for a token with `decimals` digits of precision.
///
/// Returns `None` if the value doesn't fit in a `u128` after scaling (e.g.
/// negative amounts, or amounts requiring more precision than `decimals`
/// allows without truncation loss beyond rounding).
pub fn to_raw(amount: Decimal, decimals: u32) -> Option<u128> {
    if amount.is_sign_negative() {
        return None;
    }
    let scaled = amount.round_dp(decimals) * Decimal::from(10u128.pow(decimals));
    scaled.to_string().parse::<u128>().ok().or_else(|| {
        // Decimal may render with a trailing ".0" scale; normalize via trunc.
        scaled.trunc().to_string().parse::<u128>().ok()
    })
}

/// Convert a raw integer token amount back into a display `Decimal` with
/// `decimals` digits of precision.
pub fn format_raw(raw: u128, decimals: u32) -> Decimal {
    Decimal::from_i128_with_scale(raw as i128, decimals)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    #[test]
    fn basic_round_trip() {
        let raw = to_raw(dec!(1.5), 6).unwrap();
        assert_eq!(raw, 1_500_000u128);
        assert_eq!(format_raw(raw, 6), dec!(1.5));
    }

    #[test]
    fn zero_round_trips() {
        let raw = to_raw(dec!(0), 18).unwrap();
        assert_eq!(raw, 0);
        assert_eq!(format_raw(raw, 18), dec!(0));
    }

    proptest! {
        #[test]
        fn round_trip_holds_for_modest_precision(
            whole in 0u64..1_000_000u64,
            frac in 0u32..1_000_000u32,
            decimals in 0u32..9u32,
        ) {
            let amount = Decimal::new(whole as i64, 0)
                + Decimal::new(frac as i64, 6).round_dp(decimals);
            let amount = amount.round_dp(decimals);
            if let Some(raw) = to_raw(amount, decimals) {
                prop_assert_eq!(format_raw(raw, decimals), amount);
            }
        }
    }
}
