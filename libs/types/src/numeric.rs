//! Conversion of human decimal amounts into integer base units
//!
//! Uses rust_decimal for exact parsing and rounding (no floating-point
//! errors). The integer result is built in `BigUint` so large token
//! decimals never overflow the 96-bit decimal mantissa.

use num_bigint::BigUint;
use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

use crate::errors::RequestError;

/// Bit width of amounts in trading commitments
pub const AMOUNT_BITS: u64 = 96;

/// Exclusive upper bound on bips fields
pub const MAX_BIPS: u8 = 64;

/// Scale a decimal string into base units: `round(amount * 10^decimals)`.
///
/// Fractional digits beyond `decimals` are rounded half-up. Negative values
/// and amounts wider than [`AMOUNT_BITS`] are rejected.
pub fn to_base_units(field: &str, amount: &str, decimals: u8) -> Result<BigUint, RequestError> {
    let value = Decimal::from_str(amount.trim())
        .map_err(|e| RequestError::invalid(field, format!("'{}' is not a decimal: {}", amount, e)))?;
    if value.is_sign_negative() && !value.is_zero() {
        return Err(RequestError::invalid(field, format!("{} is negative", amount)));
    }

    let rounded = value.round_dp_with_strategy(u32::from(decimals), RoundingStrategy::MidpointAwayFromZero);
    let mantissa = rounded.mantissa().unsigned_abs();
    let scale = rounded.scale();

    // round_dp never leaves more than `decimals` fractional digits
    let shift = u32::from(decimals).saturating_sub(scale);
    let units = BigUint::from(mantissa) * BigUint::from(10u32).pow(shift);

    check_amount_width(field, &units)?;
    Ok(units)
}

/// Reject amounts that do not fit the protocol's amount width.
pub fn check_amount_width(field: &str, amount: &BigUint) -> Result<(), RequestError> {
    if amount.bits() > AMOUNT_BITS {
        return Err(RequestError::invalid(
            field,
            format!("{} exceeds {} bits", amount, AMOUNT_BITS),
        ));
    }
    Ok(())
}

/// Reject bips values outside `[0, 64)`.
pub fn check_bips(field: &str, bips: u8) -> Result<(), RequestError> {
    if bips >= MAX_BIPS {
        return Err(RequestError::invalid(field, format!("{} >= {}", bips, MAX_BIPS)));
    }
    Ok(())
}

/// Reject labels outside `[0, 2^16)`.
pub fn check_label(label: u32) -> Result<u16, RequestError> {
    u16::try_from(label).map_err(|_| RequestError::invalid("label", format!("{} >= 2^16", label)))
}
