///! Math library for liquidity

use crate::error::ErrorCode;
use anchor_lang::prelude::*;

/// Add a signed liquidity delta to liquidity and revert if it overflows or underflows
///
/// # Arguments
///
/// * `x` - The liquidity (L) before change
/// * `y` - The delta (ΔL) by which liquidity should be changed
///
pub fn add_delta(x: u128, y: i128) -> Result<u128> {
    let z = if y < 0 {
        x.checked_sub(y.unsigned_abs())
    } else {
        x.checked_add(y as u128)
    };
    z.ok_or_else(|| error!(ErrorCode::Overflow))
}
