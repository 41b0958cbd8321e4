//! Multiplication and division with a 512 bit intermediate
//!
//! Every step is checked: a zero denominator or a quotient that does not fit
//! in 256 bits yields `None` instead of wrapping.

use super::big_num::{U256, U512};

pub trait MulDiv<RHS = Self> {
    type Output;

    /// Calculates `floor(self * num / denom)`
    fn mul_div_floor(self, num: RHS, denom: RHS) -> Option<Self::Output>;

    /// Calculates `ceil(self * num / denom)`
    fn mul_div_ceil(self, num: RHS, denom: RHS) -> Option<Self::Output>;
}

impl MulDiv for U256 {
    type Output = U256;

    fn mul_div_floor(self, num: Self, denom: Self) -> Option<Self::Output> {
        if denom.is_zero() {
            return None;
        }
        let product = U512::from(self) * U512::from(num);
        (product / U512::from(denom)).checked_as_u256()
    }

    fn mul_div_ceil(self, num: Self, denom: Self) -> Option<Self::Output> {
        if denom.is_zero() {
            return None;
        }
        let product = U512::from(self) * U512::from(num);
        let (quotient, remainder) = product.div_mod(U512::from(denom));
        let quotient = quotient.checked_as_u256()?;
        if remainder.is_zero() {
            Some(quotient)
        } else {
            quotient.checked_add(U256::one())
        }
    }
}

/// Calculates `ceil(x / y)`, or `None` if `y` is zero
pub fn div_rounding_up(x: U256, y: U256) -> Option<U256> {
    if y.is_zero() {
        return None;
    }
    let (quotient, remainder) = x.div_mod(y);
    if remainder.is_zero() {
        Some(quotient)
    } else {
        // quotient < U256::MAX whenever y > 1, and remainder is zero when y == 1
        Some(quotient + U256::one())
    }
}
