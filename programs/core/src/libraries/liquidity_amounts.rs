///! Liquidity amount functions
///! Provides functions for computing liquidity amounts from token amounts and prices
///! Implements formula 6.29 and 6.30
///
use super::big_num::U256;
use super::fixed_point_96;
use super::full_math::{div_rounding_up, MulDiv};
use crate::error::ErrorCode;
use anchor_lang::prelude::*;

/// Converting liquidity back to token amounts with rounding up may exceed the
/// amounts the liquidity was derived from by at most this many units
pub const ROUNDING_TOLERANCE: u128 = 1;

fn to_u128(value: U256) -> Result<u128> {
    value.checked_as_u128().ok_or_else(|| error!(ErrorCode::Overflow))
}

/// Computes the amount of liquidity received for a given amount of token_0 and price range
/// Calculates ΔL = Δx (√P_upper x √P_lower)/(√P_upper - √P_lower)
///
/// # Arguments
///
/// * `sqrt_price_lower_x96` - A sqrt price representing the lower tick boundary
/// * `sqrt_price_upper_x96` - A sqrt price representing the upper tick boundary
/// * `amount_0` - The amount_0 being sent in
///
pub fn get_liquidity_for_amount_0(
    sqrt_price_lower_x96: U256,
    sqrt_price_upper_x96: U256,
    amount_0: u128,
) -> Result<u128> {
    require!(sqrt_price_lower_x96 < sqrt_price_upper_x96, ErrorCode::InvalidRange);
    let intermediate = sqrt_price_lower_x96
        .mul_div_floor(sqrt_price_upper_x96, fixed_point_96::Q96)
        .ok_or(ErrorCode::Overflow)?;

    let liquidity = U256::from(amount_0)
        .mul_div_floor(intermediate, sqrt_price_upper_x96 - sqrt_price_lower_x96)
        .ok_or(ErrorCode::Overflow)?;
    to_u128(liquidity)
}

/// Computes the amount of liquidity received for a given amount of token_1 and price range
/// Calculates ΔL = Δy / (√P_upper - √P_lower)
///
/// # Arguments
///
/// * `sqrt_price_lower_x96` - A sqrt price representing the lower tick boundary
/// * `sqrt_price_upper_x96` - A sqrt price representing the upper tick boundary
/// * `amount_1` - The amount_1 being sent in
///
pub fn get_liquidity_for_amount_1(
    sqrt_price_lower_x96: U256,
    sqrt_price_upper_x96: U256,
    amount_1: u128,
) -> Result<u128> {
    require!(sqrt_price_lower_x96 < sqrt_price_upper_x96, ErrorCode::InvalidRange);

    let liquidity = U256::from(amount_1)
        .mul_div_floor(fixed_point_96::Q96, sqrt_price_upper_x96 - sqrt_price_lower_x96)
        .ok_or(ErrorCode::Overflow)?;
    to_u128(liquidity)
}

/// Computes the maximum amount of liquidity received for a given amount of token_0, token_1, the current
/// pool price and the prices at the tick boundaries
///
/// Below or at the lower bound only token_0 counts. At or above the upper bound only
/// token_1 counts. Inside the range the smaller of the two liquidities is taken.
///
/// # Arguments
///
/// * `sqrt_price_lower_x96` - A sqrt price representing the lower tick boundary
/// * `sqrt_price_x96` - A sqrt price representing the current pool price
/// * `sqrt_price_upper_x96` - A sqrt price representing the upper tick boundary
/// * `amount_1` - The amount of token_1 being sent in
/// * `amount_0` - The amount of token_0 being sent in
///
pub fn get_liquidity_for_amounts(
    sqrt_price_lower_x96: U256,
    sqrt_price_x96: U256,
    sqrt_price_upper_x96: U256,
    amount_1: u128,
    amount_0: u128,
) -> Result<u128> {
    require!(sqrt_price_lower_x96 < sqrt_price_upper_x96, ErrorCode::InvalidRange);
    if amount_0 == 0 && amount_1 == 0 {
        return Ok(0);
    }

    if sqrt_price_x96 <= sqrt_price_lower_x96 {
        // If P ≤ P_lower, only token_0 liquidity is active
        get_liquidity_for_amount_0(sqrt_price_lower_x96, sqrt_price_upper_x96, amount_0)
    } else if sqrt_price_x96 < sqrt_price_upper_x96 {
        // If P_lower < P < P_upper, active liquidity is the minimum of the liquidity provided
        // by token_0 and token_1
        Ok(u128::min(
            get_liquidity_for_amount_0(sqrt_price_x96, sqrt_price_upper_x96, amount_0)?,
            get_liquidity_for_amount_1(sqrt_price_lower_x96, sqrt_price_x96, amount_1)?,
        ))
    } else {
        // If P ≥ P_upper, only token_1 liquidity is active
        get_liquidity_for_amount_1(sqrt_price_lower_x96, sqrt_price_upper_x96, amount_1)
    }
}

/// Computes the amount of token_0 for a given amount of liquidity and a price range
/// Calculates Δx = ΔL (√P_upper - √P_lower) / (√P_upper x √P_lower)
///     = ΔL (1 / √P_lower -1 / √P_upper)
///
/// # Arguments
///
/// * `sqrt_price_lower_x96` - A sqrt price representing the lower tick boundary
/// * `sqrt_price_upper_x96` - A sqrt price representing the upper tick boundary
/// * `liquidity` - The liquidity being valued
/// * `round_up` - Whether to round the amount up or down
///
pub fn get_amount_0_for_liquidity(
    sqrt_price_lower_x96: U256,
    sqrt_price_upper_x96: U256,
    liquidity: u128,
    round_up: bool,
) -> Result<u128> {
    require!(sqrt_price_lower_x96 < sqrt_price_upper_x96, ErrorCode::InvalidRange);

    let numerator_1 = U256::from(liquidity) << fixed_point_96::RESOLUTION;
    let numerator_2 = sqrt_price_upper_x96 - sqrt_price_lower_x96;

    let amount_0 = if round_up {
        let intermediate = numerator_1
            .mul_div_ceil(numerator_2, sqrt_price_upper_x96)
            .ok_or(ErrorCode::Overflow)?;
        div_rounding_up(intermediate, sqrt_price_lower_x96).ok_or(ErrorCode::Overflow)?
    } else {
        numerator_1
            .mul_div_floor(numerator_2, sqrt_price_upper_x96)
            .ok_or(ErrorCode::Overflow)?
            .checked_div(sqrt_price_lower_x96)
            .ok_or(ErrorCode::Overflow)?
    };
    to_u128(amount_0)
}

/// Computes the amount of token_1 for a given amount of liquidity and a price range
/// Calculates Δy = ΔL * (√P_upper - √P_lower)
///
/// # Arguments
///
/// * `sqrt_price_lower_x96` - A sqrt price representing the lower tick boundary
/// * `sqrt_price_upper_x96` - A sqrt price representing the upper tick boundary
/// * `liquidity` - The liquidity being valued
/// * `round_up` - Whether to round the amount up or down
///
pub fn get_amount_1_for_liquidity(
    sqrt_price_lower_x96: U256,
    sqrt_price_upper_x96: U256,
    liquidity: u128,
    round_up: bool,
) -> Result<u128> {
    require!(sqrt_price_lower_x96 < sqrt_price_upper_x96, ErrorCode::InvalidRange);

    let liquidity = U256::from(liquidity);
    let difference = sqrt_price_upper_x96 - sqrt_price_lower_x96;
    let amount_1 = if round_up {
        liquidity.mul_div_ceil(difference, fixed_point_96::Q96)
    } else {
        liquidity.mul_div_floor(difference, fixed_point_96::Q96)
    }
    .ok_or(ErrorCode::Overflow)?;
    to_u128(amount_1)
}

/// Computes the token_0 and token_1 value for a given amount of liquidity, the current
/// pool price and the prices at the tick boundaries
///
/// # Arguments
///
/// * `sqrt_price_lower_x96` - A sqrt price representing the lower tick boundary
/// * `sqrt_price_x96` - A sqrt price representing the current pool price
/// * `sqrt_price_upper_x96` - A sqrt price representing the upper tick boundary
/// * `liquidity` - The liquidity being valued
/// * `round_up` - Whether to round the amounts up or down
///
pub fn get_amounts_for_liquidity(
    sqrt_price_lower_x96: U256,
    sqrt_price_x96: U256,
    sqrt_price_upper_x96: U256,
    liquidity: u128,
    round_up: bool,
) -> Result<(u128, u128)> {
    require!(sqrt_price_lower_x96 < sqrt_price_upper_x96, ErrorCode::InvalidRange);

    if sqrt_price_x96 <= sqrt_price_lower_x96 {
        // If P ≤ P_lower, active liquidity is entirely in token_0
        Ok((
            get_amount_0_for_liquidity(sqrt_price_lower_x96, sqrt_price_upper_x96, liquidity, round_up)?,
            0,
        ))
    } else if sqrt_price_x96 < sqrt_price_upper_x96 {
        // If P_lower < P < P_upper, active liquidity is in token_0 and token_1
        Ok((
            get_amount_0_for_liquidity(sqrt_price_x96, sqrt_price_upper_x96, liquidity, round_up)?,
            get_amount_1_for_liquidity(sqrt_price_lower_x96, sqrt_price_x96, liquidity, round_up)?,
        ))
    } else {
        // If P ≥ P_upper, active liquidity is entirely in token_1
        Ok((
            0,
            get_amount_1_for_liquidity(sqrt_price_lower_x96, sqrt_price_upper_x96, liquidity, round_up)?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::libraries::fixed_point_96::Q96;
    use crate::libraries::tick_math::{get_sqrt_price_at_tick, MAX_TICK, MIN_TICK};
    use quickcheck::{quickcheck, TestResult};

    #[test]
    fn price_at_lower_bound_uses_token_0_only() {
        let lower = Q96;
        let upper = Q96 * U256::from(2u8);
        let liquidity = get_liquidity_for_amounts(lower, lower, upper, 0, 1000).unwrap();
        assert_eq!(liquidity, 2000);

        // token_1 is ignored while the price sits at or below the range
        let with_token_1 = get_liquidity_for_amounts(lower, lower, upper, 5000, 1000).unwrap();
        assert_eq!(with_token_1, 2000);
    }

    #[test]
    fn price_above_range_uses_token_1_only() {
        let lower = Q96;
        let upper = Q96 * U256::from(2u8);
        let current = Q96 * U256::from(3u8);
        // ΔL = Δy / (√P_upper - √P_lower) = 1000 / 1
        assert_eq!(get_liquidity_for_amounts(lower, current, upper, 1000, 7).unwrap(), 1000);
        assert_eq!(get_liquidity_for_amounts(lower, upper, upper, 1000, 7).unwrap(), 1000);
    }

    #[test]
    fn price_inside_range_takes_minimum() {
        let lower = get_sqrt_price_at_tick(-600).unwrap();
        let current = get_sqrt_price_at_tick(0).unwrap();
        let upper = get_sqrt_price_at_tick(600).unwrap();

        let from_0 = get_liquidity_for_amount_0(current, upper, 1_000_000).unwrap();
        let from_1 = get_liquidity_for_amount_1(lower, current, 2_000_000).unwrap();
        let liquidity = get_liquidity_for_amounts(lower, current, upper, 2_000_000, 1_000_000).unwrap();
        assert_eq!(liquidity, u128::min(from_0, from_1));
        assert!(liquidity > 0);
    }

    #[test]
    fn zero_amounts_give_zero_liquidity() {
        let lower = get_sqrt_price_at_tick(-60).unwrap();
        let upper = get_sqrt_price_at_tick(60).unwrap();
        assert_eq!(get_liquidity_for_amounts(lower, Q96, upper, 0, 0).unwrap(), 0);
    }

    #[test]
    fn inverted_range_is_invalid() {
        let lower = get_sqrt_price_at_tick(60).unwrap();
        let upper = get_sqrt_price_at_tick(-60).unwrap();
        assert_eq!(
            get_liquidity_for_amounts(lower, Q96, upper, 1, 1).unwrap_err(),
            ErrorCode::InvalidRange.into()
        );
        assert_eq!(
            get_liquidity_for_amounts(lower, Q96, lower, 1, 1).unwrap_err(),
            ErrorCode::InvalidRange.into()
        );
    }

    #[test]
    fn huge_amounts_at_extreme_prices_overflow() {
        let lower = get_sqrt_price_at_tick(MAX_TICK - 1).unwrap();
        let upper = get_sqrt_price_at_tick(MAX_TICK).unwrap();
        assert_eq!(
            get_liquidity_for_amounts(lower, lower, upper, 0, u128::MAX).unwrap_err(),
            ErrorCode::Overflow.into()
        );

        let lower = get_sqrt_price_at_tick(MIN_TICK).unwrap();
        let upper = get_sqrt_price_at_tick(MIN_TICK + 1).unwrap();
        assert_eq!(
            get_liquidity_for_amounts(lower, upper, upper, u128::MAX, 0).unwrap_err(),
            ErrorCode::Overflow.into()
        );
    }

    #[test]
    fn amounts_for_liquidity_round_in_requested_direction() {
        let lower = get_sqrt_price_at_tick(-887).unwrap();
        let current = get_sqrt_price_at_tick(13).unwrap();
        let upper = get_sqrt_price_at_tick(1201).unwrap();

        let (floor_0, floor_1) = get_amounts_for_liquidity(lower, current, upper, 123_456_789, false).unwrap();
        let (ceil_0, ceil_1) = get_amounts_for_liquidity(lower, current, upper, 123_456_789, true).unwrap();
        assert!(ceil_0 == floor_0 || ceil_0 == floor_0 + 1);
        assert!(ceil_1 == floor_1 || ceil_1 == floor_1 + 1);

        let (below_0, below_1) = get_amounts_for_liquidity(lower, lower, upper, 1000, true).unwrap();
        assert!(below_0 > 0);
        assert_eq!(below_1, 0);

        let (above_0, above_1) = get_amounts_for_liquidity(lower, upper, upper, 1000, true).unwrap();
        assert_eq!(above_0, 0);
        assert!(above_1 > 0);
    }

    #[test]
    fn amount_1_for_unit_range() {
        let lower = Q96;
        let upper = Q96 * U256::from(2u8);
        assert_eq!(get_amount_1_for_liquidity(lower, upper, 1000, false).unwrap(), 1000);
        // Δx = ΔL (1 / 1 - 1 / 2)
        assert_eq!(get_amount_0_for_liquidity(lower, upper, 1000, false).unwrap(), 500);
        assert_eq!(get_amount_0_for_liquidity(lower, upper, 1001, true).unwrap(), 501);
    }

    #[test]
    fn zero_lower_price_fails_in_both_roundings() {
        for round_up in [false, true] {
            assert_eq!(
                get_amount_0_for_liquidity(U256::zero(), U256::one(), 5, round_up).unwrap_err(),
                ErrorCode::Overflow.into()
            );
        }
    }

    #[test]
    fn wide_amounts_either_fit_or_overflow() {
        fn prop(a: i32, b: i32, c: i32, amount_0: u128, amount_1: u128) -> TestResult {
            let span = MAX_TICK + 1;
            let mut ticks = [a % span, b % span, c % span];
            ticks.sort_unstable();
            if ticks[0] == ticks[2] {
                return TestResult::discard();
            }
            let price = |tick: i32| get_sqrt_price_at_tick(tick).unwrap();
            let (lower, current, upper) = (price(ticks[0]), price(ticks[1]), price(ticks[2]));

            let liquidity = match get_liquidity_for_amounts(lower, current, upper, amount_1, amount_0) {
                Ok(liquidity) => liquidity,
                Err(err) => return TestResult::from_bool(err == ErrorCode::Overflow.into()),
            };
            match get_amounts_for_liquidity(lower, current, upper, liquidity, true) {
                Ok((owed_0, owed_1)) => TestResult::from_bool(
                    owed_0 <= amount_0.saturating_add(ROUNDING_TOLERANCE)
                        && owed_1 <= amount_1.saturating_add(ROUNDING_TOLERANCE),
                ),
                Err(err) => TestResult::from_bool(err == ErrorCode::Overflow.into()),
            }
        }
        quickcheck(prop as fn(i32, i32, i32, u128, u128) -> TestResult);
    }

    #[test]
    fn liquidity_never_demands_more_than_desired() {
        fn prop(a: i32, b: i32, c: i32, amount_0: u64, amount_1: u64) -> TestResult {
            let mut ticks = [a % 200_000, b % 200_000, c % 200_000];
            ticks.sort_unstable();
            if ticks[0] == ticks[2] {
                return TestResult::discard();
            }
            let price = |tick: i32| get_sqrt_price_at_tick(tick).unwrap();
            let (lower, current, upper) = (price(ticks[0]), price(ticks[1]), price(ticks[2]));

            let liquidity =
                get_liquidity_for_amounts(lower, current, upper, amount_1 as u128, amount_0 as u128).unwrap();
            let (owed_0, owed_1) = get_amounts_for_liquidity(lower, current, upper, liquidity, true).unwrap();
            TestResult::from_bool(
                owed_0 <= amount_0 as u128 + ROUNDING_TOLERANCE
                    && owed_1 <= amount_1 as u128 + ROUNDING_TOLERANCE,
            )
        }
        quickcheck(prop as fn(i32, i32, i32, u64, u64) -> TestResult);
    }
}
