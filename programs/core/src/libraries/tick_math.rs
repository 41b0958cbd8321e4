//! Helper functions to calculate tick from √P and vice versa
//! Performs power and log calculations with fixed width integers only
//!
//! # Resources
//!
//! * https://medium.com/coinmonks/math-in-solidity-part-5-exponent-and-logarithm-9aef8515136e
//! * https://liaoph.com/logarithm-in-solidity/
//!
use super::big_num::U256;
use crate::error::ErrorCode;
use anchor_lang::prelude::*;

/// The minimum tick that may be passed to `get_sqrt_price_at_tick`, computed from log base 1.0001 of 2^-128
pub const MIN_TICK: i32 = -887272;
/// The maximum tick that may be passed to `get_sqrt_price_at_tick`, computed from log base 1.0001 of 2^128
pub const MAX_TICK: i32 = -MIN_TICK;

/// The minimum value that can be returned from `get_sqrt_price_at_tick`. Equivalent to get_sqrt_price_at_tick(MIN_TICK)
pub const MIN_SQRT_RATIO: U256 = U256([4295128739, 0, 0, 0]);
/// The maximum value that can be returned from `get_sqrt_price_at_tick`. Equivalent to get_sqrt_price_at_tick(MAX_TICK)
/// 1461446703485210103287273052203988822378723970342
pub const MAX_SQRT_RATIO: U256 = U256([0x5d951d5263988d26, 0xefd1fc6a50648849, 0xfffd8963, 0]);

// Shift amounts, encoded as U256
const NUM_32: U256 = U256([32, 0, 0, 0]);
const NUM_128: U256 = U256([128, 0, 0, 0]);

/// Multiplies a Q128.128 ratio by a Q128 magic factor
fn mul_shift(ratio: U256, factor: u128) -> U256 {
    (ratio * U256::from(factor)) >> NUM_128
}

/// Calculates 1.0001^(tick/2) as a Q64.96 number representing
/// the square root of the ratio of the two assets (token_1/token_0)
///
/// Calculates result as a Q128.128, then rounds up to Q64.96.
/// The returned price is rounded toward positive infinity, never below the exact √1.0001^tick.
/// Each magic factor is `2^128 / (1.0001^(2^(i - 1)))` for i in `[0, 20)`.
///
/// Throws if |tick| > MAX_TICK
///
/// # Arguments
/// * `tick` - Price tick
///
pub fn get_sqrt_price_at_tick(tick: i32) -> Result<U256> {
    let abs_tick = tick.unsigned_abs();
    require!(abs_tick <= MAX_TICK as u32, ErrorCode::InvalidTick);

    // i = 0
    let mut ratio = if abs_tick & 0x1 != 0 {
        U256::from(0xfffcb933bd6fad37aa2d162d1a594001u128)
    } else {
        // 2^128
        U256([0, 0, 1, 0])
    };
    // i = 1
    if abs_tick & 0x2 != 0 { ratio = mul_shift(ratio, 0xfff97272373d413259a46990580e213a) };
    // i = 2
    if abs_tick & 0x4 != 0 { ratio = mul_shift(ratio, 0xfff2e50f5f656932ef12357cf3c7fdcc) };
    // i = 3
    if abs_tick & 0x8 != 0 { ratio = mul_shift(ratio, 0xffe5caca7e10e4e61c3624eaa0941cd0) };
    // i = 4
    if abs_tick & 0x10 != 0 { ratio = mul_shift(ratio, 0xffcb9843d60f6159c9db58835c926644) };
    // i = 5
    if abs_tick & 0x20 != 0 { ratio = mul_shift(ratio, 0xff973b41fa98c081472e6896dfb254c0) };
    // i = 6
    if abs_tick & 0x40 != 0 { ratio = mul_shift(ratio, 0xff2ea16466c96a3843ec78b326b52861) };
    // i = 7
    if abs_tick & 0x80 != 0 { ratio = mul_shift(ratio, 0xfe5dee046a99a2a811c461f1969c3053) };
    // i = 8
    if abs_tick & 0x100 != 0 { ratio = mul_shift(ratio, 0xfcbe86c7900a88aedcffc83b479aa3a4) };
    // i = 9
    if abs_tick & 0x200 != 0 { ratio = mul_shift(ratio, 0xf987a7253ac413176f2b074cf7815e54) };
    // i = 10
    if abs_tick & 0x400 != 0 { ratio = mul_shift(ratio, 0xf3392b0822b70005940c7a398e4b70f3) };
    // i = 11
    if abs_tick & 0x800 != 0 { ratio = mul_shift(ratio, 0xe7159475a2c29b7443b29c7fa6e889d9) };
    // i = 12
    if abs_tick & 0x1000 != 0 { ratio = mul_shift(ratio, 0xd097f3bdfd2022b8845ad8f792aa5825) };
    // i = 13
    if abs_tick & 0x2000 != 0 { ratio = mul_shift(ratio, 0xa9f746462d870fdf8a65dc1f90e061e5) };
    // i = 14
    if abs_tick & 0x4000 != 0 { ratio = mul_shift(ratio, 0x70d869a156d2a1b890bb3df62baf32f7) };
    // i = 15
    if abs_tick & 0x8000 != 0 { ratio = mul_shift(ratio, 0x31be135f97d08fd981231505542fcfa6) };
    // i = 16
    if abs_tick & 0x10000 != 0 { ratio = mul_shift(ratio, 0x9aa508b5b7a84e1c677de54f3e99bc9) };
    // i = 17
    if abs_tick & 0x20000 != 0 { ratio = mul_shift(ratio, 0x5d6af8dedb81196699c329225ee604) };
    // i = 18
    if abs_tick & 0x40000 != 0 { ratio = mul_shift(ratio, 0x2216e584f5fa1ea926041bedfe98) };
    // i = 19
    if abs_tick & 0x80000 != 0 { ratio = mul_shift(ratio, 0x48a170391f7dc42444e8fa2) };

    // Invert to obtain 1.0001^(tick/2) for positive ticks
    if tick > 0 {
        ratio = U256::MAX / ratio;
    }

    // Round up and convert to Q64.96, so that get_tick_at_sqrt_price of the
    // result is always consistent with this function
    let remainder = ratio.low_u64() & 0xffff_ffff;
    Ok((ratio >> NUM_32) + U256::from((remainder != 0) as u8))
}

/// Calculates the greatest tick value such that get_sqrt_price_at_tick(tick) <= sqrt_price_x96
/// Throws if sqrt_price_x96 < MIN_SQRT_RATIO or sqrt_price_x96 >= MAX_SQRT_RATIO
///
/// Formula: `i = log base(√1.0001) (√P)`
///
/// # Arguments
///
/// * `sqrt_price_x96`- The sqrt ratio for which to compute the tick as a Q64.96
///
pub fn get_tick_at_sqrt_price(sqrt_price_x96: U256) -> Result<i32> {
    // second inequality must be < because the price can never reach the price at the max tick
    require!(
        sqrt_price_x96 >= MIN_SQRT_RATIO && sqrt_price_x96 < MAX_SQRT_RATIO,
        ErrorCode::InvalidSqrtPrice
    );

    // Integer part of log2(√P), i.e. the most significant bit less the x96 notation
    let msb = sqrt_price_x96.bits() as u32 - 1;
    let log2p_integer_x32 = (msb as i128 - 96) << 32;

    // Normalize √P / 2^msb into [1, 2) as a Q1.63 number
    let r = if msb >= 63 {
        sqrt_price_x96 >> U256::from(msb - 63)
    } else {
        sqrt_price_x96 << U256::from(63 - msb)
    };
    let mut r = r.low_u128();

    // Fractional part of the logarithm, one bit per squaring
    let mut bit: i128 = 0x8000_0000_0000_0000;
    let mut precision = 0;
    let mut log2p_fraction_x64: i128 = 0;
    while bit > 0 && precision < BIT_PRECISION {
        r *= r;
        // r^2 >= 2 as a Q2.126 number
        let is_r_more_than_two = r >> 127;
        r >>= 63 + is_r_more_than_two;
        log2p_fraction_x64 += bit * is_r_more_than_two as i128;
        bit >>= 1;
        precision += 1;
    }
    let log2p_fraction_x32 = log2p_fraction_x64 >> 32;
    let log2p_x32 = log2p_integer_x32 + log2p_fraction_x32;

    // 16 bit refinement gives an error margin of 2^-16 / log2 (√1.0001) = 0.2115 < 1

    // Change of base rule: multiply with 2^32 / log2 (√1.0001)
    let log_sqrt_10001_x64 = log2p_x32 * 59543866431248i128;

    // tick - 0.01
    let tick_low = ((log_sqrt_10001_x64 - 184467440737095516i128) >> 64) as i32;

    // tick + (2^-16 / log2(√1.0001)) + 0.01, rounded up to 0.8561
    let tick_high = ((log_sqrt_10001_x64 + 15793534762490258745i128) >> 64) as i32;

    Ok(if tick_low == tick_high {
        tick_low
    } else if get_sqrt_price_at_tick(tick_high)? <= sqrt_price_x96 {
        tick_high
    } else {
        tick_low
    })
}

/// Bits of the fractional logarithm computed by `get_tick_at_sqrt_price`
const BIT_PRECISION: u32 = 16;

/// Rounding applied when snapping an arbitrary tick onto a pool's tick grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TickAlignment {
    /// Greatest multiple of the spacing at or below the tick
    #[default]
    Spacing,
    /// As `Spacing`, then one spacing unit up if the multiple is odd
    EvenSpacing,
}

impl TickAlignment {
    pub fn align(self, tick: i32, tick_spacing: i32) -> i32 {
        match self {
            TickAlignment::Spacing => nearest_valid_tick(tick, tick_spacing),
            TickAlignment::EvenSpacing => nearest_even_valid_tick(tick, tick_spacing),
        }
    }
}

/// Returns the greatest multiple of `tick_spacing` that is less than or equal to `tick`
///
/// # Arguments
///
/// * `tick` - Any tick, aligned or not
/// * `tick_spacing` - The pool's tick spacing, must be positive
///
pub fn nearest_valid_tick(tick: i32, tick_spacing: i32) -> i32 {
    tick.div_euclid(tick_spacing) * tick_spacing
}

/// Snaps `tick` to the spacing grid, then moves one spacing unit up when the
/// grid index is odd. The correction only ever adds.
///
/// # Arguments
///
/// * `tick` - Any tick, aligned or not
/// * `tick_spacing` - The pool's tick spacing, must be positive
///
pub fn nearest_even_valid_tick(tick: i32, tick_spacing: i32) -> i32 {
    let valid_tick = nearest_valid_tick(tick, tick_spacing);
    if (valid_tick / tick_spacing) % 2 == 0 {
        valid_tick
    } else {
        valid_tick + tick_spacing
    }
}
