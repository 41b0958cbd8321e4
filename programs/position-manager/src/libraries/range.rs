///! Symmetric range selection around the current tick
///!
use crate::error::ErrorCode;
use anchor_lang::prelude::*;
use trident_core::error::ErrorCode as CoreError;
use trident_core::libraries::tick_math::{self, TickAlignment};

/// Half width used when none is configured
pub const DEFAULT_HALF_WIDTH: i32 = 10800;

/// How a range is laid around the current tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangePolicy {
    /// Rounding of the current tick onto the spacing grid
    pub alignment: TickAlignment,

    /// Distance from the aligned tick to the lower bound. The upper bound sits one
    /// spacing unit further away.
    pub half_width: i32,
}

impl Default for RangePolicy {
    fn default() -> Self {
        RangePolicy {
            alignment: TickAlignment::EvenSpacing,
            half_width: DEFAULT_HALF_WIDTH,
        }
    }
}

/// Returns `(tick_lower, tick_upper)` around `tick`
///
/// `tick_lower = aligned - half_width` and `tick_upper = aligned + half_width + tick_spacing`,
/// where `aligned` is `tick` rounded by the policy's alignment.
///
/// # Arguments
///
/// * `tick` - The pool's current tick
/// * `tick_spacing` - The pool's tick spacing
/// * `policy` - Alignment and width of the range
///
pub fn select_range(tick: i32, tick_spacing: u16, policy: &RangePolicy) -> Result<(i32, i32)> {
    let tick_spacing = tick_spacing as i32;
    require!(tick_spacing > 0, CoreError::TickSpacingLimit);
    require!(
        policy.half_width > 0 && policy.half_width % tick_spacing == 0,
        ErrorCode::InvalidRangeWidth
    );

    let aligned = policy.alignment.align(tick, tick_spacing);
    let tick_lower = aligned
        .checked_sub(policy.half_width)
        .ok_or(ErrorCode::InvalidRangeWidth)?;
    let tick_upper = aligned
        .checked_add(policy.half_width)
        .and_then(|upper| upper.checked_add(tick_spacing))
        .ok_or(ErrorCode::InvalidRangeWidth)?;

    require!(
        tick_lower >= tick_math::MIN_TICK && tick_upper <= tick_math::MAX_TICK,
        CoreError::InvalidTick
    );
    Ok((tick_lower, tick_upper))
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck::{quickcheck, TestResult};

    #[test]
    fn default_policy_corrects_odd_grid_index() {
        // 12345 -> 12300 = 205 * 60 -> 12360
        let (lower, upper) = select_range(12345, 60, &RangePolicy::default()).unwrap();
        assert_eq!(lower, 12360 - 10800);
        assert_eq!(upper, 12360 + 10800 + 60);
    }

    #[test]
    fn spacing_alignment_only_floors() {
        let policy = RangePolicy {
            alignment: TickAlignment::Spacing,
            half_width: 600,
        };
        assert_eq!(select_range(12345, 60, &policy).unwrap(), (11700, 12960));
        assert_eq!(select_range(-1, 60, &policy).unwrap(), (-660, 600));
    }

    #[test]
    fn width_must_be_a_positive_multiple_of_spacing() {
        let policy = RangePolicy {
            half_width: 100,
            ..Default::default()
        };
        assert_eq!(
            select_range(0, 60, &policy).unwrap_err(),
            ErrorCode::InvalidRangeWidth.into()
        );
        let policy = RangePolicy {
            half_width: 0,
            ..Default::default()
        };
        assert_eq!(
            select_range(0, 60, &policy).unwrap_err(),
            ErrorCode::InvalidRangeWidth.into()
        );
    }

    #[test]
    fn range_past_the_sentinels_is_rejected() {
        assert_eq!(
            select_range(tick_math::MAX_TICK - 100, 60, &RangePolicy::default()).unwrap_err(),
            CoreError::InvalidTick.into()
        );
        let policy = RangePolicy {
            half_width: i32::MAX - 7,
            alignment: TickAlignment::Spacing,
        };
        assert_eq!(
            select_range(-10, 1, &policy).unwrap_err(),
            ErrorCode::InvalidRangeWidth.into()
        );
    }

    #[test]
    fn selected_ranges_are_aligned_and_contain_tick() {
        fn prop(raw: i32, spacing: u16) -> TestResult {
            let spacing = spacing % 200 + 1;
            let tick = raw % 800_000;
            let policy = RangePolicy {
                half_width: spacing as i32 * 50,
                ..Default::default()
            };
            let (lower, upper) = select_range(tick, spacing, &policy).unwrap();
            let spacing = spacing as i32;
            TestResult::from_bool(
                lower % spacing == 0
                    && upper % spacing == 0
                    && lower <= tick
                    && tick < upper
                    && ((lower + policy.half_width) / spacing) % 2 == 0,
            )
        }
        quickcheck(prop as fn(i32, u16) -> TestResult);
    }
}
