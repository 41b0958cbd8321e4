pub mod big_num;
pub mod fixed_point_96;
pub mod full_math;
pub mod liquidity_amounts;
pub mod liquidity_math;
pub mod tick_math;
