//! Q64.96 fixed point constants

use super::big_num::U256;

pub const RESOLUTION: u8 = 96;

/// 2^96 as a U256
pub const Q96: U256 = U256([0, 1 << 32, 0, 0]);
