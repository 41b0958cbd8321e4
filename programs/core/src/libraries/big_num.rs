//! 256 and 512 bit numbers
//!
//! Sqrt prices are Q64.96 values below 2^160, so they live in a U256.
//! Products of two U256 values are widened to U512 before dividing.

use uint::construct_uint;

construct_uint! {
    pub struct U256(4);
}

construct_uint! {
    pub struct U512(8);
}

impl From<U256> for U512 {
    fn from(value: U256) -> Self {
        let mut words = [0u64; 8];
        words[..4].copy_from_slice(&value.0);
        U512(words)
    }
}

impl U512 {
    /// Narrows to a U256, or `None` if any of the upper 256 bits are set
    pub fn checked_as_u256(self) -> Option<U256> {
        if self.0[4..].iter().any(|word| *word != 0) {
            return None;
        }
        let mut words = [0u64; 4];
        words.copy_from_slice(&self.0[..4]);
        Some(U256(words))
    }
}

impl U256 {
    /// Narrows to a u128, or `None` if the value does not fit
    pub fn checked_as_u128(self) -> Option<u128> {
        if self.0[2] != 0 || self.0[3] != 0 {
            return None;
        }
        Some(self.low_u128())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn widen_and_narrow() {
        let value = U256::MAX;
        assert_eq!(U512::from(value).checked_as_u256(), Some(value));
        assert_eq!((U512::from(value) + U512::one()).checked_as_u256(), None);
    }

    #[test]
    fn narrow_to_u128() {
        assert_eq!(U256::from(u128::MAX).checked_as_u128(), Some(u128::MAX));
        assert_eq!((U256::from(u128::MAX) + U256::one()).checked_as_u128(), None);
    }
}
