/// Liquidity held by a position between two initialized ticks
use crate::error::ErrorCode;
use crate::libraries::liquidity_math;
use anchor_lang::prelude::*;

#[derive(AnchorSerialize, AnchorDeserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PositionState {
    /// Account allowed to burn the position
    pub owner: Pubkey,
    /// Account credited with the position
    pub recipient: Pubkey,
    pub tick_lower: i32,
    pub tick_upper: i32,

    // Liquidity in the position the last time it was touched
    pub liquidity: u128,
}

impl PositionState {
    /// Credit a liquidity change to a position
    pub fn update(&mut self, liquidity_delta: i128) -> Result<()> {
        require!(
            liquidity_delta != 0 || self.liquidity > 0,
            ErrorCode::ZeroMintAmount
        );
        self.liquidity = liquidity_math::add_delta(self.liquidity, liquidity_delta)?;
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.liquidity == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_update() {
        let mut position = PositionState {
            tick_lower: -60,
            tick_upper: 60,
            ..Default::default()
        };
        position.update(100).unwrap();
        assert_eq!(position.liquidity, 100);
        position.update(-40).unwrap();
        assert_eq!(position.liquidity, 60);
        position.update(-60).unwrap();
        assert!(position.is_empty());
    }

    #[test]
    fn no_pokes_for_empty_positions() {
        let mut position = PositionState::default();
        assert_eq!(position.update(0).unwrap_err(), ErrorCode::ZeroMintAmount.into());
    }

    #[test]
    #[should_panic]
    fn burning_more_than_held() {
        let mut position = PositionState {
            liquidity: 10,
            ..Default::default()
        };
        position.update(-11).unwrap();
    }
}
