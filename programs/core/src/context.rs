use crate::error::ErrorCode;
use anchor_lang::prelude::*;

/// Payload submitted with a liquidity amount to a pool's mint entry point
///
/// `lower_old` and `upper_old` are the initialized ticks immediately below `lower` and
/// `upper` when the payload was built. `upper_old` is resolved after `lower` is inserted.
///
#[derive(AnchorSerialize, AnchorDeserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct MintData {
    pub lower_old: i32,
    pub lower: i32,
    pub upper_old: i32,
    pub upper: i32,

    /// Upper limits on the tokens the position may take
    pub amount_0_desired: u128,
    pub amount_1_desired: u128,

    /// Whether the tokens are paid from native balances instead of the vault
    pub native_0: bool,
    pub native_1: bool,

    /// Account allowed to burn the position
    pub position_owner: Pubkey,

    /// Account credited with the position
    pub recipient: Pubkey,
}

impl MintData {
    pub fn encode(&self) -> Result<Vec<u8>> {
        self.try_to_vec()
            .map_err(|_| error!(ErrorCode::MalformedPayload))
    }

    pub fn decode(data: &[u8]) -> Result<Self> {
        Self::try_from_slice(data).map_err(|_| error!(ErrorCode::MalformedPayload))
    }
}
