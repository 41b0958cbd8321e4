use anchor_lang::prelude::*;
use trident_core::context::MintData;

/// Inputs of [`crate::prepare_mint`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MintParams {
    /// Tick range for the position, both multiples of the pool's tick spacing
    pub tick_lower: i32,
    pub tick_upper: i32,

    /// Desired amounts of token_0 and token_1 to be added
    pub amount_0_desired: u128,
    pub amount_1_desired: u128,

    pub native_0: bool,
    pub native_1: bool,

    /// Owner of the position on the pool
    pub position_owner: Pubkey,
    pub recipient: Pubkey,
}

/// Package submitted to a pool's mint entry point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MintInstruction {
    pub pool: Pubkey,
    pub liquidity: u128,
    pub data: MintData,
}

/// Inputs of [`crate::RangePositionManager::add_liquidity`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddLiquidityParams {
    pub tick_lower: i32,
    pub tick_upper: i32,

    /// Desired amounts of token_0 and token_1 to be added
    pub amount_0_desired: u128,
    pub amount_1_desired: u128,

    /// Mint fails if amounts added are below minimum levels
    pub amount_0_min: u128,
    pub amount_1_min: u128,

    /// Vault account the tokens are paid from
    pub payer: Pubkey,

    /// Account credited with the managed position
    pub recipient: Pubkey,
}
