use anchor_lang::prelude::*;

/// Pool position held by the manager on behalf of a recipient
///
/// The manager is the owner of every position it mints on a pool. Recipients claim
/// the position through its token id.
///
#[derive(AnchorSerialize, AnchorDeserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenizedPositionState {
    /// Manager local identifier of the position
    pub token_id: u64,

    /// The pool with which this token is connected
    pub pool: Pubkey,

    /// Identifier of the position on the pool
    pub pool_position_id: u64,

    /// Account allowed to withdraw the position
    pub recipient: Pubkey,

    /// The lower bound tick of the position
    pub tick_lower: i32,

    /// The upper bound tick of the position
    pub tick_upper: i32,

    /// The amount of liquidity owned by this position
    pub liquidity: u128,
}

/// Emitted when liquidity is added through the manager.
/// Also emitted when a token is minted
#[event]
pub struct IncreaseLiquidityEvent {
    /// The ID of the token for which liquidity was increased
    pub token_id: u64,

    pub pool: Pubkey,

    /// The amount by which liquidity for the position was increased
    pub liquidity: u128,

    /// The amount of token_0 that was paid for the increase in liquidity
    pub amount_0: u128,

    /// The amount of token_1 that was paid for the increase in liquidity
    pub amount_1: u128,
}

/// Emitted when liquidity is removed through the manager
#[event]
pub struct DecreaseLiquidityEvent {
    /// The ID of the token for which liquidity was decreased
    pub token_id: u64,

    pub pool: Pubkey,

    /// The amount by which liquidity for the position was decreased
    pub liquidity: u128,

    /// The amount of token_0 that was accounted for the decrease in liquidity
    pub amount_0: u128,

    /// The amount of token_1 that was accounted for the decrease in liquidity
    pub amount_1: u128,
}
