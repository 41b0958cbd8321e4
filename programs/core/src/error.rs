use anchor_lang::prelude::*;

#[error_code]
pub enum ErrorCode {
    // states/tick.rs, libraries/tick_math.rs

    // Tick lies outside the sentinel bounds, or is not a multiple of the pool's tick spacing
    #[msg("Invalid tick")]
    InvalidTick,
    // The given sqrt price must lie in [MIN_SQRT_RATIO, MAX_SQRT_RATIO)
    #[msg("Sqrt price out of range")]
    InvalidSqrtPrice,
    #[msg("Hint tick no longer precedes the inserted tick")]
    StaleOrdering,
    #[msg("Tick liquidity exceeds the maximum for the pool's tick spacing")]
    TickLiquidityLimit,

    // libraries/liquidity_amounts.rs, libraries/full_math.rs

    #[msg("Lower bound must be below upper bound")]
    InvalidRange,
    #[msg("Fixed point overflow")]
    Overflow,

    // states/factory.rs

    #[msg("Tick spacing should be between 1 and 16383")]
    TickSpacingLimit,
    #[msg("Pool tokens must be distinct")]
    IdenticalTokens,
    #[msg("Pool tokens must be sorted in ascending order")]
    UnsortedTokens,
    #[msg("Pool already exists")]
    PoolAlreadyExists,

    // states/pool.rs

    #[msg("Minting amount should be greater than 0")]
    ZeroMintAmount,
    #[msg("Owed token amount exceeds the desired amount")]
    AmountExceedsDesired,
    #[msg("Signer is not the position owner")]
    NotAnOwner,
    #[msg("Unknown position")]
    UnknownPosition,
    #[msg("Malformed instruction payload")]
    MalformedPayload,

    // engine.rs

    #[msg("Pool engine is no longer running")]
    PoolClosed,
}
